//! Istanbul BFT genesis extra-data.
//!
//! Layout: 32 bytes of vanity followed by the RLP encoding of
//! `[validators, seal, committed_seals]`. At genesis the seal is empty and
//! there are no committed seals.

use rlp::RlpStream;

/// Vanity prefix length in bytes
pub const VANITY_LEN: usize = 32;

/// Encode the validator set into a `0x`-prefixed extra-data string
pub fn istanbul_extra_data(validators: &[[u8; 20]]) -> String {
    let mut stream = RlpStream::new_list(3);
    stream.begin_list(validators.len());
    for validator in validators {
        stream.append(&validator.to_vec());
    }
    stream.append_empty_data();
    stream.begin_list(0);

    let mut bytes = vec![0u8; VANITY_LEN];
    bytes.extend_from_slice(&stream.out());
    format!("0x{}", hex::encode(bytes))
}

/// Raft carries no validator set, only the zero vanity
pub fn raft_extra_data() -> String {
    format!("0x{}", "0".repeat(VANITY_LEN * 2))
}
