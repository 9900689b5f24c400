//! Node key material.
//!
//! Keys are produced by an external generator and laid out as one
//! directory per node:
//!
//! ```text
//! key1/
//! |-- nodekey            # devp2p private key
//! |-- enode              # hex node id (64-byte public key)
//! |-- acctkeyfile.json   # keystore file of the node account
//! |-- password.txt       # keystore password
//! |-- tm.key / tm.pub    # privacy manager key pair
//! ```
//!
//! Nothing here generates key material; it is only located and parsed.

use super::ResourceError;
use crate::utils::files::read_to_string;
use sha3::{Digest, Keccak256};
use std::path::{Path, PathBuf};

pub const NODEKEY: &str = "nodekey";
pub const ENODE: &str = "enode";
pub const ACCOUNT_KEYFILE: &str = "acctkeyfile.json";
pub const PASSWORD: &str = "password.txt";
pub const TM_KEY: &str = "tm.key";
pub const TM_PUB: &str = "tm.pub";

/// Key directory of node `number` (1-based)
pub fn key_dir(config_dir: &Path, number: usize) -> PathBuf {
    config_dir.join(format!("key{}", number))
}

/// Parsed public parts of one node's keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKeys {
    /// Hex node id as written in enode URLs (no `0x`)
    pub enode_id: String,
    /// Account address, lowercase hex without `0x`
    pub account_address: String,
}

impl NodeKeys {
    /// Read the keys of node `number` from `config_dir/key<number>`
    pub fn read(config_dir: &Path, number: usize) -> Result<Self, ResourceError> {
        let dir = key_dir(config_dir, number);

        let enode_path = dir.join(ENODE);
        let enode_id = read_to_string(&enode_path)?
            .trim()
            .trim_start_matches("0x")
            .to_lowercase();
        public_key_bytes(&enode_id).map_err(|reason| ResourceError::MalformedKey {
            path: enode_path.clone(),
            reason,
        })?;

        let keyfile_path = dir.join(ACCOUNT_KEYFILE);
        let keyfile: serde_json::Value =
            serde_json::from_str(&read_to_string(&keyfile_path)?).map_err(|e| ResourceError::MalformedKey {
                path: keyfile_path.clone(),
                reason: e.to_string(),
            })?;
        let account_address = keyfile
            .get("address")
            .and_then(|a| a.as_str())
            .map(|a| a.trim_start_matches("0x").to_lowercase())
            .ok_or_else(|| ResourceError::MalformedKey {
                path: keyfile_path.clone(),
                reason: "missing 'address' field".to_string(),
            })?;

        Ok(Self {
            enode_id,
            account_address,
        })
    }

    /// Validator address: last 20 bytes of keccak256 of the public key
    pub fn validator_address(&self) -> Result<[u8; 20], String> {
        let public_key = public_key_bytes(&self.enode_id)?;
        let hash = Keccak256::digest(&public_key);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        Ok(address)
    }
}

fn public_key_bytes(enode_id: &str) -> Result<Vec<u8>, String> {
    let bytes = hex::decode(enode_id).map_err(|e| format!("enode id is not hex: {}", e))?;
    if bytes.len() != 64 {
        return Err(format!("enode id must be 64 bytes, got {}", bytes.len()));
    }
    Ok(bytes)
}

/// Read every node's keys, in node order
pub fn read_all(config_dir: &Path, node_count: usize) -> Result<Vec<NodeKeys>, ResourceError> {
    (1..=node_count).map(|number| NodeKeys::read(config_dir, number)).collect()
}

/// Files a node directory must contain; privacy keys only when required
pub fn required_files(tessera: bool) -> Vec<&'static str> {
    let mut files = vec![NODEKEY, ENODE, ACCOUNT_KEYFILE, PASSWORD];
    if tessera {
        files.extend([TM_KEY, TM_PUB]);
    }
    files
}

/// Fail on the first missing key file
pub fn check_key_material(config_dir: &Path, node_count: usize, tessera: bool) -> Result<(), ResourceError> {
    for number in 1..=node_count {
        let dir = key_dir(config_dir, number);
        for file in required_files(tessera) {
            let path = dir.join(file);
            if !path.is_file() {
                return Err(ResourceError::MissingFile(path));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ENODE_ID: &str = "ac6b1096ca56b9f6d004b779ae3728bf83f8e22453404cc3cef16a3d9b96608bc67c4b30db88e0a5a6c6390213f7acbe1153ff6d23ce57380104288ae19373ef";

    fn write_keys(dir: &Path, number: usize, enode: &str) {
        let key_dir = key_dir(dir, number);
        fs::create_dir_all(&key_dir).unwrap();
        fs::write(key_dir.join(ENODE), format!("{}\n", enode)).unwrap();
        fs::write(
            key_dir.join(ACCOUNT_KEYFILE),
            r#"{"address":"ED9D02E382B34818E88B88A309C7FE71E65F419D","crypto":{}}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_read_node_keys() {
        let dir = TempDir::new().unwrap();
        write_keys(dir.path(), 1, ENODE_ID);

        let keys = NodeKeys::read(dir.path(), 1).unwrap();
        assert_eq!(keys.enode_id, ENODE_ID);
        assert_eq!(keys.account_address, "ed9d02e382b34818e88b88a309c7fe71e65f419d");
    }

    #[test]
    fn test_malformed_enode_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_keys(dir.path(), 1, "abcd");
        assert!(matches!(
            NodeKeys::read(dir.path(), 1),
            Err(ResourceError::MalformedKey { .. })
        ));
    }

    #[test]
    fn test_missing_key_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(NodeKeys::read(dir.path(), 3), Err(ResourceError::MissingFile(_))));
        assert!(check_key_material(dir.path(), 2, false).is_err());
    }

    #[test]
    fn test_validator_address_is_keccak_suffix() {
        let keys = NodeKeys {
            enode_id: ENODE_ID.to_string(),
            account_address: String::new(),
        };
        let address = keys.validator_address().unwrap();
        let hash = Keccak256::digest(hex::decode(ENODE_ID).unwrap());
        assert_eq!(&address[..], &hash[12..]);
    }

    #[test]
    fn test_required_files() {
        assert_eq!(required_files(false).len(), 4);
        assert!(required_files(true).contains(&TM_PUB));
    }
}
