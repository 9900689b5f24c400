//! Synthesized genesis document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GAS_LIMIT: &str = "0xE0000000";
/// Initial balance of every node account, in wei
pub const ACCOUNT_BALANCE: &str = "1000000000000000000000000000";
pub const RAFT_MIXHASH: &str = "0x00000000000000000000000000000000000000647572616c65787365646c6578";
pub const ISTANBUL_MIXHASH: &str = "0x63746963616c2062797a616e74696e65206661756c7420746f6c6572616e6365";
pub const ISTANBUL_EPOCH: u64 = 30000;
const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocAccount {
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IstanbulConfig {
    pub epoch: u64,
    pub policy: u64,
    #[serde(rename = "ceil2Nby3Block")]
    pub ceil2_nby3_block: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub homestead_block: u64,
    pub byzantium_block: u64,
    pub constantinople_block: u64,
    pub chain_id: u64,
    pub eip150_block: u64,
    pub eip150_hash: String,
    pub eip155_block: u64,
    pub eip158_block: u64,
    pub max_code_size: u64,
    pub max_code_size_change_block: u64,
    pub is_quorum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub istanbul: Option<IstanbulConfig>,
}

impl ChainConfig {
    fn new(chain_id: u64, istanbul: Option<IstanbulConfig>) -> Self {
        Self {
            homestead_block: 0,
            byzantium_block: 0,
            constantinople_block: 0,
            chain_id,
            eip150_block: 0,
            eip150_hash: ZERO_HASH.to_string(),
            eip155_block: 0,
            eip158_block: 0,
            max_code_size: 35,
            max_code_size_change_block: 0,
            is_quorum: true,
            istanbul,
        }
    }
}

/// Genesis file contents. Field order and the `BTreeMap` alloc keep the
/// serialized output stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    pub alloc: BTreeMap<String, AllocAccount>,
    pub coinbase: String,
    pub config: ChainConfig,
    pub difficulty: String,
    pub extra_data: String,
    pub gas_limit: String,
    pub mixhash: String,
    pub nonce: String,
    pub parent_hash: String,
    pub timestamp: String,
}

fn alloc(accounts: &[String]) -> BTreeMap<String, AllocAccount> {
    accounts
        .iter()
        .map(|address| {
            (
                format!("0x{}", address),
                AllocAccount {
                    balance: ACCOUNT_BALANCE.to_string(),
                },
            )
        })
        .collect()
}

impl Genesis {
    fn base(chain_id: u64, accounts: &[String], istanbul: Option<IstanbulConfig>) -> Self {
        Self {
            alloc: alloc(accounts),
            coinbase: ZERO_ADDRESS.to_string(),
            config: ChainConfig::new(chain_id, istanbul),
            difficulty: "0x0".to_string(),
            extra_data: super::extra_data::raft_extra_data(),
            gas_limit: GAS_LIMIT.to_string(),
            mixhash: RAFT_MIXHASH.to_string(),
            nonce: "0x0".to_string(),
            parent_hash: ZERO_HASH.to_string(),
            timestamp: "0x00".to_string(),
        }
    }

    pub fn raft(chain_id: u64, accounts: &[String]) -> Self {
        Self::base(chain_id, accounts, None)
    }

    pub fn istanbul(chain_id: u64, accounts: &[String], extra_data: String) -> Self {
        let istanbul = IstanbulConfig {
            epoch: ISTANBUL_EPOCH,
            policy: 0,
            ceil2_nby3_block: 0,
        };
        Self {
            difficulty: "0x1".to_string(),
            extra_data,
            mixhash: ISTANBUL_MIXHASH.to_string(),
            ..Self::base(chain_id, accounts, Some(istanbul))
        }
    }
}
