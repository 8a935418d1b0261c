// Action payloads submitted to the chain

use serde::{Deserialize, Serialize};

use crate::config::{ACTIVE_PERMISSION, NEW_ACCOUNT_ACTION, SYSTEM_ACCOUNT};

/// An `actor@permission` pair authorizing an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: String,
    pub permission: String,
}

impl PermissionLevel {
    pub fn new(actor: &str, permission: &str) -> Self {
        PermissionLevel {
            actor: actor.to_string(),
            permission: permission.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWeight {
    pub key: String,
    pub weight: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevelWeight {
    pub permission: PermissionLevel,
    pub weight: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitWeight {
    pub wait_sec: u32,
    pub weight: u16,
}

/// Weighted-threshold set of keys, accounts and waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub threshold: u32,
    pub keys: Vec<KeyWeight>,
    pub accounts: Vec<PermissionLevelWeight>,
    pub waits: Vec<WaitWeight>,
}

impl Authority {
    /// Authority satisfied by one signature from `key`
    pub fn single_key(key: &str) -> Self {
        Authority {
            threshold: 1,
            keys: vec![KeyWeight {
                key: key.to_string(),
                weight: 1,
            }],
            accounts: vec![],
            waits: vec![],
        }
    }
}

/// Data of the system contract's `newaccount` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub creator: String,
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
}

/// Typed action data. Serializes as the bare inner struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionData {
    NewAccount(NewAccount),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: String,
    pub name: String,
    pub authorization: Vec<PermissionLevel>,
    pub data: ActionData,
}

impl Action {
    /// `eosio::newaccount` creating `new_account_name` with single-key
    /// owner and active authorities, authorized by `eosio@active`
    pub fn new_account(new_account_name: &str, owner_key: &str, active_key: &str) -> Self {
        Action {
            account: SYSTEM_ACCOUNT.to_string(),
            name: NEW_ACCOUNT_ACTION.to_string(),
            authorization: vec![PermissionLevel::new(SYSTEM_ACCOUNT, ACTIVE_PERMISSION)],
            data: ActionData::NewAccount(NewAccount {
                creator: SYSTEM_ACCOUNT.to_string(),
                name: new_account_name.to_string(),
                owner: Authority::single_key(owner_key),
                active: Authority::single_key(active_key),
            }),
        }
    }
}
