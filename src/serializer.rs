//! Binary packing of action data and transactions in the chain's wire layout.

use thiserror::Error;

use crate::keys::{KeyError, PublicKey, K1_KEY_TYPE};
use crate::models::{
    Action, ActionData, Authority, KeyWeight, NewAccount, PermissionLevel, PermissionLevelWeight,
    WaitWeight,
};
use crate::name::{self, NameError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("invalid public key '{key}': {source}")]
    PublicKey { key: String, source: KeyError },
    #[error("sequence of {0} elements does not fit a varuint32")]
    TooLong(usize),
}

/// Append-only little-endian byte writer
#[derive(Debug, Default)]
pub struct Serializer {
    buf: Vec<u8>,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// LEB128
    pub fn write_varuint32(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn write_name(&mut self, name: &str) -> Result<(), PackError> {
        self.write_u64(name::encode(name)?);
        Ok(())
    }

    pub fn write_len(&mut self, len: usize) -> Result<(), PackError> {
        let len32 = u32::try_from(len).map_err(|_| PackError::TooLong(len))?;
        self.write_varuint32(len32);
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), PackError> {
        self.write_len(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_public_key(&mut self, key: &str) -> Result<(), PackError> {
        let parsed: PublicKey = key.parse().map_err(|source| PackError::PublicKey {
            key: key.to_string(),
            source,
        })?;
        self.write_u8(K1_KEY_TYPE);
        self.buf.extend_from_slice(&parsed.to_bytes());
        Ok(())
    }

    pub fn write_seq<T: Pack>(&mut self, items: &[T]) -> Result<(), PackError> {
        self.write_len(items.len())?;
        for item in items {
            item.pack(self)?;
        }
        Ok(())
    }
}

/// Types with a fixed binary layout on chain
pub trait Pack {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError>;

    fn to_packed(&self) -> Result<Vec<u8>, PackError> {
        let mut s = Serializer::new();
        self.pack(&mut s)?;
        Ok(s.into_bytes())
    }
}

impl Pack for PermissionLevel {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        s.write_name(&self.actor)?;
        s.write_name(&self.permission)
    }
}

impl Pack for KeyWeight {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        s.write_public_key(&self.key)?;
        s.write_u16(self.weight);
        Ok(())
    }
}

impl Pack for PermissionLevelWeight {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        self.permission.pack(s)?;
        s.write_u16(self.weight);
        Ok(())
    }
}

impl Pack for WaitWeight {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        s.write_u32(self.wait_sec);
        s.write_u16(self.weight);
        Ok(())
    }
}

impl Pack for Authority {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        s.write_u32(self.threshold);
        s.write_seq(&self.keys)?;
        s.write_seq(&self.accounts)?;
        s.write_seq(&self.waits)
    }
}

impl Pack for NewAccount {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        s.write_name(&self.creator)?;
        s.write_name(&self.name)?;
        self.owner.pack(s)?;
        self.active.pack(s)
    }
}

impl Pack for ActionData {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        match self {
            ActionData::NewAccount(data) => data.pack(s),
        }
    }
}

impl Pack for Action {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        s.write_name(&self.account)?;
        s.write_name(&self.name)?;
        s.write_seq(&self.authorization)?;
        s.write_bytes(&self.data.to_packed()?)
    }
}
