//! K1 (secp256k1) keys and signatures in their chain text formats.
//!
//! Private keys: legacy WIF (`5...`) or `PVT_K1_...`.
//! Public keys: legacy `EOS...` or `PUB_K1_...`.
//! Signatures: `SIG_K1_...`.

use std::fmt;
use std::str::FromStr;

use ripemd::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const LEGACY_PUBLIC_KEY_PREFIX: &str = "EOS";
pub const K1_PUBLIC_KEY_PREFIX: &str = "PUB_K1_";
pub const K1_PRIVATE_KEY_PREFIX: &str = "PVT_K1_";
pub const K1_SIGNATURE_PREFIX: &str = "SIG_K1_";

/// WIF version byte for private keys
const WIF_VERSION: u8 = 0x80;

/// Suffix mixed into ripemd160 checksums of the `*_K1_` formats
const K1_SUFFIX: &[u8] = b"K1";

/// Key type tag used on the wire for K1 keys and signatures
pub const K1_KEY_TYPE: u8 = 0;

pub const PUBLIC_KEY_LEN: usize = 33;
pub const PRIVATE_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 65;

/// Upper bound on nonce retries while looking for a canonical signature
const MAX_SIGNING_ATTEMPTS: u32 = 256;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid base58 in key: {0}")]
    Base58(String),
    #[error("unrecognized key format: {0}")]
    InvalidFormat(String),
    #[error("unsupported key type: {0}")]
    UnsupportedType(String),
    #[error("checksum mismatch")]
    Checksum,
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("could not produce a canonical signature")]
    NonCanonical,
}

// ============================================================================
// CHECKSUM HELPERS
// ============================================================================

fn ripemd160_checksum(data: &[u8], suffix: &[u8]) -> [u8; 4] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix);
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2], digest[3]]
}

fn double_sha256_checksum(data: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    [second[0], second[1], second[2], second[3]]
}

fn decode_base58(text: &str) -> Result<Vec<u8>, KeyError> {
    bs58::decode(text)
        .into_vec()
        .map_err(|e| KeyError::Base58(e.to_string()))
}

/// Split `payload || checksum` and check the length of the payload
fn split_checksum(bytes: &[u8], payload_len: usize) -> Result<(&[u8], &[u8]), KeyError> {
    if bytes.len() != payload_len + 4 {
        return Err(KeyError::InvalidFormat(format!(
            "expected {} bytes, got {}",
            payload_len + 4,
            bytes.len()
        )));
    }
    Ok(bytes.split_at(payload_len))
}

fn encode_k1(prefix: &str, payload: &[u8]) -> String {
    let mut data = payload.to_vec();
    data.extend_from_slice(&ripemd160_checksum(payload, K1_SUFFIX));
    format!("{}{}", prefix, bs58::encode(data).into_string())
}

/// Decode a `<prefix><base58(payload || ripemd160(payload || "K1")[..4])>` string
fn decode_k1(text: &str, payload_len: usize) -> Result<Vec<u8>, KeyError> {
    let bytes = decode_base58(text)?;
    let (payload, checksum) = split_checksum(&bytes, payload_len)?;
    if ripemd160_checksum(payload, K1_SUFFIX) != checksum {
        return Err(KeyError::Checksum);
    }
    Ok(payload.to_vec())
}

// ============================================================================
// PUBLIC KEY
// ============================================================================

/// Compressed secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
    /// 33-byte compressed encoding
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.0.serialize()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        secp256k1::PublicKey::from_slice(bytes)
            .map(PublicKey)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))
    }

    /// `PUB_K1_` rendering
    pub fn to_k1_string(&self) -> String {
        encode_k1(K1_PUBLIC_KEY_PREFIX, &self.to_bytes())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(K1_PUBLIC_KEY_PREFIX) {
            let payload = decode_k1(rest, PUBLIC_KEY_LEN)?;
            return PublicKey::from_bytes(&payload);
        }

        if s.starts_with("PUB_") {
            return Err(KeyError::UnsupportedType(s.to_string()));
        }

        if let Some(rest) = s.strip_prefix(LEGACY_PUBLIC_KEY_PREFIX) {
            let bytes = decode_base58(rest)?;
            let (payload, checksum) = split_checksum(&bytes, PUBLIC_KEY_LEN)?;
            if ripemd160_checksum(payload, &[]) != checksum {
                return Err(KeyError::Checksum);
            }
            return PublicKey::from_bytes(payload);
        }

        Err(KeyError::InvalidFormat(s.to_string()))
    }
}

/// Legacy `EOS` rendering, the form nodes accept everywhere
impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = self.to_bytes();
        let mut data = payload.to_vec();
        data.extend_from_slice(&ripemd160_checksum(&payload, &[]));
        write!(f, "{}{}", LEGACY_PUBLIC_KEY_PREFIX, bs58::encode(data).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

// ============================================================================
// PRIVATE KEY
// ============================================================================

#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        SecretKey::from_slice(bytes)
            .map(PrivateKey)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        PublicKey(secp256k1::PublicKey::from_secret_key(&secp, &self.0))
    }

    /// `PVT_K1_` rendering
    pub fn to_k1_string(&self) -> String {
        encode_k1(K1_PRIVATE_KEY_PREFIX, &self.0.secret_bytes())
    }

    /// Legacy WIF rendering
    pub fn to_wif(&self) -> String {
        let mut data = vec![WIF_VERSION];
        data.extend_from_slice(&self.0.secret_bytes());
        let checksum = double_sha256_checksum(&data);
        data.extend_from_slice(&checksum);
        bs58::encode(data).into_string()
    }

    /// Sign a 32-byte digest, retrying with fresh nonce data until the
    /// signature is canonical
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature, KeyError> {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(*digest);

        for attempt in 0..MAX_SIGNING_ATTEMPTS {
            let signature = if attempt == 0 {
                secp.sign_ecdsa_recoverable(&message, &self.0)
            } else {
                let mut nonce_data = [0u8; 32];
                nonce_data[..4].copy_from_slice(&attempt.to_le_bytes());
                secp.sign_ecdsa_recoverable_with_noncedata(&message, &self.0, &nonce_data)
            };

            let (recovery_id, compact) = signature.serialize_compact();
            if is_canonical(&compact) {
                let mut bytes = [0u8; SIGNATURE_LEN];
                bytes[0] = recovery_id.to_i32() as u8 + 27 + 4;
                bytes[1..].copy_from_slice(&compact);
                return Ok(Signature(bytes));
            }

            tracing::trace!(attempt, "non-canonical signature, retrying");
        }

        Err(KeyError::NonCanonical)
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(K1_PRIVATE_KEY_PREFIX) {
            let payload = decode_k1(rest, PRIVATE_KEY_LEN)?;
            return PrivateKey::from_bytes(&payload);
        }

        if s.starts_with("PVT_") {
            return Err(KeyError::UnsupportedType(s.to_string()));
        }

        let bytes = decode_base58(s)?;
        let (payload, checksum) = split_checksum(&bytes, PRIVATE_KEY_LEN + 1)?;
        if payload[0] != WIF_VERSION {
            return Err(KeyError::InvalidFormat(format!(
                "unexpected WIF version byte {:#04x}",
                payload[0]
            )));
        }
        if double_sha256_checksum(payload) != checksum {
            return Err(KeyError::Checksum);
        }
        PrivateKey::from_bytes(&payload[1..])
    }
}

/// Never prints key material
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(public: {})", self.public_key())
    }
}

// ============================================================================
// SIGNATURE
// ============================================================================

/// Chain rules accept only signatures whose r and s have no redundant
/// leading zero byte and a clear high bit
fn is_canonical(compact: &[u8; 64]) -> bool {
    (compact[0] & 0x80) == 0
        && !(compact[0] == 0 && (compact[1] & 0x80) == 0)
        && (compact[32] & 0x80) == 0
        && !(compact[32] == 0 && (compact[33] & 0x80) == 0)
}

/// Recoverable signature: `[recovery_id + 31] || r || s`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn is_canonical(&self) -> bool {
        let mut compact = [0u8; 64];
        compact.copy_from_slice(&self.0[1..]);
        is_canonical(&compact)
    }

    /// Recover the public key that produced this signature over `digest`
    pub fn recover(&self, digest: &[u8; 32]) -> Result<PublicKey, KeyError> {
        let recovery_id = RecoveryId::from_i32(self.0[0] as i32 - 27 - 4)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        let signature = RecoverableSignature::from_compact(&self.0[1..], recovery_id)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        let secp = Secp256k1::verification_only();
        secp.recover_ecdsa(&Message::from_digest(*digest), &signature)
            .map(PublicKey)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(K1_SIGNATURE_PREFIX)
            .ok_or_else(|| KeyError::InvalidFormat(s.to_string()))?;
        let payload = decode_k1(rest, SIGNATURE_LEN)?;

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes.copy_from_slice(&payload);
        Ok(Signature(bytes))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_k1(K1_SIGNATURE_PREFIX, &self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
    const DEV_PVT_K1: &str = "PVT_K1_2bfGi9rYsXQSXXTvJbDAPhHLQUojjaNLomdm3cEJ1XTzMqUt3V";
    const DEV_PUB_LEGACY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
    const DEV_PUB_K1: &str = "PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63";

    #[test]
    fn test_wif_derives_known_public_key() {
        let key: PrivateKey = DEV_WIF.parse().unwrap();
        assert_eq!(key.public_key().to_string(), DEV_PUB_LEGACY);
        assert_eq!(key.public_key().to_k1_string(), DEV_PUB_K1);
        assert_eq!(
            hex::encode(key.public_key().to_bytes()),
            "02c0ded2bc1f1305fb0faac5e6c03ee3a1924234985427b6167ca569d13df435cf"
        );
    }

    #[test]
    fn test_private_key_formats_agree() {
        let wif: PrivateKey = DEV_WIF.parse().unwrap();
        let k1: PrivateKey = DEV_PVT_K1.parse().unwrap();
        assert_eq!(wif.public_key(), k1.public_key());
        assert_eq!(wif.to_wif(), DEV_WIF);
        assert_eq!(wif.to_k1_string(), DEV_PVT_K1);
    }

    #[test]
    fn test_public_key_formats_agree() {
        let legacy: PublicKey = DEV_PUB_LEGACY.parse().unwrap();
        let k1: PublicKey = DEV_PUB_K1.parse().unwrap();
        assert_eq!(legacy, k1);
    }

    #[test]
    fn test_bad_checksums_rejected() {
        // last character changed
        let bad_pub = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CW";
        assert_eq!(bad_pub.parse::<PublicKey>(), Err(KeyError::Checksum));

        let bad_wif = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD4";
        assert!(bad_wif.parse::<PrivateKey>().is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            "PUB_OWNER".parse::<PublicKey>(),
            Err(KeyError::UnsupportedType(_))
        ));
        assert!(matches!(
            "not-a-key".parse::<PublicKey>(),
            Err(KeyError::InvalidFormat(_))
        ));
        assert!(matches!(
            "0OIl".parse::<PrivateKey>(),
            Err(KeyError::Base58(_))
        ));
        assert!(matches!(
            "PVT_R1_abc".parse::<PrivateKey>(),
            Err(KeyError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let key: PrivateKey = DEV_WIF.parse().unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(DEV_WIF));
        assert!(debug.contains(DEV_PUB_LEGACY));
    }

    #[test]
    fn test_sign_is_canonical_and_recoverable() {
        let key: PrivateKey = DEV_WIF.parse().unwrap();

        for i in 0u8..16 {
            let digest: [u8; 32] = Sha256::digest([i]).into();
            let signature = key.sign_digest(&digest).unwrap();

            assert!(signature.is_canonical());
            assert_eq!(signature.recover(&digest).unwrap(), key.public_key());
        }
    }

    #[test]
    fn test_signature_text_format() {
        let key: PrivateKey = DEV_WIF.parse().unwrap();
        let digest: [u8; 32] = Sha256::digest(b"newaccount").into();
        let signature = key.sign_digest(&digest).unwrap();

        let text = signature.to_string();
        assert!(text.starts_with("SIG_K1_"));

        let parsed: Signature = text.parse().unwrap();
        assert_eq!(parsed, signature);
        assert!((31..=34).contains(&parsed.as_bytes()[0]));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key: PrivateKey = DEV_PVT_K1.parse().unwrap();
        let digest = [7u8; 32];
        assert_eq!(key.sign_digest(&digest).unwrap(), key.sign_digest(&digest).unwrap());
    }
}
