//! Signature providers: who holds the keys that sign transactions.

use async_trait::async_trait;
use thiserror::Error;

use crate::keys::{KeyError, PrivateKey, PublicKey, Signature};
use crate::transaction::signing_digest;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureProviderError {
    #[error("invalid private key #{index}: {source}")]
    InvalidPrivateKey { index: usize, source: KeyError },
    #[error("invalid required key '{key}': {source}")]
    InvalidRequiredKey { key: String, source: KeyError },
    #[error("no available key for required key {0}")]
    MissingKey(String),
    #[error("signing failed: {0}")]
    Signing(#[from] KeyError),
}

#[async_trait]
pub trait SignatureProvider: Send + Sync {
    /// Public keys this provider can sign for
    async fn available_keys(&self) -> Vec<PublicKey>;

    /// Sign `packed_trx` for `chain_id` with every key in `required_keys`
    async fn sign(
        &self,
        chain_id: &[u8; 32],
        required_keys: &[String],
        packed_trx: &[u8],
    ) -> Result<Vec<Signature>, SignatureProviderError>;
}

/// Signs with private keys held in memory
pub struct LocalKeySignatureProvider {
    keys: Vec<(PublicKey, PrivateKey)>,
}

impl LocalKeySignatureProvider {
    /// Parse every key up front so a typo fails before any network call
    pub fn new<S: AsRef<str>>(private_keys: &[S]) -> Result<Self, SignatureProviderError> {
        let keys = private_keys
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let key: PrivateKey = text
                    .as_ref()
                    .parse()
                    .map_err(|source| SignatureProviderError::InvalidPrivateKey { index, source })?;
                Ok((key.public_key(), key))
            })
            .collect::<Result<Vec<_>, SignatureProviderError>>()?;

        Ok(LocalKeySignatureProvider { keys })
    }

    fn find(&self, public_key: &PublicKey) -> Option<&PrivateKey> {
        self.keys
            .iter()
            .find(|(candidate, _)| candidate == public_key)
            .map(|(_, private_key)| private_key)
    }
}

#[async_trait]
impl SignatureProvider for LocalKeySignatureProvider {
    async fn available_keys(&self) -> Vec<PublicKey> {
        self.keys.iter().map(|(public_key, _)| *public_key).collect()
    }

    async fn sign(
        &self,
        chain_id: &[u8; 32],
        required_keys: &[String],
        packed_trx: &[u8],
    ) -> Result<Vec<Signature>, SignatureProviderError> {
        let digest = signing_digest(chain_id, packed_trx);

        let mut signatures = Vec::with_capacity(required_keys.len());
        for text in required_keys {
            let public_key: PublicKey =
                text.parse()
                    .map_err(|source| SignatureProviderError::InvalidRequiredKey {
                        key: text.clone(),
                        source,
                    })?;

            let private_key = self
                .find(&public_key)
                .ok_or_else(|| SignatureProviderError::MissingKey(text.clone()))?;

            signatures.push(private_key.sign_digest(&digest)?);
        }

        Ok(signatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
    const DEV_PUB: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
    const DEV_PUB_K1: &str = "PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63";

    #[tokio::test]
    async fn test_available_keys() {
        let provider = LocalKeySignatureProvider::new(&[DEV_WIF]).unwrap();
        let keys = provider.available_keys().await;
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].to_string(), DEV_PUB);
    }

    #[test]
    fn test_invalid_key_rejected_at_construction() {
        let result = LocalKeySignatureProvider::new(&[DEV_WIF, "garbage"]);
        assert!(matches!(
            result,
            Err(SignatureProviderError::InvalidPrivateKey { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_sign_with_required_key() {
        let provider = LocalKeySignatureProvider::new(&[DEV_WIF]).unwrap();
        let chain_id = [0xabu8; 32];
        let packed = b"packed transaction";

        // nodes may answer in either key format
        for required in [DEV_PUB, DEV_PUB_K1] {
            let signatures = provider
                .sign(&chain_id, &[required.to_string()], packed)
                .await
                .unwrap();

            assert_eq!(signatures.len(), 1);
            let digest = signing_digest(&chain_id, packed);
            assert_eq!(signatures[0].recover(&digest).unwrap().to_string(), DEV_PUB);
        }
    }

    #[test]
    fn test_sign_missing_key() {
        let provider = LocalKeySignatureProvider::new(&[DEV_WIF]).unwrap();
        // public key of the private key 1
        let other = "EOS5p78kHbL33Rn3JWkTWRE2B9uz6gy4r1KbfAKLNQGE3ovMBS5bu".to_string();

        let result =
            tokio_test::block_on(provider.sign(&[0u8; 32], std::slice::from_ref(&other), b""));
        assert_eq!(result, Err(SignatureProviderError::MissingKey(other)));
    }

    #[tokio::test]
    async fn test_signs_with_each_required_key() {
        let provider = LocalKeySignatureProvider::new(&[
            DEV_WIF,
            "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf",
        ])
        .unwrap();
        let required = vec![
            "EOS5p78kHbL33Rn3JWkTWRE2B9uz6gy4r1KbfAKLNQGE3ovMBS5bu".to_string(),
            DEV_PUB.to_string(),
        ];

        let signatures = provider.sign(&[0u8; 32], &required, b"trx").await.unwrap();
        let digest = signing_digest(&[0u8; 32], b"trx");
        let signers: Vec<String> = signatures
            .iter()
            .map(|sig| sig.recover(&digest).unwrap().to_string())
            .collect();
        assert_eq!(signers, required);
    }

    #[tokio::test]
    async fn test_no_required_keys_no_signatures() {
        let provider = LocalKeySignatureProvider::new(&[DEV_WIF]).unwrap();
        let signatures = provider.sign(&[0u8; 32], &[], b"").await.unwrap();
        assert!(signatures.is_empty());
    }
}
