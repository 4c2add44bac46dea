//! Scanner configuration.

use ethers::types::Address;

use crate::constants::{DEFAULT_SCAN_BATCH_SIZE, DEFAULT_VIEW_TAG_CACHE_SIZE};
use crate::error::{Result, VeilpayError};
use crate::types::{CompressedPublicKey, StealthPrivateKey};

/// Configuration for a scanning identity.
///
/// Holds the recipient's key material, so this type has no serde and its
/// Debug output redacts the private keys.
#[derive(Debug, Clone)]
pub struct ScanningConfig {
    /// Viewing private key; required to detect payments.
    pub viewing_private_key: StealthPrivateKey,
    /// Spending public key; required to derive stealth addresses.
    pub spending_public_key: CompressedPublicKey,
    /// Spending private key; only needed to recover stealth private keys.
    pub spending_private_key: Option<StealthPrivateKey>,
    /// JSON-RPC endpoint, `None` for in-process providers.
    pub rpc_url: Option<String>,
    pub chain_id: u64,
    /// First block the scanner cursor starts from.
    pub start_block: u64,
    /// Maximum blocks per scan batch.
    pub batch_size: u64,
    /// Announcer contract to filter events by, if known.
    pub announcer: Option<Address>,
    /// Capacity of the negative view-tag cache.
    pub view_tag_cache_size: usize,
}

impl ScanningConfig {
    /// Creates a config with defaults for everything but the key material.
    pub fn new(
        viewing_private_key: StealthPrivateKey,
        spending_public_key: CompressedPublicKey,
    ) -> Self {
        Self {
            viewing_private_key,
            spending_public_key,
            spending_private_key: None,
            rpc_url: None,
            chain_id: 1,
            start_block: 0,
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
            announcer: None,
            view_tag_cache_size: DEFAULT_VIEW_TAG_CACHE_SIZE,
        }
    }

    pub fn with_spending_private_key(mut self, key: StealthPrivateKey) -> Self {
        self.spending_private_key = Some(key);
        self
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_start_block(mut self, block: u64) -> Self {
        self.start_block = block;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_announcer(mut self, announcer: Address) -> Self {
        self.announcer = Some(announcer);
        self
    }

    pub fn with_view_tag_cache_size(mut self, size: usize) -> Self {
        self.view_tag_cache_size = size;
        self
    }

    /// Validates the config.
    ///
    /// # Errors
    /// Returns `ConfigError` on a zero batch size or zero cache capacity.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(VeilpayError::ConfigError(
                "batch_size must be greater than zero".into(),
            ));
        }
        if self.view_tag_cache_size == 0 {
            return Err(VeilpayError::ConfigError(
                "view_tag_cache_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COMPRESSED_PUBLIC_KEY_SIZE;

    fn sample_config() -> ScanningConfig {
        let mut pk = [0x42; COMPRESSED_PUBLIC_KEY_SIZE];
        pk[0] = 0x02;
        ScanningConfig::new(
            StealthPrivateKey::from_array([1u8; 32]),
            CompressedPublicKey::from_array(pk),
        )
    }

    #[test]
    fn test_defaults() {
        let config = sample_config();
        assert_eq!(config.batch_size, DEFAULT_SCAN_BATCH_SIZE);
        assert_eq!(config.view_tag_cache_size, DEFAULT_VIEW_TAG_CACHE_SIZE);
        assert_eq!(config.start_block, 0);
        assert!(config.spending_private_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = sample_config()
            .with_chain_id(11155111)
            .with_start_block(500)
            .with_batch_size(250)
            .with_rpc_url("http://localhost:8545");
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(config.start_block, 500);
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = sample_config().with_batch_size(0);
        assert!(matches!(
            config.validate(),
            Err(VeilpayError::ConfigError(_))
        ));
    }

    #[test]
    fn test_debug_redacts_private_keys() {
        let config = sample_config();
        let debug = format!("{:?}", config);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("0101"));
    }
}
