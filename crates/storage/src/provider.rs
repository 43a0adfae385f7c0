//! Sources of raw storage words.

use std::{collections::HashMap, convert::Infallible, future::Future};

use alloy_eips::BlockId;
use alloy_primitives::{B256, U256};

/// Reads single storage words of one contract.
pub trait StorageProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the 32-byte word at `slot`, optionally at a specific block.
    fn sload(
        &self,
        slot: U256,
        block: Option<BlockId>,
    ) -> impl Future<Output = Result<B256, Self::Error>> + Send;
}

/// In-memory storage where unset slots read as zero.
///
/// Block references are ignored.
#[derive(Debug, Clone, Default)]
pub struct HashMapStorageProvider {
    words: HashMap<U256, B256>,
}

impl HashMapStorageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the word at `slot`.
    pub fn with_word(mut self, slot: U256, word: B256) -> Self {
        self.insert(slot, word);
        self
    }

    pub fn insert(&mut self, slot: U256, word: B256) {
        self.words.insert(slot, word);
    }
}

impl FromIterator<(U256, B256)> for HashMapStorageProvider {
    fn from_iter<I: IntoIterator<Item = (U256, B256)>>(iter: I) -> Self {
        Self { words: iter.into_iter().collect() }
    }
}

impl StorageProvider for HashMapStorageProvider {
    type Error = Infallible;

    async fn sload(&self, slot: U256, _block: Option<BlockId>) -> Result<B256, Self::Error> {
        Ok(self.words.get(&slot).copied().unwrap_or_default())
    }
}

#[cfg(feature = "rpc")]
pub use rpc::RpcStorageProvider;

#[cfg(feature = "rpc")]
mod rpc {
    use alloy_eips::BlockId;
    use alloy_primitives::{Address, B256, U256};
    use alloy_provider::Provider;
    use alloy_transport::TransportError;

    use super::StorageProvider;

    /// Reads storage of `address` through `eth_getStorageAt`.
    #[derive(Debug, Clone)]
    pub struct RpcStorageProvider<P> {
        provider: P,
        address: Address,
    }

    impl<P> RpcStorageProvider<P> {
        pub const fn new(provider: P, address: Address) -> Self {
            Self { provider, address }
        }
    }

    impl<P: Provider> StorageProvider for RpcStorageProvider<P> {
        type Error = TransportError;

        async fn sload(&self, slot: U256, block: Option<BlockId>) -> Result<B256, Self::Error> {
            let request = self.provider.get_storage_at(self.address, slot);
            let value = match block {
                Some(block) => request.block_id(block).await?,
                None => request.await?,
            };
            Ok(B256::from(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hashmap_provider_defaults_to_zero() {
        let provider =
            HashMapStorageProvider::new().with_word(U256::from(1u64), B256::repeat_byte(7));

        assert_eq!(provider.sload(U256::from(1u64), None).await, Ok(B256::repeat_byte(7)));
        assert_eq!(provider.sload(U256::from(2u64), None).await, Ok(B256::ZERO));
    }
}
