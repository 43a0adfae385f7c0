//! Decoding of EVM contract storage against a compiler storage layout.
//!
//! Given a [`StorageLayout`](slotscan_layout::StorageLayout) and a
//! [`StorageProvider`], [`read_storage`] fetches the words behind every
//! variable and renders them as [`StorageValue`]s. Mapping entries are only
//! read for the keys supplied as probes.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod block;
pub mod cache;
pub mod error;
pub mod packing;
pub mod provider;
pub mod reader;
pub mod slots;
pub mod value;

pub use block::normalize_block_reference;
pub use cache::WordCache;
pub use error::{ReadError, Result};
#[cfg(feature = "rpc")]
pub use provider::RpcStorageProvider;
pub use provider::{HashMapStorageProvider, StorageProvider};
pub use reader::{ReadOptions, StorageReader, StorageSnapshot, read_storage};
pub use slots::{
    IntoSlot, SlotError, add_slot, array_slot, derive_array_slot, derive_mapping_slot,
    mapping_slot, slot_hex,
};
pub use value::{Placeholder, StorageValue};
