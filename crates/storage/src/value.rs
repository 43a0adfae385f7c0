//! Decoded storage values.

use std::fmt;

use alloy_primitives::{Address, Bytes, I256, U256, hex};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A decoded storage value.
///
/// Serializes to JSON with integers as decimal strings, addresses
/// checksummed, byte strings as `0x` hex and placeholders as their text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageValue {
    Bool(bool),
    Uint(U256),
    Int(I256),
    Address(Address),
    /// `bytesN`, exactly N bytes.
    FixedBytes(Bytes),
    /// Dynamic `bytes`.
    Bytes(Bytes),
    String(String),
    /// Rendered text for contracts, enums and function pointers.
    Label(String),
    Array(Vec<StorageValue>),
    Struct(IndexMap<String, StorageValue>),
    /// Mapping entries keyed by the probe key literal.
    Mapping(IndexMap<String, StorageValue>),
    /// Undecoded word data.
    Raw(Bytes),
    Placeholder(Placeholder),
}

impl StorageValue {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Looks up a struct member or mapping entry.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Struct(entries) | Self::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl From<Placeholder> for StorageValue {
    fn from(placeholder: Placeholder) -> Self {
        Self::Placeholder(placeholder)
    }
}

/// Stand-in for a value that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// The variable's type id is missing from the layout.
    Unknown,
    /// A mapping with no usable probe keys, carrying the mapping's type label.
    UnresolvedMapping(String),
    /// A mapping entry whose key or value type is missing from the layout.
    UnknownType,
    /// A fixed array whose length could not be read from its label.
    FixedArray(Bytes),
    /// A `dynamic_array` without an element type.
    DynamicArray,
    /// A dynamic value whose declared length exceeds the read limit.
    Oversized(U256),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("<unknown>"),
            Self::UnresolvedMapping(label) => f.write_str(label),
            Self::UnknownType => f.write_str("unknown type"),
            Self::FixedArray(data) => write!(f, "fixed array: {}", hex::encode_prefixed(data)),
            Self::DynamicArray => f.write_str("dynamic array"),
            Self::Oversized(len) => write!(f, "<oversized: {len}>"),
        }
    }
}

impl Serialize for StorageValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Uint(value) => serializer.collect_str(value),
            Self::Int(value) => serializer.collect_str(value),
            Self::Address(value) => serializer.serialize_str(&value.to_checksum(None)),
            Self::FixedBytes(data) | Self::Bytes(data) | Self::Raw(data) => {
                serializer.serialize_str(&hex::encode_prefixed(data))
            }
            Self::String(text) | Self::Label(text) => serializer.serialize_str(text),
            Self::Array(elements) => serializer.collect_seq(elements),
            Self::Struct(entries) | Self::Mapping(entries) => serializer.collect_map(entries),
            Self::Placeholder(placeholder) => serializer.collect_str(placeholder),
        }
    }
}
