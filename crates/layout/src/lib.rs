//! Solidity storage layout model.
//!
//! Mirrors the `storageLayout` object the compiler emits for every contract: an
//! ordered list of top-level variables plus a table of type definitions keyed by
//! type identifier (`t_uint256`, `t_mapping(t_address,t_uint256)`, ...).
//!
//! Each [`TypeDefinition`] is classified once into a [`TypeKind`] so decoders can
//! dispatch on a single discriminant instead of probing optional fields.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod label;
pub use label::{Primitive, fixed_array_len};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Storage layout for a contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageLayout {
    pub storage: Vec<StorageVariable>,
    /// The compiler emits `null` for contracts without state variables.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub types: HashMap<String, TypeDefinition>,
}

impl StorageLayout {
    /// Looks up a type by identifier and classifies it.
    ///
    /// Returns `None` if the identifier is not part of the layout.
    pub fn resolve(&self, id: &str) -> Option<ResolvedType<'_>> {
        let definition = self.types.get(id)?;
        Some(ResolvedType { definition, kind: definition.kind() })
    }
}

/// A declared field: either a top-level state variable or a struct member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageVariable {
    /// Declaring contract, e.g. `src/Token.sol:Token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// Variable name
    pub label: String,
    /// Byte offset within the storage slot, counted from the low-order end.
    pub offset: usize,
    /// Storage slot number relative to the enclosing scope, as a decimal string.
    pub slot: String,
    /// Type identifier, a key into [`StorageLayout::types`].
    #[serde(rename = "type")]
    pub ty: String,
}

impl StorageVariable {
    pub fn new(
        label: impl Into<String>,
        slot: impl Into<String>,
        offset: usize,
        ty: impl Into<String>,
    ) -> Self {
        Self {
            contract: None,
            label: label.into(),
            offset,
            slot: slot.into(),
            ty: ty.into(),
        }
    }
}

/// How the compiler stores values of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Stored directly at the declared slot and offset.
    Inplace,
    /// Values live at `keccak256(key . slot)`.
    Mapping,
    /// Length at the declared slot, elements from `keccak256(slot)`.
    DynamicArray,
    /// `bytes` and `string`: inline when short, from `keccak256(slot)` when long.
    Bytes,
}

/// Represents a type definition from the compiler's layout output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeDefinition {
    pub encoding: Encoding,

    /// Human-readable label, e.g. `uint24[]` or `mapping(address => string)`.
    pub label: String,

    /// Number of bytes this type occupies, as a decimal string.
    #[serde(rename = "numberOfBytes")]
    pub number_of_bytes: String,

    /// Element type for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// Key type for mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Value type for mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Struct members, with slots relative to the struct's first slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<StorageVariable>>,
}

impl TypeDefinition {
    pub fn new(encoding: Encoding, label: impl Into<String>, number_of_bytes: usize) -> Self {
        Self {
            encoding,
            label: label.into(),
            number_of_bytes: number_of_bytes.to_string(),
            base: None,
            key: None,
            value: None,
            members: None,
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_key_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self.value = Some(value.into());
        self
    }

    pub fn with_members(mut self, members: Vec<StorageVariable>) -> Self {
        self.members = Some(members);
        self
    }

    /// Size in bytes of a single value of this type.
    pub fn size(&self) -> Result<usize, LayoutError> {
        self.number_of_bytes
            .parse()
            .map_err(|_| LayoutError::InvalidSize {
                label: self.label.clone(),
                value: self.number_of_bytes.clone(),
            })
    }

    /// Classifies the type by shape.
    ///
    /// Arrays are recognised by `base` and structs by `members` before the
    /// encoding is consulted, so `DynamicArray` is only returned for a
    /// `dynamic_array` type that lacks an element type.
    pub fn kind(&self) -> TypeKind<'_> {
        if let Some(base) = &self.base {
            return TypeKind::Array {
                base,
                dynamic: self.encoding == Encoding::DynamicArray,
            };
        }
        if let Some(members) = &self.members {
            return TypeKind::Struct { members };
        }
        match self.encoding {
            Encoding::Inplace => TypeKind::Inplace,
            Encoding::Bytes => TypeKind::Bytes,
            Encoding::Mapping => TypeKind::Mapping {
                key: self.key.as_deref(),
                value: self.value.as_deref(),
            },
            Encoding::DynamicArray => TypeKind::DynamicArray,
        }
    }
}

/// Shape of a type, decided once per lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind<'a> {
    /// Scalar packed into its slot.
    Inplace,
    /// Variable-length `bytes` or `string`.
    Bytes,
    Mapping {
        key: Option<&'a str>,
        value: Option<&'a str>,
    },
    /// Fixed-size (`dynamic == false`) or dynamic array of `base` elements.
    Array { base: &'a str, dynamic: bool },
    Struct { members: &'a [StorageVariable] },
    /// A `dynamic_array` without an element type.
    DynamicArray,
}

/// A type definition together with its shape.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedType<'a> {
    pub definition: &'a TypeDefinition,
    pub kind: TypeKind<'a>,
}

impl<'a> ResolvedType<'a> {
    pub fn label(&self) -> &'a str {
        &self.definition.label
    }

    pub fn size(&self) -> Result<usize, LayoutError> {
        self.definition.size()
    }
}

/// Errors raised while loading or interpreting a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed reading layout file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing storage layout JSON")]
    Json(#[from] serde_json::Error),
    #[error("compiler output contains no contracts")]
    NoContracts,
    #[error("contract `{0}` not found in compiler output")]
    ContractNotFound(String),
    #[error("type `{label}` has invalid numberOfBytes `{value}`")]
    InvalidSize { label: String, value: String },
}

/// Represents the compiler's `--combined-json storage-layout` output.
#[derive(Debug, Deserialize)]
struct SolcOutput {
    contracts: IndexMap<String, ContractOutput>,
}

#[derive(Debug, Deserialize)]
struct ContractOutput {
    #[serde(rename = "storage-layout")]
    storage_layout: serde_json::Value,
}

/// Loads a storage layout file from disk.
///
/// See [`parse_layout`] for the accepted formats.
pub fn load_layout(path: &Path, contract: Option<&str>) -> Result<StorageLayout, LayoutError> {
    let content = std::fs::read_to_string(path).map_err(|source| LayoutError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layout(&content, contract)
}

/// Parses either a bare layout object or the compiler's combined-json output.
///
/// For combined output, `contract` selects an entry by its full key
/// (`src/Token.sol:Token`) or by the name after the last `:`. Without a name the
/// first contract in file order is used. Older compilers embed each layout as a
/// JSON string; both forms are accepted.
pub fn parse_layout(json: &str, contract: Option<&str>) -> Result<StorageLayout, LayoutError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("contracts").is_none() {
        return Ok(serde_json::from_value(value)?);
    }

    // Parsed from the text again: `Value` objects do not keep key order.
    let output: SolcOutput = serde_json::from_str(json)?;
    let entry = match contract {
        Some(name) => output
            .contracts
            .into_iter()
            .find(|(key, _)| key == name || key.rsplit(':').next() == Some(name))
            .ok_or_else(|| LayoutError::ContractNotFound(name.to_string()))?,
        None => output
            .contracts
            .into_iter()
            .next()
            .ok_or(LayoutError::NoContracts)?,
    };

    match entry.1.storage_layout {
        serde_json::Value::String(embedded) => Ok(serde_json::from_str(&embedded)?),
        layout => Ok(serde_json::from_value(layout)?),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, TypeDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}
