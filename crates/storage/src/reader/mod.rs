//! Recursive decoding of contract storage.
//!
//! A [`StorageReader`] walks a list of top-level variables, fetching each
//! slot it needs at most once and decoding the fetched bytes according to the
//! variable's type. Structs, arrays and mappings recurse into their members,
//! elements and probed entries.

mod probe;
mod scalar;

use alloy_eips::BlockId;
use alloy_primitives::{B256, Bytes, U256};
use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::Serialize;
use slotscan_layout::{
    ResolvedType, StorageLayout, StorageVariable, TypeKind, fixed_array_len, label,
};
use tracing::{debug, instrument, trace};

use crate::{
    cache::WordCache,
    error::{ReadError, Result},
    packing::{ElementCursor, WORD_SIZE, extract_window, slots_spanned},
    provider::StorageProvider,
    slots::{add_slot, array_slot, mapping_slot, slot_hex},
    value::{Placeholder, StorageValue},
};

/// Result of a storage read: every fetched word plus the decoded values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageSnapshot {
    pub words: WordCache,
    pub values: IndexMap<String, StorageValue>,
}

/// Options for [`read_storage`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Probe paths such as `balances[0xabc..]` or `allowances[0x1][0x2]`.
    pub map_keys: Vec<String>,
    /// Restricts the read to top-level variables with these labels.
    pub vars: Option<Vec<String>>,
    pub block: Option<BlockId>,
    /// Optional cap on dynamic array element counts and long byte-string
    /// lengths. Unbounded when `None`.
    pub max_dynamic_len: Option<usize>,
}

/// Reads and decodes the layout's variables, or those named in
/// [`ReadOptions::vars`], in layout order.
pub async fn read_storage<P: StorageProvider>(
    provider: &P,
    layout: &StorageLayout,
    options: &ReadOptions,
) -> Result<StorageSnapshot> {
    let variables: Vec<StorageVariable> = match &options.vars {
        Some(vars) => layout
            .storage
            .iter()
            .filter(|variable| vars.contains(&variable.label))
            .cloned()
            .collect(),
        None => layout.storage.clone(),
    };

    StorageReader::new(provider, layout)
        .with_map_keys(&options.map_keys)
        .at_block(options.block)
        .with_max_dynamic_len(options.max_dynamic_len)
        .read(&variables)
        .await
}

/// A single decode session over one contract's storage.
///
/// The reader owns the word cache for the session; [`StorageReader::read`]
/// consumes it and hands the cache back in the snapshot.
#[derive(Debug)]
pub struct StorageReader<'a, P> {
    provider: &'a P,
    layout: &'a StorageLayout,
    map_keys: &'a [String],
    block: Option<BlockId>,
    max_dynamic_len: Option<usize>,
    words: WordCache,
}

impl<'a, P: StorageProvider> StorageReader<'a, P> {
    pub fn new(provider: &'a P, layout: &'a StorageLayout) -> Self {
        Self {
            provider,
            layout,
            map_keys: &[],
            block: None,
            max_dynamic_len: None,
            words: WordCache::new(),
        }
    }

    /// Probe paths used to decide which mapping entries to read.
    pub fn with_map_keys(mut self, map_keys: &'a [String]) -> Self {
        self.map_keys = map_keys;
        self
    }

    pub fn at_block(mut self, block: Option<BlockId>) -> Self {
        self.block = block;
        self
    }

    /// Values longer than `max_dynamic_len` decode to an `<oversized: N>`
    /// placeholder instead of being fetched.
    pub fn with_max_dynamic_len(mut self, max_dynamic_len: Option<usize>) -> Self {
        self.max_dynamic_len = max_dynamic_len;
        self
    }

    /// Decodes `variables`, rooted at slot zero.
    #[instrument(skip_all, fields(variables = variables.len(), block = ?self.block))]
    pub async fn read(mut self, variables: &[StorageVariable]) -> Result<StorageSnapshot> {
        let values = self.decode_members("", variables, U256::ZERO).await?;
        debug!(words = self.words.len(), "storage read complete");
        Ok(StorageSnapshot { words: self.words, values })
    }

    /// Decodes a list of variables whose slots are relative to `base`.
    ///
    /// `prefix` is the path of the enclosing value, empty at the top level.
    fn decode_members<'s>(
        &'s mut self,
        prefix: &'s str,
        variables: &'s [StorageVariable],
        base: U256,
    ) -> BoxFuture<'s, Result<IndexMap<String, StorageValue>>> {
        async move {
            let layout = self.layout;
            let mut values = IndexMap::with_capacity(variables.len());

            for variable in variables {
                let Some(ty) = layout.resolve(&variable.ty) else {
                    debug!(label = %variable.label, ty = %variable.ty, "variable has unknown type");
                    values.insert(variable.label.clone(), Placeholder::Unknown.into());
                    continue;
                };

                let slot = add_slot(base, &variable.slot)?;
                let data = self.load(slot, variable.offset, ty.size()?).await?;
                let path = if prefix.is_empty() {
                    variable.label.clone()
                } else {
                    format!("{prefix}.{}", variable.label)
                };
                let value = self.decode_value(path, data, ty, slot).await?;
                values.insert(variable.label.clone(), value);
            }

            Ok(values)
        }
        .boxed()
    }

    /// Decodes the value of type `ty` stored at `slot`, whose leading bytes
    /// have already been loaded into `data`.
    fn decode_value(
        &mut self,
        path: String,
        data: Bytes,
        ty: ResolvedType<'a>,
        slot: U256,
    ) -> BoxFuture<'_, Result<StorageValue>> {
        async move {
            match ty.kind {
                TypeKind::Inplace => Ok(scalar::decode_inplace(&data, ty.label())),
                TypeKind::Bytes => self.decode_bytes(&path, &data, ty, slot).await,
                TypeKind::Struct { members } => {
                    Ok(StorageValue::Struct(self.decode_members(&path, members, slot).await?))
                }
                TypeKind::Array { base, dynamic } => {
                    self.decode_array(&path, &data, ty, base, dynamic, slot).await
                }
                TypeKind::Mapping { key, value } => {
                    self.decode_mapping(&path, ty, key, value, slot).await
                }
                TypeKind::DynamicArray => {
                    debug!(%path, "dynamic array without element type");
                    Ok(Placeholder::DynamicArray.into())
                }
            }
        }
        .boxed()
    }

    async fn decode_array(
        &mut self,
        path: &str,
        data: &[u8],
        ty: ResolvedType<'a>,
        base: &'a str,
        dynamic: bool,
        slot: U256,
    ) -> Result<StorageValue> {
        let layout = self.layout;
        let element = layout.resolve(base);
        let element_bytes = match element {
            Some(element) => element.size()?,
            None => {
                debug!(%path, base, "array element type is unknown, reading raw words");
                WORD_SIZE
            }
        };

        let (start, len) = if dynamic {
            let count = U256::try_from_be_slice(data).unwrap_or(U256::MAX);
            match usize::try_from(count).ok().filter(|len| self.within_limit(*len)) {
                Some(len) => (array_slot(slot), len),
                None => {
                    debug!(%path, %count, "dynamic array length exceeds the read limit");
                    return Ok(Placeholder::Oversized(count).into());
                }
            }
        } else {
            match fixed_array_len(ty.label()).filter(|len| *len > 0) {
                Some(len) => (slot, len),
                None => {
                    debug!(%path, label = ty.label(), "cannot read fixed array length");
                    return Ok(Placeholder::FixedArray(Bytes::copy_from_slice(data)).into());
                }
            }
        };

        let mut elements = Vec::new();
        for (index, (delta, offset)) in ElementCursor::new(element_bytes).take(len).enumerate() {
            let element_slot = start.wrapping_add(U256::from(delta));
            let element_data = self.load(element_slot, offset, element_bytes).await?;
            let value = match element {
                Some(element) => {
                    let element_path = format!("{path}[{index}]");
                    self.decode_value(element_path, element_data, element, element_slot).await?
                }
                None => StorageValue::Raw(element_data),
            };
            elements.push(value);
        }

        Ok(StorageValue::Array(elements))
    }

    async fn decode_mapping(
        &mut self,
        path: &str,
        ty: ResolvedType<'a>,
        key: Option<&'a str>,
        value: Option<&'a str>,
        slot: U256,
    ) -> Result<StorageValue> {
        let keys = probe::matching_keys(self.map_keys, path);
        if keys.is_empty() {
            return Ok(Placeholder::UnresolvedMapping(ty.label().to_string()).into());
        }

        let layout = self.layout;
        let key_ty = key.and_then(|id| layout.resolve(id));
        let value_ty = value.and_then(|id| layout.resolve(id));

        let mut entries = IndexMap::new();
        for key in keys {
            if entries.contains_key(key) {
                continue;
            }
            let (Some(key_ty), Some(value_ty)) = (key_ty, value_ty) else {
                debug!(%path, key, "mapping key or value type is unknown");
                entries.insert(key.to_string(), Placeholder::UnknownType.into());
                continue;
            };

            let entry_slot = match mapping_slot(slot, key, key_ty.definition) {
                Ok(entry_slot) => entry_slot,
                Err(err) => {
                    debug!(%path, key, %err, "skipping probe key that does not fit the key type");
                    continue;
                }
            };

            let value_bytes = value_ty.size()?;
            let mut data = self.load(entry_slot, 0, value_bytes).await?;
            data.truncate(value_bytes);
            let entry_path = format!("{path}[{key}]");
            let value = self.decode_value(entry_path, data, value_ty, entry_slot).await?;
            entries.insert(key.to_string(), value);
        }

        if entries.is_empty() {
            return Ok(Placeholder::UnresolvedMapping(ty.label().to_string()).into());
        }
        Ok(StorageValue::Mapping(entries))
    }

    /// Decodes `bytes` and `string` values.
    ///
    /// The lowest byte of the word at `slot` tells the two encodings apart.
    /// Even: the data lives in the same word, left-aligned, with length
    /// `byte / 2`. Odd: the word holds `2 * length + 1` and the data starts at
    /// [`array_slot`]`(slot)`.
    ///
    /// The long length is taken from the whole word, not only its lowest
    /// byte, so payloads longer than 63 bytes decode in full. A low-byte
    /// reading would truncate them.
    async fn decode_bytes(
        &mut self,
        path: &str,
        data: &[u8],
        ty: ResolvedType<'a>,
        slot: U256,
    ) -> Result<StorageValue> {
        let marker = data.last().copied().unwrap_or_default();

        let content = if marker % 2 == 0 {
            let length = usize::from(marker / 2);
            if length >= data.len() {
                return Err(ReadError::MalformedBytes { path: path.to_string(), length });
            }
            Bytes::copy_from_slice(&data[..length])
        } else {
            let word = U256::try_from_be_slice(data).unwrap_or(U256::MAX);
            let length = word >> 1;
            let Some(length) = usize::try_from(length).ok().filter(|len| self.within_limit(*len))
            else {
                debug!(%path, %length, "byte string length exceeds the read limit");
                return Ok(Placeholder::Oversized(length).into());
            };
            let words = self.load(array_slot(slot), 0, slots_spanned(length) * WORD_SIZE).await?;
            Bytes::copy_from_slice(&words[..length])
        };

        if !label::is_string(ty.label()) {
            return Ok(StorageValue::Bytes(content));
        }
        String::from_utf8(content.to_vec())
            .map(StorageValue::String)
            .map_err(|source| ReadError::InvalidEncoding { path: path.to_string(), source })
    }

    fn within_limit(&self, len: usize) -> bool {
        self.max_dynamic_len.is_none_or(|max| len <= max)
    }

    /// Loads the `bytes`-wide value at `offset` of `slot`.
    ///
    /// Values wider than a word are read from consecutive slots and returned
    /// whole. A full-word value is returned as the word itself.
    async fn load(&mut self, slot: U256, offset: usize, bytes: usize) -> Result<Bytes> {
        let count = slots_spanned(bytes);
        let mut words = Vec::with_capacity(count);
        for index in 0..count {
            words.push(self.fetch(slot.wrapping_add(U256::from(index))).await?);
        }

        match words.as_slice() {
            [word] if bytes == WORD_SIZE => Ok(Bytes::copy_from_slice(word.as_slice())),
            [word] => Ok(Bytes::copy_from_slice(extract_window(word, offset, bytes)?)),
            words => Ok(words.iter().flat_map(|word| word.0).collect()),
        }
    }

    /// Returns the word at `slot`, asking the provider only on first use.
    async fn fetch(&mut self, slot: U256) -> Result<B256> {
        if let Some(word) = self.words.get(&slot) {
            return Ok(word);
        }

        trace!(slot = %slot_hex(slot), "fetching storage word");
        let word = self.provider.sload(slot, self.block).await.map_err(|err| ReadError::Provider {
            slot: slot_hex(slot),
            source: Box::new(err),
        })?;
        self.words.insert(slot, word);
        Ok(word)
    }
}
