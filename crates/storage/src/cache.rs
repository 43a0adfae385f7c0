use std::collections::BTreeMap;

use alloy_primitives::{B256, U256};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::slots::slot_hex;

/// Words fetched during one read, keyed by slot.
///
/// Iteration is in ascending slot order, which is also the order of the
/// canonical hex keys when sorted by length and then lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordCache {
    words: BTreeMap<U256, B256>,
}

impl WordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: &U256) -> Option<B256> {
        self.words.get(slot).copied()
    }

    pub fn insert(&mut self, slot: U256, word: B256) {
        self.words.insert(slot, word);
    }

    pub fn contains(&self, slot: &U256) -> bool {
        self.words.contains_key(slot)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Slots in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = U256> + '_ {
        self.words.keys().copied()
    }
}

impl FromIterator<(U256, B256)> for WordCache {
    fn from_iter<I: IntoIterator<Item = (U256, B256)>>(iter: I) -> Self {
        Self { words: iter.into_iter().collect() }
    }
}

/// Serialized as an object from canonical slot hex to word hex.
impl Serialize for WordCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.words.len()))?;
        for (slot, word) in &self.words {
            map.serialize_entry(&slot_hex(*slot), word)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_ordered_numerically() {
        let cache: WordCache = [0x100u64, 0x02, 0x1f, 0x00]
            .into_iter()
            .map(|slot| (U256::from(slot), B256::ZERO))
            .collect();

        let slots: Vec<_> = cache.slots().map(slot_hex).collect();
        assert_eq!(slots, vec!["0x00", "0x02", "0x1f", "0x0100"]);
    }

    #[test]
    fn test_serializes_canonical_keys() {
        let mut cache = WordCache::new();
        cache.insert(U256::from(1u64), B256::with_last_byte(0x2a));
        cache.insert(U256::ZERO, B256::ZERO);

        let json = serde_json::to_value(&cache).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "0x00": "0x0000000000000000000000000000000000000000000000000000000000000000",
                "0x01": "0x000000000000000000000000000000000000000000000000000000000000002a",
            })
        );
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&U256::ZERO));
    }
}
