//! Slot arithmetic and derivation of array and mapping locations.

use alloy_primitives::{U256, hex, keccak256};
use slotscan_layout::{Encoding, TypeDefinition};

/// Errors raised while interpreting user-supplied slot text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("invalid numeric value `{0}`")]
    InvalidNumeric(String),
    #[error("invalid byte string `{0}`")]
    InvalidBytes(String),
}

/// A value that can be interpreted as a storage slot number.
pub trait IntoSlot {
    fn into_slot(self) -> Result<U256, SlotError>;
}

impl IntoSlot for U256 {
    fn into_slot(self) -> Result<U256, SlotError> {
        Ok(self)
    }
}

impl IntoSlot for u64 {
    fn into_slot(self) -> Result<U256, SlotError> {
        Ok(U256::from(self))
    }
}

impl IntoSlot for usize {
    fn into_slot(self) -> Result<U256, SlotError> {
        Ok(U256::from(self))
    }
}

impl IntoSlot for &str {
    fn into_slot(self) -> Result<U256, SlotError> {
        parse_uint(self)
    }
}

impl IntoSlot for &String {
    fn into_slot(self) -> Result<U256, SlotError> {
        parse_uint(self)
    }
}

/// Big-endian bytes of at most 32 bytes.
impl IntoSlot for &[u8] {
    fn into_slot(self) -> Result<U256, SlotError> {
        U256::try_from_be_slice(self)
            .ok_or_else(|| SlotError::InvalidNumeric(hex::encode_prefixed(self)))
    }
}

/// Parses an unsigned integer written as `0x`-prefixed hex or plain decimal.
///
/// Hex digits may have odd length. Values wider than 256 bits are rejected.
pub fn parse_uint(text: &str) -> Result<U256, SlotError> {
    let invalid = || SlotError::InvalidNumeric(text.to_string());
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16u64),
        None => (text, 10u64),
    };
    let well_formed = !digits.is_empty()
        && digits.bytes().all(|b| {
            if radix == 16 {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            }
        });
    if !well_formed {
        return Err(invalid());
    }
    U256::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// Parses a `0x`-prefixed, even-length byte string of at most 32 bytes.
pub fn parse_word_bytes(text: &str) -> Result<U256, SlotError> {
    let invalid = || SlotError::InvalidBytes(text.to_string());
    let digits = text.strip_prefix("0x").ok_or_else(invalid)?;
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    if bytes.len() > 32 {
        return Err(invalid());
    }
    U256::try_from_be_slice(&bytes).ok_or_else(invalid)
}

/// Adds two slot numbers, wrapping modulo 2^256.
pub fn add_slot(a: impl IntoSlot, b: impl IntoSlot) -> Result<U256, SlotError> {
    Ok(a.into_slot()?.wrapping_add(b.into_slot()?))
}

/// Canonical text form of a slot: `0x`-prefixed minimal even-length hex.
///
/// Zero is rendered as `0x00`.
pub fn slot_hex(slot: U256) -> String {
    let bytes = slot.to_be_bytes::<32>();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(31);
    hex::encode_prefixed(&bytes[first..])
}

/// Slot of the first element of a dynamic array, or the data of a long
/// `bytes`/`string`, whose length is stored at `slot`.
///
/// `keccak256(pad32(slot))`
pub fn array_slot(slot: U256) -> U256 {
    U256::from_be_bytes(keccak256(slot.to_be_bytes::<32>()).0)
}

/// Slot of the value stored under `key` in the mapping rooted at `slot`.
///
/// `bytes`-encoded keys (`string`, `bytes`) are hashed as their raw UTF-8.
/// Every other key is parsed as an unsigned integer and left-padded to 32
/// bytes: `keccak256(key ++ pad32(slot))`.
pub fn mapping_slot(slot: U256, key: &str, key_ty: &TypeDefinition) -> Result<U256, SlotError> {
    let mut preimage = match key_ty.encoding {
        Encoding::Bytes => key.as_bytes().to_vec(),
        _ => parse_uint(key)?.to_be_bytes::<32>().to_vec(),
    };
    preimage.extend_from_slice(&slot.to_be_bytes::<32>());
    Ok(U256::from_be_bytes(keccak256(&preimage).0))
}

/// [`array_slot`] over a slot given as a byte string.
pub fn derive_array_slot(slot: &str) -> Result<U256, SlotError> {
    Ok(array_slot(parse_word_bytes(slot)?))
}

/// [`mapping_slot`] over a slot given as a byte string.
pub fn derive_mapping_slot(
    slot: &str,
    key: &str,
    key_ty: &TypeDefinition,
) -> Result<U256, SlotError> {
    mapping_slot(parse_word_bytes(slot)?, key, key_ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, uint};
    use test_case::test_case;

    fn key_type(encoding: Encoding, label: &str) -> TypeDefinition {
        TypeDefinition::new(encoding, label, 32)
    }

    #[test_case("0", U256::ZERO; "zero")]
    #[test_case("19992001", U256::from(19992001u64); "decimal")]
    #[test_case("0xa", U256::from(10u64); "odd length hex")]
    #[test_case("0x00a", U256::from(10u64); "padded hex")]
    #[test_case("0XFF", U256::from(255u64); "upper prefix")]
    fn test_parse_uint(text: &str, expected: U256) {
        assert_eq!(parse_uint(text), Ok(expected));
    }

    #[test_case(""; "empty")]
    #[test_case("0x"; "bare prefix")]
    #[test_case("0xinvalidvalue"; "not hex")]
    #[test_case("12a"; "mixed decimal")]
    #[test_case("-1"; "negative")]
    fn test_parse_uint_rejects(text: &str) {
        assert_eq!(parse_uint(text), Err(SlotError::InvalidNumeric(text.to_string())));
    }

    #[test]
    fn test_parse_uint_rejects_values_wider_than_a_word() {
        let wide = format!("0x1{}", "0".repeat(64));
        assert!(matches!(parse_uint(&wide), Err(SlotError::InvalidNumeric(_))));
    }

    #[test]
    fn test_add_slot() {
        assert_eq!(add_slot(10u64, "0xa"), Ok(U256::from(20u64)));
        assert_eq!(add_slot("0xa", "0x00a"), Ok(U256::from(20u64)));
        assert_eq!(add_slot(U256::MAX, 1u64), Ok(U256::ZERO));
        assert_eq!(
            add_slot("0xinvalidvalue", 1u64),
            Err(SlotError::InvalidNumeric("0xinvalidvalue".to_string()))
        );
    }

    #[test]
    fn test_add_slot_from_bytes() {
        let bytes: &[u8] = &[0x01, 0x00];
        assert_eq!(add_slot(bytes, 1u64), Ok(U256::from(257u64)));

        let wide: &[u8] = &[0xff; 33];
        assert!(matches!(add_slot(wide, 1u64), Err(SlotError::InvalidNumeric(_))));
    }

    #[test_case(U256::ZERO, "0x00"; "zero")]
    #[test_case(U256::from(10u64), "0x0a"; "single byte")]
    #[test_case(U256::from(0x1234u64), "0x1234"; "two bytes")]
    #[test_case(U256::from(0x10000u64), "0x010000"; "padded to even length")]
    fn test_slot_hex(slot: U256, expected: &str) {
        assert_eq!(slot_hex(slot), expected);
    }

    #[test]
    fn test_array_slot() {
        assert_eq!(
            derive_array_slot("0x01"),
            Ok(uint!(
                0xb10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6_U256
            ))
        );
        assert_eq!(derive_array_slot("0x01"), Ok(array_slot(U256::from(1u64))));
    }

    #[test_case("123"; "missing prefix")]
    #[test_case("0xabc"; "odd length")]
    #[test_case("0xzz"; "not hex")]
    fn test_derive_array_slot_rejects(slot: &str) {
        assert_eq!(derive_array_slot(slot), Err(SlotError::InvalidBytes(slot.to_string())));
    }

    #[test]
    fn test_derive_array_slot_rejects_more_than_32_bytes() {
        let slot = format!("0x{}", "01".repeat(33));
        assert!(matches!(derive_array_slot(&slot), Err(SlotError::InvalidBytes(_))));
    }

    #[test]
    fn test_mapping_slot_string_key() {
        let slot = derive_mapping_slot("0x01", "key1", &key_type(Encoding::Bytes, "string"));
        assert_eq!(
            slot,
            Ok(uint!(
                0x3027013d4e34a28d45f0d9df418cfe2d7f5ef1aa6dedce3be41e84553d26df3e_U256
            ))
        );
    }

    #[test]
    fn test_mapping_slot_integer_key() {
        let slot = derive_mapping_slot("0x01", "0x0a", &key_type(Encoding::Inplace, "uint256"));
        assert_eq!(
            slot,
            Ok(uint!(
                0x2a32391a76c35a36352b711f9152c0d0a340cd686850c8ef25fbb11c71b89e7b_U256
            ))
        );
        assert_eq!(
            slot,
            mapping_slot(U256::from(1u64), "10", &key_type(Encoding::Inplace, "uint256"))
        );
    }

    #[test]
    fn test_mapping_slot_address_key() {
        let owner = address!("0x4c5C749f5Fd9215186D07694c059d458333D5cDF");
        let slot = mapping_slot(
            U256::from(4u64),
            &owner.to_string(),
            &key_type(Encoding::Inplace, "address"),
        );
        assert_eq!(
            slot,
            Ok(uint!(
                0xb66fcce8cb49ef7ecb29dc9c101618236577de5803411f41cf1630870d60235e_U256
            ))
        );

        // Manual computation: keccak256(pad32(owner) ++ pad32(4))
        let mut preimage = [0u8; 64];
        preimage[12..32].copy_from_slice(owner.as_slice());
        preimage[63] = 4;
        assert_eq!(slot, Ok(U256::from_be_bytes(keccak256(preimage).0)));
    }

    #[test]
    fn test_mapping_slot_errors() {
        let string_key = key_type(Encoding::Bytes, "string");
        let int_key = key_type(Encoding::Inplace, "uint256");

        assert_eq!(
            derive_mapping_slot("123", "key1", &string_key),
            Err(SlotError::InvalidBytes("123".to_string()))
        );
        assert_eq!(
            derive_mapping_slot("0x01", "key1", &int_key),
            Err(SlotError::InvalidNumeric("key1".to_string()))
        );
    }

    #[test]
    fn test_mapping_slot_is_deterministic_and_key_sensitive() {
        let int_key = key_type(Encoding::Inplace, "uint256");
        let base = U256::from(7u64);

        let first = mapping_slot(base, "1", &int_key);
        assert_eq!(first, mapping_slot(base, "0x01", &int_key));
        assert_ne!(first, mapping_slot(base, "2", &int_key));
        assert_ne!(first, mapping_slot(U256::from(8u64), "1", &int_key));
    }
}
