use alloy_primitives::{Address, Bytes, I256, U256, hex};
use slotscan_layout::{Primitive, label::pads_right};

use crate::{packing::widen, value::StorageValue};

/// Decodes an `inplace` scalar from its packed bytes.
///
/// Values wider than a word and labels without a scalar interpretation are
/// returned raw.
pub(super) fn decode_inplace(data: &[u8], label: &str) -> StorageValue {
    let Some(word) = widen(data, pads_right(label)) else {
        return StorageValue::Raw(Bytes::copy_from_slice(data));
    };
    let value = U256::from_be_bytes(word.0);

    match Primitive::from_label(label) {
        Primitive::Bool => StorageValue::Bool(!value.is_zero()),
        Primitive::Address => StorageValue::Address(Address::from_word(word)),
        Primitive::Uint(_) => StorageValue::Uint(value),
        Primitive::Int(bits) => StorageValue::Int(sign_extend(value, bits)),
        Primitive::FixedBytes(len) => StorageValue::FixedBytes(Bytes::copy_from_slice(&word[..len])),
        Primitive::Contract(name) => {
            StorageValue::Label(format!("{name}({})", Address::from_word(word).to_checksum(None)))
        }
        Primitive::Enum(name) => StorageValue::Label(format!("{name}[{value}]")),
        Primitive::Function => StorageValue::Label(format!("{label} -> 0x{}", minimal_hex(value))),
        Primitive::Unsupported => StorageValue::Raw(Bytes::copy_from_slice(word.as_slice())),
    }
}

/// Interprets the low `bits` of `value` as a two's complement integer.
fn sign_extend(value: U256, bits: usize) -> I256 {
    let shift = 256 - bits;
    I256::from_raw(value << shift).asr(shift)
}

/// Lowercase hex without leading zeros; zero is `0`.
fn minimal_hex(value: U256) -> String {
    let digits = hex::encode(value.to_be_bytes::<32>());
    match digits.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}
