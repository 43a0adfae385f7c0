//! Interpretation of compiler type labels.
//!
//! Labels drive scalar conversion: `contract Foo` is stored as an address,
//! `enum Foo` and function pointers as unsigned integers, and `bytesN` is the
//! only scalar family that is left-aligned within its bytes.

/// Scalar interpretation of an `inplace` type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive<'a> {
    Bool,
    /// `address` and `address payable`.
    Address,
    /// `uintN`, with the bit width.
    Uint(usize),
    /// `intN`, with the bit width.
    Int(usize),
    /// `bytesN`, with the byte width.
    FixedBytes(usize),
    /// `contract Name`, stored as an address.
    Contract(&'a str),
    /// `enum Name`, stored as its ordinal.
    Enum(&'a str),
    /// Function pointer, stored as an integer.
    Function,
    /// Anything else, e.g. user-defined value types.
    Unsupported,
}

impl<'a> Primitive<'a> {
    pub fn from_label(label: &'a str) -> Self {
        if let Some(name) = label.strip_prefix("contract") {
            return Self::Contract(name.trim_start());
        }
        if let Some(name) = label.strip_prefix("enum") {
            return Self::Enum(name.trim_start());
        }
        if label.starts_with("function") {
            return Self::Function;
        }
        if label == "bool" {
            return Self::Bool;
        }
        if label == "address" || label == "address payable" {
            return Self::Address;
        }
        if let Some(bits) = label.strip_prefix("uint") {
            return int_width(bits).map_or(Self::Unsupported, Self::Uint);
        }
        if let Some(bits) = label.strip_prefix("int") {
            return int_width(bits).map_or(Self::Unsupported, Self::Int);
        }
        if let Some(width) = label.strip_prefix("bytes") {
            return match width.parse::<usize>() {
                Ok(n) if (1..=32).contains(&n) && is_decimal(width) => Self::FixedBytes(n),
                _ => Self::Unsupported,
            };
        }
        Self::Unsupported
    }
}

/// Whether a value of this label is padded on the right when widened to a word.
///
/// `bytesN` occupies the high-order end of its value; every other scalar sits
/// at the low-order end and is padded on the left.
pub fn pads_right(label: &str) -> bool {
    label.starts_with("bytes")
}

/// Whether a `bytes`-encoded value should be decoded as UTF-8 text.
pub fn is_string(label: &str) -> bool {
    label.starts_with("string")
}

/// Length of a fixed-size array from the trailing `[N]` of its label.
///
/// `uint64[3]` yields 3 and `uint8[][2]` yields 2; `uint8[]` yields `None`.
pub fn fixed_array_len(label: &str) -> Option<usize> {
    let (_, len) = label.strip_suffix(']')?.rsplit_once('[')?;
    if !is_decimal(len) {
        return None;
    }
    len.parse().ok()
}

fn int_width(bits: &str) -> Option<usize> {
    if bits.is_empty() {
        return Some(256);
    }
    if !is_decimal(bits) {
        return None;
    }
    bits.parse()
        .ok()
        .filter(|n| (8..=256).contains(n) && n % 8 == 0)
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("bool", Primitive::Bool; "bool")]
    #[test_case("address", Primitive::Address; "address")]
    #[test_case("address payable", Primitive::Address; "address payable")]
    #[test_case("uint8", Primitive::Uint(8); "uint8")]
    #[test_case("uint24", Primitive::Uint(24); "uint24")]
    #[test_case("uint", Primitive::Uint(256); "bare uint")]
    #[test_case("int64", Primitive::Int(64); "int64")]
    #[test_case("bytes1", Primitive::FixedBytes(1); "bytes1")]
    #[test_case("bytes32", Primitive::FixedBytes(32); "bytes32")]
    #[test_case("contract IERC20", Primitive::Contract("IERC20"); "contract")]
    #[test_case("enum Vault.Status", Primitive::Enum("Vault.Status"); "enum")]
    #[test_case("function (uint256) external returns (bool)", Primitive::Function; "function")]
    #[test_case("uint7", Primitive::Unsupported; "odd width")]
    #[test_case("bytes33", Primitive::Unsupported; "oversized bytes")]
    #[test_case("bytes", Primitive::Unsupported; "dynamic bytes")]
    #[test_case("Price", Primitive::Unsupported; "user defined value type")]
    fn test_primitive_from_label(label: &str, expected: Primitive<'_>) {
        assert_eq!(Primitive::from_label(label), expected);
    }

    #[test_case("uint64[3]", Some(3); "simple")]
    #[test_case("struct Pair[2]", Some(2); "struct elements")]
    #[test_case("uint8[][12]", Some(12); "nested dynamic")]
    #[test_case("uint8[]", None; "dynamic")]
    #[test_case("uint8[0x2]", None; "hex length")]
    #[test_case("uint8", None; "not an array")]
    fn test_fixed_array_len(label: &str, expected: Option<usize>) {
        assert_eq!(fixed_array_len(label), expected);
    }

    #[test]
    fn test_padding_direction() {
        assert!(pads_right("bytes1"));
        assert!(pads_right("bytes32"));
        assert!(!pads_right("uint8"));
        assert!(!pads_right("bool"));
        assert!(!pads_right("address"));
    }

    #[test]
    fn test_is_string() {
        assert!(is_string("string"));
        assert!(!is_string("bytes"));
    }
}
