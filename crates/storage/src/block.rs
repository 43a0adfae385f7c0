use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::B256;

use crate::slots::{SlotError, parse_uint};

/// Normalizes a user-supplied block reference.
///
/// Accepts the tags `earliest`, `latest`, `pending`, `safe` and `finalized`,
/// a 32-byte `0x` block hash, or a block number in decimal or `0x` hex. An
/// absent or empty reference means the provider's default block.
pub fn normalize_block_reference(reference: Option<&str>) -> Result<Option<BlockId>, SlotError> {
    let Some(reference) = reference.filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    let tag = match reference {
        "earliest" => BlockNumberOrTag::Earliest,
        "latest" => BlockNumberOrTag::Latest,
        "pending" => BlockNumberOrTag::Pending,
        "safe" => BlockNumberOrTag::Safe,
        "finalized" => BlockNumberOrTag::Finalized,
        _ => {
            if let Some(hash) = block_hash(reference) {
                return Ok(Some(BlockId::from(hash)));
            }
            let number = parse_uint(reference)?;
            let number = u64::try_from(number)
                .map_err(|_| SlotError::InvalidNumeric(reference.to_string()))?;
            BlockNumberOrTag::Number(number)
        }
    };
    Ok(Some(BlockId::from(tag)))
}

fn block_hash(reference: &str) -> Option<B256> {
    if reference.len() != 66 || !reference.starts_with("0x") {
        return None;
    }
    reference.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use test_case::test_case;

    #[test_case("earliest", BlockNumberOrTag::Earliest; "earliest")]
    #[test_case("latest", BlockNumberOrTag::Latest; "latest")]
    #[test_case("pending", BlockNumberOrTag::Pending; "pending")]
    #[test_case("safe", BlockNumberOrTag::Safe; "safe")]
    #[test_case("finalized", BlockNumberOrTag::Finalized; "finalized")]
    #[test_case("10", BlockNumberOrTag::Number(10); "decimal")]
    #[test_case("0xff", BlockNumberOrTag::Number(255); "hex")]
    fn test_block_tags_and_numbers(reference: &str, expected: BlockNumberOrTag) {
        assert_eq!(
            normalize_block_reference(Some(reference)),
            Ok(Some(BlockId::from(expected)))
        );
    }

    #[test]
    fn test_absent_reference() {
        assert_eq!(normalize_block_reference(None), Ok(None));
        assert_eq!(normalize_block_reference(Some("")), Ok(None));
    }

    #[test]
    fn test_block_hash() {
        let hash = "0x7ae7a1d5c1b1b23ee3cdb0a3b5a3e6ac4e1e7b4f3a0c23bb4c4c8d7a6e5f4d3c";
        assert_eq!(
            normalize_block_reference(Some(hash)),
            Ok(Some(BlockId::from(b256!(
                "0x7ae7a1d5c1b1b23ee3cdb0a3b5a3e6ac4e1e7b4f3a0c23bb4c4c8d7a6e5f4d3c"
            ))))
        );
    }

    #[test_case("0xinvalidvalue"; "not hex")]
    #[test_case("head"; "unknown tag")]
    #[test_case("0x10000000000000000"; "beyond u64")]
    fn test_invalid_reference(reference: &str) {
        assert_eq!(
            normalize_block_reference(Some(reference)),
            Err(SlotError::InvalidNumeric(reference.to_string()))
        );
    }
}
