//! Matching of mapping probes against value paths.
//!
//! A probe such as `balances[0xabc]` or `nested[1][2]` names a mapping by
//! its path and supplies the key in brackets. Nested mappings are probed
//! with one bracketed key per level.

/// Key literals of the probes that address the mapping at `path`, in probe
/// order.
pub(super) fn matching_keys<'k>(probes: &'k [String], path: &str) -> Vec<&'k str> {
    probes.iter().filter_map(|probe| match_probe(probe, path)).collect()
}

/// Returns the key of `probe` if it starts with exactly `path[`.
fn match_probe<'k>(probe: &'k str, path: &str) -> Option<&'k str> {
    let rest = probe.strip_prefix(path)?.strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("v6[0x01]", "v6", Some("0x01"); "direct")]
    #[test_case("v6[key]", "v6", Some("key"); "string key")]
    #[test_case("v6[]", "v6", Some(""); "empty key")]
    #[test_case("v6[1][2]", "v6", Some("1"); "outer level")]
    #[test_case("v6[1][2]", "v6[1]", Some("2"); "inner level")]
    #[test_case("s.m[7]", "s.m", Some("7"); "struct member")]
    #[test_case("v66[1]", "v6", None; "longer name")]
    #[test_case("xv6[1]", "v6", None; "anchored at start")]
    #[test_case("v6", "v6", None; "no key")]
    #[test_case("v6[1", "v6", None; "unterminated")]
    fn test_match_probe(probe: &str, path: &str, expected: Option<&str>) {
        assert_eq!(match_probe(probe, path), expected);
    }

    #[test]
    fn test_matching_keys_preserves_probe_order() {
        let probes = vec![
            "balances[0x02]".to_string(),
            "owners[0x01]".to_string(),
            "balances[0x01]".to_string(),
        ];
        assert_eq!(matching_keys(&probes, "balances"), vec!["0x02", "0x01"]);
        assert!(matching_keys(&probes, "missing").is_empty());
    }
}
