//! Property-based invariant tests for tree paths and stat envelopes.
//!
//! 1. Text form round-trips through `Display` and `FromStr`.
//! 2. `child` then `parent` returns the original path.
//! 3. `prefix` of a path is a prefix in both segments and ordering.
//! 4. An envelope contains every member of its group.

use nanotree_core::{BRANCHING, MAX_PATH_LEN, Path, Stat};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn path_strategy() -> impl Strategy<Value = Path> {
    prop::collection::vec(0u8..BRANCHING as u8, 0..=MAX_PATH_LEN)
        .prop_map(|segments| Path::new(&segments).expect("segments are in range"))
}

fn stat_strategy() -> impl Strategy<Value = Stat> {
    (-1e6f64..1e6, 1e-3f64..1e3, 1e-3f64..1e3)
        .prop_map(|(mean, below, above)| Stat::new(mean - below, mean, mean + above, 64))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Text round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn display_parse_round_trip(path in path_strategy()) {
        let text = path.to_string();
        let parsed: Path = text.parse().expect("display output parses");
        prop_assert_eq!(parsed, path);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. child/parent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn child_then_parent_is_identity(path in path_strategy(), index in 0usize..BRANCHING) {
        match path.child(index) {
            Ok(child) => {
                prop_assert_eq!(child.len(), path.len() + 1);
                prop_assert_eq!(child.last(), Some(index));
                prop_assert_eq!(child.parent(), Some(path));
            }
            Err(_) => prop_assert_eq!(path.len(), MAX_PATH_LEN),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. prefix
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prefix_orders_before_path(path in path_strategy(), len in 0usize..=MAX_PATH_LEN) {
        let prefix = path.prefix(len);
        prop_assert!(path.segments().starts_with(prefix.segments()));
        prop_assert!(prefix <= path);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. envelope containment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn envelope_contains_members(group in prop::collection::vec(stat_strategy(), 1..64)) {
        let env = Stat::envelope(&group).expect("group is non-empty");
        prop_assert!(env.is_ordered());
        for stat in &group {
            prop_assert!(env.contains(stat), "{:?} escapes {:?}", stat, env);
        }
        prop_assert_eq!(env.count, 64 * group.len() as u64);
    }
}

#[cfg(feature = "serde")]
#[test]
fn serde_round_trip() {
    let path = Path::new(&[1, 2, 3]).unwrap();
    let json = serde_json::to_string(&path).unwrap();
    assert_eq!(json, "[1,2,3]");
    assert_eq!(serde_json::from_str::<Path>(&json).unwrap(), path);
    assert!(serde_json::from_str::<Path>("[1,64]").is_err());

    let stat = Stat::new(0.0, 1.0, 2.0, 64);
    let json = serde_json::to_string(&stat).unwrap();
    assert_eq!(serde_json::from_str::<Stat>(&json).unwrap(), stat);
}
