#![cfg(test)]

// Property tests for RedBlackTreeMap: model equivalence plus the color and
// ordering invariants checked after every operation.

use crate::error::KeyNotFound;
use crate::red_black_tree_map::RedBlackTreeMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16, u32),
    Search(i16),
    Bump(i16),
    Contains(i16),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<i16>(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => any::<i16>().prop_map(Op::Search),
        1 => any::<i16>().prop_map(Op::Bump),
        1 => any::<i16>().prop_map(Op::Contains),
    ]
}

// Narrow key range so overwrites and cache hits are frequent.
fn arb_small_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-20i16..20, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => (-20i16..20).prop_map(Op::Search),
        1 => (-20i16..20).prop_map(Op::Bump),
        1 => (-20i16..20).prop_map(Op::Contains),
    ]
}

fn run_against_model(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut sut: RedBlackTreeMap<i16, u32> = RedBlackTreeMap::new();
    let mut model: BTreeMap<i16, u32> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let fresh = model.insert(k, v).is_none();
                prop_assert_eq!(sut.insert(k, v), fresh);
            }
            Op::Search(k) => match model.get(&k) {
                Some(v) => prop_assert_eq!(sut.search(&k), Ok(v)),
                None => prop_assert_eq!(sut.search(&k), Err(KeyNotFound)),
            },
            Op::Bump(k) => {
                if let Some(mv) = model.get_mut(&k) {
                    *mv = mv.wrapping_add(1);
                    let v = sut.search_mut(&k).expect("present in model");
                    *v = v.wrapping_add(1);
                } else {
                    prop_assert!(sut.search_mut(&k).is_err());
                }
            }
            Op::Contains(k) => prop_assert_eq!(sut.contains(&k), model.contains_key(&k)),
        }

        prop_assert_eq!(sut.len(), model.len());
        sut.assert_invariants();
    }

    let keys: Vec<i16> = model.keys().copied().collect();
    prop_assert_eq!(sut.in_order_keys(), keys);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_btreemap(ops in proptest::collection::vec(arb_op(), 1..200)) {
        run_against_model(ops)?;
    }

    #[test]
    fn prop_matches_btreemap_dense_keys(ops in proptest::collection::vec(arb_small_op(), 1..200)) {
        run_against_model(ops)?;
    }

    // Black height stays logarithmic for any insertion order.
    #[test]
    fn prop_black_height_is_logarithmic(keys in proptest::collection::vec(any::<i32>(), 1..400)) {
        let mut sut = RedBlackTreeMap::new();
        for &k in &keys {
            sut.insert(k, ());
        }
        let bh = sut.assert_invariants();
        let n = sut.len();
        // n >= 2^bh - 1
        prop_assert!((1usize << bh) <= n + 1, "black height {} with {} nodes", bh, n);
    }
}
