#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so growth and
// chain internals stay reachable without feature gates.

use crate::chained_hash_map::tests::ConstBuildHasher;
use crate::chained_hash_map::ChainedHashMap;
use crate::config::HashMapConfig;
use crate::error::KeyNotFound;
use core::hash::BuildHasher;
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations: indices shrink toward earlier keys and the op
// list shrinks in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Search(usize),
    Append(usize, i32),
    Contains(String),
}

fn arb_config() -> impl Strategy<Value = HashMapConfig> {
    (1usize..=16, 0.25f64..4.0, 1.1f64..4.0).prop_map(|(b, lf, g)| HashMapConfig::new(b, lf, g))
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            1 => idx.clone().prop_map(Op::Search),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Append(i, d)),
            1 => prop_oneof![contains_pool, "[a-z]{0,4}"].prop_map(Op::Contains),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives `sut` and a std model through `ops`, tracking the expected bucket
// count alongside: a new key that brings len/buckets to the threshold grows
// the table exactly once.
fn run_against_model<S: BuildHasher>(
    mut sut: ChainedHashMap<String, i32, S>,
    config: HashMapConfig,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut buckets = config.bucket_count;

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let fresh = model.insert(k.clone(), v).is_none();
                prop_assert_eq!(sut.insert(k, v), fresh);
                if fresh && model.len() as f64 / buckets as f64 >= config.max_load_factor {
                    if let Some(next) = config.grown_bucket_count(buckets) {
                        buckets = next;
                    }
                }
            }
            Op::Search(i) => {
                let k = &pool[i];
                match model.get(k) {
                    Some(v) => prop_assert_eq!(sut.search(k.as_str()), Ok(v)),
                    None => prop_assert_eq!(sut.search(k.as_str()), Err(KeyNotFound)),
                }
            }
            Op::Append(i, d) => {
                let k = &pool[i];
                match (sut.search_mut(k.as_str()), model.get_mut(k)) {
                    (Ok(v), Some(mv)) => {
                        *v = v.wrapping_add(d);
                        *mv = mv.wrapping_add(d);
                    }
                    (Err(KeyNotFound), None) => {}
                    (got, want) => prop_assert!(false, "search_mut {:?} vs model {:?}", got, want),
                }
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_str()), model.contains_key(&s));
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.bucket_count(), buckets);
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.search(k.as_str()), Ok(v));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - insert reports new keys exactly when the model had none
// - search/search_mut/contains agree with the model, including through the
//   lookup cache
// - len matches and the bucket count follows the growth rule
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_config(config).unwrap();
        run_against_model(sut, config, &pool, ops)?;
    }
}

// Property: same invariants with every key in a single chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_config_and_hasher(config, ConstBuildHasher).unwrap();
        run_against_model(sut, config, &pool, ops)?;
    }
}
