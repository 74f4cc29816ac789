#![cfg(test)]

// Property tests for ChainedHashTable kept inside the crate so they can
// check the chain-length bookkeeping that is not part of the public API.

use crate::chained_hash_table::ChainedHashTable;
use crate::config::TableConfig;
use crate::error::TableError;
use hashbrown::HashMap;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(i64, i32),
    Remove(i64),
    Find(i64),
    Mutate(i64, i32),
    Flush,
}

// Keys are drawn as multiples of a small stride so that chains collide under
// small bucket counts and resizes happen often.
fn arb_key() -> impl Strategy<Value = i64> {
    prop_oneof![
        8 => (0i64..64, 1i64..=4).prop_map(|(k, stride)| k * stride * 8),
        1 => -8i64..0,
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        6 => (arb_key(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => arb_key().prop_map(Op::Remove),
        3 => arb_key().prop_map(Op::Find),
        2 => (arb_key(), any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => Just(Op::Flush),
    ];
    proptest::collection::vec(op, 1..120)
}

fn longest_chain(t: &ChainedHashTable<i32>) -> usize {
    (0..t.capacity()).map(|i| t.chain(i).count()).max().unwrap_or(0)
}

// Property: State-machine equivalence against hashbrown::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate inserts and absent removes fail and change nothing.
// - Negative keys are rejected on insert/remove and never found.
// - `len()` equals the model size; every stored key sits in bucket key mod capacity.
// - `max_chain_len()` is an upper bound on the true longest chain.
// - Capacity never shrinks; flush exports exactly the model's pairs.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(
        start in 1usize..=8,
        max_chain in 1usize..=4,
        ops in arb_ops(),
    ) {
        let config = TableConfig::new()
            .with_start_size(start)
            .with_max_chain_len(max_chain);
        let mut sut: ChainedHashTable<i32> = ChainedHashTable::with_config(config).unwrap();
        let mut model: HashMap<i64, i32> = HashMap::new();
        let mut last_capacity = sut.capacity();

        for op in ops {
            match op {
                Op::Insert(k, v) => match sut.insert(k, v) {
                    Ok(()) => {
                        prop_assert!(k >= 0);
                        prop_assert!(model.insert(k, v).is_none(), "insert must fail on duplicate");
                    }
                    Err(TableError::AlreadyPresent { key }) => {
                        prop_assert_eq!(key, k);
                        prop_assert!(model.contains_key(&k));
                    }
                    Err(TableError::InvalidArgument { .. }) => { prop_assert!(k < 0); }
                    Err(e) => { prop_assert!(false, "unexpected error: {:?}", e); }
                },
                Op::Remove(k) => match sut.remove(k) {
                    Ok(v) => { prop_assert_eq!(model.remove(&k), Some(v)); }
                    Err(TableError::KeyNotFound { key }) => {
                        prop_assert_eq!(key, k);
                        prop_assert!(!model.contains_key(&k));
                    }
                    Err(TableError::InvalidArgument { .. }) => { prop_assert!(k < 0); }
                    Err(e) => { prop_assert!(false, "unexpected error: {:?}", e); }
                },
                Op::Find(k) => {
                    prop_assert_eq!(sut.find(k), model.contains_key(&k));
                    prop_assert_eq!(sut.get(k), model.get(&k));
                }
                Op::Mutate(k, d) => {
                    if let Some(v) = sut.get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                    if let Some(v) = model.get_mut(&k) {
                        *v = v.wrapping_add(d);
                    }
                }
                Op::Flush => {
                    let mut out: Vec<(i64, i32)> = sut
                        .flush_all()
                        .unwrap()
                        .into_iter()
                        .map(Into::into)
                        .collect();
                    let mut expected: Vec<(i64, i32)> = model.drain().collect();
                    out.sort_unstable();
                    expected.sort_unstable();
                    prop_assert_eq!(out, expected);
                    prop_assert_eq!(sut.max_chain_len(), 0);
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert!(sut.capacity() >= last_capacity, "capacity must never shrink");
            last_capacity = sut.capacity();
            prop_assert!(longest_chain(&sut) <= sut.max_chain_len());

            let cap = sut.capacity();
            let mut stored = 0;
            for i in 0..cap {
                for (_, e) in sut.chain(i) {
                    prop_assert_eq!((e.key as u64 % cap as u64) as usize, i);
                    stored += 1;
                }
            }
            prop_assert_eq!(stored, model.len());
        }
    }
}
