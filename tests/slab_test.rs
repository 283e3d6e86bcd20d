use grove::{SlabArena, SlabConfig, SlabKey};
use proptest::prelude::*;
use std::collections::HashMap;

#[test]
fn test_block_size_is_page_multiple() {
    let slab: SlabArena<[u64; 3]> = SlabArena::with_config(SlabConfig::default().with_min_slots_per_block(100));
    assert_eq!(slab.block_size() % 4096, 0);
    assert!(slab.slots_per_block() >= 100);
    assert_eq!(slab.block_count(), 0);
    assert_eq!(slab.memory_size(), 0);
}

#[test]
fn test_memory_grows_one_block_at_a_time() {
    let mut slab: SlabArena<u64> = SlabArena::new();
    let per_block = slab.slots_per_block();
    let keys: Vec<SlabKey> = (0..per_block as u64 * 3 + 1).map(|i| slab.insert(i)).collect();
    assert_eq!(slab.block_count(), 4);
    assert_eq!(slab.memory_size(), 4 * slab.block_size());
    assert_eq!(slab.len(), keys.len());
    assert_eq!(slab.ordinal_bound(), keys.len());

    for (i, &key) in keys.iter().enumerate() {
        assert_eq!(slab.ordinal(key), Some(i));
    }
}

#[test]
fn test_freed_slot_is_reused_but_old_key_stays_dead() {
    let mut slab = SlabArena::new();
    let old = slab.insert(String::from("old"));
    assert_eq!(slab.remove(old).as_deref(), Some("old"));
    let new = slab.insert(String::from("new"));

    assert_eq!(new.addr(), old.addr());
    assert_ne!(new.generation(), old.generation());
    assert_eq!(slab.get(old), None);
    assert_eq!(slab.get(new).map(String::as_str), Some("new"));
    assert_eq!(slab.remove(old), None);
}

#[test]
fn test_invalid_key_never_resolves() {
    let mut slab = SlabArena::new();
    slab.insert(1u8);
    assert!(SlabKey::INVALID.is_invalid());
    assert!(!slab.contains(SlabKey::INVALID));
    assert_eq!(slab.get_mut(SlabKey::INVALID), None);
}

#[derive(Debug, Clone)]
enum Operation {
    Insert(u32),
    Remove(usize),
    Get(usize),
}

proptest! {
    #[test]
    fn test_slab_matches_map_model(ops in proptest::collection::vec(
        prop_oneof![
            any::<u32>().prop_map(Operation::Insert),
            any::<usize>().prop_map(Operation::Remove),
            any::<usize>().prop_map(Operation::Get),
        ],
        1..300
    )) {
        let mut slab = SlabArena::with_config(SlabConfig::default().with_min_slots_per_block(4));
        let mut model: HashMap<SlabKey, u32> = HashMap::new();
        let mut issued: Vec<SlabKey> = Vec::new();

        for op in ops {
            match op {
                Operation::Insert(v) => {
                    let key = slab.insert(v);
                    prop_assert!(model.insert(key, v).is_none(), "key {:?} issued twice", key);
                    issued.push(key);
                }
                Operation::Remove(i) if !issued.is_empty() => {
                    let key = issued[i % issued.len()];
                    prop_assert_eq!(slab.remove(key), model.remove(&key));
                }
                Operation::Get(i) if !issued.is_empty() => {
                    let key = issued[i % issued.len()];
                    prop_assert_eq!(slab.get(key), model.get(&key));
                }
                _ => {}
            }
        }

        prop_assert_eq!(slab.len(), model.len());
        let mut live: Vec<(SlabKey, u32)> = slab.iter().map(|(k, &v)| (k, v)).collect();
        let mut expected: Vec<(SlabKey, u32)> = model.into_iter().collect();
        live.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(live, expected);
    }
}
