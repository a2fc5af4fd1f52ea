use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::page_store::{ContainerKind, PageBitmapStore, MAX_OFFSET};
use crate::radix::RadixMap;

// ---- page bitmap store ---------------------------------------------------

fn pages_strategy() -> impl Strategy<Value = BTreeMap<u32, BTreeSet<u16>>> {
    prop::collection::btree_map(
        0u32..500,
        prop::collection::btree_set(1u16..=MAX_OFFSET, 1..64),
        1..24,
    )
}

/// Sizes of the three candidate encodings for one page, computed
/// independently of the store.
fn container_sizes(offsets: &[u16]) -> (usize, usize, usize) {
    let array = offsets.len() * 2;
    let bitmap = (usize::from(*offsets.last().unwrap()) - 1) / 8 + 1;
    let mut runs = 0usize;
    let mut i = 0;
    while i < offsets.len() {
        let mut j = i;
        while j + 1 < offsets.len() && offsets[j + 1] == offsets[j] + 1 {
            j += 1;
        }
        runs += 1;
        i = j + 1;
    }
    (array, bitmap, runs * 4)
}

fn expected_kind(array: usize, bitmap: usize, run: usize) -> ContainerKind {
    if bitmap <= array && bitmap <= run {
        ContainerKind::Bitmap
    } else if run < bitmap && run < array {
        ContainerKind::Run
    } else {
        ContainerKind::Array
    }
}

// ---- radix map -----------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
    Insert(u64, u64),
    Delete(u64),
    Get(u64),
}

fn radix_key_strategy() -> impl Strategy<Value = u64> + Clone {
    // Mostly page-clustered keys so leaves actually fill and climb size
    // classes; a trickle of arbitrary keys exercises upward growth and
    // deep single-key chains.
    prop_oneof![
        6 => (0u64..8, 0u64..1024).prop_map(|(page, off)| (page << 16) | off),
        1 => any::<u64>(),
    ]
}

fn radix_ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = radix_key_strategy();
    let op = prop_oneof![
        5 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Delete),
        2 => key.prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=1500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_page_store_membership(pages in pages_strategy()) {
        let mut store = PageBitmapStore::new();
        for (&page, offsets) in &pages {
            let sorted: Vec<u16> = offsets.iter().copied().collect();
            store.add_page(page, &sorted);
        }
        prop_assert_eq!(store.len(), pages.len());

        for (&page, offsets) in &pages {
            for off in 1..=MAX_OFFSET {
                prop_assert_eq!(
                    store.lookup(page, off),
                    offsets.contains(&off),
                    "page {} offset {}", page, off
                );
            }
            prop_assert!(!store.lookup(page, 0));
        }
        // Pages never attached are fully absent.
        for page in 500..510 {
            prop_assert!(!store.lookup(page, 1));
        }
    }

    #[test]
    fn prop_page_store_picks_smallest_container(pages in pages_strategy()) {
        let mut store = PageBitmapStore::new();
        for (&page, offsets) in &pages {
            let sorted: Vec<u16> = offsets.iter().copied().collect();
            store.add_page(page, &sorted);
        }

        for (&page, offsets) in &pages {
            let sorted: Vec<u16> = offsets.iter().copied().collect();
            let (array, bitmap, run) = container_sizes(&sorted);
            let kind = store.container_kind(page).unwrap();
            prop_assert_eq!(
                kind,
                expected_kind(array, bitmap, run),
                "page {}: array={} bitmap={} run={}", page, array, bitmap, run
            );
            // Whatever was chosen is no larger than either alternative.
            let chosen = match kind {
                ContainerKind::Array => array,
                ContainerKind::Bitmap => bitmap,
                ContainerKind::Run => run,
            };
            prop_assert!(chosen <= array && chosen <= bitmap && chosen <= run);
        }
    }

    #[test]
    fn prop_radix_matches_btreemap(ops in radix_ops_strategy()) {
        let mut map: RadixMap<u64> = RadixMap::new();
        let mut oracle: BTreeMap<u64, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let existed = map.insert(key, value);
                    let old = oracle.insert(key, value);
                    prop_assert_eq!(existed, old.is_some());
                }
                Op::Delete(key) => {
                    let existed = map.delete(key);
                    let old = oracle.remove(&key);
                    prop_assert_eq!(existed, old.is_some());
                }
                Op::Get(key) => {
                    prop_assert_eq!(map.lookup(key), oracle.get(&key).copied());
                }
            }
            prop_assert_eq!(map.len(), oracle.len());
        }

        for (&key, &value) in &oracle {
            prop_assert_eq!(map.lookup(key), Some(value));
        }

        // Draining the survivors must collapse the tree completely.
        let remaining: Vec<u64> = oracle.keys().copied().collect();
        for key in remaining {
            prop_assert!(map.delete(key));
        }
        prop_assert!(map.is_empty());
        let stats = map.stats();
        prop_assert_eq!(stats.inner_nodes, [0; 6]);
        prop_assert_eq!(stats.leaf_nodes, [0; 6]);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_radix_delete_order_small_set() {
    // Keys chosen to share partial paths at different depths, so deletes
    // collapse chains of varying length in every order.
    let keys: Vec<u64> = vec![0, 1, 0x100, 0x101, 0x1_0000, 0xFF_FF_FF];

    for_each_permutation(&keys, |perm| {
        let mut map: RadixMap<u64> = RadixMap::new();
        for (i, &k) in keys.iter().enumerate() {
            map.insert(k, i as u64);
        }

        let mut live: BTreeSet<u64> = keys.iter().copied().collect();
        for k in perm {
            assert!(map.delete(k));
            live.remove(&k);
            for &other in &keys {
                let expect = live
                    .contains(&other)
                    .then(|| keys.iter().position(|&x| x == other).unwrap() as u64);
                assert_eq!(map.lookup(other), expect, "key {:#x}", other);
            }
            assert_eq!(map.len(), live.len());
        }
        assert!(map.is_empty());
    });
}
