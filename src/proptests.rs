use super::*;

use crate::mask::class_mask;
use crate::node::Node;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

const ALPHABET: &[u8] = b"abcAB.-_0/";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn validate_trie<V>(t: &Trie<V>) {
    let Some(root) = &t.root else {
        assert_eq!(t.len(), 0, "empty trie must have no items");
        return;
    };
    let max = t.config.max_prefix_per_node;

    let mut items = 0usize;
    let mut stack: Vec<(&Node<V>, bool)> = vec![(root, true)];
    while let Some((node, is_root)) = stack.pop() {
        assert!(!node.is_dead(), "reachable node without item or children");
        if !is_root {
            assert!(!node.prefix.is_empty(), "only the root may have an empty prefix");
        }
        assert!(node.prefix.len() <= max, "prefix longer than {max}");
        assert_eq!(
            node.mask,
            class_mask(&node.prefix) | node.children.combined_mask(),
            "mask must summarise the subtree"
        );

        let mut firsts: Vec<u8> = node.children.iter().map(|c| c.first_byte()).collect();
        let n = firsts.len();
        firsts.sort_unstable();
        firsts.dedup();
        assert_eq!(firsts.len(), n, "sibling first bytes must be unique");

        if node.item.is_none() && node.children.len() == 1 {
            let child = node.children.get(0);
            assert!(
                child.item.is_some() || node.prefix.len() + child.prefix.len() > max,
                "mergeable structural pair left uncompacted"
            );
        }

        items += usize::from(node.item.is_some());
        stack.extend(node.children.iter().map(|c| (c, false)));
    }
    assert_eq!(items, t.len(), "reachable items must match Trie::len");
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A tiny alphabet forces shared prefixes, splits and compaction.
    prop::collection::vec(prop::sample::select(ALPHABET.to_vec()), 0..=14)
}

fn query_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(prop::sample::select(ALPHABET.to_vec()), 0..=4)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 35)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u16),
    #[proptest(weight = 20)]
    Set(#[proptest(strategy = "key_strategy()")] Vec<u8>, u16),
    #[proptest(weight = 25)]
    Delete(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    DeleteSubtree(#[proptest(strategy = "query_strategy()")] Vec<u8>),
    #[proptest(weight = 17)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (1usize..=12, any::<bool>()).prop_map(|(max, sorted)| Config {
        max_prefix_per_node: max,
        child_order: if sorted {
            ChildOrder::Sorted
        } else {
            ChildOrder::Insertion
        },
    })
}

fn build(config: Config, keys: &[Vec<u8>]) -> (Trie<u32>, BTreeMap<Vec<u8>, u32>) {
    let mut t = Trie::with_config(config).unwrap();
    let mut m = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        t.set(k, i as u32);
        m.insert(k.clone(), i as u32);
    }
    (t, m)
}

fn fold_eq(a: u8, b: u8, fold: bool) -> bool {
    if fold {
        a.eq_ignore_ascii_case(&b)
    } else {
        a == b
    }
}

/// Greedy subsequence match; returns skipped bytes between first and last
/// matched byte.
fn brute_fuzzy(key: &[u8], partial: &[u8], fold: bool) -> Option<usize> {
    let mut matched = 0;
    let mut first = None;
    for (i, &b) in key.iter().enumerate() {
        if matched == partial.len() {
            break;
        }
        if fold_eq(b, partial[matched], fold) {
            first.get_or_insert(i);
            matched += 1;
            if matched == partial.len() {
                let start = first.unwrap_or(i);
                return Some(i + 1 - start - partial.len());
            }
        }
    }
    (matched == partial.len()).then_some(0)
}

fn brute_contains(key: &[u8], needle: &[u8], fold: bool) -> bool {
    needle.is_empty()
        || key
            .windows(needle.len())
            .any(|w| w.iter().zip(needle).all(|(&a, &b)| fold_eq(a, b, fold)))
}

fn brute_starts_with(key: &[u8], prefix: &[u8], fold: bool) -> bool {
    key.len() >= prefix.len() && brute_contains(&key[..prefix.len()], prefix, fold)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 20_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(config in config_strategy(), ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        let mut t: Trie<u16> = Trie::with_config(config).unwrap();
        let mut m: BTreeMap<Vec<u8>, u16> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let expected = !m.contains_key(&key);
                    prop_assert_eq!(t.insert(&key, value), expected);
                    m.entry(key).or_insert(value);
                }
                Op::Set(key, value) => {
                    t.set(&key, value);
                    m.insert(key, value);
                }
                Op::Delete(key) => {
                    prop_assert_eq!(t.delete(&key), m.remove(&key).is_some());
                    prop_assert_eq!(t.get(&key), None);
                }
                Op::DeleteSubtree(prefix) => {
                    let doomed: Vec<Vec<u8>> = m
                        .keys()
                        .filter(|k| k.starts_with(&prefix))
                        .cloned()
                        .collect();
                    prop_assert_eq!(t.delete_subtree(&prefix), !doomed.is_empty());
                    for k in doomed {
                        m.remove(&k);
                    }
                    prop_assert!(!t.match_subtree(&prefix));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                    let has_ext = m.keys().any(|k| k.starts_with(&key));
                    prop_assert_eq!(t.match_subtree(&key), has_ext);
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let mut got: Vec<(Vec<u8>, u16)> = t.iter().map(|(k, v)| (k, *v)).collect();
        if config.child_order == ChildOrder::Insertion {
            got.sort();
        }
        let expected: Vec<(Vec<u8>, u16)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_fuzzy_matches_brute_force(
        config in config_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..=60),
        partial in query_strategy(),
        fold in any::<bool>(),
    ) {
        let (t, m) = build(config, &keys);

        let mut got = Vec::new();
        t.visit_fuzzy(&partial, fold, |k, v, skipped| {
            got.push((k.to_vec(), *v, skipped));
            Ok(())
        }).unwrap();
        got.sort();

        let mut expected: Vec<(Vec<u8>, u32, usize)> = m
            .iter()
            .filter_map(|(k, v)| brute_fuzzy(k, &partial, fold).map(|s| (k.clone(), *v, s)))
            .collect();
        expected.sort();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_substring_matches_brute_force(
        config in config_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..=60),
        needle in query_strategy(),
        fold in any::<bool>(),
    ) {
        let (t, m) = build(config, &keys);

        let mut got = Vec::new();
        t.visit_substring(&needle, fold, |k, v| {
            got.push((k.to_vec(), *v));
            Ok(())
        }).unwrap();
        got.sort();

        let expected: Vec<(Vec<u8>, u32)> = m
            .iter()
            .filter(|(k, _)| brute_contains(k, &needle, fold))
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_prefix_walks_match_brute_force(
        config in config_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..=60),
        lookup in key_strategy(),
        fold in any::<bool>(),
    ) {
        let (t, m) = build(config, &keys);

        let mut prefixes = Vec::new();
        t.visit_prefixes(&lookup, fold, |k, _| {
            prefixes.push(k.to_vec());
            Ok(())
        }).unwrap();
        if !fold {
            // A single root-to-leaf path: shorter keys come first.
            prop_assert!(prefixes.windows(2).all(|w| w[0].len() < w[1].len()));
        }
        prefixes.sort();
        let expected: Vec<Vec<u8>> = m
            .keys()
            .filter(|k| brute_starts_with(&lookup, k, fold))
            .cloned()
            .collect();
        prop_assert_eq!(prefixes, expected);

        let subtree_prefix = &lookup[..lookup.len().min(3)];
        let mut subtree = Vec::new();
        t.visit_subtree_with(subtree_prefix, fold, |k, _| {
            subtree.push(k.to_vec());
            Ok(())
        }).unwrap();
        subtree.sort();
        let expected: Vec<Vec<u8>> = m
            .keys()
            .filter(|k| brute_starts_with(k, subtree_prefix, fold))
            .cloned()
            .collect();
        prop_assert_eq!(subtree, expected);
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

fn small_keys() -> Vec<Vec<u8>> {
    vec![
        b"a".to_vec(),
        b"ab".to_vec(),
        b"abc".to_vec(),
        b"abd".to_vec(),
        b"b".to_vec(),
        b"".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    init_logging();
    let keys = small_keys();
    for_each_permutation(&keys, |perm| {
        let config = Config {
            max_prefix_per_node: 2,
            child_order: ChildOrder::Sorted,
        };
        let mut t: Trie<u64> = Trie::with_config(config).unwrap();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        for (i, k) in perm.into_iter().enumerate() {
            assert!(t.insert(&k, i as u64));
            m.insert(k, i as u64);
        }

        validate_trie(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.into_iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    init_logging();
    let keys = small_keys();
    let mut base: Trie<u64> = Trie::new();
    for (i, k) in keys.iter().enumerate() {
        base.set(k, i as u64);
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut remaining = keys.len();
        for k in perm {
            assert!(t.delete(&k));
            assert!(!t.delete(&k));
            remaining -= 1;
            assert_eq!(t.len(), remaining);
            validate_trie(&t);
        }
        assert!(t.is_empty());
        assert!(t.root.is_none());
    });
}
