//! Fuzzy (subsequence) and substring search.
//!
//! Both searches keep an explicit stack of candidate subtrees and drop a
//! candidate as soon as its class mask lacks a class the rest of the query
//! needs.

use crate::error::Result;
use crate::mask::{bytes_match, class_mask, may_contain};
use crate::node::Node;
use crate::trie::Trie;
use crate::visit::walk;

struct Candidate<'a, V> {
    node: &'a Node<V>,
    /// Length of the shared key buffer before `node`'s prefix.
    parent_len: usize,
    /// Bytes of the query matched so far.
    matched: usize,
    skipped: usize,
}

impl<V> Trie<V> {
    /// Visits every item whose key contains `partial` as a subsequence.
    ///
    /// The visitor also receives the number of bytes skipped between the
    /// first matched byte and the end of the match; bytes before the first
    /// match are free. Every item below the node where the match completes
    /// is reported with that node's count. Results come in no particular
    /// order, rank on the caller side.
    pub fn visit_fuzzy<F>(&self, partial: &[u8], case_insensitive: bool, mut visitor: F) -> Result<()>
    where
        F: FnMut(&[u8], &V, usize) -> Result<()>,
    {
        if partial.is_empty() {
            return self.visit(|key, item| visitor(key, item, 0));
        }
        let Some(root) = &self.root else {
            return Ok(());
        };

        let mut key = Vec::new();
        let mut stack = vec![Candidate {
            node: root,
            parent_len: 0,
            matched: 0,
            skipped: 0,
        }];
        while let Some(c) = stack.pop() {
            let rest = &partial[c.matched..];
            if !may_contain(c.node.mask, class_mask(rest), case_insensitive) {
                continue;
            }

            let (count, skipped) =
                fuzzy_match_count(&c.node.prefix, rest, c.matched, case_insensitive);
            let matched = c.matched + count;
            let skipped = c.skipped + skipped;
            key.truncate(c.parent_len);
            key.extend_from_slice(&c.node.prefix);

            if matched == partial.len() {
                walk(c.node, &mut key, &mut |key: &[u8], item: &V| {
                    visitor(key, item, skipped)
                })?;
                continue;
            }

            let len = key.len();
            stack.extend(c.node.children.iter().rev().map(|child| Candidate {
                node: child,
                parent_len: len,
                matched,
                skipped,
            }));
        }
        Ok(())
    }

    /// Visits every item whose key contains `substring` as a contiguous run.
    pub fn visit_substring<F>(
        &self,
        substring: &[u8],
        case_insensitive: bool,
        mut visitor: F,
    ) -> Result<()>
    where
        F: FnMut(&[u8], &V) -> Result<()>,
    {
        if substring.is_empty() {
            return self.visit(visitor);
        }
        let Some(root) = &self.root else {
            return Ok(());
        };

        let needle = if case_insensitive {
            substring.to_ascii_uppercase()
        } else {
            substring.to_vec()
        };
        // A match straddling the edge into a node starts at most this many
        // bytes before the node's own prefix.
        let max_suffix = substring.len() - 1;

        let mut key = Vec::new();
        let mut window = Vec::with_capacity(max_suffix + self.config.max_prefix_per_node);
        // (node, key length before the node's prefix)
        let mut stack: Vec<(&Node<V>, usize)> = vec![(root, 0)];
        while let Some((node, parent_len)) = stack.pop() {
            key.truncate(parent_len);
            let tail = parent_len.min(max_suffix);
            window.clear();
            window.extend_from_slice(&key[parent_len - tail..]);
            window.extend_from_slice(&node.prefix);
            if case_insensitive {
                window.make_ascii_uppercase();
            }

            key.extend_from_slice(&node.prefix);
            if contains(&window, &needle) {
                // Every key below extends `key`, so the whole subtree matches.
                walk(node, &mut key, &mut visitor)?;
                continue;
            }

            let overlap = overlap_len(&key, substring, case_insensitive);
            let required = class_mask(&substring[overlap..]);
            let len = key.len();
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .filter(|child| may_contain(child.mask, required, case_insensitive))
                    .map(|child| (child, len)),
            );
        }
        Ok(())
    }
}

/// Scans `prefix` for the bytes of `query` in order. Returns how many query
/// bytes matched and how many prefix bytes were skipped once the search had
/// matched anything (`offset` query bytes were matched before this call).
fn fuzzy_match_count(
    prefix: &[u8],
    query: &[u8],
    offset: usize,
    case_insensitive: bool,
) -> (usize, usize) {
    let mut count = 0;
    let mut skipped = 0;
    for &b in prefix {
        if count == query.len() {
            break;
        }
        if bytes_match(b, query[count], case_insensitive) {
            count += 1;
        } else if offset + count > 0 {
            skipped += 1;
        }
    }
    (count, skipped)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Longest proper prefix of `query` that `key` ends with.
fn overlap_len(key: &[u8], query: &[u8], case_insensitive: bool) -> usize {
    let start = (query.len() - 1).min(key.len());
    (1..=start)
        .rev()
        .find(|&i| {
            let suffix = &key[key.len() - i..];
            let head = &query[..i];
            if case_insensitive {
                suffix.eq_ignore_ascii_case(head)
            } else {
                suffix == head
            }
        })
        .unwrap_or(0)
}
