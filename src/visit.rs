//! Ordered walks: whole trie, one subtree, or the prefixes of a key.
//!
//! Every walk reuses one key buffer, so the key slice handed to a visitor is
//! only valid for the duration of that call.

use crate::error::{Error, Result};
use crate::node::Node;
use crate::trie::Trie;

/// What the walk does after calling the visitor on a node.
fn descend_after(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(Error::SkipSubtree) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Pre-order walk of the subtree rooted at `root`.
///
/// `key` must hold the full key up to and including `root`'s prefix. It is
/// restored to that state before returning.
pub(crate) fn walk<V, F>(root: &Node<V>, key: &mut Vec<u8>, visitor: &mut F) -> Result<()>
where
    F: FnMut(&[u8], &V) -> Result<()>,
{
    let base = key.len();
    let result = walk_from(root, base, key, visitor);
    key.truncate(base);
    result
}

fn walk_from<'a, V, F>(
    root: &'a Node<V>,
    base: usize,
    key: &mut Vec<u8>,
    visitor: &mut F,
) -> Result<()>
where
    F: FnMut(&[u8], &V) -> Result<()>,
{
    if let Some(item) = &root.item {
        if !descend_after(visitor(key.as_slice(), item))? {
            return Ok(());
        }
    }

    // (node, key length before the node's prefix)
    let mut stack: Vec<(&'a Node<V>, usize)> =
        root.children.iter().rev().map(|c| (c, base)).collect();
    while let Some((node, parent_len)) = stack.pop() {
        key.truncate(parent_len);
        key.extend_from_slice(&node.prefix);

        if let Some(item) = &node.item {
            if !descend_after(visitor(key.as_slice(), item))? {
                continue;
            }
        }

        let len = key.len();
        stack.extend(node.children.iter().rev().map(|c| (c, len)));
    }
    Ok(())
}

impl<V> Trie<V> {
    /// Calls `visitor` on every stored item, parents before children.
    ///
    /// Returning [`Error::SkipSubtree`] skips the rest of the current
    /// subtree. Any other error stops the walk and is returned.
    pub fn visit<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&[u8], &V) -> Result<()>,
    {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let mut key = Vec::with_capacity(32 + root.prefix.len());
        key.extend_from_slice(&root.prefix);
        walk(root, &mut key, &mut visitor)
    }

    /// Visits every item whose key starts with `prefix`.
    pub fn visit_subtree<F>(&self, prefix: &[u8], visitor: F) -> Result<()>
    where
        F: FnMut(&[u8], &V) -> Result<()>,
    {
        self.visit_subtree_with(prefix, false, visitor)
    }

    /// Like [`visit_subtree`](Self::visit_subtree), optionally folding ASCII
    /// case when matching `prefix`. Reported keys keep their stored case.
    pub fn visit_subtree_with<F>(
        &self,
        prefix: &[u8],
        case_insensitive: bool,
        mut visitor: F,
    ) -> Result<()>
    where
        F: FnMut(&[u8], &V) -> Result<()>,
    {
        for (mut key, node) in self.find_subtrees(prefix, case_insensitive) {
            walk(node, &mut key, &mut visitor)?;
        }
        Ok(())
    }

    /// Visits, root to leaf, the items stored under prefixes of `key`.
    ///
    /// [`Error::SkipSubtree`] stops descending along the current path.
    pub fn visit_prefixes<F>(&self, key: &[u8], case_insensitive: bool, mut visitor: F) -> Result<()>
    where
        F: FnMut(&[u8], &V) -> Result<()>,
    {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let mut buf = Vec::with_capacity(key.len());
        // (node, bytes of `key` consumed before it, buffer length before it)
        let mut stack = vec![(root, 0usize, 0usize)];
        while let Some((node, consumed, base)) = stack.pop() {
            let rest = &key[consumed..];
            let common = node.common_prefix_len(rest, case_insensitive);
            if common < node.prefix.len() {
                continue;
            }

            buf.truncate(base);
            buf.extend_from_slice(&node.prefix);
            if let Some(item) = &node.item {
                if !descend_after(visitor(&buf, item))? {
                    continue;
                }
            }

            let Some(&next) = rest.get(common) else {
                continue;
            };
            let len = buf.len();
            stack.extend(
                node.children
                    .matching(next, case_insensitive)
                    .rev()
                    .map(|c| (c, consumed + common, len)),
            );
        }
        Ok(())
    }

    /// Nodes where `prefix` is used up, each with the full stored key through
    /// the end of its own prefix. At most one unless folding case.
    fn find_subtrees(&self, prefix: &[u8], case_insensitive: bool) -> Vec<(Vec<u8>, &Node<V>)> {
        let mut found = Vec::new();
        let Some(root) = &self.root else {
            return found;
        };

        let mut stack = vec![(root, 0usize, Vec::new())];
        while let Some((node, consumed, mut key)) = stack.pop() {
            let rest = &prefix[consumed..];
            let common = node.common_prefix_len(rest, case_insensitive);
            key.extend_from_slice(&node.prefix);

            if common == rest.len() {
                found.push((key, node));
                continue;
            }
            if common < node.prefix.len() {
                continue;
            }
            for child in node.children.matching(rest[common], case_insensitive).rev() {
                stack.push((child, consumed + common, key.clone()));
            }
        }
        found
    }
}

/// Iterator over `(key, item)` pairs in walk order.
pub struct Iter<'a, V> {
    stack: Vec<(&'a Node<V>, usize)>,
    key: Vec<u8>,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(root: Option<&'a Node<V>>) -> Self {
        Self {
            stack: root.map(|r| (r, 0)).into_iter().collect(),
            key: Vec::new(),
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, parent_len)) = self.stack.pop() {
            self.key.truncate(parent_len);
            self.key.extend_from_slice(&node.prefix);
            let len = self.key.len();
            self.stack.extend(node.children.iter().rev().map(|c| (c, len)));

            if let Some(item) = &node.item {
                return Some((self.key.clone(), item));
            }
        }
        None
    }
}
