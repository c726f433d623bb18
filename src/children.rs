//! Child list of a trie node.
//!
//! Children are routed by the first byte of their prefix, which is unique
//! among siblings. Lists are short (bounded by the byte alphabet), so a
//! flat vector with a linear scan beats any map here.

use crate::config::ChildOrder;
use crate::mask::bytes_match;
use crate::node::Node;

pub(crate) struct Children<V> {
    nodes: Vec<Node<V>>,
}

impl<V> Default for Children<V> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

/// Tears the subtree down with an explicit stack; chains can be far deeper
/// than the call stack allows.
impl<V> Drop for Children<V> {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.nodes);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children.nodes);
        }
    }
}

impl<V> Children<V> {
    pub(crate) fn single(child: Node<V>) -> Self {
        Self { nodes: vec![child] }
    }

    pub(crate) fn from_vec(nodes: Vec<Node<V>>) -> Self {
        Self { nodes }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn position(&self, b: u8) -> Option<usize> {
        self.nodes.iter().position(|n| n.first_byte() == b)
    }

    pub(crate) fn next(&self, b: u8) -> Option<&Node<V>> {
        self.nodes.iter().find(|n| n.first_byte() == b)
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> &Node<V> {
        &self.nodes[idx]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, idx: usize) -> &mut Node<V> {
        &mut self.nodes[idx]
    }

    /// Adds a child whose first byte is not yet routed.
    pub(crate) fn add(&mut self, child: Node<V>, order: ChildOrder) {
        debug_assert!(
            self.position(child.first_byte()).is_none(),
            "duplicate first byte {:#04x}",
            child.first_byte()
        );
        match order {
            ChildOrder::Insertion => self.nodes.push(child),
            ChildOrder::Sorted => {
                let b = child.first_byte();
                let at = self.nodes.partition_point(|n| n.first_byte() < b);
                self.nodes.insert(at, child);
            }
        }
    }

    pub(crate) fn remove_at(&mut self, idx: usize) -> Node<V> {
        self.nodes.remove(idx)
    }

    /// Removes and returns the only child, if there is exactly one.
    pub(crate) fn take_only(&mut self) -> Option<Node<V>> {
        if self.nodes.len() != 1 {
            return None;
        }
        self.nodes.pop()
    }

    pub(crate) fn combined_mask(&self) -> u64 {
        self.nodes.iter().fold(0, |mask, n| mask | n.mask)
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, Node<V>> {
        self.nodes.iter()
    }

    /// Children whose first byte matches `b`. At most two when folding case.
    pub(crate) fn matching(
        &self,
        b: u8,
        case_insensitive: bool,
    ) -> impl DoubleEndedIterator<Item = &Node<V>> {
        self.nodes
            .iter()
            .filter(move |n| bytes_match(n.first_byte(), b, case_insensitive))
    }
}
