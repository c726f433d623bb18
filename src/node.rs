use std::fmt::{self, Debug};

use log::trace;
use smallvec::SmallVec;

use crate::children::Children;
use crate::mask::{bytes_match, class_mask};

/// Key fragment owned by a node. Inline for the default prefix bound.
pub(crate) type Prefix = SmallVec<[u8; 16]>;

/// A trie node.
///
/// `mask` is the class mask of `prefix` together with every descendant's
/// prefix. A node without an item is a pure branch point.
pub(crate) struct Node<V> {
    pub(crate) prefix: Prefix,
    pub(crate) item: Option<V>,
    pub(crate) mask: u64,
    pub(crate) children: Children<V>,
}

impl<V> Node<V> {
    pub(crate) fn new(prefix: &[u8], item: Option<V>) -> Self {
        Self {
            prefix: Prefix::from_slice(prefix),
            item,
            mask: class_mask(prefix),
            children: Children::default(),
        }
    }

    /// Builds the nodes holding `key`, `max` bytes per node, with `item` on
    /// the last one. An empty key yields a single node with an empty prefix.
    pub(crate) fn chain(key: &[u8], item: V, max: usize) -> Self {
        let mut chunks = key.chunks(max).rev();
        let Some(last) = chunks.next() else {
            return Self::new(&[], Some(item));
        };

        let mut node = Self::new(last, Some(item));
        for chunk in chunks {
            let mut parent = Self::new(chunk, None);
            parent.mask |= node.mask;
            parent.children = Children::single(node);
            node = parent;
        }
        node
    }

    /// First byte of the prefix. Only valid for non-root nodes, whose
    /// prefixes are never empty.
    #[inline]
    pub(crate) fn first_byte(&self) -> u8 {
        self.prefix[0]
    }

    #[inline]
    pub(crate) fn is_dead(&self) -> bool {
        self.item.is_none() && self.children.is_empty()
    }

    pub(crate) fn common_prefix_len(&self, key: &[u8], case_insensitive: bool) -> usize {
        self.prefix
            .iter()
            .zip(key)
            .take_while(|&(a, b)| bytes_match(*a, *b, case_insensitive))
            .count()
    }

    pub(crate) fn recompute_mask(&mut self) {
        self.mask = class_mask(&self.prefix) | self.children.combined_mask();
    }

    /// Keeps `prefix[..at]` here and moves the rest of the prefix, the item
    /// and the children into a single new child.
    pub(crate) fn split(&mut self, at: usize, max: usize) {
        debug_assert!(at < self.prefix.len());

        let mut child = Node {
            prefix: Prefix::from_slice(&self.prefix[at..]),
            item: self.item.take(),
            mask: 0,
            children: std::mem::take(&mut self.children),
        };
        child.recompute_mask();
        child.compact(max);

        trace!(
            "split {:?} at {}",
            String::from_utf8_lossy(&self.prefix),
            at
        );
        self.prefix.truncate(at);
        self.mask = class_mask(&self.prefix) | child.mask;
        self.children = Children::single(child);
    }

    /// Merges this node with its only child when neither holds an item and
    /// the joined prefix fits in `max` bytes. Returns whether it merged.
    pub(crate) fn compact(&mut self, max: usize) -> bool {
        if self.item.is_some() || self.children.len() != 1 {
            return false;
        }
        let child = self.children.get(0);
        if child.item.is_some() || self.prefix.len() + child.prefix.len() > max {
            return false;
        }
        let Some(child) = self.children.take_only() else {
            return false;
        };

        trace!(
            "compact {:?} + {:?}",
            String::from_utf8_lossy(&self.prefix),
            String::from_utf8_lossy(&child.prefix)
        );
        self.prefix.extend_from_slice(&child.prefix);
        self.children = child.children;
        true
    }

    pub(crate) fn count(&self) -> usize {
        let mut n = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            n += 1;
            stack.extend(node.children.iter());
        }
        n
    }

    pub(crate) fn count_items(&self) -> usize {
        let mut n = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            n += usize::from(node.item.is_some());
            stack.extend(node.children.iter());
        }
        n
    }

    pub(crate) fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        V: Debug,
    {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, indent)) = stack.pop() {
            writeln!(
                f,
                "{:indent$}{} {:?}",
                "",
                String::from_utf8_lossy(&node.prefix),
                node.item,
                indent = indent
            )?;
            stack.extend(node.children.iter().rev().map(|c| (c, indent + 2)));
        }
        Ok(())
    }
}

/// Post-order copy with an explicit stack; chains can be far deeper than
/// the call stack allows.
impl<V: Clone> Clone for Node<V> {
    fn clone(&self) -> Self {
        // (source node, children already queued)
        let mut work: Vec<(&Node<V>, bool)> =
            self.children.iter().rev().map(|c| (c, false)).collect();
        let mut done: Vec<Node<V>> = Vec::new();
        while let Some((node, expanded)) = work.pop() {
            if !expanded {
                work.push((node, true));
                work.extend(node.children.iter().rev().map(|c| (c, false)));
                continue;
            }
            let children = done.split_off(done.len() - node.children.len());
            done.push(Node {
                prefix: node.prefix.clone(),
                item: node.item.clone(),
                mask: node.mask,
                children: Children::from_vec(children),
            });
        }

        Node {
            prefix: self.prefix.clone(),
            item: self.item.clone(),
            mask: self.mask,
            children: Children::from_vec(done),
        }
    }
}
