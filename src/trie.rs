use std::fmt::{self, Debug};

use log::{debug, trace};

use crate::config::Config;
use crate::error::Result;
use crate::mask::class_mask;
use crate::node::Node;
use crate::visit::Iter;

/// A Patricia trie over byte keys.
///
/// Keys are split into node prefixes of at most
/// [`Config::max_prefix_per_node`] bytes. Each node carries a character-class
/// mask of its subtree so fuzzy and substring searches can skip subtrees
/// that lack a required byte class.
///
/// The trie is single-writer: `&mut self` for every mutation, shared
/// borrows for every read.
pub struct Trie<V> {
    pub(crate) root: Option<Node<V>>,
    pub(crate) config: Config,
    count: usize,
}

enum Put {
    New,
    Replaced,
    Kept,
}

impl<V> Trie<V> {
    pub fn new() -> Self {
        Self {
            root: None,
            config: Config::default(),
            count: 0,
        }
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        debug!("trie config: {:?}", config);
        Ok(Self {
            root: None,
            config,
            count: 0,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of stored items.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of nodes, structural ones included.
    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, Node::count)
    }

    /// The item stored at the root node, if any.
    pub fn item(&self) -> Option<&V> {
        self.root.as_ref().and_then(|root| root.item.as_ref())
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let (node, common) = self.find_subtree(key)?;
        if common != node.prefix.len() {
            return None;
        }
        node.item.as_ref()
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let mut node = self.root.as_mut()?;
        let mut key = key;
        loop {
            let common = node.common_prefix_len(key, false);
            key = &key[common..];
            if common < node.prefix.len() {
                return None;
            }
            if key.is_empty() {
                return node.item.as_mut();
            }
            let idx = node.children.position(key[0])?;
            node = node.children.get_mut(idx);
        }
    }

    /// Whether an item is stored at exactly `key`.
    pub fn matches(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Whether any stored key has `key` as a prefix.
    pub fn match_subtree(&self, key: &[u8]) -> bool {
        self.find_subtree(key).is_some()
    }

    /// Stores `item` under `key` unless an item is already there. Returns
    /// whether the item was stored.
    pub fn insert(&mut self, key: &[u8], item: V) -> bool {
        !matches!(self.put(key, item, false), Put::Kept)
    }

    /// Stores `item` under `key`, replacing any previous item.
    pub fn set(&mut self, key: &[u8], item: V) {
        self.put(key, item, true);
    }

    fn put(&mut self, key: &[u8], item: V, replace: bool) -> Put {
        let Config {
            max_prefix_per_node: max,
            child_order: order,
        } = self.config;

        let root = match &mut self.root {
            Some(root) => root,
            slot @ None => {
                *slot = Some(Node::chain(key, item, max));
                self.count += 1;
                return Put::New;
            }
        };

        let mut node = &mut *root;
        let mut key = key;
        let mut path = Vec::new();
        let split = loop {
            let common = node.common_prefix_len(key, false);
            let rest = &key[common..];

            if common < node.prefix.len() {
                node.split(common, max);
                node.mask |= class_mask(rest);
                if rest.is_empty() {
                    node.item = Some(item);
                } else {
                    node.children.add(Node::chain(rest, item, max), order);
                }
                break true;
            }

            if rest.is_empty() {
                if node.item.is_some() && !replace {
                    return Put::Kept;
                }
                if node.item.replace(item).is_some() {
                    return Put::Replaced;
                }
                break false;
            }

            node.mask |= class_mask(rest);
            match node.children.position(rest[0]) {
                Some(idx) => {
                    path.push(idx);
                    node = node.children.get_mut(idx);
                    key = rest;
                }
                None => {
                    node.children.add(Node::chain(rest, item, max), order);
                    break false;
                }
            }
        };

        // A split shortens the node, which may now fit into an item-less
        // parent that was too long to merge with it before.
        if split {
            if let Some((_, parent)) = path.split_last() {
                descend_mut(root, parent).compact(max);
            }
        }
        self.count += 1;
        Put::New
    }

    /// Removes the item stored at exactly `key`. Returns whether there was
    /// one.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let max = self.config.max_prefix_per_node;
        let Some((path, common)) = self.find_path(key) else {
            return false;
        };
        let Some(root) = self.root.as_mut() else {
            return false;
        };

        let node = descend_mut(root, &path);
        if common != node.prefix.len() || node.item.take().is_none() {
            return false;
        }
        self.count -= 1;

        if !node.children.is_empty() {
            node.compact(max);
            if let Some((_, parent_path)) = path.split_last() {
                descend_mut(root, parent_path).compact(max);
            }
            return true;
        }

        self.prune(&path);
        true
    }

    /// Removes every item whose key starts with `prefix`. Returns whether
    /// anything matched.
    pub fn delete_subtree(&mut self, prefix: &[u8]) -> bool {
        let Some((path, _)) = self.find_path(prefix) else {
            return false;
        };
        let Some(root) = self.root.as_ref() else {
            return false;
        };

        self.count -= descend(root, &path).count_items();
        self.prune(&path);
        true
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.count = 0;
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self.root.as_ref())
    }

    /// Indented rendering of the node structure, one `prefix item` line per
    /// node.
    pub fn dump(&self) -> String
    where
        V: Debug,
    {
        struct Dump<'a, V>(&'a Node<V>);

        impl<V: Debug> fmt::Display for Dump<'_, V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.print(f)
            }
        }

        self.root
            .as_ref()
            .map(|root| Dump(root).to_string())
            .unwrap_or_default()
    }

    /// Node where `key` is used up, and how many bytes of that node's prefix
    /// it consumed.
    pub(crate) fn find_subtree(&self, key: &[u8]) -> Option<(&Node<V>, usize)> {
        let mut node = self.root.as_ref()?;
        let mut key = key;
        loop {
            let common = node.common_prefix_len(key, false);
            key = &key[common..];
            if key.is_empty() {
                return Some((node, common));
            }
            if common < node.prefix.len() {
                return None;
            }
            node = node.children.next(key[0])?;
        }
    }

    /// Same as [`find_subtree`](Self::find_subtree) but returns the child
    /// indices leading to the node.
    fn find_path(&self, key: &[u8]) -> Option<(Vec<usize>, usize)> {
        let mut node = self.root.as_ref()?;
        let mut key = key;
        let mut path = Vec::new();
        loop {
            let common = node.common_prefix_len(key, false);
            key = &key[common..];
            if key.is_empty() {
                return Some((path, common));
            }
            if common < node.prefix.len() {
                return None;
            }
            let idx = node.children.position(key[0])?;
            path.push(idx);
            node = node.children.get(idx);
        }
    }

    /// Unlinks the node at `path` together with the chain of item-less,
    /// single-child ancestors above it, then restores masks and compaction.
    fn prune(&mut self, path: &[usize]) {
        let max = self.config.max_prefix_per_node;
        let Some(root) = self.root.as_mut() else {
            return;
        };

        // One pass down the path: the deepest ancestor that survives, and
        // each ancestor's mask without the child on the path.
        let mut keep = None;
        let mut masks = Vec::with_capacity(path.len());
        let mut node = &*root;
        for (depth, &idx) in path.iter().enumerate() {
            if node.item.is_some() || node.children.len() >= 2 {
                keep = Some(depth);
            }
            let others = node
                .children
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != idx)
                .fold(class_mask(&node.prefix), |mask, (_, c)| mask | c.mask);
            masks.push(others);
            node = node.children.get(idx);
        }
        let Some(depth) = keep else {
            trace!("reset trie");
            self.clear();
            return;
        };

        let node = descend_mut(root, &path[..depth]);
        let removed = node.children.remove_at(path[depth]);
        trace!(
            "prune {:?} below depth {}",
            String::from_utf8_lossy(&removed.prefix),
            depth
        );

        node.recompute_mask();
        let mut below = node.mask;
        masks.truncate(depth);
        for mask in masks.iter_mut().rev() {
            *mask |= below;
            below = *mask;
        }
        let mut node = &mut *root;
        for (&idx, mask) in path.iter().zip(masks) {
            node.mask = mask;
            node = node.children.get_mut(idx);
        }

        descend_mut(root, &path[..depth]).compact(max);
        if depth > 0 {
            descend_mut(root, &path[..depth - 1]).compact(max);
        }
        debug_assert!(!root.is_dead());
    }
}

fn descend<'a, V>(root: &'a Node<V>, path: &[usize]) -> &'a Node<V> {
    path.iter().fold(root, |node, &idx| node.children.get(idx))
}

fn descend_mut<'a, V>(root: &'a mut Node<V>, path: &[usize]) -> &'a mut Node<V> {
    let mut node = root;
    for &idx in path {
        node = node.children.get_mut(idx);
    }
    node
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for Trie<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            config: self.config,
            count: self.count,
        }
    }
}

impl<V: Debug> Debug for Trie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(&k).into_owned(), v)))
            .finish()
    }
}
