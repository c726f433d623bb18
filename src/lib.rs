//! # fuzzy-patricia
//!
//! A Patricia (compressed prefix) trie over byte keys with fuzzy and
//! substring search.
//!
//! Each node holds a key fragment of bounded length and a 64-bit mask of the
//! character classes (digits, letters, `.`, `-`) found anywhere in its
//! subtree. Searches compare that mask with the classes the query still
//! needs and skip whole subtrees before touching their bytes.
//!
//! ## Example
//!
//! ```rust
//! use fuzzy_patricia::Trie;
//!
//! let mut trie: Trie<u32> = Trie::new();
//! trie.insert(b"src/main.rs", 1);
//! trie.insert(b"src/lib.rs", 2);
//! trie.insert(b"README.md", 3);
//!
//! assert_eq!(trie.get(b"src/lib.rs"), Some(&2));
//!
//! let mut hits = Vec::new();
//! trie.visit_fuzzy(b"srm", false, |key, item, skipped| {
//!     hits.push((key.to_vec(), *item, skipped));
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(hits, vec![(b"src/main.rs".to_vec(), 1, 2)]);
//! ```

mod children;
mod config;
mod error;
mod mask;
mod node;
mod search;
mod trie;
mod visit;

pub use config::{ChildOrder, Config, DEFAULT_MAX_PREFIX_PER_NODE};
pub use error::{BoxError, Error, Result};
pub use trie::Trie;
pub use visit::Iter;

#[cfg(test)]
mod proptests;
