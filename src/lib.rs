//! # tidmap
//!
//! Compact in-memory membership structures for sparse 64-bit keys with a
//! page/offset shape, as produced by block-structured storage: a key is a
//! 32-bit page number plus a small in-page offset, keys arrive heavily
//! clustered by page, and the working set must stay resident while being
//! probed billions of times.
//!
//! Two structures, usable independently:
//!
//! - [`PageBitmapStore`]: an exact membership set keyed by page. Each
//!   page's offsets are frozen into the smallest of three container
//!   encodings (sorted array, bitmap, run list) and packed into one
//!   shared growable arena. Pages are attached once, whole, and then
//!   only probed.
//! - [`RadixMap`]: a general `u64 -> V` map built as a byte-chunked trie
//!   whose nodes adapt their physical size to their occupancy. Supports
//!   interleaved insert, lookup, and delete.
//!
//! Both are single-writer. Neither takes locks; wrap them yourself if
//! readers and the writer must overlap.
//!
//! ```rust
//! use tidmap::{PageBitmapStore, RadixMap};
//!
//! let mut store = PageBitmapStore::new();
//! store.add_page(9, &[1, 4, 200]);
//! assert!(store.lookup(9, 4));
//! assert!(!store.lookup(9, 5));
//!
//! let mut map: RadixMap<u32> = RadixMap::new();
//! map.insert((9 << 16) | 4, 7);
//! assert_eq!(map.lookup((9 << 16) | 4), Some(7));
//! ```

#![warn(missing_docs)]

pub mod page_store;
pub mod radix;

pub use page_store::{ContainerKind, PageBitmapStore, PageStoreStats, MAX_OFFSET};
pub use radix::{RadixMap, RadixStats, SizeClass};

#[cfg(test)]
mod proptests;
