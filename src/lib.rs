//! Red-black tree containers using the _allocated_ pattern for explicit
//! allocator control.
//!
//! This crate provides an ordered map and an ordered set for environments
//! without a general-purpose allocator or unwinding. Every tree node comes
//! from an allocator you choose, and every failure (including running out of
//! memory) is reported as a value.
//!
//! - [`TreeMap`] - An ordered key-value map
//! - [`TreeSet`] - An ordered set of keys
//!
//! # Quick Start
//!
//! ```
//! use allocated_rbtree::TreeMap;
//!
//! let mut map = TreeMap::new();
//! map.insert(1, "one")?;
//! map.insert(2, "two")?;
//! map.insert(3, "three")?;
//!
//! assert_eq!(map.at(&2)?, &"two");
//! assert_eq!(map.len(), 3);
//! # Ok::<(), allocated_rbtree::Error>(())
//! ```
//!
//! # The Allocated Pattern
//!
//! ## Wrapper Types (Recommended)
//!
//! - [`TreeMap<K, V, C, A>`] - Owns allocator, safe API
//! - [`TreeSet<K, C, A>`] - Owns allocator, safe API
//!
//! ## Allocated Types (Advanced)
//!
//! - [`AllocatedRedBlackTree<K, V, C>`] - Low-level, requires manual allocator passing
//!
//! ```
//! use allocated::{CountingAllocator, DropIn};
//! use allocated_rbtree::AllocatedRedBlackTree;
//!
//! let alloc = CountingAllocator::default();
//! let mut tree = AllocatedRedBlackTree::<u32, &str>::new();
//!
//! unsafe {
//!     tree.try_insert_in(&alloc, 1, "one")?;
//! }
//!
//! // One node, one allocation
//! assert_eq!(alloc.n_allocations(), 1);
//!
//! unsafe { tree.drop_in(&alloc) };
//! # Ok::<(), allocated_rbtree::Error>(())
//! ```
//!
//! # Ordering
//!
//! Keys are ordered by a [`Comparator`] supplied at construction, defaulting
//! to [`NaturalOrder`]. See the [`compare`] module.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

pub mod compare;
mod error;
/// Map façade over the red-black tree.
pub mod map;
/// The red-black tree engine.
///
/// This module provides [`rbtree::AllocatedRedBlackTree`], its cursors and
/// its iterators.
pub mod rbtree;
/// Set façade over the red-black tree.
pub mod set;

pub use compare::{CompareFn, Comparator, NaturalOrder, ReverseOrder};
pub use error::{Error, TreeResult};
pub use rbtree::AllocatedRedBlackTree;

pub use map::TreeMap;
pub use set::TreeSet;
