use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Bound;
use core::ops::RangeBounds;
use core::ptr::NonNull;

#[cfg(feature = "std")]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use alloc::string::String;
#[cfg(feature = "std")]
use std::error::Error as StdError;
#[cfg(feature = "std")]
use std::io::Write;
#[cfg(feature = "std")]
use alloc::vec::Vec;

use allocator_api2::alloc::Allocator;

use allocated::AllocResult;
use allocated::DropGuard;
use allocated::DropGuardResult;
use allocated::DropIn;
use allocated::FromIteratorIn;
use allocated::IntoIteratorIn;

use crate::compare::{checked_compare, Comparator, NaturalOrder};
pub use crate::error::{Error, TreeResult};

mod cursor;
mod iters;
mod node;


pub use cursor::{Cursor, CursorMut};
pub use iters::{IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys, Range, Values, ValuesMut};
use iters::RawIter;
use node::{is_black, maximum, minimum, successor, Color, Link, Node};

enum Search<K, V> {
    Found(NonNull<Node<K, V>>),
    Vacant {
        parent: Link<K, V>,
        left: bool,
    },
}

/// A red-black tree using the allocated pattern.
///
/// This is the low-level "allocated" type: every method that allocates or
/// frees a node takes the allocator as an argument, and the tree must be
/// released with [`DropIn::drop_in`] using that same allocator. For most use
/// cases prefer [`TreeMap`](crate::TreeMap) or [`TreeSet`](crate::TreeSet),
/// which own their allocator.
///
/// Keys are unique and ordered by the comparator `C`, which defaults to
/// [`NaturalOrder`].
///
/// # Examples
///
/// ```
/// use allocated::{CountingAllocator, DropIn};
/// use allocated_rbtree::AllocatedRedBlackTree;
///
/// let alloc = CountingAllocator::default();
/// let mut tree = AllocatedRedBlackTree::<u32, &str>::new();
///
/// unsafe {
///     tree.try_insert_in(&alloc, 2, "two")?;
///     tree.try_insert_in(&alloc, 1, "one")?;
/// }
///
/// assert_eq!(tree.first_key_value(), Some((&1, &"one")));
/// assert_eq!(tree.len(), 2);
///
/// unsafe { tree.drop_in(&alloc) };
/// assert_eq!(alloc.net_allocations(), 0);
/// # Ok::<(), allocated_rbtree::Error>(())
/// ```
pub struct AllocatedRedBlackTree<K, V, C = NaturalOrder> {
    root: Link<K, V>,
    n: usize,
    cmp: C,
    marker: PhantomData<Node<K, V>>,
}

// SAFETY: the tree uniquely owns every node reachable from `root`; moving the
// tree moves ownership of its keys and values.
unsafe impl<K: Send, V: Send, C: Send> Send for AllocatedRedBlackTree<K, V, C> {}

// SAFETY: shared references only hand out shared references to keys and values.
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for AllocatedRedBlackTree<K, V, C> {}

impl<K, V, C: Default> AllocatedRedBlackTree<K, V, C> {
    /// Creates an empty tree. No memory is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C: Default> Default for AllocatedRedBlackTree<K, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> AllocatedRedBlackTree<K, V, C> {
    /// Creates an empty tree ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> Self {
        AllocatedRedBlackTree {
            root: None,
            n: 0,
            cmp,
            marker: PhantomData,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Returns the comparator ordering this tree.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    fn first_node(&self) -> Link<K, V> {
        // SAFETY: the root is live.
        self.root.map(|r| unsafe { minimum(r) })
    }

    fn last_node(&self) -> Link<K, V> {
        // SAFETY: the root is live.
        self.root.map(|r| unsafe { maximum(r) })
    }

    fn raw_iter(&self) -> RawIter<K, V> {
        RawIter::new(self.first_node(), self.last_node())
    }

    /// Returns the element with the minimum key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        // SAFETY: the node is live for as long as `self` is borrowed.
        self.first_node().map(|n| unsafe {
            let n = n.as_ref();
            (&n.key, &n.value)
        })
    }

    /// Returns the element with the maximum key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        // SAFETY: the node is live for as long as `self` is borrowed.
        self.last_node().map(|n| unsafe {
            let n = n.as_ref();
            (&n.key, &n.value)
        })
    }

    /// Returns a cursor at the minimum element, or at the end if empty.
    pub fn begin(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self, self.first_node())
    }

    /// Returns a cursor at the end sentinel, one past the maximum element.
    pub fn end(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self, None)
    }

    /// Returns a mutable cursor at the minimum element.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn begin_mut_in<'a, 's, A: Allocator>(
        &'s mut self,
        alloc: &'a A,
    ) -> CursorMut<'a, 's, A, K, V, C> {
        let first = self.first_node();
        CursorMut::new(alloc, self, first)
    }

    /// Returns an iterator over the elements, in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.raw_iter(), self.n)
    }

    /// Returns an iterator over the elements with mutable values, in ascending
    /// key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.raw_iter(), self.n)
    }

    /// Returns an iterator over the keys, in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns a mutable iterator over the values, in ascending key order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Replaces the child slot of `u`'s parent (or the root) with `v`.
    ///
    /// # Safety
    ///
    /// `u` and `v` MUST be live nodes of this tree.
    unsafe fn transplant(&mut self, u: NonNull<Node<K, V>>, v: Link<K, V>) {
        // SAFETY: all nodes touched are live nodes of this tree.
        unsafe {
            let parent = (*u.as_ptr()).parent;
            match parent {
                None => self.root = v,
                Some(p) => {
                    if (*p.as_ptr()).left == Some(u) {
                        (*p.as_ptr()).left = v;
                    } else {
                        (*p.as_ptr()).right = v;
                    }
                }
            }
            if let Some(v) = v {
                (*v.as_ptr()).parent = parent;
            }
        }
    }

    /// # Safety
    ///
    /// `x` MUST be a live node of this tree with a right child.
    unsafe fn rotate_left(&mut self, x: NonNull<Node<K, V>>) {
        // SAFETY: `x` and its right child are live; the links rewritten below
        // all belong to live nodes of this tree.
        unsafe {
            let Some(y) = (*x.as_ptr()).right else {
                unreachable!("rotate_left requires a right child");
            };
            (*x.as_ptr()).right = (*y.as_ptr()).left;
            if let Some(b) = (*y.as_ptr()).left {
                (*b.as_ptr()).parent = Some(x);
            }
            self.transplant(x, Some(y));
            (*y.as_ptr()).left = Some(x);
            (*x.as_ptr()).parent = Some(y);
        }
    }

    /// # Safety
    ///
    /// `x` MUST be a live node of this tree with a left child.
    unsafe fn rotate_right(&mut self, x: NonNull<Node<K, V>>) {
        // SAFETY: mirror of `rotate_left`.
        unsafe {
            let Some(y) = (*x.as_ptr()).left else {
                unreachable!("rotate_right requires a left child");
            };
            (*x.as_ptr()).left = (*y.as_ptr()).right;
            if let Some(b) = (*y.as_ptr()).right {
                (*b.as_ptr()).parent = Some(x);
            }
            self.transplant(x, Some(y));
            (*y.as_ptr()).right = Some(x);
            (*x.as_ptr()).parent = Some(y);
        }
    }

    /// Restores the red-black invariants after linking the red node `z`.
    ///
    /// # Safety
    ///
    /// `z` MUST be a live node of this tree.
    unsafe fn insert_fixup(&mut self, mut z: NonNull<Node<K, V>>) {
        // SAFETY: every node reached through parent/child links is live.
        unsafe {
            loop {
                let Some(mut p) = (*z.as_ptr()).parent else {
                    break;
                };
                if (*p.as_ptr()).color == Color::Black {
                    break;
                }
                // A red parent is never the root, so the grandparent exists.
                let Some(g) = (*p.as_ptr()).parent else {
                    break;
                };

                if (*g.as_ptr()).left == Some(p) {
                    match (*g.as_ptr()).right {
                        Some(u) if (*u.as_ptr()).color == Color::Red => {
                            (*p.as_ptr()).color = Color::Black;
                            (*u.as_ptr()).color = Color::Black;
                            (*g.as_ptr()).color = Color::Red;
                            z = g;
                        }
                        _ => {
                            if (*p.as_ptr()).right == Some(z) {
                                z = p;
                                self.rotate_left(z);
                                p = g_child(g, true);
                            }
                            (*p.as_ptr()).color = Color::Black;
                            (*g.as_ptr()).color = Color::Red;
                            self.rotate_right(g);
                        }
                    }
                } else {
                    match (*g.as_ptr()).left {
                        Some(u) if (*u.as_ptr()).color == Color::Red => {
                            (*p.as_ptr()).color = Color::Black;
                            (*u.as_ptr()).color = Color::Black;
                            (*g.as_ptr()).color = Color::Red;
                            z = g;
                        }
                        _ => {
                            if (*p.as_ptr()).left == Some(z) {
                                z = p;
                                self.rotate_right(z);
                                p = g_child(g, false);
                            }
                            (*p.as_ptr()).color = Color::Black;
                            (*g.as_ptr()).color = Color::Red;
                            self.rotate_left(g);
                        }
                    }
                }
            }
            if let Some(root) = self.root {
                (*root.as_ptr()).color = Color::Black;
            }
        }
    }

    /// Removes `z` from the tree structure and rebalances.
    ///
    /// A node with two children trades places (links and color) with its
    /// in-order successor first, so every surviving element stays in the
    /// node it was inserted in.
    ///
    /// # Safety
    ///
    /// `z` MUST be a live node of this tree.
    unsafe fn unlink(&mut self, z: NonNull<Node<K, V>>) {
        // SAFETY: every node reached through parent/child links is live.
        unsafe {
            let zp = z.as_ptr();
            let mut removed_color = (*zp).color;
            let x: Link<K, V>;
            let x_parent: Link<K, V>;

            match ((*zp).left, (*zp).right) {
                (None, right) => {
                    x = right;
                    x_parent = (*zp).parent;
                    self.transplant(z, right);
                }
                (left, None) => {
                    x = left;
                    x_parent = (*zp).parent;
                    self.transplant(z, left);
                }
                (Some(zl), Some(zr)) => {
                    let y = minimum(zr);
                    let yp = y.as_ptr();
                    removed_color = (*yp).color;
                    x = (*yp).right;
                    if (*yp).parent == Some(z) {
                        x_parent = Some(y);
                    } else {
                        x_parent = (*yp).parent;
                        self.transplant(y, (*yp).right);
                        (*yp).right = Some(zr);
                        (*zr.as_ptr()).parent = Some(y);
                    }
                    self.transplant(z, Some(y));
                    (*yp).left = Some(zl);
                    (*zl.as_ptr()).parent = Some(y);
                    (*yp).color = (*zp).color;
                }
            }

            (*zp).parent = None;
            (*zp).left = None;
            (*zp).right = None;
            self.n -= 1;

            if removed_color == Color::Black {
                self.erase_fixup(x, x_parent);
            }
        }
    }

    /// Absorbs the double-black deficiency left at `x` (child of `parent`).
    ///
    /// # Safety
    ///
    /// `x` and `parent` MUST be live nodes of this tree (or nil).
    unsafe fn erase_fixup(&mut self, mut x: Link<K, V>, mut parent: Link<K, V>) {
        // SAFETY: every node reached through parent/child links is live. A
        // double-black position always has a sibling by the black-height rule.
        unsafe {
            while x != self.root && is_black(x) {
                let Some(p) = parent else {
                    break;
                };
                if (*p.as_ptr()).left == x {
                    let Some(mut w) = (*p.as_ptr()).right else {
                        break;
                    };
                    if (*w.as_ptr()).color == Color::Red {
                        (*w.as_ptr()).color = Color::Black;
                        (*p.as_ptr()).color = Color::Red;
                        self.rotate_left(p);
                        w = g_child(p, false);
                    }
                    if is_black((*w.as_ptr()).left) && is_black((*w.as_ptr()).right) {
                        (*w.as_ptr()).color = Color::Red;
                        x = Some(p);
                        parent = (*p.as_ptr()).parent;
                    } else {
                        if is_black((*w.as_ptr()).right) {
                            if let Some(wl) = (*w.as_ptr()).left {
                                (*wl.as_ptr()).color = Color::Black;
                            }
                            (*w.as_ptr()).color = Color::Red;
                            self.rotate_right(w);
                            w = g_child(p, false);
                        }
                        (*w.as_ptr()).color = (*p.as_ptr()).color;
                        (*p.as_ptr()).color = Color::Black;
                        if let Some(wr) = (*w.as_ptr()).right {
                            (*wr.as_ptr()).color = Color::Black;
                        }
                        self.rotate_left(p);
                        x = self.root;
                        break;
                    }
                } else {
                    let Some(mut w) = (*p.as_ptr()).left else {
                        break;
                    };
                    if (*w.as_ptr()).color == Color::Red {
                        (*w.as_ptr()).color = Color::Black;
                        (*p.as_ptr()).color = Color::Red;
                        self.rotate_right(p);
                        w = g_child(p, true);
                    }
                    if is_black((*w.as_ptr()).right) && is_black((*w.as_ptr()).left) {
                        (*w.as_ptr()).color = Color::Red;
                        x = Some(p);
                        parent = (*p.as_ptr()).parent;
                    } else {
                        if is_black((*w.as_ptr()).left) {
                            if let Some(wr) = (*w.as_ptr()).right {
                                (*wr.as_ptr()).color = Color::Black;
                            }
                            (*w.as_ptr()).color = Color::Red;
                            self.rotate_left(w);
                            w = g_child(p, true);
                        }
                        (*w.as_ptr()).color = (*p.as_ptr()).color;
                        (*p.as_ptr()).color = Color::Black;
                        if let Some(wl) = (*w.as_ptr()).left {
                            (*wl.as_ptr()).color = Color::Black;
                        }
                        self.rotate_right(p);
                        x = self.root;
                        break;
                    }
                }
            }
            if let Some(x) = x {
                (*x.as_ptr()).color = Color::Black;
            }
        }
    }

    /// Unlinks `node` and returns its memory to `alloc`.
    ///
    /// # Safety
    ///
    /// `node` MUST be a live node of this tree and `alloc` MUST be the
    /// allocator used to allocate this object.
    pub(crate) unsafe fn remove_node_in<A: Allocator>(
        &mut self,
        alloc: &A,
        node: NonNull<Node<K, V>>,
    ) -> (K, V) {
        // SAFETY: requirements match function requirements
        unsafe {
            self.unlink(node);
            Node::destroy_in(alloc, node)
        }
    }

    /// Removes and returns the element with the minimum key.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn pop_first_in<A: Allocator>(&mut self, alloc: &A) -> Option<(K, V)> {
        let node = self.first_node()?;
        // SAFETY: `node` is live and `alloc` is this tree's allocator.
        Some(unsafe { self.remove_node_in(alloc, node) })
    }

    /// Removes and returns the element with the maximum key.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn pop_last_in<A: Allocator>(&mut self, alloc: &A) -> Option<(K, V)> {
        let node = self.last_node()?;
        // SAFETY: `node` is live and `alloc` is this tree's allocator.
        Some(unsafe { self.remove_node_in(alloc, node) })
    }

    /// Converts the tree into an owning iterator that releases nodes
    /// through `alloc`.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be, or refer to, the allocator used to allocate this object.
    pub(crate) unsafe fn into_iter_with<A: Allocator>(mut self, alloc: A) -> IntoIter<K, V, A> {
        let n = self.n;
        self.n = 0;
        IntoIter::new(alloc, self.root.take(), n)
    }

    /// Clears the tree, returning every node to `alloc`.
    ///
    /// This is a single post-order teardown; no rebalancing takes place.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn clear_in<A: Allocator>(&mut self, alloc: &A) {
        if self.n > 0 {
            log::debug!("releasing {} red-black tree nodes", self.n);
        }
        let mut current = self.root.take();
        // SAFETY: every node is visited once, after both of its children have
        // been released and unlinked from it.
        unsafe {
            while let Some(node) = current {
                let np = node.as_ptr();
                if let Some(left) = (*np).left {
                    current = Some(left);
                    continue;
                }
                if let Some(right) = (*np).right {
                    current = Some(right);
                    continue;
                }
                let parent = (*np).parent;
                if let Some(p) = parent {
                    if (*p.as_ptr()).left == Some(node) {
                        (*p.as_ptr()).left = None;
                    } else {
                        (*p.as_ptr()).right = None;
                    }
                }
                drop(Node::destroy_in(alloc, node));
                current = parent;
            }
        }
        self.n = 0;
    }
}

impl<K, V, C> AllocatedRedBlackTree<K, V, C> {
    fn search<Q>(&self, key: &Q) -> Search<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut parent = None;
        let mut left = false;
        let mut current = self.root;
        while let Some(n) = current {
            // SAFETY: nodes reached from the root are live.
            let node = unsafe { n.as_ref() };
            match checked_compare(&self.cmp, key, node.key.borrow()) {
                Ordering::Less => {
                    parent = current;
                    left = true;
                    current = node.left;
                }
                Ordering::Greater => {
                    parent = current;
                    left = false;
                    current = node.right;
                }
                Ordering::Equal => return Search::Found(n),
            }
        }
        Search::Vacant { parent, left }
    }

    fn find_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        match self.search(key) {
            Search::Found(n) => Some(n),
            Search::Vacant { .. } => None,
        }
    }

    /// The first node whose key satisfies `pred`, for a `pred` that is
    /// false then true along the in-order sequence.
    fn first_where(&self, pred: impl Fn(&K) -> bool) -> Link<K, V> {
        let mut found = None;
        let mut current = self.root;
        while let Some(n) = current {
            // SAFETY: nodes reached from the root are live.
            let node = unsafe { n.as_ref() };
            if pred(&node.key) {
                found = current;
                current = node.left;
            } else {
                current = node.right;
            }
        }
        found
    }

    /// The last node whose key satisfies `pred`, for a `pred` that is true
    /// then false along the in-order sequence.
    fn last_where(&self, pred: impl Fn(&K) -> bool) -> Link<K, V> {
        let mut found = None;
        let mut current = self.root;
        while let Some(n) = current {
            // SAFETY: nodes reached from the root are live.
            let node = unsafe { n.as_ref() };
            if pred(&node.key) {
                found = current;
                current = node.right;
            } else {
                current = node.left;
            }
        }
        found
    }

    fn lower_bound_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.first_where(|k| self.cmp.compare(k.borrow(), key) != Ordering::Less)
    }

    fn upper_bound_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.first_where(|k| self.cmp.compare(k.borrow(), key) == Ordering::Greater)
    }

    fn range_start<Q>(&self, bound: Bound<&Q>) -> Link<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        match bound {
            Bound::Included(key) => self.lower_bound_node(key),
            Bound::Excluded(key) => self.upper_bound_node(key),
            Bound::Unbounded => self.first_node(),
        }
    }

    fn range_end<Q>(&self, bound: Bound<&Q>) -> Link<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        match bound {
            Bound::Included(key) => {
                self.last_where(|k| self.cmp.compare(k.borrow(), key) != Ordering::Greater)
            }
            Bound::Excluded(key) => {
                self.last_where(|k| self.cmp.compare(k.borrow(), key) == Ordering::Less)
            }
            Bound::Unbounded => self.last_node(),
        }
    }

    /// Returns `true` if the tree contains an element with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.find_node(key).is_some()
    }

    /// Returns the number of elements with the given key: `0` or `1`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        usize::from(self.contains_key(key))
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        // SAFETY: the node is live for as long as `self` is borrowed.
        self.find_node(key).map(|n| unsafe { &n.as_ref().value })
    }

    /// Returns the stored key and value corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        // SAFETY: the node is live for as long as `self` is borrowed.
        self.find_node(key).map(|n| unsafe {
            let n = n.as_ref();
            (&n.key, &n.value)
        })
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        // SAFETY: the node is live and `self` is mutably borrowed.
        self.find_node(key)
            .map(|n| unsafe { &mut (*n.as_ptr()).value })
    }

    /// Returns a cursor at the element with the given key, or at the end if
    /// there is none.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor::new(self, self.find_node(key))
    }

    /// Returns a cursor at the first element whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor::new(self, self.lower_bound_node(key))
    }

    /// Returns a cursor at the first element whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor::new(self, self.upper_bound_node(key))
    }

    /// Returns an iterator over the elements whose keys fall in `range`.
    ///
    /// An inverted range yields nothing.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        let front = self.range_start(range.start_bound());
        let back = self.range_end(range.end_bound());
        let raw = match (front, back) {
            // SAFETY: both nodes are live.
            (Some(f), Some(b))
                if unsafe {
                    let (fk, bk): (&Q, &Q) = (f.as_ref().key.borrow(), b.as_ref().key.borrow());
                    self.cmp.compare(fk, bk) != Ordering::Greater
                } =>
            {
                RawIter::new(front, back)
            }
            _ => RawIter::new(None, None),
        };
        Range { raw, marker: PhantomData }
    }

    /// Returns a mutable cursor at the element with the given key, or at the
    /// end if there is none.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn find_mut_in<'a, 's, A: Allocator, Q>(
        &'s mut self,
        alloc: &'a A,
        key: &Q,
    ) -> CursorMut<'a, 's, A, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let node = self.find_node(key);
        CursorMut::new(alloc, self, node)
    }

    /// Returns a mutable cursor at the first element whose key is not less
    /// than `key`.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn lower_bound_mut_in<'a, 's, A: Allocator, Q>(
        &'s mut self,
        alloc: &'a A,
        key: &Q,
    ) -> CursorMut<'a, 's, A, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let node = self.lower_bound_node(key);
        CursorMut::new(alloc, self, node)
    }

    /// Removes the element with the given key, returning it.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn remove_entry_in<A: Allocator, Q>(&mut self, alloc: &A, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let node = self.find_node(key)?;
        // SAFETY: `node` is live and `alloc` is this tree's allocator.
        Some(unsafe { self.remove_node_in(alloc, node) })
    }

    /// Removes every element whose key falls in `range`, returning how many
    /// were removed.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn remove_range_in<A: Allocator, Q, R>(&mut self, alloc: &A, range: R) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        let mut current = self.range_start(range.start_bound());
        let mut removed = 0;
        while let Some(node) = current {
            // SAFETY: `node` is live until removed below.
            let key: &Q = unsafe { node.as_ref() }.key.borrow();
            let in_range = match range.end_bound() {
                Bound::Included(end) => self.cmp.compare(key, end) != Ordering::Greater,
                Bound::Excluded(end) => self.cmp.compare(key, end) == Ordering::Less,
                Bound::Unbounded => true,
            };
            if !in_range {
                break;
            }
            // SAFETY: removal never moves surviving elements between nodes, so
            // the successor stays valid across `remove_node_in`.
            unsafe {
                current = successor(node);
                drop(self.remove_node_in(alloc, node));
            }
            removed += 1;
        }
        removed
    }
}

impl<K, V, C: Comparator<K>> AllocatedRedBlackTree<K, V, C> {
    /// Allocates a node and links it at a vacant position found by `search`.
    ///
    /// # Safety
    ///
    /// `parent` and `left` MUST come from a `Search::Vacant` of this tree for
    /// `key`, with no mutation in between. `alloc` MUST be the allocator used
    /// to allocate this object.
    unsafe fn link_in<A: Allocator>(
        &mut self,
        alloc: &A,
        key: K,
        value: V,
        parent: Link<K, V>,
        left: bool,
    ) -> AllocResult<NonNull<Node<K, V>>> {
        let node = Node::create_in(alloc, key, value)?;
        // SAFETY: `node` is freshly allocated; `parent` is a live node with a
        // vacant slot on the recorded side.
        unsafe {
            (*node.as_ptr()).parent = parent;
            match parent {
                None => self.root = Some(node),
                Some(p) if left => (*p.as_ptr()).left = Some(node),
                Some(p) => (*p.as_ptr()).right = Some(node),
            }
            self.n += 1;
            self.insert_fixup(node);
        }
        Ok(node)
    }

    /// Inserts a new element, failing if the key is already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if an equal key exists, or
    /// [`Error::AllocationFailure`] if the node cannot be allocated. The tree
    /// is unchanged in both cases.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn try_insert_in<A: Allocator>(
        &mut self,
        alloc: &A,
        key: K,
        value: V,
    ) -> TreeResult<&mut V> {
        match self.search(&key) {
            Search::Found(_) => Err(Error::DuplicateKey),
            Search::Vacant { parent, left } => {
                // SAFETY: the vacancy was just found; `alloc` is this tree's allocator.
                let node = unsafe { self.link_in(alloc, key, value, parent, left)? };
                // SAFETY: `node` is live and `self` is mutably borrowed.
                Ok(unsafe { &mut (*node.as_ptr()).value })
            }
        }
    }

    /// Inserts an element, or replaces the value in place if the key is
    /// already present. Replacing never changes the tree's shape.
    ///
    /// Returns the previous value, if any.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn insert_or_assign_in<A: Allocator>(
        &mut self,
        alloc: &A,
        key: K,
        value: V,
    ) -> AllocResult<Option<V>> {
        match self.search(&key) {
            // SAFETY: the node is live and `self` is mutably borrowed.
            Search::Found(n) => Ok(Some(core::mem::replace(
                unsafe { &mut (*n.as_ptr()).value },
                value,
            ))),
            Search::Vacant { parent, left } => {
                // SAFETY: the vacancy was just found; `alloc` is this tree's allocator.
                unsafe { self.link_in(alloc, key, value, parent, left)? };
                Ok(None)
            }
        }
    }

    /// Returns the value for `key`, inserting `f()` first if it is absent.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn get_or_insert_with_in<A: Allocator, F: FnOnce() -> V>(
        &mut self,
        alloc: &A,
        key: K,
        f: F,
    ) -> AllocResult<&mut V> {
        let node = match self.search(&key) {
            Search::Found(n) => n,
            Search::Vacant { parent, left } => {
                // SAFETY: the vacancy was just found; `alloc` is this tree's allocator.
                unsafe { self.link_in(alloc, key, f(), parent, left)? }
            }
        };
        // SAFETY: `node` is live and `self` is mutably borrowed.
        Ok(unsafe { &mut (*node.as_ptr()).value })
    }
}

#[cfg(feature = "std")]
impl<K: fmt::Debug, V: fmt::Debug, C> AllocatedRedBlackTree<K, V, C> {
    /// Renders the tree structure, with node colors, as a Graphviz digraph.
    pub fn to_dot(&self) -> Result<String, Box<dyn StdError>> {
        let mut data = Vec::default();

        data.write_all(b"digraph G {\n")?;
        data.write_all(b"node [style=filled, fontcolor=white];\n")?;

        let mut stack: Vec<NonNull<Node<K, V>>> = self.root.into_iter().collect();
        while let Some(n) = stack.pop() {
            // SAFETY: nodes reached from the root are live.
            let node = unsafe { n.as_ref() };
            let fill = match node.color {
                Color::Red => "red",
                Color::Black => "black",
            };
            writeln!(
                data,
                "n{:p} [label=\"{:?}: {:?}\", fillcolor={}];",
                n.as_ptr(),
                node.key,
                node.value,
                fill
            )?;
            for child in [node.left, node.right].into_iter().flatten() {
                writeln!(data, "n{:p} -> n{:p};", n.as_ptr(), child.as_ptr())?;
                stack.push(child);
            }
        }
        data.write_all(b"}\n")?;

        Ok(String::from_utf8(data)?)
    }
}

/// The child of `p` on the given side, which the caller knows exists.
///
/// # Safety
///
/// `p` MUST be a live node.
unsafe fn g_child<K, V>(p: NonNull<Node<K, V>>, left: bool) -> NonNull<Node<K, V>> {
    // SAFETY: `p` is live.
    let node = unsafe { p.as_ref() };
    let child = if left { node.left } else { node.right };
    match child {
        Some(c) => c,
        None => unreachable!("red-black invariants guarantee this child"),
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AllocatedRedBlackTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> DropIn for AllocatedRedBlackTree<K, V, C> {
    /// # Safety
    ///
    /// `alloc` must be the allocator used to allocate this object.
    unsafe fn drop_in<A: Allocator>(&mut self, alloc: &A) {
        // SAFETY: requirements match function requirements
        unsafe {
            self.clear_in(alloc);
        }
    }
}

impl<'a, K, V, C: Comparator<K> + Default, A: Allocator> FromIteratorIn<'a, (K, V), A>
    for AllocatedRedBlackTree<K, V, C>
{
    /// Builds a tree from key-value pairs; for repeated keys the last value
    /// wins.
    fn from_iter_in<T>(alloc: &'a A, iter: T) -> DropGuardResult<Self, &'a A>
    where
        T: IntoIterator<Item = (K, V)>,
    {
        // SAFETY: an empty tree owns no allocations, so any allocator is safe here.
        let mut tree: DropGuard<Self, &'a A> = unsafe { DropGuard::new(Self::new(), alloc) };

        for (k, v) in iter {
            // Safety: `alloc` was used to create the `tree`
            unsafe {
                tree.insert_or_assign_in(alloc, k, v)?;
            }
        }

        Ok(tree)
    }
}

impl<'a, K, V, C, A: Allocator + 'a> IntoIteratorIn<'a, A> for AllocatedRedBlackTree<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, &'a A>;

    unsafe fn into_iter_in(self, alloc: &'a A) -> Self::IntoIter {
        // SAFETY: requirements match function requirements
        unsafe { self.into_iter_with(alloc) }
    }
}

impl<'s, K, V, C> IntoIterator for &'s AllocatedRedBlackTree<K, V, C> {
    type IntoIter = Iter<'s, K, V>;
    type Item = (&'s K, &'s V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, K, V, C> IntoIterator for &'s mut AllocatedRedBlackTree<K, V, C> {
    type IntoIter = IterMut<'s, K, V>;
    type Item = (&'s K, &'s mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
