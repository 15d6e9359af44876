//! Ordered map that owns its allocator.
//!
//! This module provides [`TreeMap<K, V, C, A>`], a wrapper around
//! [`AllocatedRedBlackTree`] that stores the allocator next to the tree,
//! making it safe to use without passing the allocator to every call.

use core::borrow::Borrow;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::RangeBounds;
use core::ptr;

use allocator_api2::alloc::{Allocator, Global};

use allocated::{AllocResultExt, DropIn, FromIteratorIn};

use crate::compare::{Comparator, NaturalOrder};
use crate::error::{Error, TreeResult};
use crate::rbtree::{
    AllocatedRedBlackTree, Cursor, CursorMut, IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys,
    Range, Values, ValuesMut,
};

#[cfg(test)]
mod tests;

/// An ordered map backed by a red-black tree that owns its allocator.
///
/// Keys are unique. Every fallible operation reports failure as an
/// [`Error`]; allocation failure leaves the map exactly as it was.
///
/// # Example
///
/// ```
/// use allocated_rbtree::{Error, TreeMap};
///
/// let mut map = TreeMap::new();
/// map.insert("b", 2)?;
/// map.insert("a", 1)?;
///
/// assert_eq!(map.insert("a", 10), Err(Error::DuplicateKey));
/// assert_eq!(map.insert_or_assign("a", 10)?, Some(1));
/// assert_eq!(map.at(&"a")?, &10);
/// assert_eq!(map.at(&"z"), Err(Error::KeyNotFound));
///
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, ["a", "b"]);
/// # Ok::<(), Error>(())
/// ```
pub struct TreeMap<K, V, C = NaturalOrder, A: Allocator = Global> {
    alloc: A,
    raw: ManuallyDrop<AllocatedRedBlackTree<K, V, C>>,
    capacity_hint: usize,
}

impl<K, V> TreeMap<K, V> {
    /// Creates an empty map using the global allocator.
    #[inline]
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty map that reports at least `capacity` from
    /// [`capacity`](Self::capacity).
    ///
    /// Nodes are still allocated one at a time; the hint is advisory.
    pub fn with_capacity_hint(capacity: usize) -> Self {
        Self::with_capacity_hint_in(NaturalOrder, Global, capacity)
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`, using the global allocator.
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_in(cmp, Global)
    }
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, A: Allocator> Drop for TreeMap<K, V, C, A> {
    fn drop(&mut self) {
        // SAFETY: `self.raw` was allocated by `self.alloc`
        unsafe {
            self.raw.drop_in(&self.alloc);
        }
    }
}

impl<K, V, C: Default, A: Allocator> TreeMap<K, V, C, A> {
    /// Creates an empty map using the provided allocator.
    pub fn new_in(alloc: A) -> Self {
        Self::with_comparator_in(C::default(), alloc)
    }
}

impl<K, V, C, A: Allocator> TreeMap<K, V, C, A> {
    /// Creates an empty map ordered by `cmp`, using the provided allocator.
    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        Self::with_capacity_hint_in(cmp, alloc, 0)
    }

    /// Creates an empty map ordered by `cmp`, using the provided allocator,
    /// that reports at least `capacity` from [`capacity`](Self::capacity).
    pub fn with_capacity_hint_in(cmp: C, alloc: A, capacity: usize) -> Self {
        Self {
            alloc,
            raw: ManuallyDrop::new(AllocatedRedBlackTree::with_comparator(cmp)),
            capacity_hint: capacity,
        }
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the capacity hint given at construction, or [`len`](Self::len)
    /// if that is larger.
    pub fn capacity(&self) -> usize {
        self.capacity_hint.max(self.len())
    }

    /// Returns the comparator ordering this map.
    pub fn comparator(&self) -> &C {
        self.raw.comparator()
    }

    /// Returns a reference to the allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Removes every element, returning all nodes to the allocator.
    pub fn clear(&mut self) {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.clear_in(&self.alloc) }
    }

    /// Returns the first key-value pair in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the last key-value pair in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Removes and returns the first element in the map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.pop_first_in(&self.alloc) }
    }

    /// Removes and returns the last element in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.pop_last_in(&self.alloc) }
    }

    /// Returns a cursor at the first element, or at the end if empty.
    pub fn begin(&self) -> Cursor<'_, K, V, C> {
        self.raw.begin()
    }

    /// Returns a cursor one past the last element.
    pub fn end(&self) -> Cursor<'_, K, V, C> {
        self.raw.end()
    }

    /// Returns a mutable cursor at the first element.
    pub fn begin_mut(&mut self) -> CursorMut<'_, '_, A, K, V, C> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.begin_mut_in(&self.alloc) }
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.raw.iter()
    }

    /// Gets an iterator over the entries of the map with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.raw.iter_mut()
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.raw.keys()
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        self.raw.values()
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        self.raw.values_mut()
    }

    /// Consumes the map, yielding its keys in sorted order.
    pub fn into_keys(self) -> IntoKeys<K, V, A> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }

    /// Consumes the map, yielding its values in order by key.
    pub fn into_values(self) -> IntoValues<K, V, A> {
        IntoValues {
            inner: self.into_iter(),
        }
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.contains_key(key)
    }

    /// Returns the number of elements with the given key: `0` or `1`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.count(key)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.get(key)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.get_key_value(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.get_mut(key)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    pub fn at<Q>(&self, key: &Q) -> TreeResult<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    pub fn at_mut<Q>(&mut self, key: &Q) -> TreeResult<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a cursor at the element with the given key, or at the end.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.find(key)
    }

    /// Returns a mutable cursor at the element with the given key, or at
    /// the end.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, '_, A, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.find_mut_in(&self.alloc, key) }
    }

    /// Returns a cursor at the first element whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.lower_bound(key)
    }

    /// Returns a mutable cursor at the first element whose key is not less
    /// than `key`.
    pub fn lower_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, '_, A, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.lower_bound_mut_in(&self.alloc, key) }
    }

    /// Returns a cursor at the first element whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.raw.upper_bound(key)
    }

    /// Gets an iterator over the entries whose keys fall in `range`.
    ///
    /// ```
    /// use allocated_rbtree::TreeMap;
    ///
    /// let map: TreeMap<u32, char> = [(1, 'a'), (2, 'b'), (3, 'c'), (4, 'd')]
    ///     .into_iter()
    ///     .collect();
    /// let middle: Vec<_> = map.range(2..4).map(|(_, v)| *v).collect();
    /// assert_eq!(middle, ['b', 'c']);
    /// ```
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        self.raw.range(range)
    }

    /// Removes the element with the given key, returning its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    pub fn erase<Q>(&mut self, key: &Q) -> TreeResult<V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.remove(key).ok_or(Error::KeyNotFound)
    }

    /// Removes the element with the given key, returning its value if it
    /// was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the element with the given key, returning the stored key and
    /// value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.remove_entry_in(&self.alloc, key) }
    }

    /// Removes every element whose key falls in `range`, returning how many
    /// were removed.
    pub fn remove_range<Q, R>(&mut self, range: R) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.remove_range_in(&self.alloc, range) }
    }
}

impl<K, V, C: Comparator<K>, A: Allocator> TreeMap<K, V, C, A> {
    /// Inserts a new key-value pair, returning a reference to the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the key is already present, or
    /// [`Error::AllocationFailure`] if the node cannot be allocated. The map
    /// is unchanged in both cases.
    pub fn insert(&mut self, key: K, value: V) -> TreeResult<&mut V> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.try_insert_in(&self.alloc, key, value) }
    }

    /// Inserts a key-value pair, replacing the value of an existing key.
    ///
    /// Returns the previous value, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if a new node cannot be allocated.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> TreeResult<Option<V>> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        Ok(unsafe { self.raw.insert_or_assign_in(&self.alloc, key, value)? })
    }

    /// Returns the value for `key`, inserting `f()` first if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if a new node cannot be allocated.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, f: F) -> TreeResult<&mut V> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        Ok(unsafe { self.raw.get_or_insert_with_in(&self.alloc, key, f)? })
    }

    /// Returns the value for `key`, inserting `V::default()` first if it is
    /// absent.
    ///
    /// ```
    /// use allocated_rbtree::TreeMap;
    ///
    /// let mut counts: TreeMap<&str, u32> = TreeMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.get_or_insert_default(word)? += 1;
    /// }
    /// assert_eq!(counts.at(&"a")?, &2);
    /// # Ok::<(), allocated_rbtree::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if a new node cannot be allocated.
    pub fn get_or_insert_default(&mut self, key: K) -> TreeResult<&mut V>
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }
}

#[cfg(feature = "std")]
impl<K: fmt::Debug, V: fmt::Debug, C, A: Allocator> TreeMap<K, V, C, A> {
    /// Renders the underlying tree, with node colors, as a Graphviz digraph.
    pub fn to_dot(
        &self,
    ) -> Result<alloc::string::String, alloc::boxed::Box<dyn std::error::Error>> {
        self.raw.to_dot()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, A: Allocator> fmt::Debug for TreeMap<K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.raw, f)
    }
}

impl<K: PartialEq, V: PartialEq, C, A: Allocator> PartialEq for TreeMap<K, V, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C, A: Allocator> Eq for TreeMap<K, V, C, A> {}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for TreeMap<K, V, C> {
    /// Creates a map from an iterator of key-value pairs.
    ///
    /// If the iterator yields multiple values for the same key, the last value wins.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails during construction.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let alloc = Global;
        let raw = AllocatedRedBlackTree::from_iter_in(&alloc, iter)
            .handle_alloc_error()
            .into_inner();
        Self {
            alloc,
            raw,
            capacity_hint: 0,
        }
    }
}

impl<K, V, C: Comparator<K>, A: Allocator> Extend<(K, V)> for TreeMap<K, V, C, A> {
    /// Extends the map with the contents of an iterator.
    ///
    /// If the iterator yields duplicate keys, the last value wins.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails during insertion.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            // SAFETY: `self.alloc` was used to allocate `self.raw`
            let _ = unsafe { self.raw.insert_or_assign_in(&self.alloc, k, v) }.handle_alloc_error();
        }
    }
}

impl<K, V, C, A: Allocator> IntoIterator for TreeMap<K, V, C, A> {
    type IntoIter = IntoIter<K, V, A>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so each field is moved out exactly
        // once; `this.alloc` was used to allocate `this.raw`.
        unsafe {
            let alloc = ptr::read(&this.alloc);
            let raw = ManuallyDrop::take(&mut this.raw);
            raw.into_iter_with(alloc)
        }
    }
}

impl<'s, K, V, C, A: Allocator> IntoIterator for &'s TreeMap<K, V, C, A> {
    type IntoIter = Iter<'s, K, V>;
    type Item = (&'s K, &'s V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, K, V, C, A: Allocator> IntoIterator for &'s mut TreeMap<K, V, C, A> {
    type IntoIter = IterMut<'s, K, V>;
    type Item = (&'s K, &'s mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
