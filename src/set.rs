//! Ordered set that owns its allocator.
//!
//! [`TreeSet<K, C, A>`] is a [`TreeMap`] with unit values; it shares the
//! map's ordering, cursor and error semantics.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::RangeBounds;

use allocator_api2::alloc::{Allocator, Global};

use crate::compare::{Comparator, NaturalOrder};
use crate::error::TreeResult;
use crate::map::TreeMap;
use crate::rbtree::{self, Cursor, CursorMut};

#[cfg(test)]
mod tests;

/// An ordered set backed by a red-black tree that owns its allocator.
///
/// # Example
///
/// ```
/// use allocated_rbtree::{Error, TreeSet};
///
/// let mut set = TreeSet::new();
/// set.insert(3)?;
/// set.insert(1)?;
/// assert_eq!(set.insert(3), Err(Error::DuplicateKey));
///
/// assert!(set.contains(&1));
/// assert_eq!(set.first(), Some(&1));
/// set.erase(&1)?;
/// assert_eq!(set.erase(&1), Err(Error::KeyNotFound));
/// # Ok::<(), Error>(())
/// ```
pub struct TreeSet<K, C = NaturalOrder, A: Allocator = Global> {
    map: TreeMap<K, (), C, A>,
}

impl<K> TreeSet<K> {
    /// Creates an empty set using the global allocator.
    #[inline]
    pub fn new() -> Self {
        Self { map: TreeMap::new() }
    }

    /// Creates an empty set that reports at least `capacity` from
    /// [`capacity`](Self::capacity).
    pub fn with_capacity_hint(capacity: usize) -> Self {
        Self {
            map: TreeMap::with_capacity_hint(capacity),
        }
    }
}

impl<K, C> TreeSet<K, C> {
    /// Creates an empty set ordered by `cmp`, using the global allocator.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            map: TreeMap::with_comparator(cmp),
        }
    }
}

impl<K> Default for TreeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C: Default, A: Allocator> TreeSet<K, C, A> {
    /// Creates an empty set using the provided allocator.
    pub fn new_in(alloc: A) -> Self {
        Self {
            map: TreeMap::new_in(alloc),
        }
    }
}

impl<K, C, A: Allocator> TreeSet<K, C, A> {
    /// Creates an empty set ordered by `cmp`, using the provided allocator.
    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        Self {
            map: TreeMap::with_comparator_in(cmp, alloc),
        }
    }

    /// Creates an empty set ordered by `cmp`, using the provided allocator,
    /// that reports at least `capacity` from [`capacity`](Self::capacity).
    pub fn with_capacity_hint_in(cmp: C, alloc: A, capacity: usize) -> Self {
        Self {
            map: TreeMap::with_capacity_hint_in(cmp, alloc, capacity),
        }
    }

    /// Returns the number of elements in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the capacity hint, or [`len`](Self::len) if that is larger.
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns the smallest element.
    pub fn first(&self) -> Option<&K> {
        self.map.first_key_value().map(|(k, _)| k)
    }

    /// Returns the largest element.
    pub fn last(&self) -> Option<&K> {
        self.map.last_key_value().map(|(k, _)| k)
    }

    /// Removes and returns the smallest element.
    pub fn pop_first(&mut self) -> Option<K> {
        self.map.pop_first().map(|(k, _)| k)
    }

    /// Removes and returns the largest element.
    pub fn pop_last(&mut self) -> Option<K> {
        self.map.pop_last().map(|(k, _)| k)
    }

    /// Returns a cursor at the smallest element, or at the end if empty.
    pub fn begin(&self) -> Cursor<'_, K, (), C> {
        self.map.begin()
    }

    /// Returns a cursor one past the largest element.
    pub fn end(&self) -> Cursor<'_, K, (), C> {
        self.map.end()
    }

    /// Returns a mutable cursor at the smallest element, for erasing by
    /// position.
    pub fn begin_mut(&mut self) -> CursorMut<'_, '_, A, K, (), C> {
        self.map.begin_mut()
    }

    /// Gets an iterator over the elements, in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.map.keys(),
        }
    }

    /// Returns `true` if the set contains the element.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Returns `1` if the set contains the element, otherwise `0`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.count(key)
    }

    /// Returns the stored element equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.get_key_value(key).map(|(k, _)| k)
    }

    /// Returns a cursor at the element, or at the end.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, (), C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.find(key)
    }

    /// Returns a mutable cursor at the element, or at the end.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, '_, A, K, (), C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.find_mut(key)
    }

    /// Returns a cursor at the first element not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, (), C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.lower_bound(key)
    }

    /// Returns a cursor at the first element greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, (), C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.upper_bound(key)
    }

    /// Gets an iterator over the elements that fall in `range`.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        Range {
            inner: self.map.range(range),
        }
    }

    /// Removes the element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`](crate::Error::KeyNotFound) if the
    /// element is absent.
    pub fn erase<Q>(&mut self, key: &Q) -> TreeResult<()>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.erase(key)
    }

    /// Removes the element, returning whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.remove(key).is_some()
    }

    /// Removes and returns the stored element equal to `key`.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.map.remove_entry(key).map(|(k, _)| k)
    }

    /// Removes every element that falls in `range`, returning how many
    /// were removed.
    pub fn remove_range<Q, R>(&mut self, range: R) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        self.map.remove_range(range)
    }
}

impl<K, C: Comparator<K>, A: Allocator> TreeSet<K, C, A> {
    /// Adds an element to the set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`](crate::Error::DuplicateKey) if an equal
    /// element is present, or
    /// [`Error::AllocationFailure`](crate::Error::AllocationFailure) if the
    /// node cannot be allocated.
    pub fn insert(&mut self, key: K) -> TreeResult<()> {
        self.map.insert(key, ())?;
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<K: fmt::Debug, C, A: Allocator> TreeSet<K, C, A> {
    /// Renders the underlying tree, with node colors, as a Graphviz digraph.
    pub fn to_dot(
        &self,
    ) -> Result<alloc::string::String, alloc::boxed::Box<dyn std::error::Error>> {
        self.map.to_dot()
    }
}

impl<K: fmt::Debug, C, A: Allocator> fmt::Debug for TreeSet<K, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, C, A: Allocator> PartialEq for TreeSet<K, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K: Eq, C, A: Allocator> Eq for TreeSet<K, C, A> {}

impl<K, C: Comparator<K> + Default> FromIterator<K> for TreeSet<K, C> {
    /// Creates a set from an iterator; repeated elements are kept once.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails during construction.
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().map(|k| (k, ())).collect(),
        }
    }
}

impl<K, C: Comparator<K>, A: Allocator> Extend<K> for TreeSet<K, C, A> {
    /// Extends the set with the contents of an iterator.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails during insertion.
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        self.map.extend(iter.into_iter().map(|k| (k, ())));
    }
}

impl<K, C, A: Allocator> IntoIterator for TreeSet<K, C, A> {
    type IntoIter = IntoIter<K, A>;
    type Item = K;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.map.into_keys(),
        }
    }
}

impl<'s, K, C, A: Allocator> IntoIterator for &'s TreeSet<K, C, A> {
    type IntoIter = Iter<'s, K>;
    type Item = &'s K;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the elements of a [`TreeSet`], in ascending order.
pub struct Iter<'a, K> {
    inner: rbtree::Keys<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

/// An iterator over a range of elements of a [`TreeSet`].
pub struct Range<'a, K> {
    inner: rbtree::Range<'a, K, ()>,
}

impl<'a, K> Iterator for Range<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<K> DoubleEndedIterator for Range<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K> FusedIterator for Range<'_, K> {}

/// An owning iterator over the elements of a [`TreeSet`], in ascending order.
pub struct IntoIter<K, A: Allocator> {
    inner: rbtree::IntoKeys<K, (), A>,
}

impl<K, A: Allocator> Iterator for IntoIter<K, A> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, A: Allocator> DoubleEndedIterator for IntoIter<K, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, A: Allocator> ExactSizeIterator for IntoIter<K, A> {}
impl<K, A: Allocator> FusedIterator for IntoIter<K, A> {}
