use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

use allocator_api2::alloc::Allocator;

use super::node::{predecessor, successor, Link, Node};

/// A pair of in-order positions closing in on each other.
///
/// Both ends are inclusive; the iterator is exhausted once they cross.
pub(crate) struct RawIter<K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
}

impl<K, V> Clone for RawIter<K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
        }
    }
}

impl<K, V> RawIter<K, V> {
    pub(crate) fn new(front: Link<K, V>, back: Link<K, V>) -> Self {
        Self { front, back }
    }

    fn next_front(&mut self) -> Option<NonNull<Node<K, V>>> {
        let node = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            // SAFETY: `node` is live while the tree is borrowed by the iterator.
            self.front = unsafe { successor(node) };
        }
        Some(node)
    }

    fn next_back(&mut self) -> Option<NonNull<Node<K, V>>> {
        let node = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            // SAFETY: `node` is live while the tree is borrowed by the iterator.
            self.back = unsafe { predecessor(node) };
        }
        Some(node)
    }
}

/// An iterator over the elements of a tree, in ascending key order.
///
/// This struct is created by the [`iter`](super::AllocatedRedBlackTree::iter)
/// method on [`AllocatedRedBlackTree`](super::AllocatedRedBlackTree).
pub struct Iter<'a, K, V> {
    raw: RawIter<K, V>,
    len: usize,
    marker: PhantomData<&'a Node<K, V>>,
}

// SAFETY: `Iter` only hands out shared references into the borrowed tree.
unsafe impl<K: Sync, V: Sync> Send for Iter<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            len: self.len,
            marker: PhantomData,
        }
    }
}

impl<K, V> Iter<'_, K, V> {
    pub(crate) fn new(raw: RawIter<K, V>, len: usize) -> Self {
        Self {
            raw,
            len,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.raw.next_front()?;
        self.len -= 1;
        // SAFETY: the tree is borrowed for 'a.
        let node = unsafe { node.as_ref() };
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = self.raw.next_back()?;
        self.len -= 1;
        // SAFETY: the tree is borrowed for 'a.
        let node = unsafe { node.as_ref() };
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the elements of a tree with mutable values.
///
/// This struct is created by the
/// [`iter_mut`](super::AllocatedRedBlackTree::iter_mut) method.
pub struct IterMut<'a, K, V> {
    raw: RawIter<K, V>,
    len: usize,
    marker: PhantomData<&'a mut Node<K, V>>,
}

// SAFETY: `IterMut` behaves like `&mut V` paired with `&K`.
unsafe impl<K: Sync, V: Send> Send for IterMut<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for IterMut<'_, K, V> {}

impl<K, V> IterMut<'_, K, V> {
    pub(crate) fn new(raw: RawIter<K, V>, len: usize) -> Self {
        Self {
            raw,
            len,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.raw.next_front()?;
        self.len -= 1;
        // SAFETY: the tree is mutably borrowed for 'a and each node is yielded once.
        let node = unsafe { &mut *node.as_ptr() };
        Some((&node.key, &mut node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = self.raw.next_back()?;
        self.len -= 1;
        // SAFETY: the tree is mutably borrowed for 'a and each node is yielded once.
        let node = unsafe { &mut *node.as_ptr() };
        Some((&node.key, &mut node.value))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a tree, in ascending order.
pub struct Keys<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a tree, in ascending key order.
pub struct Values<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a tree, in ascending key order.
pub struct ValuesMut<'a, K, V> {
    pub(super) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An iterator over a key range of a tree.
///
/// This struct is created by the [`range`](super::AllocatedRedBlackTree::range)
/// method.
pub struct Range<'a, K, V> {
    pub(super) raw: RawIter<K, V>,
    pub(super) marker: PhantomData<&'a Node<K, V>>,
}

// SAFETY: as for `Iter`.
unsafe impl<K: Sync, V: Sync> Send for Range<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Range<'_, K, V> {}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the tree is borrowed for 'a.
        let node = unsafe { self.raw.next_front()?.as_ref() };
        Some((&node.key, &node.value))
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: the tree is borrowed for 'a.
        let node = unsafe { self.raw.next_back()?.as_ref() };
        Some((&node.key, &node.value))
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

/// An owning iterator over the elements of a tree, in ascending key order.
///
/// Every node is returned to the allocator as soon as its element has been
/// yielded; dropping the iterator releases the rest.
pub struct IntoIter<K, V, A: Allocator> {
    alloc: A,
    // The nodes form an in-order list: `left` is the previous node and
    // `right` the next one. Parent links are stale.
    front: Link<K, V>,
    back: Link<K, V>,
    len: usize,
}

// SAFETY: the iterator uniquely owns the remaining nodes.
unsafe impl<K: Send, V: Send, A: Allocator + Send> Send for IntoIter<K, V, A> {}

// SAFETY: `&IntoIter` gives no access to keys or values.
unsafe impl<K: Sync, V: Sync, A: Allocator + Sync> Sync for IntoIter<K, V, A> {}

impl<K, V, A: Allocator> IntoIter<K, V, A> {
    pub(crate) fn new(alloc: A, root: Link<K, V>, len: usize) -> Self {
        let mut head = None;
        let mut tail: Link<K, V> = None;
        let mut current = root;
        // Rotate left subtrees up until the current node is the minimum of
        // what remains, then append it to the list and continue with its
        // right subtree.
        while let Some(node) = current {
            let np = node.as_ptr();
            // SAFETY: the iterator owns every node reachable from `root`. A
            // node's `right` is only overwritten once the walk has left it.
            unsafe {
                if let Some(left) = (*np).left {
                    (*np).left = (*left.as_ptr()).right;
                    (*left.as_ptr()).right = Some(node);
                    current = Some(left);
                } else {
                    current = (*np).right;
                    (*np).left = tail;
                    match tail {
                        Some(t) => (*t.as_ptr()).right = Some(node),
                        None => head = Some(node),
                    }
                    tail = Some(node);
                }
            }
        }
        if let Some(t) = tail {
            // SAFETY: `t` is the last node of the list.
            unsafe { (*t.as_ptr()).right = None };
        }
        Self {
            alloc,
            front: head,
            back: tail,
            len,
        }
    }
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let node = self.front?;
        // SAFETY: `node` is still owned by the iterator, and `len` stops the
        // walk before a released node is reached.
        unsafe {
            self.front = (*node.as_ptr()).right;
            self.len -= 1;
            Some(Node::destroy_in(&self.alloc, node))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V, A: Allocator> DoubleEndedIterator for IntoIter<K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let node = self.back?;
        // SAFETY: as in `next`.
        unsafe {
            self.back = (*node.as_ptr()).left;
            self.len -= 1;
            Some(Node::destroy_in(&self.alloc, node))
        }
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoIter<K, V, A> {}

impl<K, V, A: Allocator> Drop for IntoIter<K, V, A> {
    fn drop(&mut self) {
        if self.len > 0 {
            log::trace!("dropping {} unconsumed red-black tree elements", self.len);
        }
        for _ in self.by_ref() {}
    }
}

/// An owning iterator over the keys of a tree, in ascending order.
pub struct IntoKeys<K, V, A: Allocator> {
    pub(crate) inner: IntoIter<K, V, A>,
}

impl<K, V, A: Allocator> Iterator for IntoKeys<K, V, A> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> DoubleEndedIterator for IntoKeys<K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoKeys<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoKeys<K, V, A> {}

/// An owning iterator over the values of a tree, in ascending key order.
pub struct IntoValues<K, V, A: Allocator> {
    pub(crate) inner: IntoIter<K, V, A>,
}

impl<K, V, A: Allocator> Iterator for IntoValues<K, V, A> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> DoubleEndedIterator for IntoValues<K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoValues<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoValues<K, V, A> {}
