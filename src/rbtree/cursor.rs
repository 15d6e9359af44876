//! Bidirectional positions within a tree.
//!
//! A cursor points either at an element or at the end sentinel, one past the
//! maximum. Moving forward from the maximum reaches the end; moving backward
//! from the end reaches the maximum. Dereferencing the end sentinel, moving
//! forward from it, or moving backward from the minimum is reported as
//! [`Error::InvalidIterator`] and leaves the cursor where it was.
//!
//! Cursors borrow their tree, so no cursor can observe a node after it has
//! been erased: the only way to erase by position is [`CursorMut::remove_current`].

use core::fmt;
use core::ptr;
use core::ptr::NonNull;

use allocator_api2::alloc::Allocator;

use crate::error::{Error, TreeResult};

use super::node::{predecessor, successor, Link, Node};
use super::AllocatedRedBlackTree;

/// A read-only cursor over an [`AllocatedRedBlackTree`].
///
/// Two cursors are equal when they belong to the same tree and point at the
/// same position.
pub struct Cursor<'a, K, V, C> {
    tree: &'a AllocatedRedBlackTree<K, V, C>,
    current: Link<K, V>,
}

// SAFETY: a `Cursor` is a shared borrow of the tree plus a position in it.
unsafe impl<K: Sync, V: Sync, C: Sync> Send for Cursor<'_, K, V, C> {}
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for Cursor<'_, K, V, C> {}

impl<'a, K, V, C> Cursor<'a, K, V, C> {
    pub(super) fn new(tree: &'a AllocatedRedBlackTree<K, V, C>, current: Link<K, V>) -> Self {
        Self { tree, current }
    }

    /// Returns `true` if the cursor is at the end sentinel.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the key at the cursor, or `None` at the end.
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    /// Returns the value at the cursor, or `None` at the end.
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, v)| v)
    }

    /// Returns the element at the cursor, or `None` at the end.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        // SAFETY: the tree is borrowed for 'a, so the node is live.
        self.current.map(|n| unsafe {
            let n = n.as_ref();
            (&n.key, &n.value)
        })
    }

    /// Dereferences the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] at the end sentinel.
    pub fn get(&self) -> TreeResult<(&'a K, &'a V)> {
        self.key_value().ok_or(Error::InvalidIterator)
    }

    /// Advances to the in-order successor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] at the end sentinel.
    pub fn move_next(&mut self) -> TreeResult<()> {
        let node = self.current.ok_or(Error::InvalidIterator)?;
        // SAFETY: the tree is borrowed, so the node is live.
        self.current = unsafe { successor(node) };
        Ok(())
    }

    /// Retreats to the in-order predecessor; from the end sentinel this is
    /// the maximum element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] at the minimum element or when the
    /// tree is empty.
    pub fn move_prev(&mut self) -> TreeResult<()> {
        self.current = Some(step_back(self.tree, self.current)?);
        Ok(())
    }
}

fn step_back<K, V, C>(
    tree: &AllocatedRedBlackTree<K, V, C>,
    current: Link<K, V>,
) -> TreeResult<NonNull<Node<K, V>>> {
    match current {
        None => tree.last_node(),
        // SAFETY: the tree is borrowed, so the node is live.
        Some(node) => unsafe { predecessor(node) },
    }
    .ok_or(Error::InvalidIterator)
}

impl<K, V, C> Clone for Cursor<'_, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C> Copy for Cursor<'_, K, V, C> {}

impl<K, V, C> PartialEq for Cursor<'_, K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.current == other.current
    }
}

impl<K, V, C> Eq for Cursor<'_, K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Cursor<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

/// A cursor that can modify values and erase elements.
///
/// Created by [`AllocatedRedBlackTree::begin_mut_in`] and friends, or by the
/// façades' `*_mut` cursor methods.
pub struct CursorMut<'a, 's, A: Allocator, K, V, C> {
    alloc: &'a A,
    tree: &'s mut AllocatedRedBlackTree<K, V, C>,
    current: Link<K, V>,
}

// SAFETY: a `CursorMut` is a unique borrow of the tree plus a position in it.
unsafe impl<A: Allocator + Sync, K: Send, V: Send, C: Send> Send
    for CursorMut<'_, '_, A, K, V, C>
{
}
unsafe impl<A: Allocator + Sync, K: Sync, V: Sync, C: Sync> Sync
    for CursorMut<'_, '_, A, K, V, C>
{
}

impl<'a, 's, A: Allocator, K, V, C> CursorMut<'a, 's, A, K, V, C> {
    /// `alloc` must be the allocator used for `tree`.
    pub(super) fn new(
        alloc: &'a A,
        tree: &'s mut AllocatedRedBlackTree<K, V, C>,
        current: Link<K, V>,
    ) -> Self {
        Self {
            alloc,
            tree,
            current,
        }
    }

    /// Returns `true` if the cursor is at the end sentinel.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the key at the cursor, or `None` at the end.
    pub fn key(&self) -> Option<&K> {
        // SAFETY: the tree is borrowed, so the node is live.
        self.current.map(|n| unsafe { &(*n.as_ptr()).key })
    }

    /// Returns the value at the cursor, or `None` at the end.
    pub fn value(&self) -> Option<&V> {
        // SAFETY: the tree is borrowed, so the node is live.
        self.current.map(|n| unsafe { &(*n.as_ptr()).value })
    }

    /// Returns the value at the cursor mutably, or `None` at the end.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        // SAFETY: the tree is mutably borrowed through `self`.
        self.current.map(|n| unsafe { &mut (*n.as_ptr()).value })
    }

    /// Dereferences the cursor mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] at the end sentinel.
    pub fn get_mut(&mut self) -> TreeResult<(&K, &mut V)> {
        let node = self.current.ok_or(Error::InvalidIterator)?;
        // SAFETY: the tree is mutably borrowed through `self`.
        let node = unsafe { &mut *node.as_ptr() };
        Ok((&node.key, &mut node.value))
    }

    /// Advances to the in-order successor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] at the end sentinel.
    pub fn move_next(&mut self) -> TreeResult<()> {
        let node = self.current.ok_or(Error::InvalidIterator)?;
        // SAFETY: the tree is borrowed, so the node is live.
        self.current = unsafe { successor(node) };
        Ok(())
    }

    /// Retreats to the in-order predecessor; from the end sentinel this is
    /// the maximum element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] at the minimum element or when the
    /// tree is empty.
    pub fn move_prev(&mut self) -> TreeResult<()> {
        self.current = Some(step_back(self.tree, self.current)?);
        Ok(())
    }

    /// Erases the element at the cursor and moves to its successor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterator`] at the end sentinel.
    pub fn remove_current(&mut self) -> TreeResult<(K, V)> {
        let node = self.current.ok_or(Error::InvalidIterator)?;
        // SAFETY: `node` is live, and removal never moves surviving elements
        // between nodes, so the successor stays valid. `alloc` is the tree's
        // allocator by construction.
        unsafe {
            let next = successor(node);
            let removed = self.tree.remove_node_in(self.alloc, node);
            self.current = next;
            Ok(removed)
        }
    }

    /// Returns a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self.tree, self.current)
    }
}
