use core::alloc::Layout;
use core::ptr;
use core::ptr::NonNull;

use allocated::AllocResult;
use allocated::AllocatorExt;
use allocator_api2::alloc::Allocator;

pub(crate) type Link<K, V> = Option<NonNull<Node<K, V>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) color: Color,
    pub(crate) parent: Link<K, V>,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Moves a fresh, unlinked red node into memory obtained from `alloc`.
    ///
    /// Nothing is linked on failure, so callers can allocate before touching
    /// the tree and keep it intact when this returns `Err`.
    pub fn create_in<A: Allocator>(alloc: &A, key: K, value: V) -> AllocResult<NonNull<Self>> {
        let node = Node {
            key,
            value,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
        };
        let heap = alloc.allocate_from(node).inspect_err(|e| {
            log::warn!("red-black tree node allocation failed: {e:?}");
        })?;
        Ok(heap.into_inner())
    }

    /// Returns the node's memory to `alloc`, handing back its key and value.
    ///
    /// # Safety
    ///
    /// `node` MUST have been created by [`Node::create_in`] with `alloc` and
    /// MUST already be unlinked from every other node.
    pub unsafe fn destroy_in<A: Allocator>(alloc: &A, node: NonNull<Self>) -> (K, V) {
        // SAFETY: node is valid and uniquely owned; it is not accessed again after the read.
        let Node { key, value, .. } = unsafe { ptr::read(node.as_ptr()) };
        // SAFETY: node was allocated by `alloc` with the layout of `Node<K, V>`.
        unsafe {
            alloc.deallocate(node.cast(), Layout::new::<Self>());
        }
        (key, value)
    }
}

/// Returns `true` for red nodes; nil leaves are black.
pub(crate) fn is_red<K, V>(link: Link<K, V>) -> bool {
    // SAFETY: links stored in a tree always point at live nodes.
    link.is_some_and(|n| unsafe { n.as_ref() }.color == Color::Red)
}

pub(crate) fn is_black<K, V>(link: Link<K, V>) -> bool {
    !is_red(link)
}

/// # Safety
///
/// `node` MUST point at a live node of a well-formed tree.
pub(crate) unsafe fn minimum<K, V>(mut node: NonNull<Node<K, V>>) -> NonNull<Node<K, V>> {
    // SAFETY: child links of a live node are live.
    while let Some(left) = unsafe { node.as_ref() }.left {
        node = left;
    }
    node
}

/// # Safety
///
/// `node` MUST point at a live node of a well-formed tree.
pub(crate) unsafe fn maximum<K, V>(mut node: NonNull<Node<K, V>>) -> NonNull<Node<K, V>> {
    // SAFETY: child links of a live node are live.
    while let Some(right) = unsafe { node.as_ref() }.right {
        node = right;
    }
    node
}

/// The in-order successor of `node`, or `None` if it is the maximum.
///
/// # Safety
///
/// `node` MUST point at a live node of a well-formed tree.
pub(crate) unsafe fn successor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    // SAFETY: all links reached from a live node are live.
    unsafe {
        if let Some(right) = node.as_ref().right {
            return Some(minimum(right));
        }
        let mut child = node;
        let mut parent = node.as_ref().parent;
        while let Some(p) = parent {
            if p.as_ref().right != Some(child) {
                break;
            }
            child = p;
            parent = p.as_ref().parent;
        }
        parent
    }
}

/// The in-order predecessor of `node`, or `None` if it is the minimum.
///
/// # Safety
///
/// `node` MUST point at a live node of a well-formed tree.
pub(crate) unsafe fn predecessor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    // SAFETY: all links reached from a live node are live.
    unsafe {
        if let Some(left) = node.as_ref().left {
            return Some(maximum(left));
        }
        let mut child = node;
        let mut parent = node.as_ref().parent;
        while let Some(p) = parent {
            if p.as_ref().left != Some(child) {
                break;
            }
            child = p;
            parent = p.as_ref().parent;
        }
        parent
    }
}
