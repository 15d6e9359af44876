//! Ordering functions supplied to a tree at construction time.
//!
//! Every tree is parameterised by a [`Comparator`], a strict total order over
//! its keys. The order must be consistent: `compare(a, b)` must be the reverse
//! of `compare(b, a)`, and it must be transitive. Debug builds check the first
//! property on every comparison the tree performs.

use core::cmp::Ordering;
use core::fmt;

/// A strict total order over `K`.
pub trait Comparator<K: ?Sized> {
    /// Compares `a` with `b`.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReverseOrder;

impl<K: Ord + ?Sized> Comparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}

/// Adapts a closure into a [`Comparator`].
///
/// ```
/// use allocated_rbtree::{CompareFn, Comparator};
///
/// let by_len = CompareFn(|a: &&str, b: &&str| a.len().cmp(&b.len()));
/// assert!(by_len.compare(&"ab", &"abc").is_lt());
/// ```
#[derive(Clone, Copy, Default)]
pub struct CompareFn<F>(pub F);

impl<K: ?Sized, F: Fn(&K, &K) -> Ordering> Comparator<K> for CompareFn<F> {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for CompareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompareFn").field(&"..").finish()
    }
}

/// Compares `a` with `b`, checking antisymmetry in debug builds.
#[inline]
pub(crate) fn checked_compare<K: ?Sized, C: Comparator<K>>(cmp: &C, a: &K, b: &K) -> Ordering {
    let ord = cmp.compare(a, b);
    debug_assert_eq!(
        cmp.compare(b, a),
        ord.reverse(),
        "comparator is not antisymmetric"
    );
    ord
}
