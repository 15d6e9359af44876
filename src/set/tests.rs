extern crate alloc;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use std::error::Error as StdError;

use itertools::assert_equal;

use allocated::CountingAllocator;

use crate::compare::ReverseOrder;
use crate::error::Error;

use super::*;

#[test]
fn test_insert_contains_erase() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();
    {
        let mut set = TreeSet::<u32, NaturalOrder, _>::new_in(&alloc);
        for k in [5, 1, 4, 2, 3] {
            set.insert(k)?;
        }

        assert_eq!(set.len(), 5);
        assert_eq!(set.insert(4), Err(Error::DuplicateKey));
        assert_eq!(set.len(), 5);
        assert!(set.contains(&4));
        assert_eq!(set.count(&4), 1);

        set.erase(&4)?;
        assert_eq!(set.erase(&4), Err(Error::KeyNotFound));
        assert!(!set.remove(&4));
        assert!(set.remove(&5));
        assert_equal(set.iter().copied(), vec![1, 2, 3]);
    }

    assert_eq!(alloc.n_allocations(), 5);
    assert_eq!(alloc.net_allocations(), 0);

    Ok(())
}

#[test]
fn test_take_returns_stored_key() -> Result<(), Box<dyn StdError>> {
    let mut set = TreeSet::new();
    set.insert("apple".to_string())?;
    set.insert("pear".to_string())?;

    assert_eq!(set.get("pear").map(String::as_str), Some("pear"));
    assert_eq!(set.take("apple"), Some("apple".to_string()));
    assert_eq!(set.take("apple"), None);
    assert_eq!(set.len(), 1);

    Ok(())
}

#[test]
fn test_first_last_pop() {
    let mut set: TreeSet<i32> = [3, -1, 7].into_iter().collect();

    assert_eq!(set.first(), Some(&-1));
    assert_eq!(set.last(), Some(&7));
    assert_eq!(set.pop_first(), Some(-1));
    assert_eq!(set.pop_last(), Some(7));
    assert_eq!(set.pop_last(), Some(3));
    assert_eq!(set.first(), None);
}

#[test]
fn test_cursors() -> Result<(), Box<dyn StdError>> {
    let set: TreeSet<u32> = [10, 20, 30].into_iter().collect();

    let mut cursor = set.end();
    cursor.move_prev()?;
    assert_eq!(cursor.key(), Some(&30));
    assert_eq!(set.lower_bound(&11).key(), Some(&20));
    assert_eq!(set.upper_bound(&10).key(), Some(&20));
    assert!(set.find(&15).is_end());
    assert_eq!(set.find(&10), set.begin());
    assert_eq!(set.end().get(), Err(Error::InvalidIterator));

    Ok(())
}

#[test]
fn test_erase_by_cursor() -> Result<(), Box<dyn StdError>> {
    let mut set: TreeSet<u32> = (0..10).collect();

    let mut cursor = set.find_mut(&3);
    let (removed, ()) = cursor.remove_current()?;
    assert_eq!(removed, 3);
    assert_eq!(cursor.key(), Some(&4));

    let mut cursor = set.begin_mut();
    while cursor.key().is_some_and(|k| *k < 2) {
        cursor.remove_current()?;
    }

    assert_equal(set.iter().copied(), vec![2, 4, 5, 6, 7, 8, 9]);

    Ok(())
}

#[test]
fn test_range() {
    let mut set: TreeSet<u32> = (0..20).collect();

    assert_equal(set.range(3..7).copied(), 3..7);
    assert_equal(set.range(..=2).rev().copied(), vec![2, 1, 0]);

    assert_eq!(set.remove_range(10..), 10);
    assert_eq!(set.len(), 10);
    assert_eq!(set.last(), Some(&9));
}

#[test]
fn test_reverse_order() -> Result<(), Box<dyn StdError>> {
    let mut set = TreeSet::with_comparator(ReverseOrder);
    set.extend(["b", "c", "a"]);

    assert_equal(set.iter().copied(), vec!["c", "b", "a"]);
    assert_eq!(set.first(), Some(&"c"));

    Ok(())
}

#[test]
fn test_into_iter() {
    let alloc = CountingAllocator::default();
    let mut set = TreeSet::<String, NaturalOrder, _>::new_in(&alloc);
    set.extend(["z", "x", "y"].iter().map(|s| s.to_string()));

    let items: Vec<_> = set.into_iter().collect();
    assert_eq!(items, vec!["x", "y", "z"]);

    let set: TreeSet<u32, NaturalOrder, _> = {
        let mut set = TreeSet::new_in(&alloc);
        set.extend(1..=4);
        set
    };
    assert_equal(set.into_iter().rev(), vec![4, 3, 2, 1]);
    assert_eq!(alloc.net_allocations(), 0);
}

#[test]
fn test_capacity_clear_eq_debug() -> Result<(), Box<dyn StdError>> {
    let mut a = TreeSet::with_capacity_hint(8);
    a.insert(2)?;
    a.insert(1)?;
    assert_eq!(a.capacity(), 8);

    let b: TreeSet<i32> = [1, 2].into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(format!("{a:?}"), "{1, 2}");

    a.clear();
    assert!(a.is_empty());
    assert_ne!(a, b);
    assert_eq!(a, TreeSet::default());

    Ok(())
}

#[test]
fn test_capacity_hint_with_comparator_in() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();
    {
        let mut set = TreeSet::with_capacity_hint_in(ReverseOrder, &alloc, 10);
        for k in [1, 3, 2] {
            set.insert(k)?;
        }
        assert_eq!(set.capacity(), 10);
        assert_equal(set.iter().copied(), [3, 2, 1]);
    }
    assert_eq!(alloc.net_allocations(), 0);

    Ok(())
}
