extern crate alloc;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use std::error::Error as StdError;

use proptest::prelude::*;

use itertools::assert_equal;

use allocated::CountingAllocator;

use crate::compare::ReverseOrder;

use super::*;

#[test]
fn test_new() {
    let map = TreeMap::<u32, u32>::new();

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.capacity(), 0);
    assert_eq!(map.get(&1), None);
    assert_eq!(map.begin(), map.end());
    assert_eq!(map, TreeMap::default());
}

#[test]
fn test_insert_and_at() -> Result<(), Box<dyn StdError>> {
    let mut map = TreeMap::new();

    map.insert(2, "two")?;
    map.insert(1, "one")?;
    map.insert(3, "three")?;

    assert_eq!(map.len(), 3);
    assert_eq!(map.at(&2)?, &"two");
    assert_eq!(map.at(&4), Err(Error::KeyNotFound));

    *map.at_mut(&2)? = "TWO";
    assert_eq!(map.get(&2), Some(&"TWO"));
    assert_eq!(map.at_mut(&4), Err(Error::KeyNotFound));

    assert_equal(map.keys().copied(), vec![1, 2, 3]);

    Ok(())
}

#[test]
fn test_insert_duplicate() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();
    {
        let mut map = TreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
        map.insert(1, 10)?;

        assert_eq!(map.insert(1, 11), Err(Error::DuplicateKey));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&10));
    }

    assert_eq!(alloc.n_allocations(), 1);
    assert_eq!(alloc.net_allocations(), 0);

    Ok(())
}

#[test]
fn test_insert_or_assign() -> Result<(), Box<dyn StdError>> {
    let mut map = TreeMap::new();

    assert_eq!(map.insert_or_assign("a", 1)?, None);
    assert_eq!(map.insert_or_assign("a", 2)?, Some(1));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("a"), Some(&2));

    Ok(())
}

#[test]
fn test_get_or_insert_default() -> Result<(), Box<dyn StdError>> {
    let mut map: TreeMap<String, Vec<u32>> = TreeMap::new();

    map.get_or_insert_default("odd".to_string())?.push(1);
    map.get_or_insert_default("even".to_string())?.push(2);
    map.get_or_insert_default("odd".to_string())?.push(3);

    assert_eq!(map.len(), 2);
    assert_eq!(map.at("odd")?, &vec![1, 3]);
    assert_eq!(map.at("even")?, &vec![2]);

    assert!(map.get_or_insert_with("none".to_string(), Vec::new)?.is_empty());
    assert_eq!(map.len(), 3);

    Ok(())
}

#[test]
fn test_erase() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();
    {
        let mut map = TreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
        for i in 0..10 {
            map.insert(i, i * i)?;
        }

        assert_eq!(map.erase(&3)?, 9);
        assert_eq!(map.erase(&3), Err(Error::KeyNotFound));
        assert_eq!(map.remove(&4), Some(16));
        assert_eq!(map.remove(&4), None);
        assert_eq!(map.remove_entry(&5), Some((5, 25)));
        assert_eq!(map.len(), 7);
        assert_eq!(map.count(&3), 0);
        assert_eq!(map.count(&6), 1);
    }

    assert_eq!(alloc.n_allocations(), 10);
    assert_eq!(alloc.net_allocations(), 0);

    Ok(())
}

#[test]
fn test_erase_by_cursor() -> Result<(), Box<dyn StdError>> {
    let mut map: TreeMap<u32, u32> = (0..10).map(|i| (i, i)).collect();

    let mut cursor = map.find_mut(&4);
    assert_eq!(cursor.remove_current()?, (4, 4));
    assert_eq!(cursor.key(), Some(&5));
    assert_eq!(cursor.remove_current()?, (5, 5));
    assert_eq!(cursor.key(), Some(&6));

    let mut cursor = map.find_mut(&9);
    cursor.remove_current()?;
    assert!(cursor.is_end());
    assert_eq!(cursor.remove_current(), Err(Error::InvalidIterator));

    let mut cursor = map.lower_bound_mut(&7);
    if let Some(v) = cursor.value_mut() {
        *v = 70;
    }

    assert_equal(map.keys().copied(), vec![0, 1, 2, 3, 6, 7, 8]);
    assert_eq!(map.get(&7), Some(&70));

    Ok(())
}

#[test]
fn test_begin_mut_drain() -> Result<(), Box<dyn StdError>> {
    let mut map: TreeMap<u32, u32> = (0..10).map(|i| (i, i)).collect();

    let mut cursor = map.begin_mut();
    while !cursor.is_end() {
        cursor.remove_current()?;
    }

    assert!(map.is_empty());

    Ok(())
}

#[test]
fn test_cursors() -> Result<(), Box<dyn StdError>> {
    let map: TreeMap<u32, char> = [(10, 'a'), (20, 'b'), (30, 'c')].into_iter().collect();

    let mut cursor = map.end();
    cursor.move_prev()?;
    assert_eq!(cursor.get()?, (&30, &'c'));

    assert_eq!(map.lower_bound(&15).key(), Some(&20));
    assert_eq!(map.upper_bound(&20).key(), Some(&30));
    assert!(map.upper_bound(&30).is_end());
    assert!(map.find(&25).is_end());
    assert_eq!(map.find(&10), map.begin());

    let mut cursor = map.begin();
    assert_eq!(cursor.move_prev(), Err(Error::InvalidIterator));

    let mut count = 0;
    let mut cursor = map.begin();
    while !cursor.is_end() {
        count += 1;
        cursor.move_next()?;
    }
    assert_eq!(count, map.len());

    Ok(())
}

#[test]
fn test_range_and_remove_range() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();
    {
        let mut map = TreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
        map.extend((0..20).map(|i| (i, i)));

        assert_equal(map.range(5..8).map(|(k, _)| *k), 5..8);
        assert_equal(map.range(15..).rev().map(|(k, _)| *k), (15..20).rev());

        assert_eq!(map.remove_range(5..15), 10);
        assert_equal(map.keys().copied(), (0..5).chain(15..20));
        assert_eq!(alloc.net_allocations(), 10);
    }

    assert_eq!(alloc.net_allocations(), 0);

    Ok(())
}

#[test]
fn test_pop() -> Result<(), Box<dyn StdError>> {
    let mut map: TreeMap<u32, u32> = (1..=3).map(|i| (i, i)).collect();

    assert_eq!(map.first_key_value(), Some((&1, &1)));
    assert_eq!(map.last_key_value(), Some((&3, &3)));
    assert_eq!(map.pop_first(), Some((1, 1)));
    assert_eq!(map.pop_last(), Some((3, 3)));
    assert_eq!(map.pop_last(), Some((2, 2)));
    assert_eq!(map.pop_first(), None);

    Ok(())
}

#[test]
fn test_clear() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();
    let mut map = TreeMap::<u32, String, NaturalOrder, _>::new_in(&alloc);

    for i in 0..50 {
        map.insert(i, i.to_string())?;
    }
    map.clear();

    assert!(map.is_empty());
    assert_eq!(alloc.net_allocations(), 0);

    map.insert(1, "again".to_string())?;
    assert_eq!(map.len(), 1);

    core::mem::drop(map);
    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.net_bytes_allocated(), 0);

    Ok(())
}

#[test]
fn test_capacity_hint() -> Result<(), Box<dyn StdError>> {
    let mut map = TreeMap::with_capacity_hint(4);
    assert_eq!(map.capacity(), 4);
    assert!(map.is_empty());

    for i in 0..6 {
        map.insert(i, ())?;
        assert!(map.capacity() >= map.len());
    }
    assert_eq!(map.capacity(), 6);

    Ok(())
}

#[test]
fn test_capacity_hint_with_comparator_in() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();
    {
        let mut map = TreeMap::with_capacity_hint_in(ReverseOrder, &alloc, 3);
        assert_eq!(map.capacity(), 3);
        assert_eq!(alloc.n_allocations(), 0);

        for i in 0..5u32 {
            map.insert(i, i * 2)?;
        }
        assert_eq!(map.capacity(), 5);
        assert_equal(map.keys().copied(), [4, 3, 2, 1, 0]);

        map.clear();
        assert_eq!(map.capacity(), 3);
    }
    assert_eq!(alloc.net_allocations(), 0);

    Ok(())
}

#[test]
fn test_with_comparator() -> Result<(), Box<dyn StdError>> {
    let mut map = TreeMap::with_comparator(ReverseOrder);
    for i in 0..5 {
        map.insert(i, i * 10)?;
    }

    assert_equal(map.keys().copied(), (0..5).rev());
    assert_eq!(map.first_key_value(), Some((&4, &40)));
    assert_eq!(map.comparator(), &ReverseOrder);

    Ok(())
}

#[test]
fn test_iterators() -> Result<(), Box<dyn StdError>> {
    let mut map: TreeMap<u32, u32> = (1..=4).map(|i| (i, i)).collect();

    for (_, v) in map.iter_mut() {
        *v *= 2;
    }
    for v in map.values_mut() {
        *v += 1;
    }
    for (k, v) in &mut map {
        *v += k;
    }

    assert_equal(map.values().copied(), vec![4, 7, 10, 13]);
    assert_equal(&map, vec![(&1, &4), (&2, &7), (&3, &10), (&4, &13)]);
    assert_eq!(map.iter().len(), 4);

    let keys: Vec<_> = map.keys().rev().copied().collect();
    assert_eq!(keys, vec![4, 3, 2, 1]);

    for v in map.values_mut().rev().take(1) {
        *v = 0;
    }
    assert_equal(map.values().rev().copied(), vec![0, 10, 7, 4]);

    Ok(())
}

#[test]
fn test_into_iter() -> Result<(), Box<dyn StdError>> {
    let alloc = CountingAllocator::default();

    let mut map = TreeMap::<u32, String, NaturalOrder, _>::new_in(&alloc);
    for i in [3, 1, 2] {
        map.insert(i, i.to_string())?;
    }
    assert_equal(
        map.into_iter(),
        vec![(1, "1".to_string()), (2, "2".to_string()), (3, "3".to_string())],
    );
    assert_eq!(alloc.net_allocations(), 0);

    let mut map = TreeMap::<u32, String, NaturalOrder, _>::new_in(&alloc);
    for i in 0..10 {
        map.insert(i, i.to_string())?;
    }
    let mut keys = map.into_keys();
    assert_eq!(keys.next(), Some(0));
    assert_eq!(keys.next_back(), Some(9));
    assert_equal(keys.by_ref().rev().take(2), vec![8, 7]);
    assert_eq!(keys.len(), 6);
    core::mem::drop(keys);
    assert_eq!(alloc.net_allocations(), 0);

    let mut map = TreeMap::<u32, String, NaturalOrder, _>::new_in(&alloc);
    map.insert(7, "seven".to_string())?;
    assert_equal(map.into_values(), vec!["seven".to_string()]);
    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.net_bytes_allocated(), 0);

    Ok(())
}

#[test]
fn test_from_iter_last_wins() {
    let map: TreeMap<&str, u32> = vec![("a", 1), ("b", 2), ("a", 3)].into_iter().collect();

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("a"), Some(&3));
}

#[test]
fn test_eq_and_debug() -> Result<(), Box<dyn StdError>> {
    let a: TreeMap<u32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
    let mut b = TreeMap::new();
    b.insert(1, "a")?;
    b.insert(2, "b")?;

    assert_eq!(a, b);
    b.insert(3, "c")?;
    assert_ne!(a, b);

    assert_eq!(format!("{a:?}"), r#"{1: "a", 2: "b"}"#);

    Ok(())
}

#[test]
fn test_error_display() {
    assert_eq!(
        Error::DuplicateKey.to_string(),
        "an element with an equal key is already present"
    );
    assert_eq!(
        Error::KeyNotFound.to_string(),
        "no element with the requested key is present"
    );
    assert_eq!(
        Error::InvalidIterator.to_string(),
        "cursor does not refer to an element"
    );
}

proptest! {
    #[test]
    fn test_against_btreemap(ops in prop::collection::vec((0..3u8, 0..100u32), 1..200)) {
        let alloc = CountingAllocator::default();
        {
            let mut map = TreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
            let mut model = std::collections::BTreeMap::new();

            for (op, k) in ops {
                match op {
                    0 => {
                        let expected = if model.contains_key(&k) {
                            Err(Error::DuplicateKey)
                        } else {
                            model.insert(k, k);
                            Ok(())
                        };
                        prop_assert_eq!(map.insert(k, k).map(|_| ()), expected);
                    }
                    1 => {
                        prop_assert_eq!(map.erase(&k).ok(), model.remove(&k));
                    }
                    _ => {
                        prop_assert_eq!(map.at(&k).ok(), model.get(&k));
                    }
                }
                prop_assert_eq!(map.len(), model.len());
            }

            assert_equal(map.iter(), model.iter());
        }

        prop_assert_eq!(alloc.net_allocations(), 0);
    }
}
