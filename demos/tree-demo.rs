//! Demonstrates the owning wrapper types `TreeMap` and `TreeSet`.

use allocated_rbtree::{Error, ReverseOrder, TreeMap, TreeSet};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== TreeMap Demo ===\n");
    map_demo()?;

    println!("\n=== TreeSet Demo ===\n");
    set_demo()?;

    Ok(())
}

fn map_demo() -> Result<(), Box<dyn std::error::Error>> {
    let mut map = TreeMap::new();

    map.insert(3, "three")?;
    map.insert(1, "one")?;
    map.insert(4, "four")?;
    map.insert(5, "five")?;
    map.insert(9, "nine")?;
    map.insert(2, "two")?;

    // Keys are unique; use insert_or_assign to overwrite
    let duplicate = matches!(map.insert(1, "ONE"), Err(Error::DuplicateKey));
    if duplicate {
        map.insert_or_assign(1, "ONE")?;
    }

    println!("Inserted {} items", map.len());
    println!("Key 1: {}", map.at(&1)?);

    println!("\nAll entries:");
    for (k, v) in &map {
        println!("  {} -> {}", k, v);
    }

    println!("\nWalking back from the end:");
    let mut cursor = map.end();
    while cursor.move_prev().is_ok() {
        if let Some((k, v)) = cursor.key_value() {
            println!("  {} -> {}", k, v);
        }
    }

    let removed = map.remove_range(2..5);
    println!("\nRemoved {} entries in 2..5", removed);

    let mut cursor = map.find_mut(&5);
    if let Ok((k, v)) = cursor.remove_current() {
        println!("Erased {} -> {}, next is {:?}", k, v, cursor.key());
    }

    println!("Final map: {:?}", map);

    Ok(())
}

fn set_demo() -> Result<(), Box<dyn std::error::Error>> {
    let mut set = TreeSet::with_comparator(ReverseOrder);

    for word in ["pear", "apple", "fig", "plum"] {
        set.insert(word)?;
    }

    println!("Descending: {:?}", set);
    println!("Largest: {:?}", set.first());

    set.erase(&"fig")?;
    match set.erase(&"fig") {
        Err(Error::KeyNotFound) => println!("fig already erased"),
        other => println!("unexpected: {:?}", other),
    }

    Ok(())
}
