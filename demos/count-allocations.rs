use rand::Rng;

use allocated::CountingAllocator;
use allocated::DropIn;

use allocated_rbtree::{AllocatedRedBlackTree, Error};

fn main() -> Result<(), Error> {
    for i in 0..100 {
        let alloc = CountingAllocator::default();
        let mut tree = AllocatedRedBlackTree::<u32, u32>::new();

        let mut rng = rand::thread_rng();

        for _ in 0..1000 {
            let k: u32 = rng.gen_range(0..2000);
            let v: u32 = rng.gen();

            if rng.gen_bool(0.25) {
                unsafe {
                    tree.remove_entry_in(&alloc, &k);
                }
            } else {
                unsafe {
                    tree.insert_or_assign_in(&alloc, k, v)?;
                }
            }

            println!(
                "{},{},{},{},{}",
                i,
                tree.len(),
                alloc.n_allocations(),
                alloc.net_allocations(),
                alloc.n_bytes_allocated()
            );
        }

        unsafe {
            tree.drop_in(&alloc);
        }

        assert_eq!(alloc.net_allocations(), 0);
    }

    Ok(())
}
