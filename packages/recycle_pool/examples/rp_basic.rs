//! Basic usage of the `recycle_pool` crate:
//!
//! * Declaring a static pool.
//! * Acquiring with an allocation fallback.
//! * Releasing for reuse.
//! * Sharing the pool across threads.

use std::thread;

use recycle_pool::RecyclePool;

/// A stand-in for a small, frequently churned rendering object.
struct Scratch {
    buffer: Vec<u8>,
}

static POOL: RecyclePool<Scratch, 8> = RecyclePool::new();

fn checkout() -> Box<Scratch> {
    POOL.acquire().unwrap_or_else(|| {
        Box::new(Scratch {
            buffer: Vec::with_capacity(4096),
        })
    })
}

fn main() {
    // Warm the pool from the main thread.
    for _ in 0..4 {
        POOL.release(Box::new(Scratch {
            buffer: Vec::with_capacity(4096),
        }));
    }

    println!("Pool starts with {} recycled objects", POOL.occupied());

    let workers: Vec<_> = (0..4_u8)
        .map(|worker| {
            thread::spawn(move || {
                for _ in 0..10_000 {
                    let mut scratch = checkout();

                    scratch.buffer.push(worker);
                    scratch.buffer.clear();

                    POOL.release(scratch);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker thread panicked");
    }

    println!("Pool ends with {} recycled objects", POOL.occupied());
    println!("Final state: {POOL:?}");
}
