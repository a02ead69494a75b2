//! Cross-thread stress tests for shared handles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use rstest::rstest;

use crate::Shared;

struct Tracked {
    alive: Arc<AtomicBool>,
    drops: Arc<AtomicUsize>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked() -> (Shared<Tracked>, Arc<AtomicBool>, Arc<AtomicUsize>) {
    let alive = Arc::new(AtomicBool::new(true));
    let drops = Arc::new(AtomicUsize::new(0));
    let handle = Shared::new(Tracked {
        alive: Arc::clone(&alive),
        drops: Arc::clone(&drops),
    });
    (handle, alive, drops)
}

#[rstest]
#[case::pair_of_threads(2, 20_000)]
#[case::many_threads(16, 2_000)]
fn object_is_destroyed_once_after_last_release(#[case] threads: usize, #[case] rounds: usize) {
    let (handle, alive, drops) = tracked();
    let barrier = Arc::new(Barrier::new(threads));

    let workers: Vec<_> = (0..threads)
        .map(|_| {
            let local = handle.clone();
            let start = Arc::clone(&barrier);
            thread::spawn(move || {
                start.wait();
                for _ in 0..rounds {
                    let copy = local.clone();
                    assert!(copy.alive.load(Ordering::SeqCst), "observed a freed object");
                    drop(copy);
                }
            })
        })
        .collect();

    drop(handle);
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(!alive.load(Ordering::SeqCst));
}

#[test]
fn racing_final_releases_free_exactly_once() {
    const THREADS: usize = 12;

    for _ in 0..200 {
        let (handle, _alive, drops) = tracked();
        let barrier = Arc::new(Barrier::new(THREADS));
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let local = handle.clone();
                let start = Arc::clone(&barrier);
                thread::spawn(move || {
                    start.wait();
                    drop(local);
                })
            })
            .collect();
        drop(handle);
        for worker in workers {
            worker.join().expect("worker panicked");
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
