use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Instant;

use relazy::{Lazy, ParkMutex, ParkRwLock, RawLock, SpinRwLock};

const THREADS: usize = 8;
const READS_PER_THREAD: usize = 10_000;

fn run<L: RawLock + Send + Sync + 'static>(label: &str) {
   let runs = Arc::new(AtomicUsize::new(0));
   let cell: Arc<Lazy<u64, _, L>> = {
      let runs = Arc::clone(&runs);
      Arc::new(Lazy::new(move || {
         runs.fetch_add(1, Ordering::Relaxed);
         std::thread::sleep(std::time::Duration::from_millis(10));
         0xC0FFEE
      }))
   };

   let barrier = Arc::new(Barrier::new(THREADS));
   let start = Instant::now();
   let threads: Vec<_> = (0..THREADS)
      .map(|_| {
         let cell = Arc::clone(&cell);
         let barrier = Arc::clone(&barrier);
         std::thread::spawn(move || {
            barrier.wait();
            for _ in 0..READS_PER_THREAD {
               assert_eq!(cell.force(), 0xC0FFEE);
            }
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   println!(
      "{:<12} {} threads x {} reads in {:?}",
      label,
      THREADS,
      READS_PER_THREAD,
      start.elapsed()
   );
   assert_eq!(runs.load(Ordering::Relaxed), 1); // One computation per strategy
}

fn main() {
   // Same workload, three locking strategies. The read-write locks let the
   // post-computation reads proceed in parallel; the mutex serializes them.
   run::<ParkRwLock>("ParkRwLock");
   run::<ParkMutex>("ParkMutex");
   run::<SpinRwLock>("SpinRwLock");
}
