use std::sync::atomic::{AtomicUsize, Ordering};

use relazy::Lazy;

static RUNS: AtomicUsize = AtomicUsize::new(0);
static REPORT: Lazy<String> = Lazy::new(|| {
   // This closure runs once per epoch
   RUNS.fetch_add(1, Ordering::Relaxed);
   println!("Building report...");
   // Simulate work
   std::thread::sleep(std::time::Duration::from_millis(50));
   "42 widgets sold".to_string()
});

fn main() {
   assert!(!REPORT.is_computed());
   assert_eq!(REPORT.get(), None);

   let threads: Vec<_> = (0..5)
      .map(|i| {
         std::thread::spawn(move || {
            println!("Thread {} read: {}", i, REPORT.force());
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   assert!(REPORT.is_computed());
   assert_eq!(RUNS.load(Ordering::Relaxed), 1); // One computation, five readers

   // Invalidate the cached value; the next read recomputes it
   REPORT.clear();
   assert!(!REPORT.is_computed());
   println!("After clear: {}", REPORT.force());
   assert_eq!(RUNS.load(Ordering::Relaxed), 2); // Exactly one more run

   // Derived cells recompute on demand from the source
   let audited = REPORT.map(|r| format!("{} (audited)", r));
   println!("Derived: {}", audited.force());
}
