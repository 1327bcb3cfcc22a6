use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use relazy::TryLazy;

#[test]
fn test_ok_is_cached() {
   let attempts = AtomicUsize::new(0);
   let cell: TryLazy<u32, String, _> = TryLazy::new(|| {
      attempts.fetch_add(1, Ordering::SeqCst);
      Ok(10)
   });

   assert_eq!(cell.force(), Ok(10));
   assert_eq!(cell.force(), Ok(10));
   assert!(cell.is_computed());
   assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_err_is_not_cached() {
   let attempts = AtomicUsize::new(0);
   let cell = TryLazy::new(|| {
      if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
         Err("resource not ready")
      } else {
         Ok(3u32)
      }
   });

   assert_eq!(cell.force(), Err("resource not ready"));
   assert!(!cell.is_computed());
   assert_eq!(cell.get(), None);

   // The next call retries, and the success sticks.
   assert_eq!(cell.force(), Ok(3));
   assert_eq!(cell.force(), Ok(3));
   assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_clear_forces_retry() {
   let attempts = AtomicUsize::new(0);
   let cell: TryLazy<usize, &str, _> =
      TryLazy::new(|| Ok(attempts.fetch_add(1, Ordering::SeqCst)));

   assert_eq!(cell.force(), Ok(0));
   cell.clear();
   assert_eq!(cell.force(), Ok(1));
}

#[test]
fn test_take() {
   let mut cell: TryLazy<u32, &str, _> = TryLazy::new(|| Ok(9));
   assert_eq!(cell.take(), None);

   let _ = cell.force();
   assert_eq!(cell.take(), Some(9));
   assert!(!cell.is_computed());
}

#[test]
fn test_concurrent_failures_each_get_their_error() {
   // Every failing attempt reports to exactly one caller; once an attempt
   // succeeds, everyone later sees the cached value.
   let attempts = Arc::new(AtomicUsize::new(0));
   let cell = Arc::new(TryLazy::new({
      let attempts = Arc::clone(&attempts);
      move || {
         let n = attempts.fetch_add(1, Ordering::SeqCst);
         thread::sleep(Duration::from_millis(5));
         if n < 2 {
            Err(n)
         } else {
            Ok(99u32)
         }
      }
   }));

   let threads: Vec<_> = (0..4)
      .map(|_| {
         let cell = Arc::clone(&cell);
         thread::spawn(move || {
            // Retry until the shared cell settles.
            loop {
               match cell.force() {
                  Ok(value) => return value,
                  Err(_) => thread::sleep(Duration::from_millis(1)),
               }
            }
         })
      })
      .collect();

   for handle in threads {
      assert_eq!(handle.join().unwrap(), 99);
   }
   assert!(cell.is_computed());

   // Two failures, then one success; later forces never re-ran the closure.
   assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn test_display_and_debug() {
   let cell: TryLazy<u32, &str, _> = TryLazy::new(|| Ok(5));
   assert_eq!(format!("{cell}"), "<uncomputed>");
   assert_eq!(format!("{cell:?}"), "TryLazy(<uncomputed>)");

   let _ = cell.force();
   assert_eq!(format!("{cell}"), "5");
   assert_eq!(format!("{cell:?}"), "TryLazy(5)");
}
