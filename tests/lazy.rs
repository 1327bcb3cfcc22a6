use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use relazy::{Lazy, ParkMutex, ParkRwLock, RawLock, SpinRwLock};

#[test]
fn test_new_is_not_computed() {
   let cell: Lazy<i32> = Lazy::new(|| 42);
   assert!(!cell.is_computed());
   assert_eq!(cell.get(), None);
}

#[test]
fn test_force_computes_once() {
   let counter = AtomicUsize::new(0);
   let cell: Lazy<_, _> = Lazy::new(|| {
      counter.fetch_add(1, Ordering::SeqCst);
      42
   });

   assert_eq!(cell.force(), 42);
   assert!(cell.is_computed());

   // Second call serves the cache; the initializer does not run again.
   assert_eq!(cell.force(), 42);
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_get_never_computes() {
   let counter = AtomicUsize::new(0);
   let cell: Lazy<_, _> = Lazy::new(|| {
      counter.fetch_add(1, Ordering::SeqCst);
      1
   });

   assert_eq!(cell.get(), None);
   assert_eq!(counter.load(Ordering::SeqCst), 0);

   cell.force();
   assert_eq!(cell.get(), Some(1));
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_force_returns_owned_clone() {
   let cell: Lazy<_, _> = Lazy::new(|| String::from("alpha"));
   let mut first = cell.force();
   first.push_str("beta");

   // Mutating the returned clone leaves the cache untouched.
   assert_eq!(cell.force(), "alpha");
}

#[test]
fn test_clear_then_recompute() {
   let counter = AtomicUsize::new(0);
   let cell: Lazy<_, _> = Lazy::new(|| counter.fetch_add(1, Ordering::SeqCst) + 1);

   assert_eq!(cell.force(), 1);
   cell.clear();
   assert!(!cell.is_computed());
   assert_eq!(cell.force(), 2);
   assert_eq!(cell.force(), 2);

   // Exactly two runs: one per epoch.
   assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_clear_uncomputed_is_noop() {
   let cell: Lazy<i32> = Lazy::new(|| 1);
   cell.clear();
   assert!(!cell.is_computed());
   assert_eq!(cell.force(), 1);
}

#[test]
fn test_lifecycle_counter_scenario() {
   let counter = AtomicUsize::new(0);
   let cell: Lazy<_, _> = Lazy::new(|| counter.fetch_add(1, Ordering::SeqCst) + 1);

   assert_eq!(cell.force(), 1);
   assert!(cell.is_computed());
   assert_eq!(cell.force(), 1);
   assert_eq!(counter.load(Ordering::SeqCst), 1);

   cell.clear();
   assert!(!cell.is_computed());

   assert_eq!(cell.force(), 2);
   assert_eq!(counter.load(Ordering::SeqCst), 2);
}

fn force_from_many_threads<L: RawLock + Send + Sync + 'static>() {
   let counter = Arc::new(AtomicUsize::new(0));
   let barrier = Arc::new(Barrier::new(8));
   let cell: Arc<Lazy<u64, _, L>> = Arc::new(Lazy::new({
      let counter = Arc::clone(&counter);
      move || {
         counter.fetch_add(1, Ordering::SeqCst);
         // Hold the computation long enough for every thread to pile up.
         thread::sleep(Duration::from_millis(20));
         42
      }
   }));

   let threads: Vec<_> = (0..8)
      .map(|_| {
         let cell = Arc::clone(&cell);
         let barrier = Arc::clone(&barrier);
         thread::spawn(move || {
            barrier.wait();
            cell.force()
         })
      })
      .collect();

   for handle in threads {
      assert_eq!(handle.join().unwrap(), 42);
   }
   // Exactly one thread ran the initializer; the rest waited and read.
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_access_rwlock() {
   force_from_many_threads::<ParkRwLock>();
}

#[test]
fn test_concurrent_first_access_mutex() {
   force_from_many_threads::<ParkMutex>();
}

#[test]
fn test_concurrent_first_access_spin() {
   force_from_many_threads::<SpinRwLock>();
}

#[test]
fn test_panic_does_not_poison() {
   let attempts = AtomicUsize::new(0);
   let cell: Lazy<_, _> = Lazy::new(|| {
      if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
         panic!("first attempt blows up");
      }
      7
   });

   let result = catch_unwind(AssertUnwindSafe(|| cell.force()));
   assert!(result.is_err());
   // The failed attempt left nothing behind.
   assert!(!cell.is_computed());

   // The next caller simply retries.
   assert_eq!(cell.force(), 7);
   assert!(cell.is_computed());
   assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_panicking_initializer_wakes_blocked_threads() {
   let attempts = Arc::new(AtomicUsize::new(0));
   let barrier = Arc::new(Barrier::new(2));
   let cell: Arc<Lazy<_, _>> = Arc::new(Lazy::new({
      let attempts = Arc::clone(&attempts);
      move || {
         if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(20));
            panic!("first attempt blows up");
         }
         7u32
      }
   }));

   let threads: Vec<_> = (0..2)
      .map(|_| {
         let cell = Arc::clone(&cell);
         let barrier = Arc::clone(&barrier);
         thread::spawn(move || {
            barrier.wait();
            catch_unwind(AssertUnwindSafe(|| cell.force())).ok()
         })
      })
      .collect();

   let results: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

   // The first attempt panicked in exactly one thread; the thread blocked
   // behind it was woken, retried, and succeeded.
   assert_eq!(results.iter().filter(|r| r.is_none()).count(), 1);
   assert_eq!(results.iter().filter(|r| **r == Some(7)).count(), 1);
   assert_eq!(attempts.load(Ordering::SeqCst), 2);
   assert!(cell.is_computed());
}

#[test]
fn test_clear_while_computing() {
   let started = Arc::new(AtomicBool::new(false));
   let clear_pending = Arc::new(AtomicBool::new(false));
   let runs = Arc::new(AtomicUsize::new(0));

   let cell: Arc<Lazy<_, _>> = Arc::new(Lazy::new({
      let started = Arc::clone(&started);
      let clear_pending = Arc::clone(&clear_pending);
      let runs = Arc::clone(&runs);
      move || {
         if runs.fetch_add(1, Ordering::SeqCst) == 0 {
            started.store(true, Ordering::SeqCst);
            // Keep computing until the main thread has committed to clearing.
            while !clear_pending.load(Ordering::SeqCst) {
               thread::sleep(Duration::from_millis(1));
            }
            thread::sleep(Duration::from_millis(10));
         }
         5u32
      }
   }));

   let worker = {
      let cell = Arc::clone(&cell);
      thread::spawn(move || cell.force())
   };

   while !started.load(Ordering::SeqCst) {
      thread::sleep(Duration::from_millis(1));
   }
   // The initializer is mid-run: clear() must block until its value is
   // stored, then discard it.
   clear_pending.store(true, Ordering::SeqCst);
   cell.clear();

   // The computing caller still got the value it produced.
   assert_eq!(worker.join().unwrap(), 5);
   assert!(!cell.is_computed());

   // The next force starts a fresh run.
   assert_eq!(cell.force(), 5);
   assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_map_forces_source() {
   let source_runs = AtomicUsize::new(0);
   let base: Lazy<_, _> = Lazy::new(|| {
      source_runs.fetch_add(1, Ordering::SeqCst);
      21u32
   });
   let doubled = base.map(|v| v * 2);

   assert!(!base.is_computed());
   assert_eq!(doubled.force(), 42);

   // Forcing the derived cell memoized the source on the way.
   assert!(base.is_computed());
   assert_eq!(source_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_map_caches_are_independent() {
   let source_runs = AtomicUsize::new(0);
   let transform_runs = AtomicUsize::new(0);
   let base: Lazy<_, _> = Lazy::new(|| {
      source_runs.fetch_add(1, Ordering::SeqCst);
      10u32
   });
   let tripled = base.map(|v| {
      transform_runs.fetch_add(1, Ordering::SeqCst);
      v * 3
   });

   assert_eq!(tripled.force(), 30);

   // Clearing the derived cell leaves the source cached; recomputing the
   // derived cell re-runs only the transform.
   tripled.clear();
   assert!(base.is_computed());
   assert_eq!(tripled.force(), 30);
   assert_eq!(source_runs.load(Ordering::SeqCst), 1);
   assert_eq!(transform_runs.load(Ordering::SeqCst), 2);

   // Clearing the source leaves the derived cache in place.
   base.clear();
   assert!(tripled.is_computed());
   assert_eq!(tripled.force(), 30);
   assert_eq!(source_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_map_chain() {
   let base: Lazy<_, _> = Lazy::new(|| 2u32);
   let shifted = base.map(|v| v + 1);
   let squared = shifted.map(|v| v * v);
   assert_eq!(squared.force(), 9);
}

#[test]
fn test_zip_with() {
   let width: Lazy<_, _> = Lazy::new(|| 6u32);
   let height: Lazy<_, _> = Lazy::new(|| 7u32);
   let area = width.zip_with(&height, |w, h| w * h);

   assert_eq!(area.force(), 42);
   assert!(width.is_computed());
   assert!(height.is_computed());

   // The combined cell has its own cache.
   width.clear();
   assert_eq!(area.force(), 42);
}

#[test]
fn test_clone_snapshots_cache() {
   let cell: Lazy<_, _> = Lazy::new(|| String::from("shared"));
   let fresh = cell.clone();
   assert!(!fresh.is_computed());

   cell.force();
   let warmed = cell.clone();
   assert!(warmed.is_computed());
   assert_eq!(warmed.get(), Some(String::from("shared")));

   // Clones are independent afterwards.
   cell.clear();
   assert!(warmed.is_computed());
}

#[test]
fn test_default_uses_default_initializer() {
   let cell: Lazy<Vec<i32>> = Lazy::default();
   assert!(!cell.is_computed());
   assert_eq!(cell.force(), Vec::<i32>::new());
}

#[test]
fn test_eq_compares_cached_state() {
   let a: Lazy<i32> = Lazy::new(|| 1);
   let b: Lazy<i32> = Lazy::new(|| 1);
   assert_eq!(a, b); // both uncomputed

   a.force();
   assert_ne!(a, b); // computed vs uncomputed

   b.force();
   assert_eq!(a, b); // both computed to the same value
}

#[test]
fn test_display_and_debug() {
   let cell: Lazy<i32> = Lazy::new(|| 42);
   assert_eq!(format!("{cell}"), "<uncomputed>");
   assert_eq!(format!("{cell:?}"), "Lazy(<uncomputed>)");

   cell.force();
   assert_eq!(format!("{cell}"), "42");
   assert_eq!(format!("{cell:?}"), "Lazy(42)");
}

#[test]
fn test_take_and_get_mut() {
   let mut cell: Lazy<_, _> = Lazy::new(|| vec![1, 2]);
   assert_eq!(cell.take(), None);

   cell.force();
   if let Some(items) = cell.get_mut() {
      items.push(3);
   }
   assert_eq!(cell.force(), vec![1, 2, 3]);

   assert_eq!(cell.take(), Some(vec![1, 2, 3]));
   assert!(!cell.is_computed());
}

static MESSAGE: Lazy<String> = Lazy::new(|| String::from("from a static"));

#[test]
fn test_static_cell() {
   assert_eq!(MESSAGE.force(), "from a static");
   assert!(MESSAGE.is_computed());
}

proptest! {
   #[test]
   fn prop_force_is_idempotent(x in any::<i64>()) {
      let cell: Lazy<_, _> = Lazy::new(move || x);
      prop_assert_eq!(cell.force(), x);
      prop_assert_eq!(cell.force(), x);
   }

   #[test]
   fn prop_clear_recomputes_to_same_value(x in any::<i64>()) {
      let cell: Lazy<_, _> = Lazy::new(move || x);
      cell.force();
      cell.clear();
      prop_assert_eq!(cell.force(), x);
   }

   #[test]
   fn prop_map_applies_transform(x in any::<i32>(), k in any::<i32>()) {
      let cell: Lazy<_, _> = Lazy::new(move || x);
      let mapped = cell.map(move |v| v.wrapping_mul(k));
      prop_assert_eq!(mapped.force(), x.wrapping_mul(k));
   }

   #[test]
   fn prop_zip_with_combines(x in any::<i32>(), y in any::<i32>()) {
      let a: Lazy<_, _> = Lazy::new(move || x);
      let b: Lazy<_, _> = Lazy::new(move || y);
      let sum = a.zip_with(&b, |l, r| l.wrapping_add(r));
      prop_assert_eq!(sum.force(), x.wrapping_add(y));
   }
}
