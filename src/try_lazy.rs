//! Fallible resettable lazy cell.
//!
//! [`TryLazy`] is the `Result`-returning sibling of [`Lazy`](crate::Lazy) for
//! initializers that can fail without panicking. Failure leaves no trace:
//! only successes are cached.

use core::fmt;
use core::marker::PhantomData;

use crate::lock::{DefaultLock, RawLock};
use crate::slot::Slot;

/// A thread-safe, resettable lazy cell with a fallible initializer.
///
/// Like [`Lazy`](crate::Lazy), but the initializer returns `Result`. Only
/// `Ok` values are cached: an `Err` is handed to the caller whose access
/// triggered the attempt, the cache stays empty, and the next access retries.
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use relazy::TryLazy;
///
/// let attempts = AtomicUsize::new(0);
/// let cell: TryLazy<u32, &str, _> = TryLazy::new(|| {
///    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
///       Err("not ready")
///    } else {
///       Ok(7)
///    }
/// });
///
/// assert_eq!(cell.force(), Err("not ready"));
/// assert!(!cell.is_computed());
/// assert_eq!(cell.force(), Ok(7));
/// assert_eq!(cell.force(), Ok(7));
/// assert_eq!(attempts.load(Ordering::SeqCst), 2);
/// ```
pub struct TryLazy<T, E, F = fn() -> Result<T, E>, L = DefaultLock> {
   slot: Slot<T, L>,
   init: F,
   _err: PhantomData<fn() -> E>,
}

impl<T, E, F, L> TryLazy<T, E, F, L>
where
   F: Fn() -> Result<T, E>,
   L: RawLock,
{
   /// Creates a new, uncomputed cell around the fallible `init`.
   #[inline]
   #[must_use]
   pub const fn new(init: F) -> Self {
      Self {
         slot: Slot::new(),
         init,
         _err: PhantomData,
      }
   }

   /// Returns the value, attempting the computation if the cache is empty.
   ///
   /// - On a cache hit, returns `Ok` with a clone of the value; the
   ///   initializer does not run.
   /// - On a miss, runs the initializer: an `Ok` is cached and returned, an
   ///   `Err` is returned with the cache left empty so the next call retries.
   ///
   /// Concurrent callers racing on an empty cache serialize; each failed
   /// attempt hands its error to exactly one caller.
   #[inline]
   pub fn force(&self) -> Result<T, E>
   where
      T: Clone,
   {
      self.slot.try_get_or_compute(&self.init)
   }

   /// Returns a clone of the cached value without computing.
   #[inline]
   pub fn get(&self) -> Option<T>
   where
      T: Clone,
   {
      self.slot.peek()
   }

   /// Whether a value is currently cached.
   #[inline]
   pub fn is_computed(&self) -> bool {
      self.slot.is_computed()
   }

   /// Empties the cache so the next [`force`](TryLazy::force) attempts the
   /// computation afresh.
   #[inline]
   pub fn clear(&self) {
      self.slot.clear();
   }

   /// Takes the cached value out, leaving the cell uncomputed.
   ///
   /// Requires exclusive access (`&mut self`), so it never blocks.
   #[inline]
   pub fn take(&mut self) -> Option<T> {
      self.slot.take()
   }
}

impl<T, E, F, L> fmt::Display for TryLazy<T, E, F, L>
where
   T: fmt::Display,
   L: RawLock,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      self.slot.with_read(|cached| match cached {
         Some(value) => fmt::Display::fmt(value, f),
         None => f.write_str("<uncomputed>"),
      })
   }
}

impl<T, E, F, L> fmt::Debug for TryLazy<T, E, F, L>
where
   T: fmt::Debug,
   L: RawLock,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      self.slot.with_read(|cached| {
         let mut d = f.debug_tuple("TryLazy");
         match cached {
            Some(value) => d.field(value),
            None => d.field(&format_args!("<uncomputed>")),
         };
         d.finish()
      })
   }
}
