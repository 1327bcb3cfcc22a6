//! Shared memoizing core behind every caching cell type.
//!
//! [`Slot`] owns the cache (an `Option<T>`) together with the lock guarding
//! it, and implements the double-checked protocol the public cells expose: a
//! shared-access probe of the cache first, then, on a miss, an exclusive
//! re-check before the initializer runs. The re-check is what turns a burst of
//! first accesses into exactly one initializer run.
//!
//! Reads hand out clones rather than references. Nothing borrowed from the
//! cache ever outlives the lock, which is what makes [`Slot::clear`] callable
//! through `&self` at any time.

use core::cell::UnsafeCell;

use crate::lock::RawLock;

/// One-value cache plus the lock guarding it.
pub(crate) struct Slot<T, L> {
   lock: L,
   value: UnsafeCell<Option<T>>,
}

/// Releases shared access on drop.
struct ReadGuard<'a, L: RawLock>(&'a L);

impl<'a, L: RawLock> ReadGuard<'a, L> {
   #[inline]
   fn acquire(lock: &'a L) -> Self {
      lock.lock_shared();
      Self(lock)
   }
}

impl<L: RawLock> Drop for ReadGuard<'_, L> {
   #[inline]
   fn drop(&mut self) {
      // SAFETY: the guard is only constructed by `acquire`, so this thread
      // holds shared access exactly once.
      unsafe { self.0.unlock_shared() };
   }
}

/// Releases exclusive access on drop. Dropping on the unwind path is what
/// frees the lock when an initializer panics.
struct WriteGuard<'a, L: RawLock>(&'a L);

impl<'a, L: RawLock> WriteGuard<'a, L> {
   #[inline]
   fn acquire(lock: &'a L) -> Self {
      lock.lock_exclusive();
      Self(lock)
   }
}

impl<L: RawLock> Drop for WriteGuard<'_, L> {
   #[inline]
   fn drop(&mut self) {
      // SAFETY: the guard is only constructed by `acquire`, so this thread
      // holds the exclusive lock.
      unsafe { self.0.unlock_exclusive() };
   }
}

impl<T, L: RawLock> Slot<T, L> {
   /// Creates an empty slot.
   #[inline]
   pub(crate) const fn new() -> Self {
      Self {
         lock: L::INIT,
         value: UnsafeCell::new(None),
      }
   }

   /// Runs `f` with shared access to the cache.
   #[inline]
   pub(crate) fn with_read<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
      let _guard = ReadGuard::acquire(&self.lock);
      // SAFETY: shared access is held for the whole call, so no exclusive
      // holder can mutate the cache underneath `f`.
      f(unsafe { (*self.value.get()).as_ref() })
   }

   /// Runs `f` with exclusive access to the cache.
   #[inline]
   pub(crate) fn with_write<R>(&self, f: impl FnOnce(&mut Option<T>) -> R) -> R {
      let _guard = WriteGuard::acquire(&self.lock);
      // SAFETY: exclusive access is held for the whole call, so this is the
      // only live reference into the cache.
      f(unsafe { &mut *self.value.get() })
   }

   /// Returns a clone of the cached value, if any. Never computes.
   #[inline]
   pub(crate) fn peek(&self) -> Option<T>
   where
      T: Clone,
   {
      self.with_read(|cached| cached.cloned())
   }

   /// Whether a value is currently cached.
   #[inline]
   pub(crate) fn is_computed(&self) -> bool {
      self.with_read(|cached| cached.is_some())
   }

   /// Empties the cache. Blocks until in-flight access completes.
   #[inline]
   pub(crate) fn clear(&self) {
      self.with_write(|cached| *cached = None);
   }

   /// Returns the cached value, running `compute` to fill the cache if empty.
   ///
   /// The fast path takes shared access and clones the hit. On a miss the
   /// exclusive path re-checks before computing: whichever thread wins the
   /// exclusive lock runs `compute` alone while everyone else waits on the
   /// lock and then reads the stored value.
   ///
   /// If `compute` panics, the cache stays empty and the lock is released on
   /// unwind, so the next caller simply tries again.
   #[inline]
   pub(crate) fn get_or_compute(&self, compute: impl FnOnce() -> T) -> T
   where
      T: Clone,
   {
      if let Some(value) = self.peek() {
         return value;
      }
      self.compute_slow(compute)
   }

   /// Fallible form of [`Slot::get_or_compute`]: `Err` results are handed to
   /// the caller and never cached.
   #[inline]
   pub(crate) fn try_get_or_compute<E>(
      &self,
      compute: impl FnOnce() -> Result<T, E>,
   ) -> Result<T, E>
   where
      T: Clone,
   {
      if let Some(value) = self.peek() {
         return Ok(value);
      }
      self.try_compute_slow(compute)
   }

   /// Cold path for `get_or_compute`: serialize, re-check, compute, store.
   #[cold]
   fn compute_slow(&self, compute: impl FnOnce() -> T) -> T
   where
      T: Clone,
   {
      self.with_write(|cached| {
         // Another thread may have filled the cache between our shared probe
         // and this exclusive section.
         if let Some(value) = cached {
            return value.clone();
         }
         let value = compute();
         *cached = Some(value.clone());
         value
      })
   }

   /// Cold path for `try_get_or_compute`.
   #[cold]
   fn try_compute_slow<E>(&self, compute: impl FnOnce() -> Result<T, E>) -> Result<T, E>
   where
      T: Clone,
   {
      self.with_write(|cached| {
         if let Some(value) = cached {
            return Ok(value.clone());
         }
         let value = compute()?;
         *cached = Some(value.clone());
         Ok(value)
      })
   }

   /// Takes the cached value out, leaving the slot empty.
   ///
   /// Exclusive access through `&mut self`; no locking.
   #[inline]
   pub(crate) fn take(&mut self) -> Option<T> {
      self.value.get_mut().take()
   }

   /// Mutable access to the cached value, if any.
   ///
   /// Exclusive access through `&mut self`; no locking.
   #[inline]
   pub(crate) fn value_mut(&mut self) -> Option<&mut T> {
      self.value.get_mut().as_mut()
   }

   /// Fills a not-yet-shared slot, e.g. while cloning a cell.
   ///
   /// Exclusive access through `&mut self`; no locking.
   #[inline]
   pub(crate) fn prime(&mut self, value: T) {
      *self.value.get_mut() = Some(value);
   }
}

// SAFETY:
// `Slot<T, L>` is `Sync` if `T` is `Sync` (shared holders on several threads
// observe `&T`) and `T` is `Send` (a value computed on one thread may be
// dropped by a `clear` on another), provided the lock itself is thread-safe.
unsafe impl<T: Send + Sync, L: RawLock + Sync> Sync for Slot<T, L> {}
// SAFETY:
// `Slot<T, L>` is `Send` if `T` is `Send`: moving the slot moves the cached
// value with it.
unsafe impl<T: Send, L: RawLock + Send> Send for Slot<T, L> {}
