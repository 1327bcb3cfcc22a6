//! Resettable lazy cell.
//!
//! [`Lazy<T, F, L>`] pairs a stored initializer with a one-value cache. The
//! first [`force`](Lazy::force) runs the initializer and caches the result;
//! later calls return the cached value until [`clear`](Lazy::clear) empties
//! the cache, after which the next `force` computes afresh.
//!
//! The cell is thread-safe: a burst of concurrent first accesses runs the
//! initializer exactly once while everyone else blocks and then reads the
//! stored value. The lock strategy is chosen through the final type
//! parameter; see the [`lock`](crate::lock) module.

use core::fmt;

use crate::lock::{DefaultLock, RawLock};
use crate::slot::Slot;

/// A thread-safe, resettable lazy cell.
///
/// Holds a zero-argument initializer and runs it at most once per epoch: the
/// stretch from construction (or the last [`clear`](Lazy::clear)) to the next
/// completed computation. Within an epoch every access observes the same
/// value, no matter which thread computed it.
///
/// Reads return owned clones of the cached value, which is what keeps
/// clearing safe: nothing borrowed from the cell can outlive the cache entry
/// it came from. Cheaply cloned types are the intended cargo; wrap anything
/// expensive in an `Arc`.
///
/// The initializer must not access its own cell. The lock is not reentrant,
/// and doing so deadlocks.
///
/// # Examples
///
/// ```rust
/// use relazy::Lazy;
///
/// let cell = Lazy::new(|| "expensive".len());
/// assert!(!cell.is_computed());
/// assert_eq!(cell.force(), 9);
/// assert!(cell.is_computed());
///
/// cell.clear();
/// assert!(!cell.is_computed());
/// assert_eq!(cell.force(), 9);
/// ```
pub struct Lazy<T, F = fn() -> T, L = DefaultLock> {
   slot: Slot<T, L>,
   init: F,
}

impl<T, F, L> Lazy<T, F, L>
where
   F: Fn() -> T,
   L: RawLock,
{
   /// Creates a new, uncomputed cell around `init`.
   ///
   /// `const`, so cells can live in statics:
   ///
   /// ```rust
   /// use relazy::Lazy;
   ///
   /// static MOTD: Lazy<String> = Lazy::new(|| String::from("hello"));
   ///
   /// assert_eq!(MOTD.force(), "hello");
   /// ```
   #[inline]
   #[must_use]
   pub const fn new(init: F) -> Self {
      Self {
         slot: Slot::new(),
         init,
      }
   }

   /// Returns the value, computing it if the cache is empty.
   ///
   /// - If a value is cached, returns a clone of it without touching the
   ///   initializer.
   /// - Otherwise runs the initializer, caches the result, and returns it.
   ///   Concurrent callers racing on an empty cache produce exactly one
   ///   initializer run; the losers block and then read the winner's value.
   ///
   /// If the initializer panics, the panic propagates to the caller that ran
   /// it, the cache stays empty, and the next call tries again. Blocked
   /// callers are woken either way.
   #[inline]
   pub fn force(&self) -> T
   where
      T: Clone,
   {
      self.slot.get_or_compute(&self.init)
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
   ///
   /// A pure observer: never runs the initializer.
   #[inline]
   pub fn is_computed(&self) -> bool {
      self.slot.is_computed()
   }

   /// Empties the cache so the next [`force`](Lazy::force) computes afresh.
   ///
   /// May be called from any thread at any time. A clear issued while the
   /// initializer is running blocks until that run's value is stored, then
   /// discards it; the caller that computed the value still gets it back.
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

   /// Returns a mutable reference to the cached value, if any.
   ///
   /// Requires exclusive access (`&mut self`), so it never blocks.
   #[inline]
   pub fn get_mut(&mut self) -> Option<&mut T> {
      self.slot.value_mut()
   }

   /// Returns a cell that computes `transform` of this cell's value.
   ///
   /// Forcing the derived cell forces this one first (caching its value as a
   /// side effect), then applies `transform` and caches the result. The two
   /// caches are independent: clearing one never clears the other, and the
   /// derived cell re-runs `transform` after its own cache is cleared.
   ///
   /// ```rust
   /// use relazy::Lazy;
   ///
   /// let base = Lazy::new(|| 21);
   /// let doubled = base.map(|v| v * 2);
   ///
   /// assert_eq!(doubled.force(), 42);
   /// assert!(base.is_computed());
   /// ```
   pub fn map<'a, U, G>(&'a self, transform: G) -> Lazy<U, impl Fn() -> U + 'a, L>
   where
      T: Clone,
      G: Fn(T) -> U + 'a,
   {
      Lazy::new(move || transform(self.force()))
   }

   /// Returns a cell combining this cell's value with `other`'s.
   ///
   /// The named replacement for operating on two cells at once: write
   /// `a.zip_with(&b, |x, y| x + y)` rather than reaching into both. Forcing
   /// the combined cell forces both sources; its cache is its own.
   pub fn zip_with<'a, U, V, F2, M, G>(
      &'a self,
      other: &'a Lazy<U, F2, M>,
      combine: G,
   ) -> Lazy<V, impl Fn() -> V + 'a, L>
   where
      T: Clone,
      U: Clone,
      F2: Fn() -> U,
      M: RawLock,
      G: Fn(T, U) -> V + 'a,
   {
      Lazy::new(move || combine(self.force(), other.force()))
   }
}

// --- Trait Implementations ---

impl<T, F, L> Clone for Lazy<T, F, L>
where
   T: Clone,
   F: Clone,
   L: RawLock,
{
   /// Clones the cell: the clone receives a copy of the cached value (if any)
   /// and of the initializer, then lives independently.
   fn clone(&self) -> Self {
      let mut cell = Self {
         slot: Slot::new(),
         init: self.init.clone(),
      };
      if let Some(value) = self.slot.peek() {
         cell.slot.prime(value);
      }
      cell
   }
}

impl<T, L> Default for Lazy<T, fn() -> T, L>
where
   T: Default,
   L: RawLock,
{
   /// An uncomputed cell whose initializer is `T::default`.
   #[inline]
   fn default() -> Self {
      Self::new(T::default)
   }
}

impl<T, F, L> fmt::Display for Lazy<T, F, L>
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

impl<T, F, L> fmt::Debug for Lazy<T, F, L>
where
   T: fmt::Debug,
   L: RawLock,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      self.slot.with_read(|cached| {
         let mut d = f.debug_tuple("Lazy");
         match cached {
            Some(value) => d.field(value),
            None => d.field(&format_args!("<uncomputed>")),
         };
         d.finish()
      })
   }
}

impl<T, F, L> PartialEq for Lazy<T, F, L>
where
   T: PartialEq + Clone,
   L: RawLock,
{
   /// Cells compare by cached state: equal when both are uncomputed, or when
   /// both hold equal values.
   ///
   /// The two snapshots are taken one after the other rather than under both
   /// locks at once, so comparing cells in any order cannot deadlock.
   #[inline]
   fn eq(&self, other: &Self) -> bool {
      self.slot.peek() == other.slot.peek()
   }
}

impl<T, F, L> Eq for Lazy<T, F, L>
where
   T: Eq + Clone,
   L: RawLock,
{
}
