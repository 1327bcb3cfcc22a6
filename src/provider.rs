//! Eager counterpart of the lazy cell.

use core::any;
use core::fmt;
use core::marker::PhantomData;

/// A value source with no cache: every access runs the initializer.
///
/// Shares its access vocabulary with [`Lazy`](crate::Lazy) (`force`, `map`)
/// so a call site can swap between caching and recomputation by changing the
/// type alone. Calls are independent; concurrent `force`s share no state and
/// never block each other.
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use relazy::Provider;
///
/// let runs = AtomicUsize::new(0);
/// let provider = Provider::new(|| runs.fetch_add(1, Ordering::SeqCst) + 1);
///
/// assert_eq!(provider.force(), 1);
/// assert_eq!(provider.force(), 2);
/// ```
pub struct Provider<T, F = fn() -> T> {
   init: F,
   _value: PhantomData<fn() -> T>,
}

impl<T, F> Provider<T, F>
where
   F: Fn() -> T,
{
   /// Creates a provider around `init`.
   #[inline]
   #[must_use]
   pub const fn new(init: F) -> Self {
      Self {
         init,
         _value: PhantomData,
      }
   }

   /// Computes and returns a fresh value.
   #[inline]
   pub fn force(&self) -> T {
      (self.init)()
   }

   /// Returns a provider that applies `transform` to each produced value.
   pub fn map<'a, U, G>(&'a self, transform: G) -> Provider<U, impl Fn() -> U + 'a>
   where
      G: Fn(T) -> U + 'a,
   {
      Provider::new(move || transform(self.force()))
   }
}

impl<T, F: Clone> Clone for Provider<T, F> {
   #[inline]
   fn clone(&self) -> Self {
      Self {
         init: self.init.clone(),
         _value: PhantomData,
      }
   }
}

impl<T, F> fmt::Debug for Provider<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("Provider")
         .field(&format_args!("{}", any::type_name::<T>()))
         .finish()
   }
}

impl<T, F> fmt::Display for Provider<T, F> {
   /// Renders the produced type rather than a value, since obtaining a value
   /// would run the initializer.
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "Provider({})", any::type_name::<T>())
   }
}
