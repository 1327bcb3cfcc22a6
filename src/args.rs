//! Cells and providers whose initializers take arguments.
//!
//! `Lazy1`..`Lazy5` cache like [`Lazy`](crate::Lazy) but accept the
//! initializer's arguments at access time. The cache is a single slot and is
//! not keyed by the arguments: whichever call fills the cache decides the
//! value, and until the cell is cleared every later call returns that value
//! no matter what arguments it passes (first write wins). `Provider1`..
//! `Provider5` are the eager counterparts and use their arguments on every
//! call.
//!
//! The ten types differ only in arity, so a local macro stamps them out.

use core::fmt;
use core::marker::PhantomData;

use crate::lock::{DefaultLock, RawLock};
use crate::slot::Slot;

macro_rules! arg_cells {
   ($lazy:ident, $provider:ident, $($arg:ident: $ty:ident),+) => {
      #[doc = concat!(
         "A [`Lazy`](crate::Lazy)-style cell whose initializer takes arguments ",
         "supplied to [`", stringify!($lazy), "::force`].\n\n",
         "The cache is not keyed by the arguments: the call that fills the ",
         "cache decides the value, and later calls return it unchanged ",
         "regardless of their own arguments, until [`", stringify!($lazy),
         "::clear`] starts a fresh round."
      )]
      pub struct $lazy<T, $($ty,)+ F = fn($($ty),+) -> T, L = DefaultLock> {
         slot: Slot<T, L>,
         init: F,
         _args: PhantomData<fn($($ty),+) -> T>,
      }

      impl<T, $($ty,)+ F, L> $lazy<T, $($ty,)+ F, L>
      where
         F: Fn($($ty),+) -> T,
         L: RawLock,
      {
         /// Creates a new, uncomputed cell around `init`.
         #[inline]
         #[must_use]
         pub const fn new(init: F) -> Self {
            Self {
               slot: Slot::new(),
               init,
               _args: PhantomData,
            }
         }

         /// Returns the cached value, computing it from the given arguments
         /// if the cache is empty.
         ///
         /// Arguments only matter for the call that actually computes; a
         /// cache hit ignores them entirely.
         #[inline]
         pub fn force(&self, $($arg: $ty),+) -> T
         where
            T: Clone,
         {
            self.slot.get_or_compute(move || (self.init)($($arg),+))
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

         /// Empties the cache; the next `force` computes from its own
         /// arguments.
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

      impl<T, $($ty,)+ F, L> fmt::Display for $lazy<T, $($ty,)+ F, L>
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

      impl<T, $($ty,)+ F, L> fmt::Debug for $lazy<T, $($ty,)+ F, L>
      where
         T: fmt::Debug,
         L: RawLock,
      {
         fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.slot.with_read(|cached| {
               let mut d = f.debug_tuple(stringify!($lazy));
               match cached {
                  Some(value) => d.field(value),
                  None => d.field(&format_args!("<uncomputed>")),
               };
               d.finish()
            })
         }
      }

      #[doc = concat!(
         "An eager, uncached value source taking arguments on every call; ",
         "the argument-taking counterpart of [`Provider`](crate::Provider)."
      )]
      pub struct $provider<T, $($ty,)+ F = fn($($ty),+) -> T> {
         init: F,
         _args: PhantomData<fn($($ty),+) -> T>,
      }

      impl<T, $($ty,)+ F> $provider<T, $($ty,)+ F>
      where
         F: Fn($($ty),+) -> T,
      {
         /// Creates a provider around `init`.
         #[inline]
         #[must_use]
         pub const fn new(init: F) -> Self {
            Self {
               init,
               _args: PhantomData,
            }
         }

         /// Computes and returns a fresh value from the given arguments.
         #[inline]
         pub fn force(&self, $($arg: $ty),+) -> T {
            (self.init)($($arg),+)
         }
      }

      impl<T, $($ty,)+ F> fmt::Debug for $provider<T, $($ty,)+ F> {
         fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_tuple(stringify!($provider))
               .field(&format_args!("{}", core::any::type_name::<T>()))
               .finish()
         }
      }

      impl<T, $($ty,)+ F> fmt::Display for $provider<T, $($ty,)+ F> {
         fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}({})", stringify!($provider), core::any::type_name::<T>())
         }
      }
   };
}

arg_cells!(Lazy1, Provider1, a1: A1);
arg_cells!(Lazy2, Provider2, a1: A1, a2: A2);
arg_cells!(Lazy3, Provider3, a1: A1, a2: A2, a3: A3);
arg_cells!(Lazy4, Provider4, a1: A1, a2: A2, a3: A3, a4: A4);
arg_cells!(Lazy5, Provider5, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
