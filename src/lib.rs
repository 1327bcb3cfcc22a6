//! Thread-safe, resettable lazy cells and providers with pluggable locking
//! strategies.
//!
//! The crate centers on [`Lazy<T>`]: a cell that runs its initializer on first
//! access, caches the result, and serves every later access from the cache
//! until [`Lazy::clear`] empties it again. All operations go through `&self`,
//! so a cell can be shared freely across threads.
//!
//! Around that core:
//!
//! - [`TryLazy<T, E>`]: fallible initializer; only `Ok` results are cached,
//!   an `Err` leaves the cell ready to retry.
//! - [`Provider<T>`]: the eager, uncached counterpart with the same call
//!   vocabulary.
//! - [`Lazy1`]..[`Lazy5`] and [`Provider1`]..[`Provider5`]: initializers
//!   taking one to five arguments supplied at access time.
//!
//! # Guarantees
//!
//! - **One computation per epoch**: concurrent first accesses run the
//!   initializer exactly once; everyone else blocks and reads the stored
//!   value. Clearing starts a new epoch.
//! - **No poisoning**: a panicking or failing initializer leaves the cell
//!   empty and usable; the next access simply tries again.
//! - **Safe invalidation**: reads return owned clones, so nothing borrowed
//!   from a cell can dangle across a [`Lazy::clear`].
//!
//! # Locking strategies
//!
//! Every caching cell takes a lock strategy as its final type parameter,
//! defaulting to [`ParkRwLock`] (reader-writer, parking). [`ParkMutex`]
//! trades parallel cached reads for a smaller footprint, and [`SpinRwLock`]
//! spins instead of parking. See the [`lock`] module.
//!
//! # Examples
//!
//! ```rust
//! use relazy::Lazy;
//!
//! static GREETING: Lazy<String> = Lazy::new(|| {
//!    // Imagine something expensive here.
//!    String::from("hello, world")
//! });
//!
//! assert_eq!(GREETING.force(), "hello, world");
//! assert!(GREETING.is_computed());
//!
//! // Invalidate; the next force recomputes.
//! GREETING.clear();
//! assert!(!GREETING.is_computed());
//! ```
//!
//! Share expensive data through `Arc` to keep the per-read clone cheap:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use relazy::Lazy;
//!
//! let table = Lazy::new(|| Arc::new(vec![1, 2, 3]));
//! let snapshot = table.force();
//! table.clear();
//! assert_eq!(*snapshot, vec![1, 2, 3]); // still alive
//! ```

/// Lock trait and the bundled strategies.
pub mod lock;

/// Shared memoizing core.
mod slot;

/// Resettable lazy cell.
mod lazy;

/// Fallible resettable lazy cell.
mod try_lazy;

/// Eager counterpart of the lazy cell.
mod provider;

/// Argument-taking cells and providers.
mod args;

pub use args::{
   Lazy1, Lazy2, Lazy3, Lazy4, Lazy5, Provider1, Provider2, Provider3, Provider4, Provider5,
};
pub use lazy::Lazy;
pub use lock::{DefaultLock, ParkMutex, ParkRwLock, RawLock, SpinRwLock};
pub use provider::Provider;
pub use try_lazy::TryLazy;
