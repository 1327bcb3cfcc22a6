//! Lock strategies for the memoizing cells.
//!
//! Every cell in this crate synchronizes through the [`RawLock`] trait: a pair
//! of exclusive operations plus a pair of shared operations that default to the
//! exclusive ones. A reader-writer strategy overrides the shared pair so cached
//! reads can proceed in parallel; an exclusive-only strategy leaves the defaults
//! in place and stays correct, with cached reads briefly serializing instead.
//!
//! Three strategies are provided:
//!
//! - [`ParkRwLock`]: reader-writer lock that parks contended threads through
//!   `parking_lot_core`. The crate-wide default ([`DefaultLock`]).
//! - [`ParkMutex`]: exclusive-only lock on the same parking substrate, for
//!   cells whose reads are rare enough that reader counting is not worth it.
//! - [`SpinRwLock`]: reader-writer lock that spins instead of parking, for
//!   short critical sections.
//!
//! The strategy is chosen per cell through its final type parameter, e.g.
//! `Lazy<T, F, ParkMutex>`. All strategies are functionally interchangeable.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// The lock strategy used by cells that do not name one explicitly.
pub type DefaultLock = ParkRwLock;

/// A raw lock suitable for guarding a cell's cache.
///
/// Implementations fall into two tiers:
///
/// - **Exclusive-only**: implement [`lock_exclusive`](RawLock::lock_exclusive)
///   and [`unlock_exclusive`](RawLock::unlock_exclusive) and inherit the shared
///   operations, which then behave exclusively.
/// - **Reader-writer**: additionally override
///   [`lock_shared`](RawLock::lock_shared) and
///   [`unlock_shared`](RawLock::unlock_shared) so shared holders may coexist.
///
/// Locks are not reentrant: acquiring the same lock twice from one thread
/// deadlocks. Acquisition blocks for as long as needed; there are no timeouts
/// and no fairness guarantee.
///
/// # Safety
///
/// Implementations must guarantee mutual exclusion between an exclusive holder
/// and every other holder, and must establish acquire/release ordering: writes
/// made before a release are visible after the next acquisition.
pub unsafe trait RawLock {
   /// Initial, unlocked state. Lets cells be built in `const` contexts and
   /// placed in statics.
   const INIT: Self;

   /// Acquires the lock exclusively, blocking until no other holder remains.
   fn lock_exclusive(&self);

   /// Releases an exclusive hold.
   ///
   /// # Safety
   ///
   /// Must only be called by the thread currently holding the exclusive lock.
   unsafe fn unlock_exclusive(&self);

   /// Acquires the lock for shared access.
   ///
   /// Exclusive-only strategies inherit this default, which takes the
   /// exclusive lock.
   #[inline]
   fn lock_shared(&self) {
      self.lock_exclusive();
   }

   /// Releases a shared hold.
   ///
   /// # Safety
   ///
   /// Must only be called by a thread currently holding shared access.
   #[inline]
   unsafe fn unlock_shared(&self) {
      // SAFETY: with the default `lock_shared`, shared access *is* exclusive
      // access, so the caller's shared hold satisfies `unlock_exclusive`.
      unsafe { self.unlock_exclusive() };
   }
}

/// Exclusive-only lock built on `parking_lot_core` futex-style parking.
///
/// State is packed into a single `AtomicU8`:
/// - Bit 0: LOCKED - a thread holds the lock.
/// - Bit 1: WAITING - at least one thread is parked.
#[repr(transparent)]
pub struct ParkMutex(AtomicU8);

impl ParkMutex {
   /// Bit flag: a thread holds the lock.
   const LOCKED: u8 = 1;
   /// Bit flag: at least one thread is parked waiting for the lock.
   const WAITING: u8 = 2;

   /// Creates a new, unlocked `ParkMutex`.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   /// Notifies all parked threads.
   #[inline]
   fn notify_all(&self) {
      // SAFETY: The address passed to unpark must match the address used for
      // park. We consistently use the address of the atomic.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the current thread until the state changes from `expected_state`.
   #[inline]
   fn wait(&self, expected_state: u8) {
      // SAFETY: See safety comment in `notify_all`.
      unsafe {
         // park() validates the state under the queue lock before sleeping,
         // so a wake between our last load and the sleep cannot be lost.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected_state,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
         // Wake-ups may be spurious; the caller's loop re-checks the state.
      }
   }

   /// Contended path: records interest in the lock and parks until released.
   #[cold]
   fn lock_contended(&self) {
      loop {
         let state = self.0.load(Ordering::Relaxed);

         // Free again: try to take it, keeping WAITING intact for the threads
         // still parked behind us.
         if state & Self::LOCKED == 0 {
            match self.0.compare_exchange_weak(
               state,
               state | Self::LOCKED,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return,
               Err(_) => {
                  core::hint::spin_loop();
                  continue;
               }
            }
         }

         // Held by someone else: make sure WAITING is set so the holder knows
         // to wake us, then park.
         if state & Self::WAITING == 0
            && self
               .0
               .compare_exchange_weak(
                  state,
                  state | Self::WAITING,
                  Ordering::Relaxed,
                  Ordering::Relaxed,
               )
               .is_err()
         {
            core::hint::spin_loop();
            continue;
         }
         self.wait(state | Self::WAITING);
      }
   }
}

// SAFETY: LOCKED is only set through a successful CAS with Acquire ordering
// and only cleared by the holder's Release swap, so holders are mutually
// exclusive and writes made under the lock are published to the next holder.
unsafe impl RawLock for ParkMutex {
   #[allow(clippy::declare_interior_mutable_const)]
   const INIT: Self = Self::new();

   #[inline]
   fn lock_exclusive(&self) {
      if self
         .0
         .compare_exchange(0, Self::LOCKED, Ordering::Acquire, Ordering::Relaxed)
         .is_ok()
      {
         return;
      }
      self.lock_contended();
   }

   #[inline]
   unsafe fn unlock_exclusive(&self) {
      // Swapping the whole state out also clears WAITING; woken threads
      // re-set it if they fail to take the lock.
      let prev_state = self.0.swap(0, Ordering::Release);
      debug_assert!(prev_state & Self::LOCKED != 0);
      if prev_state & Self::WAITING != 0 {
         self.notify_all();
      }
   }
}

impl Default for ParkMutex {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

/// Reader-writer lock built on `parking_lot_core` futex-style parking.
///
/// State is packed into a single `AtomicU32`:
/// - Bit 0: WRITER - a thread holds the lock exclusively.
/// - Bit 1: PARKED - at least one thread is parked.
/// - Bits 2..: reader count, in units of `READER`.
///
/// Readers coexist; a writer excludes everyone. Contended threads park through
/// `parking_lot_core` and are woken in bulk on release.
#[repr(transparent)]
pub struct ParkRwLock(AtomicU32);

impl ParkRwLock {
   /// Bit flag: a thread holds the lock exclusively.
   const WRITER: u32 = 1;
   /// Bit flag: at least one thread is parked.
   const PARKED: u32 = 2;
   /// One shared holder, in the counter occupying the remaining bits.
   const READER: u32 = 4;

   /// Creates a new, unlocked `ParkRwLock`.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self(AtomicU32::new(0))
   }

   /// Notifies all parked threads.
   #[inline]
   fn notify_all(&self) {
      // SAFETY: The address passed to unpark must match the address used for
      // park. We consistently use the address of the atomic.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the current thread until the state changes from `expected_state`.
   #[inline]
   fn wait(&self, expected_state: u32) {
      // SAFETY: See safety comment in `notify_all`.
      unsafe {
         // park() validates the state under the queue lock before sleeping,
         // so a wake between our last load and the sleep cannot be lost.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected_state,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
         // Wake-ups may be spurious; the caller's loop re-checks the state.
      }
   }

   /// Contended shared path: park while a writer holds the lock.
   #[cold]
   fn lock_shared_contended(&self) {
      loop {
         let state = self.0.load(Ordering::Relaxed);

         if state & Self::WRITER == 0 {
            match self.0.compare_exchange_weak(
               state,
               state + Self::READER,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return,
               Err(_) => {
                  core::hint::spin_loop();
                  continue;
               }
            }
         }

         if state & Self::PARKED == 0
            && self
               .0
               .compare_exchange_weak(
                  state,
                  state | Self::PARKED,
                  Ordering::Relaxed,
                  Ordering::Relaxed,
               )
               .is_err()
         {
            core::hint::spin_loop();
            continue;
         }
         self.wait(state | Self::PARKED);
      }
   }

   /// Contended exclusive path: park while anyone else holds the lock.
   #[cold]
   fn lock_exclusive_contended(&self) {
      loop {
         let state = self.0.load(Ordering::Relaxed);

         // Nothing but the PARKED bit set: claim the lock, keeping the bit so
         // our release still wakes the sleepers.
         if state & !Self::PARKED == 0 {
            match self.0.compare_exchange_weak(
               state,
               state | Self::WRITER,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return,
               Err(_) => {
                  core::hint::spin_loop();
                  continue;
               }
            }
         }

         if state & Self::PARKED == 0
            && self
               .0
               .compare_exchange_weak(
                  state,
                  state | Self::PARKED,
                  Ordering::Relaxed,
                  Ordering::Relaxed,
               )
               .is_err()
         {
            core::hint::spin_loop();
            continue;
         }
         self.wait(state | Self::PARKED);
      }
   }

   /// Called by the last reader out when writers are parked behind it.
   #[cold]
   fn wake_parked_writers(&self) {
      // Clear PARKED before waking so a woken writer can take the fast path.
      // Losing this race means another holder arrived first; its own release
      // does the waking instead.
      if self
         .0
         .compare_exchange(Self::PARKED, 0, Ordering::Relaxed, Ordering::Relaxed)
         .is_ok()
      {
         self.notify_all();
      }
   }
}

// SAFETY: WRITER is only set by a CAS from a state with no other holder, and
// readers only enter while WRITER is clear, so exclusive and shared holds
// cannot overlap. Acquire on every acquisition pairs with the Release on
// every release.
unsafe impl RawLock for ParkRwLock {
   #[allow(clippy::declare_interior_mutable_const)]
   const INIT: Self = Self::new();

   #[inline]
   fn lock_exclusive(&self) {
      if self
         .0
         .compare_exchange(0, Self::WRITER, Ordering::Acquire, Ordering::Relaxed)
         .is_ok()
      {
         return;
      }
      self.lock_exclusive_contended();
   }

   #[inline]
   unsafe fn unlock_exclusive(&self) {
      // Swapping the whole state out also clears PARKED; woken threads re-set
      // it if they fail to take the lock.
      let prev_state = self.0.swap(0, Ordering::Release);
      debug_assert!(prev_state & Self::WRITER != 0);
      if prev_state & Self::PARKED != 0 {
         self.notify_all();
      }
   }

   #[inline]
   fn lock_shared(&self) {
      let state = self.0.load(Ordering::Relaxed);
      if state & Self::WRITER == 0
         && self
            .0
            .compare_exchange_weak(
               state,
               state + Self::READER,
               Ordering::Acquire,
               Ordering::Relaxed,
            )
            .is_ok()
      {
         return;
      }
      self.lock_shared_contended();
   }

   #[inline]
   unsafe fn unlock_shared(&self) {
      let prev_state = self.0.fetch_sub(Self::READER, Ordering::Release);
      debug_assert!(prev_state & Self::WRITER == 0 && prev_state >= Self::READER);
      // Threads park behind readers only to write; the last reader out wakes
      // them.
      if prev_state == (Self::READER | Self::PARKED) {
         self.wake_parked_writers();
      }
   }
}

impl Default for ParkRwLock {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

/// Reader-writer lock that spins instead of parking.
///
/// Keeps the reader count in the low bits and the writer flag in the top bit.
/// There is nothing to wake: contended threads burn cycles on `spin_loop`
/// until the state clears. Only worth it when critical sections are short;
/// cells doing real work in an initializer should prefer [`ParkRwLock`].
#[repr(transparent)]
pub struct SpinRwLock(AtomicU32);

impl SpinRwLock {
   /// Bit flag: a thread holds the lock exclusively.
   const WRITER: u32 = 1 << 31;

   /// Creates a new, unlocked `SpinRwLock`.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self(AtomicU32::new(0))
   }
}

// SAFETY: the writer bit is only set by a CAS from the empty state, and
// readers that slip in while it is set back their increment out again, so
// exclusive and shared holds cannot overlap. Acquire on every acquisition
// pairs with the Release on every release.
unsafe impl RawLock for SpinRwLock {
   #[allow(clippy::declare_interior_mutable_const)]
   const INIT: Self = Self::new();

   #[inline]
   fn lock_exclusive(&self) {
      loop {
         if self
            .0
            .compare_exchange_weak(0, Self::WRITER, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
         {
            return;
         }
         while self.0.load(Ordering::Relaxed) != 0 {
            core::hint::spin_loop();
         }
      }
   }

   #[inline]
   unsafe fn unlock_exclusive(&self) {
      // Clear only the writer bit: readers may have optimistically
      // incremented the count underneath us and will back out on their own.
      self.0.fetch_sub(Self::WRITER, Ordering::Release);
   }

   #[inline]
   fn lock_shared(&self) {
      loop {
         let prev_state = self.0.fetch_add(1, Ordering::Acquire);
         if prev_state & Self::WRITER == 0 {
            return;
         }
         // A writer holds the lock: undo the optimistic increment and spin
         // until it leaves.
         self.0.fetch_sub(1, Ordering::Relaxed);
         while self.0.load(Ordering::Relaxed) & Self::WRITER != 0 {
            core::hint::spin_loop();
         }
      }
   }

   #[inline]
   unsafe fn unlock_shared(&self) {
      self.0.fetch_sub(1, Ordering::Release);
   }
}

impl Default for SpinRwLock {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}
