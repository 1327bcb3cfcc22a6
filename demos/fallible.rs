use std::sync::atomic::{AtomicUsize, Ordering};

use relazy::TryLazy;

static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);
static CONNECTION: TryLazy<String, String> = TryLazy::new(|| {
   let attempt = ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
   println!("Connecting (attempt {})...", attempt);
   if attempt < 3 {
      Err(format!("connection refused on attempt {}", attempt))
   } else {
      Ok("session-7f3a".to_string())
   }
});

fn main() {
   // Failed computations are not cached, so callers can simply retry
   let session = loop {
      match CONNECTION.force() {
         Ok(session) => break session,
         Err(e) => println!("Caught error: {}", e),
      }
   };
   println!("Connected: {}", session);
   assert_eq!(ATTEMPTS.load(Ordering::Relaxed), 3);

   // The success is cached; further calls return it without reconnecting
   assert_eq!(CONNECTION.force(), Ok("session-7f3a".to_string()));
   assert_eq!(ATTEMPTS.load(Ordering::Relaxed), 3); // No new attempt

   // Dropping the session forces a fresh connection next time
   CONNECTION.clear();
   assert!(!CONNECTION.is_computed());
   println!("Reconnected: {}", CONNECTION.force().unwrap());
   assert_eq!(ATTEMPTS.load(Ordering::Relaxed), 4);
}
