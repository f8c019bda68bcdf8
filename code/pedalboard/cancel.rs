//! Cooperative stop signal shared between a loop and whoever wants it to end.
//!
//! Every place the loops suspend goes through [`CancelToken::sleep`], so a
//! stop request cuts the wait short instead of being noticed a whole delta
//! later.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Shared {
  cancelled: Mutex<bool>,
  wake: Condvar,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
  shared: Arc<Shared>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    let mut cancelled = self.shared.cancelled.lock();
    *cancelled = true;
    self.shared.wake.notify_all();
  }

  pub fn is_cancelled(&self) -> bool {
    *self.shared.cancelled.lock()
  }

  /// Sleeps for `duration` or until cancelled. Returns `true` if the token
  /// was cancelled, either before or during the wait.
  pub fn sleep(&self, duration: Duration) -> bool {
    let deadline: Instant = Instant::now() + duration;
    let mut cancelled = self.shared.cancelled.lock();
    while !*cancelled {
      if self.shared.wake.wait_until(&mut cancelled, deadline).timed_out() {
        break;
      }
    }
    *cancelled
  }

  /// Trips this token on Ctrl-C. Only one handler may be installed per process.
  pub fn cancel_on_ctrlc(&self) -> Result<(), ctrlc::Error> {
    let token: CancelToken = self.clone();
    ctrlc::set_handler(move || token.cancel())
  }
}
