//! Fixed-duration hold with explicit cancellation
//!
//! The scenario's only suspension point. Modeled as a timer that can be
//! cancelled from outside rather than an unconditional sleep.

use std::time::Duration;
use tokio::sync::watch;

/// Timer side of a hold; consumed by `wait`
pub struct HoldTimer {
    duration: Duration,
    cancelled: watch::Receiver<bool>,
}

/// Handle that can cancel a pending hold early
pub struct HoldHandle {
    tx: watch::Sender<bool>,
}

impl HoldHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl HoldTimer {
    pub fn new(duration: Duration) -> (Self, HoldHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                duration,
                cancelled: rx,
            },
            HoldHandle { tx },
        )
    }

    /// Suspend for the full duration unless cancelled
    ///
    /// Returns `true` when the hold ran to completion.
    pub async fn wait(mut self) -> bool {
        if *self.cancelled.borrow() {
            return false;
        }

        let sleep = tokio::time::sleep(self.duration);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                changed = self.cancelled.changed() => match changed {
                    Ok(()) if *self.cancelled.borrow() => return false,
                    Ok(()) => continue,
                    // Handle dropped without cancelling; keep holding.
                    Err(_) => {
                        sleep.as_mut().await;
                        return true;
                    }
                },
            }
        }
    }
}
