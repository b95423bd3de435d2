//! Periodic autosave trigger.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Calls `tick` once per period until cancelled, dropped, or `tick`
/// returns false. The first tick fires one full period after start.
#[derive(Debug)]
pub struct AutosaveScheduler {
    handle: Option<JoinHandle<()>>,
}

impl AutosaveScheduler {
    pub fn start<F>(period: Duration, tick: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !tick() {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
