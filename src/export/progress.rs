//! Cosmetic progress for a running export.
//!
//! The ticker does not observe the pipeline. It advances a counter on a
//! timer while the export is in flight, stops short of a cap, and is set to
//! its final value when the export settles. A completed bar drops back to 0
//! after [`RESET_DELAY`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a completed bar stays at 100.
pub const RESET_DELAY: Duration = Duration::from_secs(1);

/// A running progress timer. Aborted when finished or dropped.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
    progress: Arc<watch::Sender<u8>>,
}

impl ProgressTicker {
    /// Reset `progress` to 0 and advance it by `step` every `interval`,
    /// never past `cap`.
    pub fn start(progress: Arc<watch::Sender<u8>>, interval: Duration, step: u8, cap: u8) -> Self {
        progress.send_replace(0);
        let tx = Arc::clone(&progress);
        let period = interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            // The first tick completes immediately.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                tx.send_modify(|p| *p = p.saturating_add(step).min(cap).max(*p));
            }
        });
        Self { handle, progress }
    }

    /// Stop ticking and publish the final value: 100 on success, 0 otherwise.
    ///
    /// On success the returned task resets the bar to 0 after
    /// [`RESET_DELAY`]. Abort it if another export starts first.
    pub fn finish(self, success: bool) -> Option<JoinHandle<()>> {
        self.handle.abort();
        if !success {
            self.progress.send_replace(0);
            return None;
        }
        self.progress.send_replace(100);
        let tx = Arc::clone(&self.progress);
        Some(tokio::spawn(async move {
            tokio::time::sleep(RESET_DELAY).await;
            tx.send_if_modified(|p| {
                let done = *p == 100;
                if done {
                    *p = 0;
                }
                done
            });
        }))
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
