//! Tokio driver for the refresh scheduler.
//!
//! Exactly one task polls `tick`, so renewal attempts are single-flight;
//! a poll landing while an attempt runs waits on the scheduler lock and
//! replays once it resolves.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use crate::scheduler::RefreshScheduler;

pub struct SchedulerDriver {
    handle: tokio::task::JoinHandle<()>,
    stop_tx: watch::Sender<bool>,
}

impl SchedulerDriver {
    /// Spawn the polling task. `poll_interval` bounds how late past its
    /// due time a renewal can fire.
    pub fn spawn(scheduler: Arc<Mutex<RefreshScheduler>>, poll_interval: Duration) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.lock().unwrap().tick(Utc::now());
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            debug!("scheduler driver stopping");
                            break;
                        }
                    }
                }
            }
        });

        Self { handle, stop_tx }
    }

    /// Signal the task to stop after its current iteration.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stop and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }
}
