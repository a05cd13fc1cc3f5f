//! Background forecast refresh
//!
//! Runs fetches on a tokio task so the UI loop never waits on the network.
//! Results come back to the main loop over an mpsc channel. Only one fetch is
//! in flight at a time; refresh requests made while one runs are coalesced.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::adapter::WeatherAdapter;
use crate::presentation::ForecastUpdate;

/// Messages sent from background refresh to main app
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A fetch has started
    RefreshStarted,
    /// New display values are ready
    Updated(ForecastUpdate),
    /// The fetch failed; the message is meant for the status line
    RefreshFailed(String),
}

/// Configuration for refresh scheduling
#[derive(Debug, Clone, Default)]
pub struct RefreshConfig {
    /// Interval between automatic refreshes, `None` for manual only
    pub interval: Option<Duration>,
}

/// Handle for controlling the background refresh task
#[derive(Debug)]
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Wakes the worker for an immediate refresh
    trigger_tx: mpsc::Sender<()>,
    /// The worker task, aborted on shutdown
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Spawns the refresh worker and queues the initial fetch
    ///
    /// # Arguments
    /// * `adapter` - Fetches and formats forecast updates
    /// * `config` - Auto-refresh schedule
    ///
    /// # Returns
    /// A RefreshHandle that receives updates via the `receiver` channel
    pub fn spawn(adapter: WeatherAdapter, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        // Capacity 1: a pending trigger already covers any later request
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
        let _ = trigger_tx.try_send(());

        let task = tokio::spawn(async move {
            let mut ticker = config.interval.map(|period| {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                interval
            });
            if let Some(ref mut interval) = ticker {
                // Skip the first tick (immediate); the initial trigger covers it
                interval.tick().await;
            }

            loop {
                tokio::select! {
                    trigger = trigger_rx.recv() => {
                        if trigger.is_none() {
                            break;
                        }
                        debug!("Manual refresh");
                    }
                    _ = tick(&mut ticker) => {
                        debug!("Scheduled refresh");
                    }
                }

                if msg_tx.send(RefreshMessage::RefreshStarted).await.is_err() {
                    break;
                }

                let message = match adapter.fetch_update().await {
                    Ok(update) => RefreshMessage::Updated(update),
                    Err(e) => {
                        warn!(error = %e, kind = ?e.kind(), "Forecast refresh failed");
                        RefreshMessage::RefreshFailed(e.to_string())
                    }
                };

                if msg_tx.send(message).await.is_err() {
                    break;
                }
            }
        });

        Self {
            receiver: msg_rx,
            trigger_tx,
            task,
        }
    }

    /// Requests an immediate refresh
    ///
    /// Returns `false` if a request is already queued.
    pub fn request_refresh(&self) -> bool {
        self.trigger_tx.try_send(()).is_ok()
    }

    /// Stops the worker, cancelling any fetch in flight
    pub fn shutdown(self) {
        self.task.abort();
    }
}

/// Waits for the next tick, or forever when auto-refresh is off
async fn tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
