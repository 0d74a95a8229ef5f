//! Visibility-gated polling of a [`SnapshotSource`].
//!
//! The poller is an owned resource: [`Poller::start`] spawns the loop, and
//! [`Poller::stop`] (or dropping the handle) tears it down. Readings flow out
//! through a `watch` channel, so consumers only ever see the latest one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::{LiveReading, SensorSnapshot};
use crate::error::DashboardError;
use crate::sensor_validation::validate_snapshot;
use crate::snapshot_client::SnapshotSource;
use crate::time::Clock;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Whether the host view is currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Timer scheduled
    Active,
    /// Timer cleared until the view is visible again
    Paused,
    /// Torn down; no further fetches
    Stopped,
}

/// Handle to a running poll loop
pub struct Poller {
    visibility_tx: watch::Sender<Visibility>,
    readings_rx: watch::Receiver<Option<LiveReading>>,
    state_rx: watch::Receiver<PollerState>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Mount the poller
    ///
    /// When `visibility` is `Visible` one fetch happens immediately and the
    /// interval starts from there; otherwise the loop starts paused.
    pub fn start<S>(
        source: Arc<S>,
        clock: Arc<dyn Clock>,
        period: Duration,
        visibility: Visibility,
    ) -> Self
    where
        S: SnapshotSource + 'static,
    {
        let (visibility_tx, visibility_rx) = watch::channel(visibility);
        let (readings_tx, readings_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(match visibility {
            Visibility::Visible => PollerState::Active,
            Visibility::Hidden => PollerState::Paused,
        });
        let (stop_tx, stop_rx) = oneshot::channel();

        let poll_loop = PollLoop {
            source,
            clock,
            period: period.max(Duration::from_millis(1)),
            visibility_rx,
            readings_tx,
            state_tx,
            next_seq: 1,
        };
        let task = tokio::spawn(poll_loop.run(stop_rx));

        info!(period_ms = period.as_millis() as u64, ?visibility, "Poller mounted");

        Self {
            visibility_tx,
            readings_rx,
            state_rx,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    /// Report a visibility change from the host view
    pub fn set_visibility(&self, visibility: Visibility) {
        self.visibility_tx.send_if_modified(|current| {
            if *current == visibility {
                false
            } else {
                *current = visibility;
                true
            }
        });
    }

    pub fn visibility(&self) -> Visibility {
        *self.visibility_tx.borrow()
    }

    /// Subscribe to published readings (`None` until the first success)
    pub fn subscribe(&self) -> watch::Receiver<Option<LiveReading>> {
        self.readings_rx.clone()
    }

    pub fn latest(&self) -> Option<LiveReading> {
        self.readings_rx.borrow().clone()
    }

    pub fn state(&self) -> PollerState {
        *self.state_rx.borrow()
    }

    /// Unmount: clear the timer, drop the visibility subscription and wait
    /// for the loop to finish. An in-flight fetch is abandoned unpublished.
    pub async fn stop(mut self) {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Poll loop ended abnormally");
            }
        }
    }

    fn signal_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The loop may already be gone
            let _ = stop_tx.send(());
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

struct PollLoop<S> {
    source: Arc<S>,
    clock: Arc<dyn Clock>,
    period: Duration,
    visibility_rx: watch::Receiver<Visibility>,
    readings_tx: watch::Sender<Option<LiveReading>>,
    state_tx: watch::Sender<PollerState>,
    next_seq: u64,
}

impl<S: SnapshotSource> PollLoop<S> {
    async fn run(mut self, mut stop_rx: oneshot::Receiver<()>) {
        let mut ticker = None;

        let initial = *self.visibility_rx.borrow_and_update();
        if initial == Visibility::Visible {
            if self.fetch_unless_stopped(&mut stop_rx).await {
                self.finish();
                return;
            }
            ticker = Some(self.schedule());
        }

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,

                _ = next_tick(&mut ticker) => {
                    if *self.visibility_rx.borrow() == Visibility::Hidden {
                        debug!("Tick while hidden, skipping fetch");
                        continue;
                    }
                    if self.fetch_unless_stopped(&mut stop_rx).await {
                        break;
                    }
                }

                changed = self.visibility_rx.changed() => {
                    if changed.is_err() {
                        // Handle dropped without an explicit stop
                        break;
                    }
                    let visibility = *self.visibility_rx.borrow_and_update();
                    match (visibility, ticker.is_some()) {
                        (Visibility::Hidden, true) => {
                            ticker = None;
                            self.state_tx.send_replace(PollerState::Paused);
                            info!("View hidden, polling paused");
                        }
                        (Visibility::Visible, false) => {
                            self.state_tx.send_replace(PollerState::Active);
                            info!("View visible, polling resumed");
                            if self.fetch_unless_stopped(&mut stop_rx).await {
                                break;
                            }
                            ticker = Some(self.schedule());
                        }
                        _ => {}
                    }
                }
            }
        }

        self.finish();
    }

    fn schedule(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Run one fetch to completion and apply it. Returns true when teardown
    /// arrived first, in which case nothing is published.
    async fn fetch_unless_stopped(&mut self, stop_rx: &mut oneshot::Receiver<()>) -> bool {
        let source = Arc::clone(&self.source);
        tokio::select! {
            _ = stop_rx => {
                debug!("Teardown during fetch, result discarded");
                true
            }
            result = source.fetch_snapshot() => {
                self.apply(result);
                false
            }
        }
    }

    fn apply(&mut self, result: Result<SensorSnapshot, DashboardError>) {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, code = e.code(), "Snapshot fetch failed, keeping last reading");
                return;
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        let reading = LiveReading {
            seq,
            fetched_at_ms: self.clock.now_epoch_millis(),
            status: validate_snapshot(&snapshot),
            snapshot,
        };
        if !reading.status.all_ok() {
            warn!(seq, status = ?reading.status, "Snapshot holds implausible values");
        }

        self.readings_tx.send_if_modified(|current| match current {
            Some(previous) if previous.seq >= seq => {
                debug!(seq, latest = previous.seq, "Discarding stale snapshot");
                false
            }
            _ => {
                debug!(
                    seq,
                    temperature = reading.snapshot.temperature,
                    humidity = reading.snapshot.humidity,
                    co2 = reading.snapshot.gas,
                    moisture = reading.snapshot.moisture,
                    "Snapshot applied"
                );
                *current = Some(reading.clone());
                true
            }
        });
    }

    fn finish(&self) {
        self.state_tx.send_replace(PollerState::Stopped);
        info!("Poller unmounted");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
