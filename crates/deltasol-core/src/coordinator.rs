// ── Periodic refresh coordinator ──
//
// Drives `Controller::fetch_snapshot` on a fixed interval from a
// background task and publishes the outcome over a watch channel. A
// failed cycle never clears the last good snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::MIN_SCAN_INTERVAL;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::Snapshot;

/// What subscribers see after each cycle.
#[derive(Debug, Clone, Default)]
pub struct UpdateState {
    /// Last successfully fetched snapshot; survives failed cycles.
    pub snapshot: Option<Arc<Snapshot>>,
    pub last_update_success: bool,
    /// Display form of the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

/// Handle to a running coordinator task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown()`](Self::shutdown).
pub struct CoordinatorHandle {
    rx: watch::Receiver<UpdateState>,
    cancel: CancellationToken,
    notify: Arc<Notify>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Start refreshing `controller` every `interval`, beginning immediately.
    ///
    /// Intervals below [`MIN_SCAN_INTERVAL`] are raised to it.
    pub fn spawn(controller: Controller, interval: Duration) -> Self {
        let period = effective_interval(interval);
        let (tx, rx) = watch::channel(UpdateState::default());
        let cancel = CancellationToken::new();
        let notify = Arc::new(Notify::new());

        let task = tokio::spawn(refresh_task(
            controller,
            period,
            tx,
            cancel.clone(),
            Arc::clone(&notify),
        ));

        Self {
            rx,
            cancel,
            notify,
            task,
        }
    }

    /// A receiver that wakes on every published state.
    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.rx.clone()
    }

    pub fn current(&self) -> UpdateState {
        self.rx.borrow().clone()
    }

    /// Run a cycle now instead of waiting for the next tick.
    pub fn request_refresh(&self) {
        self.notify.notify_one();
    }

    /// Stop the loop and wait for an in-flight cycle to be abandoned.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "coordinator task ended abnormally");
        }
    }
}

/// Clamp a requested scan interval to the polling floor.
pub fn effective_interval(requested: Duration) -> Duration {
    if requested < MIN_SCAN_INTERVAL {
        warn!(
            requested_secs = requested.as_secs(),
            floor_secs = MIN_SCAN_INTERVAL.as_secs(),
            "scan interval below minimum, clamping"
        );
        MIN_SCAN_INTERVAL
    } else {
        requested
    }
}

async fn refresh_task(
    controller: Controller,
    period: Duration,
    tx: watch::Sender<UpdateState>,
    cancel: CancellationToken,
    notify: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
            () = notify.notified() => interval.reset(),
        }

        debug!("coordinator tick");
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = controller.fetch_snapshot() => outcome,
        };

        tx.send_modify(|state| apply_outcome(state, outcome));
    }

    debug!("coordinator stopped");
}

fn apply_outcome(state: &mut UpdateState, outcome: Result<Arc<Snapshot>, CoreError>) {
    match outcome {
        Ok(snapshot) => {
            state.snapshot = Some(snapshot);
            state.last_update_success = true;
            state.last_error = None;
        }
        Err(e) => {
            error!(error = %e, "update failed");
            state.last_update_success = false;
            state.last_error = Some(e.to_string());
        }
    }
}
