//! # Sync Scheduler
//!
//! Fixed-interval background polling for the sync controller.
//!
//! The first check fires as soon as polling starts, then one per interval.
//! Every tick spawns its check as an independent task: stopping the poller
//! ends future ticks but never cancels a check already in flight, so the
//! state machine always settles. A check that lands new data runs the change
//! handler from its own task, so a stop issued mid-check does not swallow it.
//! Ticks that land while another operation owns the state are skipped by the
//! controller itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{CheckOutcome, SyncController, SyncEvent, SyncOutcome, SyncTrigger};

/// Callback run whenever a sync lands new data
pub type ChangeHandler = Box<dyn Fn(&SyncOutcome) + Send + Sync + 'static>;

/// Handle to a running poller
///
/// Stopping is idempotent, and dropping the handle stops the poller.
#[derive(Debug)]
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    interval: Duration,
}

impl PollHandle {
    /// Stop issuing checks. Returns `true` if this call did the stopping.
    pub fn stop(&self) -> bool {
        let was_stopped = self.stop_tx.send_replace(true);
        if !was_stopped {
            tracing::info!("Background polling stopped");
        }
        !was_stopped
    }

    pub fn is_active(&self) -> bool {
        !*self.stop_tx.borrow()
            && self
                .task
                .as_ref()
                .map(|task| !task.is_finished())
                .unwrap_or(false)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop and wait for the ticker task to exit. Checks it already spawned
    /// keep running to completion.
    pub async fn join(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Polling task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub(super) fn spawn_poller(
    controller: SyncController,
    interval: Duration,
    on_changed: ChangeHandler,
) -> PollHandle {
    let interval = interval.max(Duration::from_millis(1));
    let (stop_tx, mut stop_rx) = watch::channel(false);
    // Subscribe before spawning so a manual sync right after start is seen
    let mut events = controller.subscribe();

    let on_changed: Arc<ChangeHandler> = Arc::new(on_changed);

    tracing::info!("Background polling started every {:?}", interval);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let controller = controller.clone();
                    let on_changed = on_changed.clone();
                    tokio::spawn(async move {
                        if let CheckOutcome::Changed(outcome) = controller.check_and_sync().await {
                            on_changed(&outcome);
                        }
                    });
                }
                // Automatic outcomes are delivered by the tick task above
                event = events.recv() => match event {
                    Ok(SyncEvent::DataChanged(outcome)) if outcome.trigger == SyncTrigger::Manual => {
                        on_changed(&outcome)
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Poller fell behind by {} sync events", missed);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        tracing::debug!("Polling task exited");
    });

    PollHandle {
        stop_tx,
        task: Some(task),
        interval,
    }
}
