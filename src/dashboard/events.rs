/**
 * Dashboard Event Broadcasting
 *
 * Consumers (a UI, the headless runner, tests) observe the dashboard through
 * `tokio::sync::broadcast` channels. Every subscriber receives a copy of each
 * event; a subscriber that falls behind sees `RecvError::Lagged` and keeps
 * going from the oldest retained event.
 */

use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::dashboard::sync::SyncState;
use crate::dashboard::view::DashboardView;

/// Events published by the dashboard orchestrator
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// The sync indicator should redraw
    SyncStateChanged(SyncState),
    /// A refresh produced a new view
    DataChanged(Arc<DashboardView>),
}

/// Broadcast an event to all subscribers
///
/// Returns the number of subscribers that received it (0 if none).
pub fn broadcast_event<T: Debug>(broadcast_tx: &broadcast::Sender<T>, event: T) -> usize {
    match broadcast_tx.send(event) {
        Ok(subscriber_count) => {
            tracing::trace!("Event broadcast to {} subscribers", subscriber_count);
            subscriber_count
        }
        Err(e) => {
            // No subscribers, that's okay
            tracing::trace!("No subscribers to receive event: {:?}", e.0);
            0
        }
    }
}
