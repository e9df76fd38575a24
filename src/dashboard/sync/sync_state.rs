//! # Sync State Management
//!
//! The synchronization state machine and the snapshot handed to consumers.
//!
//! ```text
//! Idle ──▶ Checking ──▶ Idle
//!  ▲  │        │  └───▶ Error
//!  │  │        ▼
//!  │  └────▶ Syncing ──▶ Idle | Error
//!  │
//! Error ──▶ Checking | Syncing
//! ```
//!
//! `Checking` and `Syncing` are the in-flight phases: while the state is in
//! either, no other operation may start. Only the sync controller mutates a
//! `SyncState`; everyone else receives clones.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of the synchronization state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Nothing in flight
    Idle,
    /// Asking the API whether the sheet changed
    Checking,
    /// New records are landing
    Syncing,
    /// The last attempt failed; the next one starts from here
    Error,
}

impl SyncPhase {
    /// Whether an operation owns the state right now
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Checking | Self::Syncing)
    }

    /// Legal edges of the state machine
    pub fn can_transition_to(&self, next: SyncPhase) -> bool {
        use SyncPhase::*;
        matches!(
            (self, next),
            (Idle | Error, Checking)
                | (Idle | Error, Syncing)
                | (Checking, Idle | Syncing | Error)
                | (Syncing, Idle | Error)
        )
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Syncing => "syncing",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Current synchronization state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub phase: SyncPhase,
    /// When the server last landed records
    pub last_synced_at: Option<DateTime<Utc>>,
    /// When the last auto-sync check answered
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Records in the dataset as of `last_synced_at`
    pub records_synced: u64,
    /// Message of the last failure, cleared when the next attempt starts
    pub last_error: Option<String>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            phase: SyncPhase::Idle,
            last_synced_at: None,
            last_checked_at: None,
            records_synced: 0,
            last_error: None,
        }
    }
}

impl SyncState {
    pub fn is_in_flight(&self) -> bool {
        self.phase.is_in_flight()
    }

    pub fn has_error(&self) -> bool {
        self.phase == SyncPhase::Error
    }

    /// Never synced and never checked
    pub fn is_pristine(&self) -> bool {
        self.last_synced_at.is_none() && self.last_checked_at.is_none()
    }

    /// Move to `next` if the edge is legal. Returns the phase that blocked the
    /// move otherwise.
    pub(crate) fn transition(&mut self, next: SyncPhase) -> Result<(), SyncPhase> {
        if !self.phase.can_transition_to(next) {
            return Err(self.phase);
        }
        self.phase = next;
        Ok(())
    }

    /// Claim the state for a new operation. Fails with the in-flight phase
    /// when another operation holds it.
    pub(crate) fn begin(&mut self, next: SyncPhase) -> Result<(), SyncPhase> {
        if self.phase.is_in_flight() {
            return Err(self.phase);
        }
        self.transition(next)?;
        self.last_error = None;
        Ok(())
    }

    /// Record landed records. Both fields change together.
    pub(crate) fn record_sync(&mut self, synced_at: DateTime<Utc>, records: u64) {
        self.last_synced_at = Some(synced_at);
        self.records_synced = records;
    }

    /// Fail the in-flight operation
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        if self.transition(SyncPhase::Error).is_err() {
            tracing::warn!("Sync failure recorded outside an operation (phase {})", self.phase);
            self.phase = SyncPhase::Error;
        }
    }

    /// Settle the in-flight operation back to `Idle`
    pub(crate) fn finish(&mut self) {
        if self.transition(SyncPhase::Idle).is_err() {
            tracing::warn!("Sync finished from unexpected phase {}", self.phase);
            self.phase = SyncPhase::Idle;
        }
    }
}
