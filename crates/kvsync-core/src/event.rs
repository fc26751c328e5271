//! Per-key progress events
//!
//! The engine never logs directly. It reports each outcome to a
//! [`SyncObserver`]; [`TracingObserver`] turns them into `tracing` records
//! and [`RecordingObserver`] keeps them for inspection.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Outcome class of one key or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Store value written to a local file
    Fetched,
    /// Key did not exist and was created
    Created,
    /// Key existed with different content and was swapped
    Updated,
    /// Key already held the local bytes
    Unchanged,
    /// Orphaned key removed
    Deleted,
    /// Store key kept because its local file exists
    Retained,
    /// A compare-and-swap lost to a concurrent writer
    CasRetry,
    /// A compare-and-delete lost to a concurrent writer
    DeleteRetry,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::Created => "create",
            Self::Updated => "update",
            Self::Unchanged => "unchanged",
            Self::Deleted => "delete",
            Self::Retained => "retained",
            Self::CasRetry => "update retry",
            Self::DeleteRetry => "delete retry",
        }
    }

    /// Whether the event marks a lost race rather than a final outcome.
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::CasRetry | Self::DeleteRetry)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub kind: EventKind,
    pub key: String,
    pub detail: String,
}

impl SyncEvent {
    pub fn new(kind: EventKind, key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            detail: detail.into(),
        }
    }
}

/// Receives engine events as they happen.
pub trait SyncObserver {
    fn on_event(&self, event: &SyncEvent);
}

impl<F: Fn(&SyncEvent)> SyncObserver for F {
    fn on_event(&self, event: &SyncEvent) {
        self(event)
    }
}

/// Forwards events to `tracing`.
///
/// Outcomes log at info, lost races at warn, retained keys at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_event(&self, event: &SyncEvent) {
        let SyncEvent { kind, key, detail } = event;
        match kind {
            EventKind::CasRetry | EventKind::DeleteRetry => {
                tracing::warn!(%key, %detail, "[{key}] {kind} ({detail})")
            }
            EventKind::Retained => tracing::debug!(%key, "[{key}] {kind}"),
            _ if detail.is_empty() => tracing::info!(%key, "[{key}] {kind}"),
            _ => tracing::info!(%key, %detail, "[{key}] {kind} ({detail})"),
        }
    }
}

/// Collects every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Keys reported with `kind`, in arrival order.
    pub fn keys(&self, kind: EventKind) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.kind == kind)
            .map(|event| event.key)
            .collect()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_event(&self, event: &SyncEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
