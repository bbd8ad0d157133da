//! Update Dispatcher
//!
//! Applies `station-update` events to the map document, one at a time.
//!
//! # Flow
//!
//! ```text
//! StationStateUpdate ──► MarkerSelector ──► find_marker ──► compose_class ──► set_class_attribute
//!                              │                 │
//!                              └─ unmapped ──────┴─ not found ──► Skipped (no write)
//! ```
//!
//! Each update overwrites the marker's class wholesale, so the last update
//! for a station wins and updates for one station must arrive in order.
//! Nothing else carries over between updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::MapDocument;
use crate::domain::marker::{MarkerSelector, compose_class};
use crate::domain::network::{Station, StationStateUpdate};
use crate::infrastructure::metrics;

// =============================================================================
// Outcomes
// =============================================================================

/// Why an update left the map untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The station has no map element identifier.
    UnmappedStation,
    /// The document has no marker for the station.
    MarkerNotFound,
    /// The document rejected the attribute write.
    WriteFailed,
}

impl SkipReason {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnmappedStation => "unmapped_station",
            Self::MarkerNotFound => "marker_not_found",
            Self::WriteFailed => "write_failed",
        }
    }
}

/// Result of applying one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The marker's class was overwritten.
    Applied {
        /// Station that was updated.
        station: Station,
        /// Class before the write.
        previous: Option<String>,
        /// Class after the write.
        class: String,
    },
    /// Nothing was written.
    Skipped {
        /// Station named by the update.
        station: Station,
        /// Why nothing was written.
        reason: SkipReason,
    },
}

impl ApplyOutcome {
    /// Whether the marker was written.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The class written, if any.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Applied { class, .. } => Some(class),
            Self::Skipped { .. } => None,
        }
    }

    /// The skip reason, if nothing was written.
    #[must_use]
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Applied { .. } => None,
            Self::Skipped { reason, .. } => Some(*reason),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Most recent successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastApplied {
    /// Station that was updated.
    pub station: Station,
    /// Class that was written.
    pub class: String,
    /// When it was written.
    pub at: DateTime<Utc>,
}

/// Counters shared between the dispatcher, the input reader and the health
/// endpoint.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    applied: AtomicU64,
    skipped: AtomicU64,
    rejected: AtomicU64,
    resolved_markers: AtomicUsize,
    last_applied: RwLock<Option<LastApplied>>,
}

impl DispatchStats {
    /// Create zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an update handed to the dispatcher.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a successful write.
    pub fn record_applied(&self, station: Station, class: &str) {
        self.applied.fetch_add(1, Ordering::Relaxed);
        *self.last_applied.write() = Some(LastApplied {
            station,
            class: class.to_string(),
            at: Utc::now(),
        });
    }

    /// Count an update that left the map untouched.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an input that could not be decoded into an update.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how many stations resolve to a marker in the loaded document.
    pub fn set_resolved_markers(&self, count: usize) {
        self.resolved_markers.store(count, Ordering::Relaxed);
    }

    /// Updates handed to the dispatcher.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Successful writes.
    #[must_use]
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Updates that left the map untouched.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Inputs that could not be decoded.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Stations that resolve to a marker in the loaded document.
    #[must_use]
    pub fn resolved_markers(&self) -> usize {
        self.resolved_markers.load(Ordering::Relaxed)
    }

    /// Most recent successful write.
    #[must_use]
    pub fn last_applied(&self) -> Option<LastApplied> {
        self.last_applied.read().clone()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Applies station updates to a map document it owns.
///
/// # Example
///
/// ```rust
/// use station_map::application::ports::InMemoryMapDocument;
/// use station_map::application::services::UpdateDispatcher;
/// use station_map::domain::network::{
///     Station, StationState, StationStateForTrain, StationStateUpdate, Train,
/// };
///
/// let document = InMemoryMapDocument::with_markers(["St_Paul"]);
/// let mut dispatcher = UpdateDispatcher::new(document);
///
/// let update = StationStateUpdate::new(
///     Station::StPaul,
///     vec![StationStateForTrain::new(Train::Hiawatha, StationState::Stopped)],
/// );
/// let outcome = dispatcher.apply(&update);
///
/// assert_eq!(outcome.class(), Some("HiawathaStopped"));
/// assert_eq!(dispatcher.document().class_of("St_Paul"), Some("HiawathaStopped"));
/// ```
#[derive(Debug)]
pub struct UpdateDispatcher<D> {
    document: D,
    stats: Arc<DispatchStats>,
}

impl<D: MapDocument> UpdateDispatcher<D> {
    /// Create a dispatcher with fresh statistics.
    #[must_use]
    pub fn new(document: D) -> Self {
        Self::with_stats(document, Arc::new(DispatchStats::new()))
    }

    /// Create a dispatcher reporting into shared statistics.
    #[must_use]
    pub fn with_stats(document: D, stats: Arc<DispatchStats>) -> Self {
        let dispatcher = Self { document, stats };
        let resolved = dispatcher.resolvable_stations().len();
        dispatcher.stats.set_resolved_markers(resolved);
        dispatcher
    }

    /// Shared statistics handle.
    #[must_use]
    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// The document being rendered.
    #[must_use]
    pub const fn document(&self) -> &D {
        &self.document
    }

    /// Give back the document.
    #[must_use]
    pub fn into_document(self) -> D {
        self.document
    }

    /// Stations whose marker the document currently resolves, in route order.
    #[must_use]
    pub fn resolvable_stations(&self) -> Vec<Station> {
        Station::ALL
            .into_iter()
            .filter(|&station| {
                MarkerSelector::for_station(station)
                    .and_then(|selector| self.document.find_marker(&selector))
                    .is_some()
            })
            .collect()
    }

    /// Apply one update to the document.
    ///
    /// Never fails: every problem degrades to [`ApplyOutcome::Skipped`].
    #[tracing::instrument(level = "debug", skip(self, update), fields(station = %update.station))]
    pub fn apply(&mut self, update: &StationStateUpdate) -> ApplyOutcome {
        let started = Instant::now();
        self.stats.record_received();
        metrics::record_update_received();

        let outcome = self.reconcile(update);
        match &outcome {
            ApplyOutcome::Applied { station, class, .. } => {
                self.stats.record_applied(*station, class);
                metrics::record_update_applied(*station);
            }
            ApplyOutcome::Skipped { reason, .. } => {
                self.stats.record_skipped();
                metrics::record_update_skipped(*reason);
            }
        }

        metrics::record_apply_duration(started.elapsed());
        outcome
    }

    fn reconcile(&mut self, update: &StationStateUpdate) -> ApplyOutcome {
        let station = update.station;

        let Some(selector) = MarkerSelector::for_station(station) else {
            tracing::debug!("Station has no map element");
            return ApplyOutcome::Skipped {
                station,
                reason: SkipReason::UnmappedStation,
            };
        };

        let Some(marker) = self.document.find_marker(&selector) else {
            tracing::debug!(%selector, "Marker not found, nothing to update");
            return ApplyOutcome::Skipped {
                station,
                reason: SkipReason::MarkerNotFound,
            };
        };
        tracing::debug!(%selector, "Marker found");

        let class = compose_class(&update.state);
        tracing::debug!(class = %class, "Composed marker class");

        let previous = self.document.class_attribute(marker);
        tracing::debug!(
            previous = previous.as_deref().unwrap_or_default(),
            "Current marker class"
        );

        if let Err(e) = self.document.set_class_attribute(marker, &class) {
            tracing::warn!(error = %e, %selector, "Failed to set marker class");
            return ApplyOutcome::Skipped {
                station,
                reason: SkipReason::WriteFailed,
            };
        }
        tracing::debug!(class = %class, "New marker class");

        ApplyOutcome::Applied {
            station,
            previous,
            class,
        }
    }

    /// Drain updates until the channel closes or shutdown is requested.
    ///
    /// Updates are applied strictly one after another in arrival order. The
    /// document is committed after every write. Returns the document.
    pub async fn run(
        mut self,
        mut updates: mpsc::Receiver<StationStateUpdate>,
        shutdown: CancellationToken,
    ) -> D {
        tracing::info!("Update dispatcher started");

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::info!("Update dispatcher shutting down");
                    break;
                }

                update = updates.recv() => {
                    let Some(update) = update else {
                        tracing::info!("Update channel closed");
                        break;
                    };
                    if self.apply(&update).is_applied() {
                        self.commit();
                    }
                }
            }
        }

        tracing::info!(
            received = self.stats.received(),
            applied = self.stats.applied(),
            skipped = self.stats.skipped(),
            "Update dispatcher stopped"
        );
        self.document
    }

    fn commit(&mut self) {
        if let Err(e) = self.document.commit() {
            tracing::warn!(error = %e, "Failed to commit map document");
            metrics::record_commit_failure();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
