#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::panic
    )
)]

//! Station Map - Live Train Position Renderer
//!
//! Consumes `station-update` events and keeps the marker of every station in
//! an SVG route map styled with the trains at or approaching it.
//!
//! # Layers (inside to outside)
//!
//! - **Domain**: Route vocabulary and pure rendering rules
//!   - `network`: Stations, trains, occupancy states and updates
//!   - `marker`: Element ids, class composition and marker selectors
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The map document a dispatcher writes to
//!   - `services`: The update dispatcher and its counters
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `svg`: quick-xml backed SVG document
//!   - `transport`: Newline-delimited JSON input
//!   - `config`: Environment configuration
//!   - `health`: Health check HTTP endpoint
//!   - `metrics`, `telemetry`: Prometheus metrics and tracing
//!
//! # Data Flow
//!
//! ```text
//! NDJSON input --> codec --> mpsc --> UpdateDispatcher --> SvgMapDocument --> output.svg
//!                                          |
//!                                    DispatchStats --> /health
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Route vocabulary with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::marker::{FALLBACK_CLASS, MarkerSelector, compose_class};
pub use domain::network::{Station, StationState, StationStateForTrain, StationStateUpdate, Train};

// Application
pub use application::ports::{DocumentError, InMemoryMapDocument, MapDocument, MarkerHandle};
pub use application::services::{ApplyOutcome, DispatchStats, SkipReason, UpdateDispatcher};

// Infrastructure config
pub use infrastructure::config::{ConfigError, InputSource, MapConfig, MapSource};

// SVG document
pub use infrastructure::svg::{SvgError, SvgMapDocument};

// Transport
pub use infrastructure::transport::{CodecError, ReaderSummary, decode_line, forward_lines};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
