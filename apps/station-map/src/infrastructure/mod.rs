//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete map document, the inbound transport and
//! the operational surface of the service.

/// SVG route map document adapter.
pub mod svg;

/// Station update codec and line reader.
pub mod transport;

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
