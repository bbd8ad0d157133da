//! Domain Layer - Route vocabulary and marker rendering rules.
//!
//! Pure types and functions with no I/O. Everything here is deterministic
//! and can be tested without a map document.

/// Stations, trains, occupancy states and update value objects.
pub mod network;

/// Station-to-element mapping and class composition.
pub mod marker;
