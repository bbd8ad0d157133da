//! Application Layer - Ports and the update dispatcher.
//!
//! This layer applies domain decisions to a map document it does not own
//! the implementation of.

/// Port interfaces for the map document.
pub mod ports;

/// Application services that consume station updates.
pub mod services;
