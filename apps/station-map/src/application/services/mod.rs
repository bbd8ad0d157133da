//! Application Services
//!
//! - `UpdateDispatcher`: applies station updates to the map document

mod dispatcher;

pub use dispatcher::{ApplyOutcome, DispatchStats, LastApplied, SkipReason, UpdateDispatcher};
