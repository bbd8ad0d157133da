//! Marker Class Composition
//!
//! Reconciles the per-train states of one station into the value of its
//! marker's `class` attribute.
//!
//! Tokens have the form `<Train><State>` (e.g. `HiawathaStopped`) and are
//! consumed by the map stylesheet, so they are a stable contract. A station
//! with no active train gets [`FALLBACK_CLASS`].

use crate::domain::network::{StationState, StationStateForTrain, Train};

/// Class applied to a marker when no train is at or approaching the station.
pub const FALLBACK_CLASS: &str = "cls-4";

/// Class token for one train in one state.
#[must_use]
pub fn class_token(train: Train, state: StationState) -> String {
    format!("{}{}", train.as_str(), state.as_str())
}

/// Compose the marker class for a station from its per-train states.
///
/// `Empty` entries contribute nothing. Remaining entries contribute one token
/// each, space-separated, in input order. Duplicate trains are not merged:
/// a train listed twice contributes two tokens. If no entry contributes, the
/// result is [`FALLBACK_CLASS`].
///
/// # Example
///
/// ```rust
/// use station_map::domain::marker::{FALLBACK_CLASS, compose_class};
/// use station_map::domain::network::{StationState, StationStateForTrain, Train};
///
/// let states = [
///     StationStateForTrain::new(Train::Hiawatha, StationState::Empty),
///     StationStateForTrain::new(Train::Borealis, StationState::Incoming),
/// ];
/// assert_eq!(compose_class(&states), "BorealisIncoming");
/// assert_eq!(compose_class(&[]), FALLBACK_CLASS);
/// ```
#[must_use]
pub fn compose_class(states: &[StationStateForTrain]) -> String {
    let mut classes = String::new();
    for entry in states.iter().filter(|entry| entry.state.is_active()) {
        classes.push_str(entry.train.as_str());
        classes.push_str(entry.state.as_str());
        classes.push(' ');
    }

    if classes.is_empty() {
        return FALLBACK_CLASS.to_string();
    }

    classes.truncate(classes.trim_end().len());
    classes
}
