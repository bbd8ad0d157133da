//! Station Marker Rendering Rules
//!
//! Pure functions that decide which map element represents a station and
//! which CSS class it should carry.
//!
//! - `element_id`: station to map element identifier
//! - `selector`: structural path from the map root to a station marker
//! - `class`: (train, state) pairs to a composed class attribute

mod class;
mod element_id;
mod selector;

pub use class::{FALLBACK_CLASS, class_token, compose_class};
pub use element_id::{element_id, element_id_for_code};
pub use selector::{MAP_CONTAINER_ID, MARKER_PRIMITIVE, MarkerSelector, STATIONS_GROUP_ID};
