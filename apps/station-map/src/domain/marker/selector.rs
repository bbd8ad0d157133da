//! Marker Selector
//!
//! Structural path from the map root to the visual primitive of one station:
//! map container, then the stations group, then the station's own group,
//! then its first `circle`. As a CSS selector: `#map #Stations #St_Paul circle`.

use std::fmt;

use crate::domain::network::Station;

use super::element_id::element_id;

/// `id` of the map container element.
pub const MAP_CONTAINER_ID: &str = "map";

/// `id` of the group holding every station group.
pub const STATIONS_GROUP_ID: &str = "Stations";

/// Element name of a station's visual primitive.
pub const MARKER_PRIMITIVE: &str = "circle";

/// Locates the marker primitive of one station group in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerSelector {
    element_id: &'static str,
}

impl MarkerSelector {
    /// Selector for a station group identifier.
    ///
    /// Returns `None` for an empty identifier, which marks an unmapped station.
    #[must_use]
    pub const fn from_element_id(element_id: &'static str) -> Option<Self> {
        if element_id.is_empty() {
            None
        } else {
            Some(Self { element_id })
        }
    }

    /// Selector for a station.
    #[must_use]
    pub const fn for_station(station: Station) -> Option<Self> {
        Self::from_element_id(element_id(station))
    }

    /// `id` of the station group.
    #[must_use]
    pub const fn element_id(&self) -> &'static str {
        self.element_id
    }

    /// Ancestor `id`s in the order they must be nested, outermost first.
    #[must_use]
    pub const fn ancestor_ids(&self) -> [&'static str; 3] {
        [MAP_CONTAINER_ID, STATIONS_GROUP_ID, self.element_id]
    }

    /// Element name of the marker primitive.
    #[must_use]
    pub const fn primitive(&self) -> &'static str {
        MARKER_PRIMITIVE
    }
}

impl fmt::Display for MarkerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{MAP_CONTAINER_ID} #{STATIONS_GROUP_ID} #{} {MARKER_PRIMITIVE}",
            self.element_id
        )
    }
}
