//! Port Interfaces
//!
//! Defines the interface to the map document following the Hexagonal
//! Architecture pattern. The dispatcher is handed a document rather than
//! reaching for a global one, so it can be driven without a renderer.
//!
//! ## Driven Ports (Outbound)
//!
//! - `MapDocument`: locate station markers and rewrite their `class`

use std::collections::HashMap;

use crate::domain::marker::MarkerSelector;

/// Opaque reference to a marker element, valid for the document that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(usize);

impl MarkerHandle {
    /// Wrap a document-specific position.
    #[must_use]
    pub const fn new(position: usize) -> Self {
        Self(position)
    }

    /// The document-specific position.
    #[must_use]
    pub const fn position(self) -> usize {
        self.0
    }
}

/// Map document error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The handle does not refer to a marker element in this document.
    #[error("stale marker handle at position {0}")]
    StaleMarker(usize),

    /// The class attribute could not be written.
    #[error("failed to write class attribute: {message}")]
    WriteFailed {
        /// Error details.
        message: String,
    },

    /// The rendered document could not be persisted.
    #[error("failed to persist map document: {message}")]
    PersistFailed {
        /// Error details.
        message: String,
    },
}

/// Port for the rendered route map.
pub trait MapDocument: Send {
    /// Locate the marker a selector points at.
    ///
    /// Returns `None` when the document has no such element, which is not an
    /// error: the map may not be loaded yet or may not show that station.
    fn find_marker(&self, selector: &MarkerSelector) -> Option<MarkerHandle>;

    /// Current value of a marker's `class` attribute, if it has one.
    fn class_attribute(&self, marker: MarkerHandle) -> Option<String>;

    /// Replace a marker's `class` attribute wholesale.
    fn set_class_attribute(
        &mut self,
        marker: MarkerHandle,
        class: &str,
    ) -> Result<(), DocumentError>;

    /// Make applied changes visible outside the process.
    ///
    /// Documents that are only observed in memory need not override this.
    fn commit(&mut self) -> Result<(), DocumentError> {
        Ok(())
    }
}

/// Flat in-memory map keyed by station element id, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMapDocument {
    markers: Vec<(String, Option<String>)>,
    index: HashMap<String, usize>,
    writes: usize,
}

impl InMemoryMapDocument {
    /// Create a document with no markers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with one unstyled marker per element id.
    #[must_use]
    pub fn with_markers<I, S>(element_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut document = Self::new();
        for id in element_ids {
            document.insert_marker(id, None);
        }
        document
    }

    /// Add a marker, or reset an existing one's class.
    pub fn insert_marker(&mut self, element_id: impl Into<String>, class: Option<&str>) {
        let element_id = element_id.into();
        let class = class.map(str::to_string);
        if let Some(&position) = self.index.get(&element_id) {
            self.markers[position].1 = class;
        } else {
            self.index.insert(element_id.clone(), self.markers.len());
            self.markers.push((element_id, class));
        }
    }

    /// Current class of the marker with the given element id.
    #[must_use]
    pub fn class_of(&self, element_id: &str) -> Option<&str> {
        self.index
            .get(element_id)
            .and_then(|&position| self.markers[position].1.as_deref())
    }

    /// Number of class attribute writes performed.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl MapDocument for InMemoryMapDocument {
    fn find_marker(&self, selector: &MarkerSelector) -> Option<MarkerHandle> {
        self.index
            .get(selector.element_id())
            .copied()
            .map(MarkerHandle::new)
    }

    fn class_attribute(&self, marker: MarkerHandle) -> Option<String> {
        self.markers
            .get(marker.position())
            .and_then(|(_, class)| class.clone())
    }

    fn set_class_attribute(
        &mut self,
        marker: MarkerHandle,
        class: &str,
    ) -> Result<(), DocumentError> {
        let (_, current) = self
            .markers
            .get_mut(marker.position())
            .ok_or(DocumentError::StaleMarker(marker.position()))?;
        *current = Some(class.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::Station;

    #[test]
    fn finds_markers_by_element_id() {
        let document = InMemoryMapDocument::with_markers(["St_Paul", "Chicago"]);
        let selector = MarkerSelector::for_station(Station::Chicago).unwrap();
        assert!(document.find_marker(&selector).is_some());

        let missing = MarkerSelector::for_station(Station::Tomah).unwrap();
        assert!(document.find_marker(&missing).is_none());
    }

    #[test]
    fn set_class_replaces_value_and_counts_writes() {
        let mut document = InMemoryMapDocument::new();
        document.insert_marker("Winona", Some("cls-4"));
        let selector = MarkerSelector::for_station(Station::Winona).unwrap();
        let marker = document.find_marker(&selector).unwrap();

        assert_eq!(document.class_attribute(marker).as_deref(), Some("cls-4"));
        document.set_class_attribute(marker, "HiawathaStopped").unwrap();
        assert_eq!(document.class_of("Winona"), Some("HiawathaStopped"));
        assert_eq!(document.writes(), 1);
    }

    #[test]
    fn stale_handle_is_an_error() {
        let mut document = InMemoryMapDocument::new();
        let err = document
            .set_class_attribute(MarkerHandle::new(7), "cls-4")
            .unwrap_err();
        assert_eq!(err, DocumentError::StaleMarker(7));
    }

    #[test]
    fn default_commit_is_a_no_op() {
        let mut document = InMemoryMapDocument::new();
        assert!(document.commit().is_ok());
    }
}
