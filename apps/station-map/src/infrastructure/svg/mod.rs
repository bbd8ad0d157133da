//! SVG Route Map Document
//!
//! An in-memory SVG document implementing [`MapDocument`].
//!
//! The document is kept as the flat event stream produced by `quick-xml`, so
//! everything that is not a marker's `class` attribute (whitespace,
//! comments, styles, attribute order) is written back untouched.
//!
//! # Marker Resolution
//!
//! A selector `#map #Stations #St_Paul circle` matches the first `circle`
//! element, in document order, that has ancestors with the ids `map`,
//! `Stations` and `St_Paul` nested in that order. Other ancestors may sit in
//! between, as with CSS descendant combinators.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::application::ports::{DocumentError, MapDocument, MarkerHandle};
use crate::domain::marker::MarkerSelector;
use crate::infrastructure::config::MapSource;

/// Route map compiled into the binary.
pub const BUNDLED_MAP: &str = include_str!("../../../assets/route_map.svg");

/// SVG document loading and writing errors.
#[derive(Debug, thiserror::Error)]
pub enum SvgError {
    /// The map file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The map is not well-formed XML.
    #[error("malformed SVG: {0}")]
    Parse(String),

    /// The map contains no elements.
    #[error("SVG has no root element")]
    NoRootElement,

    /// The document could not be serialized.
    #[error("failed to serialize SVG: {0}")]
    Serialize(String),
}

/// Route map held in memory, optionally mirrored to a file.
#[derive(Debug, Clone)]
pub struct SvgMapDocument {
    events: Vec<Event<'static>>,
    output: Option<PathBuf>,
}

impl SvgMapDocument {
    /// Parse an SVG document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not well-formed XML or has no
    /// root element.
    pub fn parse(svg: &str) -> Result<Self, SvgError> {
        let mut reader = Reader::from_str(svg);
        let mut events = Vec::new();
        let mut depth = 0usize;
        let mut saw_element = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                SvgError::Parse(format!("at byte {}: {e}", reader.buffer_position()))
            })?;

            match &event {
                Event::Eof => break,
                Event::Start(_) => {
                    depth += 1;
                    saw_element = true;
                }
                Event::Empty(_) => saw_element = true,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
            events.push(event.into_owned());
        }

        if depth != 0 {
            return Err(SvgError::Parse(format!("{depth} unclosed element(s)")));
        }
        if !saw_element {
            return Err(SvgError::NoRootElement);
        }

        Ok(Self {
            events,
            output: None,
        })
    }

    /// The route map compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset is malformed.
    pub fn bundled() -> Result<Self, SvgError> {
        Self::parse(BUNDLED_MAP)
    }

    /// Read and parse an SVG file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn open(path: &Path) -> Result<Self, SvgError> {
        let svg = std::fs::read_to_string(path).map_err(|source| SvgError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&svg)
    }

    /// Load the map a configuration points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be read or parsed.
    pub fn load(source: &MapSource) -> Result<Self, SvgError> {
        match source {
            MapSource::Bundled => Self::bundled(),
            MapSource::File(path) => Self::open(path),
        }
    }

    /// Mirror the document to `path` on every commit.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// File the document is mirrored to, if any.
    #[must_use]
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Serialize the current render.
    ///
    /// # Errors
    ///
    /// Returns an error if an event cannot be written.
    pub fn to_svg_string(&self) -> Result<String, SvgError> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.events {
            writer
                .write_event(event.clone())
                .map_err(|e| SvgError::Serialize(e.to_string()))?;
        }
        String::from_utf8(writer.into_inner()).map_err(|e| SvgError::Serialize(e.to_string()))
    }

    /// Write the current render to `path`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self, path: &Path) -> Result<(), SvgError> {
        let svg = self.to_svg_string()?;
        let staging = staging_path(path);

        std::fs::write(&staging, svg).map_err(|source| SvgError::Io {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, path).map_err(|source| SvgError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn locate(&self, selector: &MarkerSelector) -> Option<usize> {
        let ancestors = selector.ancestor_ids();
        let primitive = selector.primitive().as_bytes();
        let mut open: Vec<Option<String>> = Vec::new();

        for (position, event) in self.events.iter().enumerate() {
            match event {
                Event::Start(start) => {
                    if start.local_name().as_ref() == primitive && nested_in_order(&open, &ancestors)
                    {
                        return Some(position);
                    }
                    open.push(attribute(start, "id"));
                }
                Event::Empty(start) => {
                    if start.local_name().as_ref() == primitive && nested_in_order(&open, &ancestors)
                    {
                        return Some(position);
                    }
                }
                Event::End(_) => {
                    open.pop();
                }
                _ => {}
            }
        }

        None
    }

    fn element(&self, marker: MarkerHandle) -> Option<&BytesStart<'static>> {
        match self.events.get(marker.position())? {
            Event::Start(start) | Event::Empty(start) => Some(start),
            _ => None,
        }
    }
}

impl MapDocument for SvgMapDocument {
    fn find_marker(&self, selector: &MarkerSelector) -> Option<MarkerHandle> {
        self.locate(selector).map(MarkerHandle::new)
    }

    fn class_attribute(&self, marker: MarkerHandle) -> Option<String> {
        self.element(marker)
            .and_then(|start| attribute(start, "class"))
    }

    fn set_class_attribute(
        &mut self,
        marker: MarkerHandle,
        class: &str,
    ) -> Result<(), DocumentError> {
        let position = marker.position();
        let start = match self.events.get_mut(position) {
            Some(Event::Start(start) | Event::Empty(start)) => start,
            _ => return Err(DocumentError::StaleMarker(position)),
        };

        *start = with_class(start, class)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DocumentError> {
        let Some(path) = self.output.as_deref() else {
            return Ok(());
        };
        self.save(path).map_err(|e| DocumentError::PersistFailed {
            message: e.to_string(),
        })
    }
}

/// Whether `ids` appear among the open elements' ids, in order.
fn nested_in_order(open: &[Option<String>], ids: &[&str]) -> bool {
    let mut wanted = ids.iter().peekable();
    for id in open.iter().flatten() {
        if wanted.peek().is_some_and(|want| **want == id.as_str()) {
            wanted.next();
        }
    }
    wanted.peek().is_none()
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Option<String> {
    start
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

/// Copy of `start` with its `class` attribute replaced, or appended if absent.
fn with_class(start: &BytesStart<'_>, class: &str) -> Result<BytesStart<'static>, DocumentError> {
    let name = String::from_utf8(start.name().as_ref().to_vec()).map_err(write_failed)?;

    let mut rebuilt = BytesStart::new(name);
    let mut replaced = false;
    for attr in start.attributes() {
        let attr = attr.map_err(write_failed)?;
        if attr.key.as_ref() == b"class" {
            if !replaced {
                rebuilt.push_attribute(("class", class));
                replaced = true;
            }
            continue;
        }

        // Output is always double-quoted; re-escape the value.
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(write_failed)?;
        let value = attr.unescape_value().map_err(write_failed)?;
        rebuilt.push_attribute((key, value.as_ref()));
    }
    if !replaced {
        rebuilt.push_attribute(("class", class));
    }

    Ok(rebuilt)
}

fn write_failed(e: impl std::fmt::Display) -> DocumentError {
    DocumentError::WriteFailed {
        message: e.to_string(),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::Station;

    const SMALL_MAP: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" id="map">
  <circle id="legend" class="legend"/>
  <g id="Stations">
    <g id="Winona">
      <!-- marker -->
      <circle cx="10" cy="10" r="4"/>
      <circle class="halo" cx="10" cy="10" r="8"/>
    </g>
    <g id="Chicago"><g id="inner"><circle class="cls-4" r="4"></circle></g></g>
    <g id="Tomah"><text>Tomah</text></g>
  </g>
  <g id="Elsewhere"><g id="Portage"><circle class="cls-4"/></g></g>
</svg>"#;

    fn selector(station: Station) -> MarkerSelector {
        MarkerSelector::for_station(station).unwrap()
    }

    #[test]
    fn bundled_map_resolves_every_station() {
        let document = SvgMapDocument::bundled().unwrap();
        for station in Station::ALL {
            let marker = document.find_marker(&selector(station));
            assert!(marker.is_some(), "no marker for {station}");
            assert_eq!(
                document.class_attribute(marker.unwrap()).as_deref(),
                Some("cls-4")
            );
        }
    }

    #[test]
    fn first_circle_in_station_group_is_the_marker() {
        let mut document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        let marker = document.find_marker(&selector(Station::Winona)).unwrap();
        assert_eq!(document.class_attribute(marker), None);

        document.set_class_attribute(marker, "BorealisStopped").unwrap();
        let svg = document.to_svg_string().unwrap();
        assert!(svg.contains(r#"<circle cx="10" cy="10" r="4" class="BorealisStopped"/>"#));
        assert!(svg.contains(r#"<circle class="halo" cx="10" cy="10" r="8"/>"#));
    }

    #[test]
    fn marker_may_be_nested_deeper_than_station_group() {
        let mut document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        let marker = document.find_marker(&selector(Station::Chicago)).unwrap();
        assert_eq!(document.class_attribute(marker).as_deref(), Some("cls-4"));

        document.set_class_attribute(marker, "HiawathaIncoming").unwrap();
        let svg = document.to_svg_string().unwrap();
        assert!(svg.contains(r#"<circle class="HiawathaIncoming" r="4"></circle>"#));
    }

    #[test]
    fn station_without_circle_is_not_found() {
        let document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        assert!(document.find_marker(&selector(Station::Tomah)).is_none());
    }

    #[test]
    fn station_outside_stations_group_is_not_found() {
        let document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        assert!(document.find_marker(&selector(Station::Portage)).is_none());
        assert!(document.find_marker(&selector(Station::Milwaukee)).is_none());
    }

    #[test]
    fn untouched_document_round_trips() {
        let document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        assert_eq!(document.to_svg_string().unwrap(), SMALL_MAP);
    }

    #[test]
    fn class_value_is_escaped() {
        let mut document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        let marker = document.find_marker(&selector(Station::Winona)).unwrap();
        document.set_class_attribute(marker, "a\"b").unwrap();
        assert_eq!(document.class_attribute(marker).as_deref(), Some("a\"b"));
        assert!(document.to_svg_string().unwrap().contains("class=\"a&quot;b\""));
    }

    #[test]
    fn sibling_attributes_stay_well_formed_after_rewrite() {
        let svg = r#"<svg id="map"><g id="Stations"><g id="Chicago"><circle data-label='say "hi" &amp; wave' class="cls-4"/></g></g></svg>"#;
        let mut document = SvgMapDocument::parse(svg).unwrap();
        let marker = document.find_marker(&selector(Station::Chicago)).unwrap();
        document.set_class_attribute(marker, "HiawathaStopped").unwrap();

        let written = document.to_svg_string().unwrap();
        assert!(written.contains(
            r#"<circle data-label="say &quot;hi&quot; &amp; wave" class="HiawathaStopped"/>"#
        ));

        let reloaded = SvgMapDocument::parse(&written).unwrap();
        let marker = reloaded.find_marker(&selector(Station::Chicago)).unwrap();
        let start = reloaded.element(marker).unwrap();
        let labels: Vec<String> = start
            .attributes()
            .with_checks(true)
            .map(|attr| {
                let attr = attr.unwrap();
                format!(
                    "{}={}",
                    String::from_utf8_lossy(attr.key.as_ref()),
                    attr.unescape_value().unwrap()
                )
            })
            .collect();
        assert_eq!(
            labels,
            vec!["data-label=say \"hi\" & wave", "class=HiawathaStopped"]
        );
    }

    #[test]
    fn handle_to_non_element_is_stale() {
        let mut document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        let err = document
            .set_class_attribute(MarkerHandle::new(10_000), "cls-4")
            .unwrap_err();
        assert_eq!(err, DocumentError::StaleMarker(10_000));
    }

    #[test]
    fn malformed_svg_is_rejected() {
        assert!(matches!(
            SvgMapDocument::parse("<svg><g></svg>"),
            Err(SvgError::Parse(_))
        ));
        assert!(matches!(
            SvgMapDocument::parse("<svg><g>"),
            Err(SvgError::Parse(_))
        ));
        assert!(matches!(
            SvgMapDocument::parse("  "),
            Err(SvgError::NoRootElement)
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SvgMapDocument::open(Path::new("/nonexistent/route_map.svg")).unwrap_err();
        assert!(matches!(err, SvgError::Io { .. }));
    }

    #[test]
    fn commit_without_output_is_a_no_op() {
        let mut document = SvgMapDocument::parse(SMALL_MAP).unwrap();
        assert!(document.output().is_none());
        assert!(document.commit().is_ok());
    }

    #[test]
    fn commit_mirrors_render_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.svg");
        let mut document = SvgMapDocument::parse(SMALL_MAP).unwrap().with_output(&path);

        let marker = document.find_marker(&selector(Station::Winona)).unwrap();
        document.set_class_attribute(marker, "EmpireBuilderStopped").unwrap();
        document.commit().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"class="EmpireBuilderStopped""#));
        assert!(!dir.path().join("live.svg.tmp").exists());

        let reloaded = SvgMapDocument::open(&path).unwrap();
        let marker = reloaded.find_marker(&selector(Station::Winona)).unwrap();
        assert_eq!(
            reloaded.class_attribute(marker).as_deref(),
            Some("EmpireBuilderStopped")
        );
    }

    #[test]
    fn nested_in_order_requires_order() {
        let open = vec![
            Some("map".to_string()),
            None,
            Some("Stations".to_string()),
            Some("Winona".to_string()),
        ];
        assert!(nested_in_order(&open, &["map", "Stations", "Winona"]));
        assert!(!nested_in_order(&open, &["Stations", "map", "Winona"]));
        assert!(!nested_in_order(&open, &["map", "Stations", "Chicago"]));
    }
}
