//! Route Network Vocabulary
//!
//! Closed enumerations for the stations along the route, the services that
//! run on it, and the occupancy state of a station with respect to a train.
//!
//! # Wire Names
//!
//! Stations travel as their short codes (`STP`, `MKE`, ...), trains and
//! states as their names (`Hiawatha`, `Stopped`, ...). The upstream feed
//! names services by their long names, so those are accepted as aliases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Station
// =============================================================================

/// A stop on the route, listed from the northern to the southern terminus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Station {
    /// St. Paul Union Depot.
    #[serde(rename = "STP", alias = "MSP")]
    StPaul,
    /// Red Wing.
    #[serde(rename = "RDW")]
    RedWing,
    /// Winona.
    #[serde(rename = "WIN")]
    Winona,
    /// La Crosse.
    #[serde(rename = "LSE")]
    LaCrosse,
    /// Tomah.
    #[serde(rename = "TOH")]
    Tomah,
    /// Wisconsin Dells.
    #[serde(rename = "WDL")]
    WisconsinDells,
    /// Portage.
    #[serde(rename = "POG")]
    Portage,
    /// Columbus.
    #[serde(rename = "CBS")]
    Columbus,
    /// Milwaukee Intermodal.
    #[serde(rename = "MKE")]
    Milwaukee,
    /// Milwaukee Airport.
    #[serde(rename = "MKA")]
    MilwaukeeAirport,
    /// Sturtevant.
    #[serde(rename = "SVT")]
    Sturtevant,
    /// Chicago Union Station.
    #[serde(rename = "CHI")]
    Chicago,
}

impl Station {
    /// Number of stations on the route.
    pub const COUNT: usize = 12;

    /// Every station, in route order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::StPaul,
        Self::RedWing,
        Self::Winona,
        Self::LaCrosse,
        Self::Tomah,
        Self::WisconsinDells,
        Self::Portage,
        Self::Columbus,
        Self::Milwaukee,
        Self::MilwaukeeAirport,
        Self::Sturtevant,
        Self::Chicago,
    ];

    /// Position of the station in route order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::StPaul => 0,
            Self::RedWing => 1,
            Self::Winona => 2,
            Self::LaCrosse => 3,
            Self::Tomah => 4,
            Self::WisconsinDells => 5,
            Self::Portage => 6,
            Self::Columbus => 7,
            Self::Milwaukee => 8,
            Self::MilwaukeeAirport => 9,
            Self::Sturtevant => 10,
            Self::Chicago => 11,
        }
    }

    /// Short station code used in wire payloads.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::StPaul => "STP",
            Self::RedWing => "RDW",
            Self::Winona => "WIN",
            Self::LaCrosse => "LSE",
            Self::Tomah => "TOH",
            Self::WisconsinDells => "WDL",
            Self::Portage => "POG",
            Self::Columbus => "CBS",
            Self::Milwaukee => "MKE",
            Self::MilwaukeeAirport => "MKA",
            Self::Sturtevant => "SVT",
            Self::Chicago => "CHI",
        }
    }

    /// Look up a station by its wire code.
    ///
    /// Codes are matched case-insensitively. `MSP` is the code the upstream
    /// feed uses for St. Paul.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.eq_ignore_ascii_case("MSP") {
            return Some(Self::StPaul);
        }
        Self::ALL
            .into_iter()
            .find(|station| station.code().eq_ignore_ascii_case(code))
    }
}

// `ALL[i]` must be the station whose `index()` is `i`, which also rules out
// repeats in `ALL`. A new variant is forced into `index` and `code` by their
// exhaustive matches, but `COUNT` and `ALL` have to be extended by hand.
const _: () = {
    let mut i = 0;
    while i < Station::COUNT {
        assert!(
            Station::ALL[i].index() == i,
            "Station::ALL is out of sync with Station::index"
        );
        i += 1;
    }
};

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a station code is not on the route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown station code: {0}")]
pub struct UnknownStationCode(pub String);

impl FromStr for Station {
    type Err = UnknownStationCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnknownStationCode(s.to_string()))
    }
}

// =============================================================================
// Train
// =============================================================================

/// A named service running on the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Train {
    /// Hiawatha Service (Chicago - Milwaukee).
    #[serde(alias = "Hiawatha Service")]
    Hiawatha,
    /// Borealis (St. Paul - Chicago).
    Borealis,
    /// Empire Builder (Chicago - Pacific Northwest).
    #[serde(alias = "Empire Builder")]
    EmpireBuilder,
}

impl Train {
    /// Every service.
    pub const ALL: [Self; 3] = [Self::Hiawatha, Self::Borealis, Self::EmpireBuilder];

    /// Service name as it appears in class tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hiawatha => "Hiawatha",
            Self::Borealis => "Borealis",
            Self::EmpireBuilder => "EmpireBuilder",
        }
    }
}

impl fmt::Display for Train {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Station State
// =============================================================================

/// Occupancy of a station with respect to one train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StationState {
    /// The train is neither at nor approaching the station.
    #[default]
    Empty,
    /// The train is approaching but has not arrived.
    Incoming,
    /// The train is at the station.
    Stopped,
}

impl StationState {
    /// Every state.
    pub const ALL: [Self; 3] = [Self::Empty, Self::Incoming, Self::Stopped];

    /// State name as it appears in class tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Incoming => "Incoming",
            Self::Stopped => "Stopped",
        }
    }

    /// Whether a train in this state is present at or near the station.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl fmt::Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Updates
// =============================================================================

/// The state of one train with respect to one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationStateForTrain {
    /// The service.
    pub train: Train,
    /// Its occupancy state.
    pub state: StationState,
}

impl StationStateForTrain {
    /// Pair a train with a state.
    #[must_use]
    pub const fn new(train: Train, state: StationState) -> Self {
        Self { train, state }
    }
}

/// One inbound `station-update` event.
///
/// Trains missing from `state` are implicitly [`StationState::Empty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationStateUpdate {
    /// The station whose marker is being updated.
    pub station: Station,
    /// Per-train states, in the order they were produced.
    pub state: Vec<StationStateForTrain>,
}

impl StationStateUpdate {
    /// Create an update.
    #[must_use]
    pub const fn new(station: Station, state: Vec<StationStateForTrain>) -> Self {
        Self { station, state }
    }

    /// An update declaring the station empty of all trains.
    #[must_use]
    pub const fn cleared(station: Station) -> Self {
        Self::new(station, Vec::new())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_round_trip_through_from_code() {
        for station in Station::ALL {
            assert_eq!(Station::from_code(station.code()), Some(station));
        }
    }

    #[test]
    fn from_code_is_case_insensitive() {
        assert_eq!(Station::from_code("mke"), Some(Station::Milwaukee));
        assert_eq!(Station::from_code(" chi "), Some(Station::Chicago));
    }

    #[test]
    fn upstream_st_paul_code_is_accepted() {
        assert_eq!(Station::from_code("MSP"), Some(Station::StPaul));
        let station: Station = serde_json::from_str("\"MSP\"").unwrap();
        assert_eq!(station, Station::StPaul);
    }

    #[test]
    fn unknown_code_fails_to_parse() {
        let err = "XYZ".parse::<Station>().unwrap_err();
        assert_eq!(err, UnknownStationCode("XYZ".to_string()));
        assert_eq!(err.to_string(), "unknown station code: XYZ");
    }

    #[test]
    fn stations_serialize_as_codes() {
        assert_eq!(
            serde_json::to_string(&Station::MilwaukeeAirport).unwrap(),
            "\"MKA\""
        );
        assert_eq!(Station::WisconsinDells.to_string(), "WDL");
    }

    #[test]
    fn all_lists_each_station_once_at_its_index() {
        let stations: HashSet<Station> = Station::ALL.into_iter().collect();
        let codes: HashSet<&str> = Station::ALL.into_iter().map(Station::code).collect();
        assert_eq!(stations.len(), Station::COUNT);
        assert_eq!(codes.len(), Station::COUNT);
        for (position, station) in Station::ALL.into_iter().enumerate() {
            assert_eq!(station.index(), position);
        }
    }

    #[test]
    fn route_order_runs_north_to_south() {
        assert_eq!(Station::ALL[0], Station::StPaul);
        assert_eq!(Station::ALL[Station::COUNT - 1], Station::Chicago);
        assert!(Station::Winona < Station::Milwaukee);
    }

    #[test]
    fn train_long_names_deserialize() {
        let train: Train = serde_json::from_str("\"Hiawatha Service\"").unwrap();
        assert_eq!(train, Train::Hiawatha);
        let train: Train = serde_json::from_str("\"Empire Builder\"").unwrap();
        assert_eq!(train, Train::EmpireBuilder);
        let train: Train = serde_json::from_str("\"Borealis\"").unwrap();
        assert_eq!(train, Train::Borealis);
    }

    #[test]
    fn unknown_train_is_rejected() {
        assert!(serde_json::from_str::<Train>("\"Lake Shore Limited\"").is_err());
    }

    #[test]
    fn state_activity() {
        assert!(!StationState::Empty.is_active());
        assert!(StationState::Incoming.is_active());
        assert!(StationState::Stopped.is_active());
        assert_eq!(StationState::default(), StationState::Empty);
    }

    #[test]
    fn update_deserializes_from_wire_shape() {
        let json = r#"{"station":"MKE","state":[
            {"train":"EmpireBuilder","state":"Incoming"},
            {"train":"Borealis","state":"Empty"}
        ]}"#;
        let update: StationStateUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.station, Station::Milwaukee);
        assert_eq!(
            update.state,
            vec![
                StationStateForTrain::new(Train::EmpireBuilder, StationState::Incoming),
                StationStateForTrain::new(Train::Borealis, StationState::Empty),
            ]
        );
    }
}
