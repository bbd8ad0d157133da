//! Station Update Codec
//!
//! Decodes one line of newline-delimited JSON into a [`StationStateUpdate`].
//!
//! Two shapes are accepted:
//!
//! ```json
//! {"station":"STP","state":[{"train":"Hiawatha","state":"Stopped"}]}
//! {"event":"station-update","payload":{"station":"STP","state":[]}}
//! ```
//!
//! Envelopes naming any other event decode to `None`, as do blank lines.

use serde::Deserialize;

use crate::domain::network::{Station, StationStateForTrain, StationStateUpdate};

/// Event name carried by station update envelopes.
pub const STATION_UPDATE_EVENT: &str = "station-update";

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Station code outside the route.
    #[error("unknown station code: {0}")]
    UnknownStation(String),

    /// Envelope without a payload.
    #[error("station-update envelope has no payload")]
    MissingPayload,

    /// Line is not a JSON object.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

impl CodecError {
    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::UnknownStation(_) => "unknown_station",
            Self::MissingPayload => "missing_payload",
            Self::InvalidFormat(_) => "invalid_format",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

/// Payload as sent; the station stays a string so unknown codes can be
/// reported by name instead of as a generic JSON error.
#[derive(Debug, Deserialize)]
struct WireUpdate {
    station: String,
    #[serde(default)]
    state: Vec<StationStateForTrain>,
}

/// Decode one input line.
///
/// # Errors
///
/// Returns an error if the line is not a JSON object, is not a valid
/// payload, or names a station outside the route.
pub fn decode_line(line: &str) -> Result<Option<StationStateUpdate>, CodecError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.starts_with('{') {
        return Err(CodecError::InvalidFormat(format!(
            "expected JSON object, got: {}...",
            trimmed.chars().take(50).collect::<String>()
        )));
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)?;

    if value.get("event").is_some() {
        let envelope: Envelope = serde_json::from_value(value)?;
        if envelope.event != STATION_UPDATE_EVENT {
            return Ok(None);
        }
        let payload = envelope.payload.ok_or(CodecError::MissingPayload)?;
        return decode_payload(payload).map(Some);
    }

    decode_payload(value).map(Some)
}

fn decode_payload(value: serde_json::Value) -> Result<StationStateUpdate, CodecError> {
    let wire: WireUpdate = serde_json::from_value(value)?;
    let station =
        Station::from_code(&wire.station).ok_or(CodecError::UnknownStation(wire.station))?;
    Ok(StationStateUpdate::new(station, wire.state))
}
