//! Station Update Transport
//!
//! Feeds the dispatcher's inbound channel from newline-delimited JSON.
//!
//! - **Codec**: decodes one `station-update` line
//! - **Reader**: drives any async line source into the channel

pub mod codec;
pub mod reader;

pub use codec::{CodecError, STATION_UPDATE_EVENT, decode_line};
pub use reader::{ReaderSummary, TransportError, forward_lines};
