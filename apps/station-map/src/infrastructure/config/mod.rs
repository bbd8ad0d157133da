//! Configuration Module
//!
//! Configuration loading for the renderer.

mod settings;

pub use settings::{
    ChannelSettings, ConfigError, InputSource, MapConfig, MapSource, ServerSettings,
};
