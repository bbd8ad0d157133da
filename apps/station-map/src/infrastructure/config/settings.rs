//! Renderer Configuration Settings
//!
//! Configuration types for the station map renderer, loaded from environment
//! variables.

use std::path::{Path, PathBuf};

/// Where the route map SVG is read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MapSource {
    /// The map compiled into the binary.
    #[default]
    Bundled,
    /// An SVG file on disk.
    File(PathBuf),
}

impl MapSource {
    /// Human-readable description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Bundled => "bundled".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Where station updates are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Newline-delimited JSON on standard input.
    #[default]
    Stdin,
    /// Newline-delimited JSON in a file.
    File(PathBuf),
}

impl InputSource {
    /// Parse an input location; `-` means standard input.
    #[must_use]
    pub fn from_arg(value: &str) -> Self {
        if value == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(value))
        }
    }

    /// Human-readable description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Stdin => "stdin".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Inbound channel settings.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Capacity of the station update channel.
    pub capacity: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Health check and metrics HTTP port (0 = disabled).
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { health_port: 8083 }
    }
}

impl ServerSettings {
    /// Whether the health server should run.
    #[must_use]
    pub const fn health_enabled(&self) -> bool {
        self.health_port != 0
    }
}

/// Complete renderer configuration.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    /// Route map to render onto.
    pub map: MapSource,
    /// Path the current render is written to after each update.
    pub output: Option<PathBuf>,
    /// Station update source.
    pub input: InputSource,
    /// Inbound channel settings.
    pub channel: ChannelSettings,
    /// Server port settings.
    pub server: ServerSettings,
}

impl MapConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a path variable is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a path variable is set but empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let map = non_empty_path(&lookup, "STATION_MAP_SVG")?
            .map_or(MapSource::Bundled, MapSource::File);

        let output = non_empty_path(&lookup, "STATION_MAP_OUTPUT")?;

        let input = match lookup("STATION_MAP_INPUT") {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::EmptyValue("STATION_MAP_INPUT".to_string()));
            }
            Some(value) => InputSource::from_arg(value.trim()),
            None => InputSource::Stdin,
        };

        let channel = ChannelSettings {
            capacity: parse_or(
                &lookup,
                "STATION_MAP_CHANNEL_CAPACITY",
                ChannelSettings::default().capacity,
            )
            .max(1),
        };

        let server = ServerSettings {
            health_port: parse_or(
                &lookup,
                "STATION_MAP_HEALTH_PORT",
                ServerSettings::default().health_port,
            ),
        };

        Ok(Self {
            map,
            output,
            input,
            channel,
            server,
        })
    }

    /// Output path, if the render is persisted.
    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn non_empty_path<F>(lookup: &F, key: &str) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
        Some(value) => Ok(Some(PathBuf::from(value.trim()))),
        None => Ok(None),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
