//! Location sources API

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::Sample;

/// What a location source pushes to its listener
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Position(Sample),
    /// Human readable failure, eg.: permission denied
    Error(String),
}

/// Callback receiving the location events of one watch
pub type Listener = Box<dyn FnMut(LocationEvent)>;

/// Handle of an active watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// The location capability is missing, tracking never starts
    #[error("{0}")]
    SourceUnavailable(String),
    /// The source failed during an active session
    #[error("{0}")]
    Source(String),
}

/// Watch configuration handed to the source
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    pub enable_high_accuracy: bool,
    /// Max time to wait for each position
    #[serde(rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Duration,
    /// Max age of a cached position, zero to always ask a fresh one
    #[serde(rename = "maximum_age_ms", deserialize_with = "millis")]
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(5000),
            maximum_age: Duration::ZERO,
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Push based location source
pub trait LocationSource {
    /// Subscribe the listener to the position updates.
    ///
    /// Fails when the source can't provide locations at all.
    fn watch(&mut self, options: &WatchOptions, listener: Listener) -> Result<WatchId, TrackingError>;

    /// Cancel the watch. No event may reach its listener after this returns
    fn clear_watch(&mut self, id: WatchId);
}

/// Columns configuration of the file sources
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldsConfiguration {
    pub time: String,
    pub coordinates: String,
    pub speed: String,
    /// Coordinates written as `lat,lng` instead of `lng,lat`
    pub flip_coordinates: bool,
}

impl Default for FieldsConfiguration {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            coordinates: "coordinates".to_string(),
            speed: "speed".to_string(),
            flip_coordinates: false,
        }
    }
}

mod replay;
mod gpx_file;

pub use replay::ReplaySource;
pub use gpx_file::GpxSource;

#[cfg(feature = "csv")]
mod csv_file;

#[cfg(feature = "csv")]
pub use csv_file::CsvSource;
