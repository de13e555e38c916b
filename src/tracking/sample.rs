//! Sample definition

use geo::geometry::Point;
use time::OffsetDateTime;

/// One timestamped position reading, as delivered by the location source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// x: longitude, y: latitude
    pub coordinates: Point,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
    /// Speed reported by the device itself, in m/s
    pub speed: Option<f64>,
}

impl Sample {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            coordinates: Point::new(longitude, latitude),
            timestamp,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: Option<f64>) -> Self {
        self.speed = speed;

        self
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.y()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.x()
    }

    /// Sample time as a date
    pub fn time(&self) -> Result<OffsetDateTime, String> {
        OffsetDateTime::from_unix_timestamp_nanos(self.timestamp as i128 * 1_000_000)
            .map_err(|e| format!("Invalid sample timestamp {}: {}", self.timestamp, e))
    }
}

impl From<(Point, OffsetDateTime)> for Sample {
    fn from((coordinates, time): (Point, OffsetDateTime)) -> Self {
        Self {
            coordinates,
            timestamp: (time.unix_timestamp_nanos() / 1_000_000) as i64,
            speed: None,
        }
    }
}
