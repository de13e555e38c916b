//! speedtracker - live speed statistics from a location stream

mod tracking;
pub mod sources;
pub mod config;

#[cfg(feature = "bot")]
pub mod bot;

pub use tracking::sample::Sample;
pub use tracking::session::{MaxSpeedPolicy, SessionId, SessionState, SpeedSession, SpeedSnapshot};
pub use tracking::speed::{average_speed, current_speed, distance_meters, pairwise_speed};
pub use tracking::tracker::SpeedTracker;
pub use tracking::window::{SampleWindow, DEFAULT_WINDOW_SIZE};
pub use sources::{FieldsConfiguration, LocationEvent, LocationSource, TrackingError, WatchOptions};
