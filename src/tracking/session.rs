//! Speed session lifecycle

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sample::Sample;
use super::speed::{average_speed, current_speed};
use super::window::SampleWindow;

/// Identifies one start-to-stop tracking interval
pub type SessionId = u64;

/// Callback fired with the fresh statistics
pub type Observer = Box<dyn FnMut(&SpeedSnapshot)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Tracking,
}

/// What happens with the max speed when a new session starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxSpeedPolicy {
    #[default]
    ResetOnStart,
    KeepAcrossSessions,
}

/// Statistics consumed by the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeedSnapshot {
    pub current_speed_kph: f64,
    pub max_speed_kph: f64,
    pub average_speed_kph: f64,
    pub sample_count: usize,
    /// Timestamp, in ms, of the newest sample
    pub last_update_timestamp: Option<i64>,
    pub tracking_active: bool,
    pub error_message: Option<String>,
}

/// Speed estimator over a bounded window of samples
pub struct SpeedSession {
    state: SessionState,
    id: SessionId,
    window: SampleWindow,
    policy: MaxSpeedPolicy,
    current: f64,
    max: f64,
    average: f64,
    error: Option<String>,
    observer: Option<Observer>,
}

impl SpeedSession {
    pub fn new(window_size: usize, policy: MaxSpeedPolicy) -> Self {
        Self {
            state: SessionState::Idle,
            id: 0,
            window: SampleWindow::new(window_size),
            policy,
            current: 0f64,
            max: 0f64,
            average: 0f64,
            error: None,
            observer: None,
        }
    }

    /// Register the observer notified on every update.
    ///
    /// It runs while the session is being updated, so it must not call back
    /// into the session.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&SpeedSnapshot) + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Begin a new session, dropping the previous window
    pub fn start(&mut self) -> SessionId {
        self.id += 1;
        self.state = SessionState::Tracking;
        self.window.clear();
        self.current = 0f64;
        self.average = 0f64;
        self.error = None;

        if self.policy == MaxSpeedPolicy::ResetOnStart {
            self.max = 0f64;
        }

        info!(session = self.id, window = self.window.capacity(), "Tracking started");
        self.notify();

        self.id
    }

    /// Feed a new sample of the session `id`.
    ///
    /// Samples of an old session or received while idle are ignored.
    pub fn on_sample(&mut self, id: SessionId, sample: Sample) -> Option<SpeedSnapshot> {
        if !self.accepts(id) {
            debug!(session = id, "Ignoring sample outside of the active session");
            return None;
        }

        self.window.push(sample);

        if self.window.len() >= 2 {
            match current_speed(&self.window) {
                Some(speed) => {
                    self.current = speed;
                    self.max = self.max.max(speed);
                }
                None => warn!(
                    timestamp = sample.timestamp,
                    "Sample without elapsed time since the previous one, keeping the current speed"
                ),
            }

            self.average = average_speed(&self.window);
        }
        self.error = None;

        debug!(
            session = id,
            samples = self.window.len(),
            current = self.current,
            max = self.max,
            average = self.average,
            "Sample processed"
        );

        let snapshot = self.snapshot();
        self.emit(&snapshot);

        Some(snapshot)
    }

    /// Halt the session `id` because the source failed
    pub fn on_error(&mut self, id: SessionId, message: String) {
        if !self.accepts(id) {
            debug!(session = id, "Ignoring error outside of the active session");
            return;
        }

        warn!(session = id, "Tracking halted: {}", message);
        self.state = SessionState::Idle;
        self.error = Some(message);
        self.notify();
    }

    /// Halt the session. The samples stay available until the next start
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }

        info!(session = self.id, samples = self.window.len(), "Tracking stopped");
        self.state = SessionState::Idle;
        self.notify();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> SpeedSnapshot {
        SpeedSnapshot {
            current_speed_kph: self.current,
            max_speed_kph: self.max,
            average_speed_kph: self.average,
            sample_count: self.window.len(),
            last_update_timestamp: self.window.last().map(|s| s.timestamp),
            tracking_active: self.is_tracking(),
            error_message: self.error.clone(),
        }
    }

    fn accepts(&self, id: SessionId) -> bool {
        self.state == SessionState::Tracking && id == self.id
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        self.emit(&snapshot);
    }

    fn emit(&mut self, snapshot: &SpeedSnapshot) {
        if let Some(observer) = self.observer.as_mut() {
            observer(snapshot);
        }
    }
}

impl Default for SpeedSession {
    fn default() -> Self {
        Self::new(super::window::DEFAULT_WINDOW_SIZE, MaxSpeedPolicy::default())
    }
}
