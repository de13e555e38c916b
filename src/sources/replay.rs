//! Deterministic in-memory source

use std::collections::VecDeque;

use tracing::debug;

use super::{Listener, LocationEvent, LocationSource, TrackingError, WatchId, WatchOptions};
use crate::Sample;

/// Source replaying a fixed sequence of events, one at a time
pub struct ReplaySource {
    events: VecDeque<LocationEvent>,
    active: Option<(WatchId, Listener)>,
    next_id: u64,
    unavailable: Option<String>,
    options: Option<WatchOptions>,
}

impl ReplaySource {
    pub fn new(events: Vec<LocationEvent>) -> Self {
        Self {
            events: events.into(),
            active: None,
            next_id: 1,
            unavailable: None,
            options: None,
        }
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self::new(samples.into_iter().map(LocationEvent::Position).collect())
    }

    /// Source without location capability, every watch fails
    pub fn unavailable(message: &str) -> Self {
        let mut source = Self::new(vec![]);
        source.unavailable = Some(message.to_string());

        source
    }

    /// Queue one more event
    pub fn push(&mut self, event: LocationEvent) -> &mut Self {
        self.events.push_back(event);

        self
    }

    /// Deliver the next queued event to the active listener
    pub fn step(&mut self) -> bool {
        let Some((_, listener)) = self.active.as_mut() else {
            return false;
        };

        match self.events.pop_front() {
            Some(event) => {
                listener(event);
                true
            }
            None => false,
        }
    }

    /// Deliver every queued event while the watch is active
    pub fn replay(&mut self) -> usize {
        let mut delivered = 0;
        while self.step() {
            delivered += 1;
        }

        delivered
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_watching(&self) -> bool {
        self.active.is_some()
    }

    /// Options of the latest watch request
    pub fn options(&self) -> Option<&WatchOptions> {
        self.options.as_ref()
    }
}

impl LocationSource for ReplaySource {
    fn watch(&mut self, options: &WatchOptions, listener: Listener) -> Result<WatchId, TrackingError> {
        if let Some(message) = &self.unavailable {
            return Err(TrackingError::SourceUnavailable(message.clone()));
        }

        let id = WatchId(self.next_id);
        self.next_id += 1;
        self.options = Some(options.clone());
        self.active = Some((id, listener));
        debug!(watch = id.0, pending = self.events.len(), "Replay watch registered");

        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if matches!(&self.active, Some((active, _)) if *active == id) {
            self.active = None;
            debug!(watch = id.0, "Replay watch cleared");
        }
    }
}
