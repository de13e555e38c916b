//! Speed tracker API, binds a location source to a speed session

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::session::{SpeedSession, SpeedSnapshot};
use crate::sources::{Listener, LocationEvent, LocationSource, TrackingError, WatchId, WatchOptions};

pub struct SpeedTracker<S>
where
    S: LocationSource,
{
    source: S,
    options: WatchOptions,
    session: Rc<RefCell<SpeedSession>>,
    watch: Option<WatchId>,
}

impl<S> SpeedTracker<S>
where
    S: LocationSource,
{
    pub fn new(source: S, options: WatchOptions, session: SpeedSession) -> Self {
        Self {
            source,
            options,
            session: Rc::new(RefCell::new(session)),
            watch: None,
        }
    }

    /// Start tracking, unless already tracking
    pub fn start(&mut self) -> Result<(), TrackingError> {
        self.release_idle_watch();

        if self.watch.is_some() {
            return Ok(());
        }

        let id = self.session.borrow_mut().start();

        let session = Rc::clone(&self.session);
        let listener: Listener = Box::new(move |event: LocationEvent| {
            let mut session = session.borrow_mut();
            match event {
                LocationEvent::Position(sample) => {
                    session.on_sample(id, sample);
                }
                LocationEvent::Error(message) => session.on_error(id, message),
            }
        });

        match self.source.watch(&self.options, listener) {
            Ok(watch) => {
                debug!(watch = watch.0, session = id, "Location watch registered");
                self.watch = Some(watch);
                Ok(())
            }
            Err(e) => {
                self.session.borrow_mut().on_error(id, e.to_string());
                Err(e)
            }
        }
    }

    /// Stop tracking. The source watch is gone once this returns
    pub fn stop(&mut self) {
        if let Some(watch) = self.watch.take() {
            self.source.clear_watch(watch);
            debug!(watch = watch.0, "Location watch cleared");
        }

        self.session.borrow_mut().stop();
    }

    /// Drop the watch of a session halted by a source error
    pub fn release_idle_watch(&mut self) {
        if self.watch.is_some() && !self.is_tracking() {
            self.stop();
        }
    }

    /// Error that halted the latest session, if any
    pub fn check(&self) -> Result<(), TrackingError> {
        match self.session.borrow().error() {
            Some(message) => Err(TrackingError::Source(message.to_string())),
            None => Ok(()),
        }
    }

    /// Observe every statistics update
    pub fn on_update<F>(&mut self, observer: F)
    where
        F: FnMut(&SpeedSnapshot) + 'static,
    {
        self.session.borrow_mut().set_observer(observer);
    }

    pub fn is_tracking(&self) -> bool {
        self.session.borrow().is_tracking()
    }

    pub fn snapshot(&self) -> SpeedSnapshot {
        self.session.borrow().snapshot()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S> Drop for SpeedTracker<S>
where
    S: LocationSource,
{
    fn drop(&mut self) {
        if let Some(watch) = self.watch.take() {
            self.source.clear_watch(watch);
        }
    }
}
