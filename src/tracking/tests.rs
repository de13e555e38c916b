
use std::cell::RefCell;
use std::rc::Rc;

use super::sample::Sample;
use super::session::{MaxSpeedPolicy, SessionState, SpeedSession, SpeedSnapshot};
use super::tracker::SpeedTracker;
use crate::sources::{
    Listener, LocationEvent, LocationSource, ReplaySource, TrackingError, WatchId, WatchOptions,
};

/// Mean earth radius used by the haversine formula
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Speed of 0.001 degrees along the equator per second
fn step_kph() -> f64 {
    EARTH_RADIUS * 0.001f64.to_radians() * 3.6
}

fn close(expected: f64, value: f64) -> bool {
    (expected - value).abs() < 1e-3
}

fn equator_run() -> Vec<Sample> {
    vec![
        Sample::new(0.0, 0.0, 0),
        Sample::new(0.0, 0.001, 1000),
        Sample::new(0.0, 0.002, 2000),
    ]
}

#[test]
fn equator_run_stats() {
    let mut session = SpeedSession::default();
    let id = session.start();

    let mut last = None;
    for sample in equator_run() {
        last = session.on_sample(id, sample);
    }

    let snapshot = last.unwrap();
    assert!((snapshot.current_speed_kph - 400.0).abs() < 1.0);
    assert!(close(step_kph(), snapshot.current_speed_kph));
    assert!(close(step_kph(), snapshot.max_speed_kph));
    assert!(close(step_kph(), snapshot.average_speed_kph));
    assert_eq!(3, snapshot.sample_count);
    assert_eq!(Some(2000), snapshot.last_update_timestamp);
    assert!(snapshot.tracking_active);
    assert_eq!(None, snapshot.error_message);
}

#[test]
fn single_sample_is_still() {
    let mut session = SpeedSession::default();
    let id = session.start();

    let snapshot = session.on_sample(id, Sample::new(10.0, 10.0, 0)).unwrap();
    assert_eq!(0.0, snapshot.current_speed_kph);
    assert_eq!(0.0, snapshot.average_speed_kph);
    assert_eq!(0.0, snapshot.max_speed_kph);
    assert_eq!(1, snapshot.sample_count);
}

#[test]
fn max_is_running_maximum() {
    let mut session = SpeedSession::default();
    let id = session.start();

    // 1x, 3x, 2x, 1x the equator step per second
    let longitudes = [0.0, 0.001, 0.004, 0.006, 0.007];
    let mut currents = vec![];
    let mut previous_max = 0.0;

    for (i, lng) in longitudes.iter().enumerate() {
        let snapshot = session
            .on_sample(id, Sample::new(0.0, *lng, i as i64 * 1000))
            .unwrap();

        if i > 0 {
            currents.push(snapshot.current_speed_kph);
        }
        let expected = currents.iter().cloned().fold(0.0, f64::max);
        assert_eq!(expected, snapshot.max_speed_kph);
        assert!(snapshot.max_speed_kph >= previous_max);
        previous_max = snapshot.max_speed_kph;
    }

    assert!(close(3.0 * step_kph(), previous_max));
    assert!(close(step_kph(), session.snapshot().current_speed_kph));
}

#[test]
fn average_over_window_only() {
    let mut session = SpeedSession::new(3, MaxSpeedPolicy::ResetOnStart);
    let id = session.start();

    // first pair at 3x, the following ones at 1x
    let longitudes = [0.0, 0.003, 0.004, 0.005];
    for (i, lng) in longitudes.iter().enumerate() {
        session.on_sample(id, Sample::new(0.0, *lng, i as i64 * 1000));
    }

    let snapshot = session.snapshot();
    assert_eq!(3, snapshot.sample_count);
    assert!(close(step_kph(), snapshot.average_speed_kph));
    assert!(close(3.0 * step_kph(), snapshot.max_speed_kph));
}

#[test]
fn duplicated_timestamp_keeps_current() {
    let mut session = SpeedSession::default();
    let id = session.start();

    session.on_sample(id, Sample::new(0.0, 0.0, 0));
    session.on_sample(id, Sample::new(0.0, 0.001, 1000));
    let snapshot = session
        .on_sample(id, Sample::new(0.0, 0.002, 1000))
        .unwrap();

    assert!(snapshot.current_speed_kph.is_finite());
    assert!(close(step_kph(), snapshot.current_speed_kph));
    assert!(close(step_kph(), snapshot.max_speed_kph));
    assert!(close(step_kph(), snapshot.average_speed_kph));
    assert_eq!(3, snapshot.sample_count);
}

#[test]
fn max_reset_policy() {
    let mut session = SpeedSession::new(10, MaxSpeedPolicy::ResetOnStart);
    let id = session.start();
    for sample in equator_run() {
        session.on_sample(id, sample);
    }
    session.stop();
    assert!(close(step_kph(), session.snapshot().max_speed_kph));

    session.start();
    let snapshot = session.snapshot();
    assert_eq!(0.0, snapshot.max_speed_kph);
    assert_eq!(0.0, snapshot.current_speed_kph);
    assert_eq!(0, snapshot.sample_count);
}

#[test]
fn max_keep_policy() {
    let mut session = SpeedSession::new(10, MaxSpeedPolicy::KeepAcrossSessions);
    let id = session.start();
    for sample in equator_run() {
        session.on_sample(id, sample);
    }
    session.stop();

    session.start();
    let snapshot = session.snapshot();
    assert!(close(step_kph(), snapshot.max_speed_kph));
    assert_eq!(0.0, snapshot.current_speed_kph);
    assert_eq!(0.0, snapshot.average_speed_kph);
    assert_eq!(0, snapshot.sample_count);
}

#[test]
fn stale_session_ignored() {
    let mut session = SpeedSession::default();
    let old = session.start();
    session.on_sample(old, Sample::new(0.0, 0.0, 0));
    session.stop();

    assert_eq!(None, session.on_sample(old, Sample::new(0.0, 0.001, 1000)));
    assert_eq!(1, session.snapshot().sample_count);

    let new = session.start();
    assert_ne!(old, new);
    assert_eq!(None, session.on_sample(old, Sample::new(0.0, 0.002, 2000)));
    session.on_error(old, "old failure".to_string());
    assert_eq!(SessionState::Tracking, session.state());
    assert_eq!(None, session.error());
}

#[test]
fn error_halts_session() {
    let mut session = SpeedSession::default();
    let id = session.start();
    session.on_sample(id, Sample::new(0.0, 0.0, 0));

    session.on_error(id, "User denied Geolocation".to_string());
    assert_eq!(SessionState::Idle, session.state());

    let snapshot = session.snapshot();
    assert!(!snapshot.tracking_active);
    assert_eq!(Some("User denied Geolocation".to_string()), snapshot.error_message);

    assert_eq!(None, session.on_sample(id, Sample::new(0.0, 0.001, 1000)));

    // a new session clears the error
    session.start();
    assert_eq!(None, session.snapshot().error_message);
}

#[test]
fn observer_sees_updates() {
    let seen: Rc<RefCell<Vec<SpeedSnapshot>>> = Rc::new(RefCell::new(vec![]));
    let sink = Rc::clone(&seen);

    let mut session = SpeedSession::default();
    session.set_observer(move |s| sink.borrow_mut().push(s.clone()));

    let id = session.start();
    for sample in equator_run() {
        session.on_sample(id, sample);
    }
    session.stop();

    let seen = seen.borrow();
    // start, three samples, stop
    assert_eq!(5, seen.len());
    assert!(seen[0].tracking_active);
    assert_eq!(3, seen[3].sample_count);
    assert!(!seen[4].tracking_active);
}

#[test]
fn tracker_replay() -> Result<(), String> {
    let source = ReplaySource::from_samples(equator_run());
    let mut tracker = SpeedTracker::new(source, WatchOptions::default(), SpeedSession::default());

    tracker.start().map_err(|e| e.to_string())?;
    assert!(tracker.is_tracking());
    assert_eq!(Some(&WatchOptions::default()), tracker.source().options());

    assert_eq!(3, tracker.source_mut().replay());

    let snapshot = tracker.snapshot();
    assert!(close(step_kph(), snapshot.current_speed_kph));
    assert!(close(step_kph(), snapshot.average_speed_kph));

    tracker.stop();
    assert!(!tracker.is_tracking());
    assert!(!tracker.source().is_watching());
    assert_eq!(3, tracker.snapshot().sample_count);

    Ok(())
}

#[test]
fn tracker_start_twice_keeps_session() -> Result<(), String> {
    let source = ReplaySource::from_samples(equator_run());
    let mut tracker = SpeedTracker::new(source, WatchOptions::default(), SpeedSession::default());

    tracker.start().map_err(|e| e.to_string())?;
    tracker.source_mut().step();
    tracker.start().map_err(|e| e.to_string())?;
    tracker.source_mut().replay();

    assert_eq!(3, tracker.snapshot().sample_count);

    Ok(())
}

#[test]
fn tracker_source_unavailable() {
    let source = ReplaySource::unavailable("Geolocation is not supported by your browser");
    let mut tracker = SpeedTracker::new(source, WatchOptions::default(), SpeedSession::default());

    let res = tracker.start();
    assert_eq!(
        Err(TrackingError::SourceUnavailable(
            "Geolocation is not supported by your browser".to_string()
        )),
        res
    );
    assert!(!tracker.is_tracking());
    assert_eq!(
        Some("Geolocation is not supported by your browser".to_string()),
        tracker.snapshot().error_message
    );
}

#[test]
fn tracker_source_error() -> Result<(), String> {
    let mut source = ReplaySource::from_samples(equator_run());
    source.push(LocationEvent::Error("Timeout expired".to_string()));
    source.push(LocationEvent::Position(Sample::new(0.0, 0.01, 3000)));

    let mut tracker = SpeedTracker::new(source, WatchOptions::default(), SpeedSession::default());
    tracker.start().map_err(|e| e.to_string())?;
    tracker.source_mut().replay();

    assert!(!tracker.is_tracking());
    assert_eq!(
        Err(TrackingError::Source("Timeout expired".to_string())),
        tracker.check()
    );

    let snapshot = tracker.snapshot();
    assert_eq!(Some("Timeout expired".to_string()), snapshot.error_message);
    assert_eq!(3, snapshot.sample_count);

    // the user restarts manually
    assert!(tracker.source().is_watching());
    tracker.release_idle_watch();
    assert!(!tracker.source().is_watching());

    tracker.source_mut().push(LocationEvent::Position(Sample::new(1.0, 1.0, 4000)));
    tracker.start().map_err(|e| e.to_string())?;
    assert!(tracker.check().is_ok());
    tracker.source_mut().replay();
    assert_eq!(1, tracker.snapshot().sample_count);

    Ok(())
}

/// Source that still delivers a buffered callback after being cleared
#[derive(Default)]
struct BufferedSource {
    listener: Rc<RefCell<Option<Listener>>>,
    cleared: Vec<WatchId>,
}

impl LocationSource for BufferedSource {
    fn watch(&mut self, _options: &WatchOptions, listener: Listener) -> Result<WatchId, TrackingError> {
        *self.listener.borrow_mut() = Some(listener);

        Ok(WatchId(7))
    }

    fn clear_watch(&mut self, id: WatchId) {
        self.cleared.push(id);
    }
}

#[test]
fn stop_ignores_buffered_callback() -> Result<(), String> {
    let source = BufferedSource::default();
    let listener = Rc::clone(&source.listener);
    let deliver = move |event: LocationEvent| {
        if let Some(l) = listener.borrow_mut().as_mut() {
            l(event);
        }
    };

    let updates = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&updates);

    let mut tracker = SpeedTracker::new(source, WatchOptions::default(), SpeedSession::default());
    tracker.on_update(move |_| *counter.borrow_mut() += 1);
    tracker.start().map_err(|e| e.to_string())?;

    for sample in equator_run() {
        deliver(LocationEvent::Position(sample));
    }
    let before = tracker.snapshot();

    tracker.stop();
    assert_eq!(vec![WatchId(7)], tracker.source().cleared);
    let notified = *updates.borrow();

    deliver(LocationEvent::Position(Sample::new(0.0, 0.01, 3000)));
    deliver(LocationEvent::Error("late failure".to_string()));

    let after = tracker.snapshot();
    assert_eq!(notified, *updates.borrow());
    assert_eq!(before.sample_count, after.sample_count);
    assert_eq!(before.current_speed_kph, after.current_speed_kph);
    assert_eq!(None, after.error_message);
    assert!(!after.tracking_active);

    Ok(())
}

#[test]
fn drop_clears_watch() -> Result<(), String> {
    let source = BufferedSource::default();
    let cleared = Rc::new(RefCell::new(false));

    struct Flagged(BufferedSource, Rc<RefCell<bool>>);
    impl LocationSource for Flagged {
        fn watch(&mut self, options: &WatchOptions, listener: Listener) -> Result<WatchId, TrackingError> {
            self.0.watch(options, listener)
        }

        fn clear_watch(&mut self, _id: WatchId) {
            *self.1.borrow_mut() = true;
        }
    }

    let mut tracker = SpeedTracker::new(
        Flagged(source, Rc::clone(&cleared)),
        WatchOptions::default(),
        SpeedSession::default(),
    );
    tracker.start().map_err(|e| e.to_string())?;
    drop(tracker);

    assert!(*cleared.borrow());

    Ok(())
}

#[test]
fn sample_time() -> Result<(), String> {
    use geo::Point;
    use time::macros::datetime;

    let sample = Sample::from((Point::new(-48.8702222, -26.31832), datetime!(2021-05-24 0:05 UTC)))
        .with_speed(Some(3.5));

    assert_eq!(1621814700000, sample.timestamp);
    assert_eq!(-26.31832, sample.latitude());
    assert_eq!(-48.8702222, sample.longitude());
    assert_eq!(Some(3.5), sample.speed);
    assert_eq!(datetime!(2021-05-24 0:05 UTC), sample.time()?);

    Ok(())
}
