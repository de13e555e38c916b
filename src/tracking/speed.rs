//! Speed derivation over consecutive samples

use geo::HaversineDistance;

use super::sample::Sample;
use super::window::SampleWindow;

/// m/s to km/h
const MPS_TO_KPH: f64 = 3.6;

/// Great-circle distance between two samples, in meters
pub fn distance_meters(a: &Sample, b: &Sample) -> f64 {
    a.coordinates.haversine_distance(&b.coordinates)
}

/// Speed in km/h from the earlier sample `a` to the later sample `b`.
///
/// `None` when no time elapsed between both, or when `b` is older than `a`.
pub fn pairwise_speed(a: &Sample, b: &Sample) -> Option<f64> {
    let elapsed = b.timestamp.checked_sub(a.timestamp)? as f64 / 1000f64;
    if elapsed <= 0f64 {
        return None;
    }

    Some(distance_meters(a, b) / elapsed * MPS_TO_KPH)
}

/// Speed between the two newest samples of the window.
///
/// Zero while the window has less than two samples.
pub fn current_speed(window: &SampleWindow) -> Option<f64> {
    if window.len() < 2 {
        return Some(0f64);
    }

    let mut newest = window.iter().rev();
    match (newest.next(), newest.next()) {
        (Some(b), Some(a)) => pairwise_speed(a, b),
        _ => Some(0f64),
    }
}

/// Mean of every pairwise speed inside the window.
///
/// Only the retained samples count, so once the window starts evicting this
/// is an average over the latest window and not over the whole session.
/// Pairs without elapsed time are left out.
pub fn average_speed(window: &SampleWindow) -> f64 {
    let (sum, count) = window
        .pairs()
        .filter_map(|(a, b)| pairwise_speed(a, b))
        .fold((0f64, 0usize), |(sum, count), speed| (sum + speed, count + 1));

    if count == 0 {
        return 0f64;
    }

    sum / count as f64
}
