//! CSV file source integration

use std::io::Read;

use csv::{Reader, StringRecord};
use time::format_description::well_known;
use time::OffsetDateTime;
use tracing::warn;

use super::{FieldsConfiguration, ReplaySource};
use crate::Sample;

/// Recorded positions read from a CSV file
pub struct CsvSource<T>
where
    T: Read,
{
    rdr: Reader<T>,
    fields: FieldsConfiguration,
}

impl<T> CsvSource<T>
where
    T: Read,
{
    pub fn new(rdr: Reader<T>, fields: Option<FieldsConfiguration>) -> Self {
        Self {
            rdr,
            fields: fields.unwrap_or_default(),
        }
    }

    /// Read every valid sample, in time order
    pub fn samples(&mut self) -> Result<Vec<Sample>, String> {
        let mut samples = vec![];

        let mut header = self
            .rdr
            .headers()
            .map_err(|e| format!("Failed on read the header: {}", e))?
            .clone();
        let header_idx = parse_header(&self.fields, &mut header)?;

        for row in self.rdr.records() {
            let mut rec = row.map_err(|e| format!("Failed on read some row: {}", e))?;

            if rec.len() < 2 {
                continue;
            }

            let sample = parse_row(&header_idx, &self.fields, &mut rec)
                .map_err(|e| format!("Error with row {:?}: {}", rec, e))?;

            if let Some(sample) = sample {
                samples.push(sample);
            }
        }

        samples.sort_by_key(|s| s.timestamp);

        Ok(samples)
    }

    /// Replayable source with the file samples
    pub fn into_replay(mut self) -> Result<ReplaySource, String> {
        let samples = self.samples()?;

        Ok(ReplaySource::from_samples(samples))
    }
}

/// Field to index map
#[derive(Debug)]
struct FieldsIndex {
    coordinates: usize,
    time: usize,
    speed: Option<usize>,
}

fn parse_header(
    fields: &FieldsConfiguration,
    header: &mut StringRecord,
) -> Result<FieldsIndex, String> {
    header.trim();

    let coordinates = header
        .iter()
        .position(|h| h.to_lowercase() == fields.coordinates)
        .ok_or("Coordinates header not found")?;

    let time = header
        .iter()
        .position(|h| h.to_lowercase() == fields.time)
        .ok_or("Time header not found")?;

    let speed = header.iter().position(|h| h.to_lowercase() == fields.speed);

    Ok(FieldsIndex {
        coordinates,
        time,
        speed,
    })
}

fn parse_row(
    header: &FieldsIndex,
    fields: &FieldsConfiguration,
    row: &mut StringRecord,
) -> Result<Option<Sample>, String> {
    row.trim();

    let raw_coordinates = row
        .get(header.coordinates)
        .ok_or("Coordinates field not found")?;
    let separator = match raw_coordinates {
        s if s.contains(',') => ',',
        s if s.contains(';') => ';',
        _ => ' ',
    };
    let scoordinates: Vec<&str> = raw_coordinates
        .split(separator)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if scoordinates.len() != 2 {
        return Ok(None);
    }

    let (ilat, ilng) = if fields.flip_coordinates { (0, 1) } else { (1, 0) };

    let (lat, lng) = match (
        scoordinates[ilat].parse::<f64>(),
        scoordinates[ilng].parse::<f64>(),
    ) {
        (Ok(lat), Ok(lng)) => (lat, lng),
        _ => {
            warn!(coordinates = raw_coordinates, "Skipping row with invalid coordinates");
            return Ok(None);
        }
    };

    let raw_time = row.get(header.time).ok_or("Time field not found")?;
    let timestamp = parse_time(raw_time)?;

    let mut sample = Sample::new(lat, lng, timestamp);

    if let Some(ispeed) = header.speed {
        sample = sample.with_speed(row.get(ispeed).and_then(|d| d.parse::<f64>().ok()));
    }

    Ok(Some(sample))
}

/// Epoch milliseconds or RFC3339
fn parse_time(raw: &str) -> Result<i64, String> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Ok(millis);
    }

    let time = OffsetDateTime::parse(raw, &well_known::Rfc3339)
        .map_err(|e| format!("Failed on parse the time: {}", e))?;

    Ok((time.unix_timestamp_nanos() / 1_000_000) as i64)
}
