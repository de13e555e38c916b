//! GPX file source integration

use std::io::Read;

use time::format_description::well_known;
use time::OffsetDateTime;

use super::ReplaySource;
use crate::Sample;

/// Recorded track points read from a GPX file
pub struct GpxSource {
    samples: Vec<Sample>,
}

impl GpxSource {
    /// Parse every timed track point of the document
    pub fn read<R: Read>(reader: R) -> Result<Self, String> {
        let doc = gpx::read(reader).map_err(|e| format!("Failed on read the GPX: {}", e))?;

        let mut samples = vec![];
        for track in &doc.tracks {
            for segment in &track.segments {
                for wp in &segment.points {
                    let Some(time) = wp.time.clone() else {
                        continue;
                    };
                    let raw = time
                        .format()
                        .map_err(|e| format!("Failed on format the GPX time: {}", e))?;
                    let time = OffsetDateTime::parse(&raw, &well_known::Rfc3339)
                        .map_err(|e| format!("Failed on parse the GPX time: {}", e))?;

                    let sample = Sample::from((wp.point(), time)).with_speed(wp.speed);
                    samples.push(sample);
                }
            }
        }

        samples.sort_by_key(|s| s.timestamp);

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_replay(self) -> ReplaySource {
        ReplaySource::from_samples(self.samples)
    }
}
