use std::collections::BTreeMap;
use std::io::{Read, Seek};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Frame, Reader, Result};

/// Power above which a sample with the given bit depth is considered clipped.
#[must_use]
pub fn clip_level(bits_per_sample: u32) -> f64 {
    match bits_per_sample {
        1 => 1.0,
        2 => 3.3359f64.powi(2),
        4 => (7.0f64 / 2.95).powi(2),
        8 => (255.0f64 / 256.0).powi(2),
        _ => 1.0,
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThreadSummary {
    pub frames: usize,
    pub samples: usize,
    /// Samples with power above the clip level
    pub clipped: usize,
    power: f64,
}

impl ThreadSummary {
    #[must_use]
    pub fn mean_power(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.power / self.samples as f64
    }

    #[must_use]
    pub fn rms(&self) -> f64 {
        self.mean_power().sqrt()
    }

    #[must_use]
    pub fn clip_fraction(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.clipped as f64 / self.samples as f64
    }
}

/// Tracks stats on frame iteration.
///
/// Stream level values are taken from the first frame added.
///
/// # Example
/// ```no_run
/// use guppi::{Reader, Summary};
///
/// let mut reader = Reader::open("16A-123_BD-4.0000.raw").unwrap();
/// let mut summary = Summary::default();
/// for frame in reader.frames().filter_map(Result::ok).take(100) {
///     summary.add(&frame);
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Summary {
    pub count: usize,
    /// Seconds since the Unix epoch
    pub first_time: Option<f64>,
    pub station: Option<u32>,
    pub sample_rate: Option<f64>,
    pub central_freq: Option<f64>,
    pub bits_per_sample: Option<u32>,
    pub threads: BTreeMap<u32, ThreadSummary>,
}

impl Summary {
    pub fn add(&mut self, frame: &Frame) {
        let hdr = &frame.header;
        if self.count == 0 {
            self.first_time = Some(frame.time());
            self.station = Some(hdr.station_id);
            self.sample_rate = Some(hdr.sample_rate);
            self.central_freq = Some(hdr.central_freq);
            self.bits_per_sample = Some(hdr.bits_per_sample);
        }
        self.count += 1;

        let clip = clip_level(hdr.bits_per_sample);
        let thread = self.threads.entry(hdr.thread_id).or_default();
        thread.frames += 1;
        thread.samples += frame.sample_count();
        for x in &frame.data.data {
            let power = f64::from(*x).powi(2);
            thread.power += power;
            if power > clip {
                thread.clipped += 1;
            }
        }
    }
}

/// Summarize all frames from the reader's current position to the end of the stream.
///
/// # Errors
/// Any error from [Reader::next_frame] other than end of file.
pub fn summarize<R>(reader: &mut Reader<R>) -> Result<Summary>
where
    R: Read + Seek,
{
    let mut summary = Summary::default();
    for frame in reader.frames() {
        summary.add(&frame?);
    }
    Ok(summary)
}
