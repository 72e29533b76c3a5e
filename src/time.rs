//! Frame time conversion.
//!
//! GUPPI headers give the observation start as an integer MJD day, integer seconds of
//! day and fractional seconds of day. A frame's time is the start time plus the frame's
//! sample offset divided by the sample rate.
#[cfg(feature = "epoch")]
use hifitime::Epoch;

/// MJD of the Unix epoch, 1970-01-01T00:00:00 UTC.
pub const MJD_UNIX_EPOCH: i64 = 40_587;
/// Number of seconds in a day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds since the Unix epoch for a frame.
///
/// Equivalent to converting `imjd + (smjd + fmjd) / 86400` to Unix time and adding
/// `offset / sample_rate`, but computed in seconds to avoid losing sub-microsecond
/// precision in the day fraction.
///
/// # Example
/// ```
/// use guppi::time::frame_time;
///
/// // 2016-01-01T00:00:00Z plus half a second
/// assert_eq!(frame_time(57388, 0, 0.0, 5_000_000, 1e7), 1451606400.5);
/// ```
#[must_use]
pub fn frame_time(imjd: i64, smjd: i64, fmjd: f64, offset: u64, sample_rate: f64) -> f64 {
    let days = (imjd - MJD_UNIX_EPOCH) as f64;
    days * SECONDS_PER_DAY + smjd as f64 + fmjd + offset as f64 / sample_rate
}

/// Same as [frame_time], as a [hifitime::Epoch].
#[cfg(feature = "epoch")]
#[must_use]
pub fn frame_epoch(imjd: i64, smjd: i64, fmjd: f64, offset: u64, sample_rate: f64) -> Epoch {
    Epoch::from_unix_seconds(frame_time(imjd, smjd, fmjd, offset, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch() {
        assert_eq!(frame_time(MJD_UNIX_EPOCH, 0, 0.0, 0, 1.0), 0.0);
    }

    #[test]
    fn seconds_of_day() {
        // 2016-01-01T12:00:01.25Z
        let t = frame_time(57388, 43201, 0.25, 0, 1e6);
        assert_eq!(t, 1_451_649_601.25);
    }

    #[test]
    fn consecutive_frames_step_by_frame_duration() {
        let samples_per_frame = 1024u64;
        let sample_rate = 2e7;
        let step = samples_per_frame as f64 / sample_rate;

        let mut last = frame_time(57500, 3600, 0.125, 0, sample_rate);
        for idx in 1..1000u64 {
            let t = frame_time(57500, 3600, 0.125, idx * samples_per_frame, sample_rate);
            assert!(t > last);
            assert!(((t - last) - step).abs() < 1e-6, "step at {idx} was {}", t - last);
            last = t;
        }
    }

    #[cfg(feature = "epoch")]
    #[test]
    fn epoch() {
        use std::str::FromStr;

        let epoch = frame_epoch(57388, 0, 0.0, 0, 1e7);
        let expected = Epoch::from_str("2016-01-01T00:00:00 UTC").unwrap();

        assert!((epoch - expected).abs().to_seconds() < 1e-6, "{epoch}");
    }
}
