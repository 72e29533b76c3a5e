use ndarray::Array1;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::time::frame_time;
use crate::{Error, Result};

/// Per-frame metadata.
///
/// Time fields are the observation start from the header; `offset` is the number of
/// samples for this thread between the start of data and the start of the frame.
///
/// # Example
/// ```
/// use guppi::FrameHeader;
///
/// let hdr = FrameHeader::builder()
///     .imjd(57388)
///     .offset(1024)
///     .bits_per_sample(4)
///     .thread_id(1)
///     .sample_rate(2e7)
///     .build();
/// assert_eq!(hdr.id(), (0, 1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, TypedBuilder)]
#[builder(field_defaults(default))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameHeader {
    /// Integer MJD day
    pub imjd: i64,
    /// Integer seconds of day
    pub smjd: i64,
    /// Fractional seconds of day
    pub fmjd: f64,
    pub offset: u64,
    pub bits_per_sample: u32,
    /// Polarization, 0 or 1
    pub thread_id: u32,
    pub station_id: u32,
    /// Hz
    pub sample_rate: f64,
    /// Hz
    pub central_freq: f64,
}

impl FrameHeader {
    /// Seconds since the Unix epoch. See [crate::time::frame_time].
    #[must_use]
    pub fn time(&self) -> f64 {
        frame_time(
            self.imjd,
            self.smjd,
            self.fmjd,
            self.offset,
            self.sample_rate,
        )
    }

    #[cfg(feature = "epoch")]
    #[must_use]
    pub fn epoch(&self) -> hifitime::Epoch {
        crate::time::frame_epoch(
            self.imjd,
            self.smjd,
            self.fmjd,
            self.offset,
            self.sample_rate,
        )
    }

    /// Station and thread ids.
    #[must_use]
    pub fn id(&self) -> (u32, u32) {
        (self.station_id, self.thread_id)
    }
}

/// Decoded samples for a single thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameData {
    pub data: Array1<f32>,
}

impl FrameData {
    #[must_use]
    pub fn new(data: Array1<f32>) -> Self {
        Self { data }
    }
}

/// A single thread's worth of samples decoded from a data block.
///
/// Frames can be combined element-wise with frames of the same length, or with a
/// scalar. Copying forms return a new frame; `_in_place` forms modify and return the
/// receiver.
///
/// ```
/// use guppi::{Frame, FrameData, FrameHeader};
/// use ndarray::array;
///
/// let a = Frame::new(FrameHeader::default(), FrameData::new(array![1.0, 2.0]));
/// let b = Frame::new(FrameHeader::default(), FrameData::new(array![3.0, -1.0]));
///
/// let sum = a.add_frame(&b).unwrap();
/// assert_eq!(sum.data.data, array![4.0, 1.0]);
/// assert_eq!(a.scale(2.0).data.data, array![2.0, 4.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: FrameHeader,
    pub data: FrameData,
    /// Always true for frames produced by the decoder.
    pub valid: bool,
}

impl Frame {
    #[must_use]
    pub fn new(header: FrameHeader, data: FrameData) -> Self {
        Frame {
            header,
            data,
            valid: true,
        }
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.header.time()
    }

    #[cfg(feature = "epoch")]
    #[must_use]
    pub fn epoch(&self) -> hifitime::Epoch {
        self.header.epoch()
    }

    #[must_use]
    pub fn id(&self) -> (u32, u32) {
        self.header.id()
    }

    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.header.sample_rate
    }

    #[must_use]
    pub fn central_freq(&self) -> f64 {
        self.header.central_freq
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.data.data.len()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    fn check_len(&self, other: &Frame) -> Result<()> {
        if self.sample_count() != other.sample_count() {
            return Err(Error::ShapeMismatch {
                left: self.sample_count(),
                right: other.sample_count(),
            });
        }
        Ok(())
    }

    /// Element-wise sum of this frame's samples and `other`'s.
    ///
    /// # Errors
    /// [Error::ShapeMismatch] if the frames have different sample counts.
    pub fn add_frame(&self, other: &Frame) -> Result<Frame> {
        let mut frame = self.clone();
        frame.add_frame_in_place(other)?;
        Ok(frame)
    }

    /// # Errors
    /// [Error::ShapeMismatch] if the frames have different sample counts.
    pub fn add_frame_in_place(&mut self, other: &Frame) -> Result<&mut Self> {
        self.check_len(other)?;
        self.data.data += &other.data.data;
        Ok(self)
    }

    #[must_use]
    pub fn add_scalar(&self, y: f32) -> Frame {
        let mut frame = self.clone();
        frame.add_scalar_in_place(y);
        frame
    }

    pub fn add_scalar_in_place(&mut self, y: f32) -> &mut Self {
        self.data.data += y;
        self
    }

    /// Element-wise product of this frame's samples and `other`'s.
    ///
    /// # Errors
    /// [Error::ShapeMismatch] if the frames have different sample counts.
    pub fn mul_frame(&self, other: &Frame) -> Result<Frame> {
        let mut frame = self.clone();
        frame.mul_frame_in_place(other)?;
        Ok(frame)
    }

    /// # Errors
    /// [Error::ShapeMismatch] if the frames have different sample counts.
    pub fn mul_frame_in_place(&mut self, other: &Frame) -> Result<&mut Self> {
        self.check_len(other)?;
        self.data.data *= &other.data.data;
        Ok(self)
    }

    /// Multiply every sample by `y`.
    #[must_use]
    pub fn scale(&self, y: f32) -> Frame {
        let mut frame = self.clone();
        frame.scale_in_place(y);
        frame
    }

    pub fn scale_in_place(&mut self, y: f32) -> &mut Self {
        self.data.data *= y;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn frame(dat: Array1<f32>) -> Frame {
        let hdr = FrameHeader::builder()
            .imjd(57388)
            .smjd(10)
            .offset(2048)
            .bits_per_sample(8)
            .station_id(12310)
            .sample_rate(1e7)
            .central_freq(1e9)
            .build();
        Frame::new(hdr, FrameData::new(dat))
    }

    #[test]
    fn accessors() {
        let f = frame(array![0.0, 1.0, 2.0]);

        assert!(f.is_valid());
        assert_eq!(f.id(), (12310, 0));
        assert_eq!(f.sample_rate(), 1e7);
        assert_eq!(f.central_freq(), 1e9);
        assert_eq!(f.sample_count(), 3);
        assert_eq!(f.time(), 1_451_606_410.0 + 2048.0 / 1e7);
    }

    #[test]
    fn add_frames_copies() {
        let a = frame(array![1.0, 2.0, 3.0]);
        let b = frame(array![-1.0, 0.5, 7.0]);

        let c = a.add_frame(&b).unwrap();

        assert_eq!(c.data.data, array![0.0, 2.5, 10.0]);
        assert_eq!(a.data.data, array![1.0, 2.0, 3.0], "receiver must be unchanged");
        assert_eq!(c.header, a.header);
    }

    #[test]
    fn add_frames_in_place() {
        let mut a = frame(array![1.0, 2.0]);
        let b = frame(array![3.0, 4.0]);

        a.add_frame_in_place(&b).unwrap().add_scalar_in_place(1.0);

        assert_eq!(a.data.data, array![5.0, 7.0]);
    }

    #[test]
    fn mul_frames() {
        let mut a = frame(array![1.0, -2.0, 3.0]);
        let b = frame(array![2.0, 2.0, -1.0]);

        assert_eq!(a.mul_frame(&b).unwrap().data.data, array![2.0, -4.0, -3.0]);

        a.mul_frame_in_place(&b).unwrap();
        assert_eq!(a.data.data, array![2.0, -4.0, -3.0]);
    }

    #[test]
    fn scalars() {
        let mut a = frame(array![1.0, -2.0]);

        assert_eq!(a.add_scalar(0.5).data.data, array![1.5, -1.5]);
        assert_eq!(a.scale(-2.0).data.data, array![-2.0, 4.0]);

        a.scale_in_place(3.0);
        assert_eq!(a.data.data, array![3.0, -6.0]);
    }

    #[test]
    fn mismatched_lengths() {
        let mut a = frame(array![1.0, 2.0]);
        let b = frame(array![1.0, 2.0, 3.0]);

        assert!(matches!(
            a.add_frame(&b),
            Err(Error::ShapeMismatch { left: 2, right: 3 })
        ));
        assert!(a.mul_frame_in_place(&b).is_err());
        assert_eq!(a.data.data, array![1.0, 2.0], "failed op must not modify");
    }
}
