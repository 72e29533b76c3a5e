//! Frame decoding from GUPPI raw capture streams.
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use ndarray::ArrayView1;
use tracing::{debug, trace};

use crate::antenna::map_antenna;
use crate::header::{self, Header};
use crate::unpack::{samples_per_thread, unpack};
use crate::{Error, Frame, FrameData, FrameHeader, Result};

/// Packet format that indicates dual polarization data.
pub const VDIF: &str = "VDIF";

/// Decoding parameters and cursor for a single stream, derived from its header.
#[derive(Debug, Clone)]
pub struct DecodeState {
    pub header: Header,
    /// Combined station id mapped from the stream name, 0 if unknown.
    pub antenna: u32,
    /// Stream position of the first data block.
    pub data_start: u64,
    /// Stream position following the last block read.
    pub cursor: u64,
    pub block_size: usize,
    pub packet_size: Option<i64>,
    pub packets_per_block: Option<i64>,
    pub bits_per_sample: u32,
    pub npol: usize,
    /// Hz
    pub sample_rate: f64,
    /// Hz
    pub central_freq: f64,
    pub imjd: i64,
    pub smjd: i64,
    pub fmjd: f64,
    // Second thread of the last block read, not yet delivered.
    pending: Option<Frame>,
}

impl DecodeState {
    /// Derive decoding parameters from `header` for data starting at `data_start`.
    ///
    /// # Errors
    /// [Error::MissingField] or [Error::InvalidField] if a required header field is
    /// absent or has the wrong type.
    pub fn new(header: Header, antenna: u32, data_start: u64) -> Result<Self> {
        let block_size = header.int(header::BLOCSIZE)?;
        let block_size = usize::try_from(block_size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| Error::InvalidField {
                name: header::BLOCSIZE.to_string(),
                reason: format!("block size must be positive, got {block_size}"),
            })?;
        let nbits = header.int(header::NBITS)?;
        let bits_per_sample =
            u32::try_from(nbits).map_err(|_| Error::UnsupportedBitDepth(nbits))?;

        let dual = header.string(header::PKTFMT)?.trim() == VDIF;
        let npol = if dual { 2 } else { 1 };
        let bandwidth = header.float(header::OBSBW)?;
        let sample_rate = if dual { bandwidth * 2.0 } else { bandwidth };

        Ok(DecodeState {
            antenna,
            data_start,
            cursor: data_start,
            block_size,
            packet_size: header.get(header::PKTSIZE).and_then(header::Value::as_i64),
            packets_per_block: header.get(header::NPKT).and_then(header::Value::as_i64),
            bits_per_sample,
            npol,
            sample_rate,
            central_freq: header.float(header::OBSFREQ)?,
            imjd: header.int(header::STT_IMJD)?,
            smjd: header.int(header::STT_SMJD)?,
            fmjd: header.float(header::STT_OFFS)?,
            pending: None,
            header,
        })
    }

    /// Frame held back from the last dual polarization block, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&Frame> {
        self.pending.as_ref()
    }

    /// Per-thread sample offset of the block starting at `position`.
    fn offset_at(&self, position: u64) -> Result<u64> {
        let samples = samples_per_thread(self.block_size, self.bits_per_sample, self.npol)?;
        let rel = position.saturating_sub(self.data_start);
        Ok(rel / self.block_size as u64 * samples as u64)
    }

    fn frame(&self, offset: u64, thread_id: u32, samples: ArrayView1<f32>) -> Frame {
        let hdr = FrameHeader::builder()
            .imjd(self.imjd)
            .smjd(self.smjd)
            .fmjd(self.fmjd)
            .offset(offset)
            .bits_per_sample(self.bits_per_sample)
            .thread_id(thread_id)
            .station_id(self.antenna)
            .sample_rate(self.sample_rate)
            .central_freq(self.central_freq)
            .build();
        Frame::new(hdr, FrameData::new(samples.to_owned()))
    }
}

/// Reads [Frame]s from a GUPPI raw stream.
///
/// The header is parsed on the first call that needs it, or explicitly with
/// [Reader::read_header]. Decoding from a position within the header starts at the
/// first data block. Each data block yields one frame per polarization thread;
/// for dual polarization data the thread 1 frame is held back and returned by the
/// following [Reader::next_frame] call, provided the stream has not been repositioned
/// in between.
///
/// # Example
/// ```no_run
/// use guppi::Reader;
///
/// let mut reader = Reader::open("16A-123_BD-4.0000.raw").unwrap();
/// println!("{} Hz at {} Hz", reader.sample_rate().unwrap(), reader.central_freq().unwrap());
/// for frame in reader.frames() {
///     let frame = frame.unwrap();
///     println!("{:?} {}", frame.id(), frame.time());
/// }
/// ```
pub struct Reader<R> {
    inner: R,
    name: String,
    state: Option<DecodeState>,
}

impl Reader<File> {
    /// Open the file at `path`. The file name is used to determine the antenna.
    ///
    /// # Errors
    /// [Error::Io] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .unwrap_or(path.as_os_str())
            .to_string_lossy()
            .into_owned();
        Ok(Self::new(File::open(path)?, name))
    }
}

impl<R> Reader<R>
where
    R: Read + Seek,
{
    /// Create a reader over `inner`. `name` is the stream's file name, used to map the
    /// antenna id.
    pub fn new(inner: R, name: impl Into<String>) -> Self {
        Reader {
            inner,
            name: name.into(),
            state: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current position in the underlying stream.
    ///
    /// # Errors
    /// [Error::Io] if the position cannot be determined.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Read the header at the current position and reset decoding state. Data is assumed
    /// to start immediately after the header.
    ///
    /// # Errors
    /// Any error from [header::read_header], or [Error::MissingField] and
    /// [Error::InvalidField] if the header lacks fields required for decoding.
    pub fn read_header(&mut self) -> Result<&Header> {
        let state = self.load_state()?;
        Ok(&self.state.insert(state).header)
    }

    fn load_state(&mut self) -> Result<DecodeState> {
        let header = header::read_header(&mut self.inner)?;
        let data_start = self.inner.stream_position()?;
        let antenna = map_antenna(&self.name, true);
        debug!(
            name = %self.name,
            fields = header.len(),
            data_start,
            antenna,
            "read header"
        );
        DecodeState::new(header, antenna, data_start)
    }

    /// Returns the decoding state, reading the header from the start of the stream if it
    /// has not been read. The stream position is unchanged.
    ///
    /// # Errors
    /// See [Reader::read_header].
    pub fn ensure(&mut self) -> Result<&DecodeState> {
        let (_, state) = self.parts()?;
        Ok(state)
    }

    fn parts(&mut self) -> Result<(&mut R, &mut DecodeState)> {
        let state = match self.state.take() {
            Some(state) => state,
            None => {
                let mark = self.inner.stream_position()?;
                debug!(name = %self.name, mark, "no decode state, reading header from start");
                self.inner.seek(SeekFrom::Start(0))?;
                let state = self.load_state();
                self.inner.seek(SeekFrom::Start(mark))?;
                state?
            }
        };
        Ok((&mut self.inner, self.state.insert(state)))
    }

    /// Decode the next [Frame].
    ///
    /// # Errors
    /// [Error::EndOfFile] if there is not a complete block remaining,
    /// [Error::UnsupportedBitDepth] if the header bit depth is not 4 or 8, or
    /// [Error::Io] on any other read failure.
    pub fn next_frame(&mut self) -> Result<Frame> {
        let (inner, state) = self.parts()?;
        let mut mark = inner.stream_position()?;

        if mark == state.cursor {
            if let Some(frame) = state.pending.take() {
                trace!(position = mark, "returning pending frame");
                return Ok(frame);
            }
        }
        state.pending = None;

        let offset = state.offset_at(mark)?;
        if mark < state.data_start {
            trace!(position = mark, "skipping header");
            mark = inner.seek(SeekFrom::Start(state.data_start))?;
        }
        let mut buf = vec![0u8; state.block_size];
        if let Err(err) = inner.read_exact(&mut buf) {
            if err.kind() == ErrorKind::UnexpectedEof {
                trace!(position = mark, "short block");
                return Err(Error::EndOfFile);
            }
            return Err(Error::Io(err));
        }
        state.cursor = inner.stream_position()?;
        trace!(position = mark, offset, "read block");

        let data = unpack(&buf, state.bits_per_sample, state.npol)?;
        let frame = state.frame(offset, 0, data.row(0));
        if state.npol == 2 {
            state.pending = Some(state.frame(offset, 1, data.row(1)));
        }

        Ok(frame)
    }

    /// Iterate over the remaining frames. Iteration ends at end of file; any other error
    /// is yielded.
    pub fn frames(&mut self) -> Frames<'_, R> {
        Frames {
            reader: self,
            done: false,
        }
    }

    /// Move the stream forward by `count` whole blocks from the current position.
    ///
    /// # Errors
    /// [Error::Io] if seeking fails.
    pub fn skip_blocks(&mut self, count: u64) -> Result<u64> {
        let (inner, state) = self.parts()?;
        let pos = inner.stream_position()?;
        Ok(inner.seek(SeekFrom::Start(pos + count * state.block_size as u64))?)
    }

    /// Data block size in bytes.
    ///
    /// # Errors
    /// See [Reader::ensure].
    pub fn frame_size(&mut self) -> Result<usize> {
        Ok(self.ensure()?.block_size)
    }

    /// Number of polarization threads per block.
    ///
    /// # Errors
    /// See [Reader::ensure].
    pub fn thread_count(&mut self) -> Result<usize> {
        Ok(self.ensure()?.npol)
    }

    /// Sample rate in Hz.
    ///
    /// # Errors
    /// See [Reader::ensure].
    pub fn sample_rate(&mut self) -> Result<f64> {
        Ok(self.ensure()?.sample_rate)
    }

    /// Central frequency in Hz.
    ///
    /// # Errors
    /// See [Reader::ensure].
    pub fn central_freq(&mut self) -> Result<f64> {
        Ok(self.ensure()?.central_freq)
    }

    /// # Errors
    /// See [Reader::ensure].
    pub fn bits_per_sample(&mut self) -> Result<u32> {
        Ok(self.ensure()?.bits_per_sample)
    }

    /// # Errors
    /// See [Reader::ensure].
    pub fn antenna_id(&mut self) -> Result<u32> {
        Ok(self.ensure()?.antenna)
    }

    /// # Errors
    /// See [Reader::ensure].
    pub fn data_start(&mut self) -> Result<u64> {
        Ok(self.ensure()?.data_start)
    }

    /// Number of complete blocks between the start of data and the end of the stream.
    ///
    /// # Errors
    /// See [Reader::ensure], or [Error::Io] if seeking fails.
    pub fn block_count(&mut self) -> Result<u64> {
        let (inner, state) = self.parts()?;
        let mark = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(mark))?;
        Ok(end.saturating_sub(state.data_start) / state.block_size as u64)
    }

    /// Samples in a frame divided by the sample rate, truncated, as determined by
    /// decoding the frames of one block.
    ///
    /// The stream position and pending frame are restored before returning.
    ///
    /// # Errors
    /// Any error from [Reader::next_frame].
    pub fn frames_per_second(&mut self) -> Result<u64> {
        let (inner, state) = self.parts()?;
        let mark = inner.stream_position()?;
        let saved = (state.cursor, state.pending.clone());

        let zult = self.probe_frames_per_second();

        let (inner, state) = self.parts()?;
        inner.seek(SeekFrom::Start(mark))?;
        (state.cursor, state.pending) = saved;
        zult
    }

    fn probe_frames_per_second(&mut self) -> Result<u64> {
        let threads = self.thread_count()?;
        let first = self.next_frame()?;
        for _ in 1..threads {
            self.next_frame()?;
        }
        Ok((first.sample_count() as f64 / first.sample_rate()).trunc() as u64)
    }
}

/// Iterator over [Frame]s returned by [Reader::frames].
pub struct Frames<'a, R> {
    reader: &'a mut Reader<R>,
    done: bool,
}

impl<R> Iterator for Frames<'_, R>
where
    R: Read + Seek,
{
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(Error::EndOfFile) => {
                trace!("no more frames");
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
