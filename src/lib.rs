#![doc = include_str!("../README.md")]

mod error;
mod frame;

pub mod antenna;
pub mod header;
pub mod reader;
pub mod summary;
pub mod time;
pub mod unpack;

pub use error::{Error, Result};
pub use frame::{Frame, FrameData, FrameHeader};
pub use header::{read_header, Header};
pub use reader::{DecodeState, Frames, Reader};
pub use summary::{summarize, Summary};
