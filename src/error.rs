#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A header card that is not `END`, `CONTINUE` or a `KEY = VALUE` pair, or the
    /// header ended before its `END` card.
    #[error("malformed header card {index}: {card:?}")]
    HeaderFormat { index: usize, card: String },

    #[error("header field {0} is missing")]
    MissingField(String),

    #[error("header field {name} is invalid: {reason}")]
    InvalidField { name: String, reason: String },

    /// Not enough bytes remain for another complete data block.
    #[error("end of file")]
    EndOfFile,

    #[error("unsupported bits per sample: {0}")]
    UnsupportedBitDepth(i64),

    #[error("frame lengths do not match: {left} != {right}")]
    ShapeMismatch { left: usize, right: usize },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
