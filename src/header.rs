//! GUPPI header parsing.
//!
//! A GUPPI header is a sequence of 80-byte ASCII cards, FITS style, of the form
//! `KEY     = VALUE`. Long string values may be continued using `CONTINUE` cards and
//! the header ends with an `END` card. Binary data blocks follow immediately.
use std::collections::HashMap;
use std::fmt::Display;
use std::io::Read;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Error, Result};

/// Length of a single header card.
pub const CARD_LEN: usize = 80;

/// Observation bandwidth in MHz; stored in Hz after parsing.
pub const OBSBW: &str = "OBSBW";
/// Observation central frequency in MHz; stored in Hz after parsing.
pub const OBSFREQ: &str = "OBSFREQ";
pub const STT_IMJD: &str = "STT_IMJD";
pub const STT_SMJD: &str = "STT_SMJD";
pub const STT_OFFS: &str = "STT_OFFS";
pub const BLOCSIZE: &str = "BLOCSIZE";
pub const PKTSIZE: &str = "PKTSIZE";
pub const NPKT: &str = "NPKT";
pub const NBITS: &str = "NBITS";
pub const PKTFMT: &str = "PKTFMT";

const MHZ: f64 = 1e6;
const CONTINUE: &str = "CONTINUE";

/// A single header value, coerced from the card text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Coerce the text to the right of `=`: integer if base-10, then float, otherwise
    /// a string with quotes removed.
    #[must_use]
    pub fn parse(raw: &str) -> Value {
        let raw = raw.trim();
        if let Ok(v) = raw.parse::<i64>() {
            return Value::Int(v);
        }
        if let Ok(v) = raw.parse::<f64>() {
            return Value::Float(v);
        }
        Value::Str(raw.replace('\'', "").trim().to_string())
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as a float. Integers are converted.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "'{v}'"),
        }
    }
}

/// Parsed GUPPI header fields.
///
/// [OBSBW] and [OBSFREQ] are in Hz.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Header {
    fields: HashMap<String, Value>,
}

impl Header {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Integer field value.
    ///
    /// # Errors
    /// [Error::MissingField] if not present, or [Error::InvalidField] if not an integer.
    pub fn int(&self, name: &str) -> Result<i64> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| invalid(name, "expected an integer"))
    }

    /// Numeric field value; integers are converted to floats.
    ///
    /// # Errors
    /// [Error::MissingField] if not present, or [Error::InvalidField] if not numeric.
    pub fn float(&self, name: &str) -> Result<f64> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| invalid(name, "expected a number"))
    }

    /// String field value.
    ///
    /// # Errors
    /// [Error::MissingField] if not present, or [Error::InvalidField] if not a string.
    pub fn string(&self, name: &str) -> Result<&str> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| invalid(name, "expected a string"))
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::MissingField(name.to_string()))
    }

    fn insert(&mut self, name: String, value: Value) {
        self.fields.insert(name, value);
    }

    fn scale(&mut self, name: &str, factor: f64) -> Result<()> {
        let v = self.float(name)?;
        self.fields.insert(name.to_string(), Value::Float(v * factor));
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> Error {
    Error::InvalidField {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn is_end(card: &str) -> bool {
    card.strip_prefix("END")
        .is_some_and(|rest| rest.chars().next().map_or(true, char::is_whitespace))
}

/// Read header cards from `r` up to and including the `END` card.
///
/// On success the reader is positioned at the first byte of data.
///
/// # Errors
/// [Error::HeaderFormat] for a malformed card or if the input ends before `END`,
/// [Error::MissingField]/[Error::InvalidField] if [OBSBW] or [OBSFREQ] are missing or
/// not numeric, or [Error::Io] on read failure.
pub fn read_header<R: Read>(mut r: R) -> Result<Header> {
    let mut header = Header::default();
    let mut last: Option<String> = None;
    let mut buf = Vec::with_capacity(CARD_LEN);

    for index in 0.. {
        buf.clear();
        (&mut r).take(CARD_LEN as u64).read_to_end(&mut buf)?;
        let card = String::from_utf8_lossy(&buf);
        if buf.len() < CARD_LEN {
            return Err(Error::HeaderFormat {
                index,
                card: card.into_owned(),
            });
        }
        let malformed = || Error::HeaderFormat {
            index,
            card: card.trim_end().to_string(),
        };

        if is_end(&card) {
            trace!(index, "end of header");
            break;
        }

        if card.starts_with(CONTINUE) {
            let token = card.split_whitespace().nth(1).ok_or_else(malformed)?;
            let name = last.as_ref().ok_or_else(malformed)?;
            let Some(Value::Str(prev)) = header.get(name) else {
                return Err(malformed());
            };
            let mut value = prev.strip_suffix('&').unwrap_or(prev).to_string();
            value.push_str(token.replace('\'', "").trim());
            header.insert(name.clone(), Value::Str(value));
            continue;
        }

        let (name, raw) = card.split_once('=').ok_or_else(malformed)?;
        let name = name.trim().to_string();
        header.insert(name.clone(), Value::parse(raw));
        last = Some(name);
    }

    header.scale(OBSBW, MHZ)?;
    header.scale(OBSFREQ, MHZ)?;

    Ok(header)
}
