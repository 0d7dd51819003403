//! Decoding of the pipe-delimited numeric payloads the modem embeds in its status page.
use std::num::ParseFloatError;

use serde::Serialize;
use thiserror::Error;

/// Number of physical channel slots the modem reports per metric.
pub const CHANNEL_SLOTS: usize = 4;

const FIELD_DELIMITER: char = '|';
// Payloads often carry a trailing `|`, so one extra segment is split off and dropped.
const MAX_SEGMENTS: usize = CHANNEL_SLOTS + 1;
const ERROR_SENTINEL: &str = "ERR";
const MODULATION_SUFFIX: &str = "QAM";

/// One metric across all channel slots. Slots without a reading hold `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ChannelVector([f64; CHANNEL_SLOTS]);

impl ChannelVector {
    pub const ZERO: Self = Self([0.0; CHANNEL_SLOTS]);

    pub fn new(values: [f64; CHANNEL_SLOTS]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; CHANNEL_SLOTS] {
        &self.0
    }

    /// Multiplies every slot by `scale`, e.g. to turn Hz into MHz.
    pub fn scaled(&self, scale: f64) -> Self {
        Self(self.0.map(|value| value * scale))
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldErrorKind {
    #[error(transparent)]
    Invalid(#[from] ParseFloatError),
    /// Overflowed to infinity, or spelled out `inf`/`NaN`; no reading the modem reports.
    #[error("value is not a finite number")]
    NonFinite,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed channel field {value:?}: {kind}")]
pub struct FieldError {
    pub value: String,
    #[source]
    pub kind: FieldErrorKind,
}

/// Decodes a payload such as `"626.998|639.001|ERR|256QAM|"` into a [`ChannelVector`].
///
/// Empty segments and the `ERR` sentinel leave their slot at zero. A `QAM` suffix is
/// stripped before parsing. Anything else that fails to parse as a float is an error,
/// since it means the page format has changed underneath us.
pub fn decode_fields(payload: &str) -> Result<ChannelVector, FieldError> {
    let mut values = [0.0; CHANNEL_SLOTS];

    let segments = payload
        .splitn(MAX_SEGMENTS, FIELD_DELIMITER)
        .take(CHANNEL_SLOTS)
        .enumerate();
    for (slot, segment) in segments {
        let segment = segment.trim();
        if segment.is_empty() || segment == ERROR_SENTINEL {
            continue;
        }

        let number = segment
            .strip_suffix(MODULATION_SUFFIX)
            .map_or(segment, str::trim);
        values[slot] = parse_finite(number).map_err(|kind| FieldError {
            value: segment.to_string(),
            kind,
        })?;
    }

    Ok(ChannelVector(values))
}

fn parse_finite(number: &str) -> Result<f64, FieldErrorKind> {
    let value = number.parse::<f64>()?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FieldErrorKind::NonFinite)
    }
}
