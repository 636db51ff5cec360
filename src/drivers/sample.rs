use std::time::{SystemTime, UNIX_EPOCH};
use chrono::{Local, TimeZone};
use crate::drivers::FrameError;
/// One multi-channel reading, stamped when the line was received.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Wall-clock seconds since the UNIX epoch.
    pub timestamp: f64,
    pub values: Vec<f64>,
}
impl Sample {
    pub fn new(timestamp: f64, values: Vec<f64>) -> Self {
        Self { timestamp, values }
    }
    pub fn now(values: Vec<f64>) -> Self {
        Self::new(unix_now(), values)
    }
    pub fn value(&self, channel: usize) -> Option<f64> {
        self.values.get(channel).copied()
    }
}
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
pub fn wall_clock_string(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    Local
        .timestamp_opt(secs as i64, nanos.min(999_999_999))
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
/// Parses one text line such as `23.50,24.10,22.90,25.00` into exactly
/// `channels` readings. Surrounding whitespace and a trailing `\r` are ignored.
pub fn parse_frame(line: &str, channels: usize) -> Result<Vec<f64>, FrameError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != channels {
        return Err(FrameError::FieldCount {
            expected: channels,
            actual: fields.len(),
        });
    }
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| FrameError::InvalidNumber {
                    index,
                    field: field.to_string(),
                })
        })
        .collect()
}
