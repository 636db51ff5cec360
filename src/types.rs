// src/types.rs
use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Where samples come from
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub enum ConnectionMode {
    #[default]
    Hardware,
    Simulation,
}

// Baud rates offered by the device firmware
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    #[default]
    B115200,
}

#[derive(Debug, Error, PartialEq)]
#[error("unsupported baud rate {0}; expected one of 9600, 19200, 38400, 115200")]
pub struct UnsupportedBaud(pub u32);

impl BaudRate {
    pub const ALL: [BaudRate; 4] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B115200,
    ];

    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B115200 => 115200,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = UnsupportedBaud;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        BaudRate::ALL
            .into_iter()
            .find(|b| b.as_u32() == value)
            .ok_or(UnsupportedBaud(value))
    }
}

impl From<BaudRate> for u32 {
    fn from(value: BaudRate) -> Self {
        value.as_u32()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}
