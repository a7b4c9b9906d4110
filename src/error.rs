//! Unified error types for the Thermolight firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop handles failures uniformly.  All variants are `Copy`; nothing here
//! allocates.

use core::fmt;

use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The settings wire protocol rejected a message.
    Protocol(ProtocolError),
    /// The temperature sensor could not be read.
    Sensor(SensorError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Reasons the settings parser abandons an in-flight message.
///
/// None of these are fatal: the engine discards the rest of the message and
/// resynchronises on the next classification byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// A numeric field had more than the allowed number of digits.
    FieldTooLong,
    /// A numeric field does not fit in `u32`.
    Overflow,
    /// A byte that cannot start or continue any token.
    UnexpectedByte(u8),
    /// A well-formed token in a position the grammar does not allow.
    UnexpectedToken,
    /// A settings field letter other than `L`, `M`, `H` or `P`.
    UnknownField(u8),
    /// More fields than the message kind can carry.
    TooManyFields,
    /// A value that does not fit its store byte or flag.
    ValueOutOfRange(u32),
    /// A pin name that is not on the board pin table.
    UnknownPin,
    /// A pin channel index outside 0–5.
    BadChannel(u32),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldTooLong => write!(f, "numeric field too long"),
            Self::Overflow => write!(f, "numeric field overflow"),
            Self::UnexpectedByte(b) => write!(f, "unexpected byte 0x{b:02x}"),
            Self::UnexpectedToken => write!(f, "unexpected token"),
            Self::UnknownField(l) => write!(f, "unknown field '{}'", *l as char),
            Self::TooManyFields => write!(f, "too many fields"),
            Self::ValueOutOfRange(v) => write!(f, "value {v} out of range"),
            Self::UnknownPin => write!(f, "unknown pin name"),
            Self::BadChannel(c) => write!(f, "bad pin channel {c}"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// The configured sensor pin has no ADC channel.
    NotAnalogPin(u8),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::NotAnalogPin(p) => write!(f, "pin {p} has no ADC channel"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
