//! Settings protocol engine.
//!
//! Drains a [`ByteSource`] once per tick, parses `S` (settings) and `P`
//! (pin remap) messages, and writes accepted messages through to the
//! [`PersistentStore`] and the in-memory [`DeviceSettings`].
//!
//! ```text
//!            ┌──── 'S' / 'P' ────▶ Body ──── ';' ────▶ commit ──┐
//!  Idle ─────┤                      │                            │
//!   ▲        └──── other ──▶ flush  │ error                      │
//!   │                               ▼                            │
//!   └────────────── ';' ─────── Discard                          │
//!   └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fields are staged while the message is in flight and only committed on
//! `;`, so a rejected message never leaves a partial write behind.

use heapless::Vec;
use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{ByteSource, PersistentStore};
use crate::error::ProtocolError;
use crate::pins::{BOARD_PIN_TABLE, PinTable};
use crate::settings::{DeviceSettings, PinRole, STORE_LEN, offsets};

use super::lexer::{Lexer, Mode, Token};

/// Field letters accepted in an `S` message.
const SETTINGS_FIELDS: &[u8] = b"LMHP";

/// Offset pairs an `S` message can fill (0/1 through 6/7).
const MAX_SETTINGS_FIELDS: usize = 4;

/// Pin fields per `P` message (one per role).
const MAX_PIN_FIELDS: usize = PinRole::ALL.len();

/// Counters exposed for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolStats {
    /// Messages committed.
    pub applied: u32,
    /// Messages abandoned on a parse error.
    pub rejected: u32,
    /// Unrecognised classification bytes that caused a flush.
    pub flushed: u32,
}

// ---------------------------------------------------------------------------
// In-flight message
// ---------------------------------------------------------------------------

/// Where the parser is inside the current field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Start of an `S` field: a letter.
    Letter,
    /// First value of the `S` field filling offset pair `pair`.
    First { letter: u8, pair: usize },
    /// Second value of the same field.
    Second { letter: u8, pair: usize, first: u8 },
    /// Start of a `P` field: a pin name.
    PinName,
    /// Channel index for a resolved pin.
    Channel { gpio: u8 },
}

impl Expect {
    /// Whether `;` is legal here.
    fn at_field_boundary(self) -> bool {
        matches!(self, Self::Letter | Self::PinName)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StagedWrite {
    offset: usize,
    value: u8,
}

/// Parse state of one message.
#[derive(Debug, Clone)]
struct Message {
    lexer: Lexer,
    expect: Expect,
    fields: usize,
    staged: Vec<StagedWrite, STORE_LEN>,
}

impl Message {
    fn new(mode: Mode) -> Self {
        Self {
            lexer: Lexer::new(mode),
            expect: match mode {
                Mode::Settings => Expect::Letter,
                Mode::Pins => Expect::PinName,
            },
            fields: 0,
            staged: Vec::new(),
        }
    }

    fn stage(&mut self, offset: usize, value: u8) -> Result<(), ProtocolError> {
        // A later field for the same offset replaces the earlier one.
        if let Some(w) = self.staged.iter_mut().find(|w| w.offset == offset) {
            w.value = value;
            return Ok(());
        }
        self.staged
            .push(StagedWrite { offset, value })
            .map_err(|_| ProtocolError::TooManyFields)
    }

    /// Advance the grammar with one token.  `Ok(true)` means the message is
    /// complete and ready to commit.
    fn accept(&mut self, token: Token, pins: &PinTable) -> Result<bool, ProtocolError> {
        match (self.expect, token) {
            (expect, Token::Terminator) if expect.at_field_boundary() => Ok(true),

            (Expect::Letter, Token::Letter(letter)) => {
                if !SETTINGS_FIELDS.contains(&letter) {
                    return Err(ProtocolError::UnknownField(letter));
                }
                if self.fields >= MAX_SETTINGS_FIELDS {
                    return Err(ProtocolError::TooManyFields);
                }
                self.expect = Expect::First { letter, pair: self.fields };
                Ok(false)
            }

            (Expect::First { letter, pair }, Token::Int { value, .. }) => {
                let first = store_value(pair * 2, value)?;
                self.expect = Expect::Second { letter, pair, first };
                Ok(false)
            }

            (Expect::Second { letter, pair, first }, Token::Int { value, digits }) => {
                self.stage(pair * 2, first)?;
                if letter == b'P' {
                    self.stage_power_field(pair * 2 + 1, value, digits)?;
                } else {
                    self.stage(pair * 2 + 1, store_value(pair * 2 + 1, value)?)?;
                }
                self.fields += 1;
                self.expect = Expect::Letter;
                Ok(false)
            }

            (Expect::PinName, Token::Pin(name)) => {
                if self.fields >= MAX_PIN_FIELDS {
                    return Err(ProtocolError::TooManyFields);
                }
                let gpio = pins.resolve(name).ok_or(ProtocolError::UnknownPin)?;
                self.expect = Expect::Channel { gpio };
                Ok(false)
            }

            (Expect::Channel { gpio }, Token::Int { value, .. }) => {
                let role = PinRole::from_index(value).ok_or(ProtocolError::BadChannel(value))?;
                self.stage(role.store_offset(), gpio)?;
                self.fields += 1;
                self.expect = Expect::PinName;
                Ok(false)
            }

            _ => Err(ProtocolError::UnexpectedToken),
        }
    }

    /// Second value of a `P` field: the first digit goes to `offset`, an
    /// optional second digit is the startup-show flag.
    fn stage_power_field(&mut self, offset: usize, value: u32, digits: u8) -> Result<(), ProtocolError> {
        let (lead, show) = match digits {
            1 => (value, None),
            2 => (value / 10, Some(flag(value % 10)?)),
            _ => return Err(ProtocolError::ValueOutOfRange(value)),
        };
        self.stage(offset, store_value(offset, lead)?)?;
        if let Some(show) = show {
            self.stage(offsets::STARTUP_SHOW, show)?;
        }
        Ok(())
    }
}

/// Range-check `value` for the store byte at `offset`: the power and lock
/// offsets hold flags, the threshold offsets hold plain bytes.
fn store_value(offset: usize, value: u32) -> Result<u8, ProtocolError> {
    match offset {
        offsets::POWER_ON | offsets::LOCK => flag(value),
        _ => byte(value),
    }
}

fn byte(value: u32) -> Result<u8, ProtocolError> {
    u8::try_from(value).map_err(|_| ProtocolError::ValueOutOfRange(value))
}

fn flag(value: u32) -> Result<u8, ProtocolError> {
    match value {
        0 | 1 => Ok(value as u8),
        _ => Err(ProtocolError::ValueOutOfRange(value)),
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Phase {
    /// Waiting for a classification byte.
    Idle,
    /// Reading the body of an `S` or `P` message.
    Body(Message),
    /// Skipping the rest of a rejected message up to `;`.
    Discard,
}

/// Incremental parser for the settings wire protocol.
#[derive(Debug, Clone)]
pub struct SettingsEngine {
    pins: &'static PinTable,
    phase: Phase,
    stats: ProtocolStats,
}

impl Default for SettingsEngine {
    fn default() -> Self {
        Self::new(&BOARD_PIN_TABLE)
    }
}

impl SettingsEngine {
    pub const fn new(pins: &'static PinTable) -> Self {
        Self {
            pins,
            phase: Phase::Idle,
            stats: ProtocolStats {
                applied: 0,
                rejected: 0,
                flushed: 0,
            },
        }
    }

    pub const fn stats(&self) -> ProtocolStats {
        self.stats
    }

    /// No message in flight.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Drain every byte `source` has available.  Returns whether at least
    /// one message was applied.  A message cut off mid-way resumes on the
    /// next call.
    pub fn poll(
        &mut self,
        source: &mut impl ByteSource,
        settings: &mut DeviceSettings,
        store: &mut impl PersistentStore,
    ) -> bool {
        let mut applied = false;

        while source.available() > 0 {
            if matches!(self.phase, Phase::Idle) {
                let Some(class) = source.peek() else { break };
                match class {
                    b' ' | b'\t' | b'\r' | b'\n' => {
                        source.read();
                    }
                    b'S' | b'P' => {
                        source.read();
                        let mode = if class == b'S' { Mode::Settings } else { Mode::Pins };
                        debug!("serial: '{}' message started", class as char);
                        self.phase = Phase::Body(Message::new(mode));
                    }
                    other => self.flush(source, other),
                }
                continue;
            }

            let Some(byte) = source.read() else { break };
            applied |= self.feed(byte, settings, store);
        }

        applied
    }

    fn flush(&mut self, source: &mut impl ByteSource, class: u8) {
        let mut dropped = 0usize;
        while source.available() > 0 && source.read().is_some() {
            dropped += 1;
        }
        self.stats.flushed = self.stats.flushed.wrapping_add(1);
        debug!("serial: unknown classification 0x{:02x}, flushed {} bytes", class, dropped);
    }

    fn feed(&mut self, byte: u8, settings: &mut DeviceSettings, store: &mut impl PersistentStore) -> bool {
        let pins = self.pins;
        match &mut self.phase {
            Phase::Idle => false,
            Phase::Discard => {
                if byte == b';' {
                    self.phase = Phase::Idle;
                }
                false
            }
            Phase::Body(message) => {
                let step = message
                    .lexer
                    .push(byte)
                    .and_then(|token| match token {
                        Some(token) => message.accept(token, pins),
                        None => Ok(false),
                    });
                match step {
                    Ok(false) => false,
                    Ok(true) => {
                        let message = core::mem::replace(&mut self.phase, Phase::Idle);
                        match message {
                            Phase::Body(message) => self.commit(&message, settings, store),
                            _ => false,
                        }
                    }
                    Err(e) => {
                        self.reject(e, byte);
                        false
                    }
                }
            }
        }
    }

    fn reject(&mut self, error: ProtocolError, byte: u8) {
        warn!("serial: message rejected: {}", error);
        self.stats.rejected = self.stats.rejected.wrapping_add(1);
        // The offending byte may itself have been the terminator.
        self.phase = if byte == b';' { Phase::Idle } else { Phase::Discard };
    }

    fn commit(&mut self, message: &Message, settings: &mut DeviceSettings, store: &mut impl PersistentStore) -> bool {
        if message.staged.is_empty() {
            debug!("serial: empty message ignored");
            return false;
        }

        let mut written = 0usize;
        let mut pins_changed = false;
        for w in &message.staged {
            if settings.commit_byte(store, w.offset, w.value) {
                written += 1;
            }
            pins_changed |= (offsets::PINS..offsets::PINS + MAX_PIN_FIELDS).contains(&w.offset);
        }

        self.stats.applied = self.stats.applied.wrapping_add(1);
        info!(
            "serial: {} applied ({} fields, {} bytes written)",
            match message.lexer.mode() {
                Mode::Settings => "settings",
                Mode::Pins => "pin map",
            },
            message.fields,
            written
        );
        if pins_changed {
            info!("serial: pin assignments saved, they take effect after reboot");
        }
        true
    }
}
