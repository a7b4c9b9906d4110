//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor, RGB output, display, byte stream, storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! and the [`SettingsEngine`](crate::serial::SettingsEngine) consume them via
//! generics, so the domain core never touches hardware directly.

use crate::config::SystemConfig;
use crate::display::DisplayFrame;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one temperature sample per tick.
pub trait SensorPort {
    /// Current temperature in °C.
    fn read_temperature(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the RGB indicator.
pub trait ActuatorPort {
    /// Set the three channel duties (0–255).
    fn set_rgb(&mut self, red: u8, green: u8, blue: u8);

    /// Turn every channel off.
    fn all_off(&mut self) {
        self.set_rgb(0, 0, 0);
    }
}

// ───────────────────────────────────────────────────────────────
// Display sink (driven adapter: domain → character display)
// ───────────────────────────────────────────────────────────────

/// Receives one [`DisplayFrame`] per tick.  Cursor placement and glyph
/// rendering are the adapter's business.
pub trait DisplaySink {
    fn show(&mut self, frame: &DisplayFrame);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Byte source (driven adapter: serial transport → protocol engine)
// ───────────────────────────────────────────────────────────────

/// A peekable, incrementally readable byte stream.
///
/// Reads never block.  `read` and `peek` return `None` when nothing is
/// buffered.
pub trait ByteSource {
    /// Bytes that can be read right now without blocking.
    fn available(&mut self) -> usize;

    /// Next byte without consuming it.
    fn peek(&mut self) -> Option<u8>;

    /// Consume the next byte.
    fn read(&mut self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Persistent store (driven adapter: domain ↔ EEPROM-style bytes)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable non-volatile memory holding the settings image.
///
/// Offsets outside the device's capacity read as `0xFF` and ignore writes.
/// There is no failure channel; writes are best-effort.
pub trait PersistentStore {
    fn read(&self, offset: usize) -> u8;

    fn write(&mut self, offset: usize, value: u8);

    /// Write only if the stored byte differs.  Returns whether a write
    /// happened.
    fn update(&mut self, offset: usize, value: u8) -> bool {
        if self.read(offset) == value {
            return false;
        }
        self.write(offset, value);
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`SystemConfig`].
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
