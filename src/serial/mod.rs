//! Settings wire protocol over the serial port.
//!
//! ```text
//!  ByteSource ──▶ SettingsEngine ──▶ Lexer ──▶ tokens ──▶ staged writes
//!                        │                                     │ ';'
//!                        ▼                                     ▼
//!                 ProtocolStats                DeviceSettings + PersistentStore
//! ```
//!
//! Messages:
//!
//! - `S` + up to four `Letter|a|b|` fields (`L`, `M`, `H`, `P`) + `;`
//! - `P` + up to six `PinName|channel|` fields + `;`
//!
//! Any other classification byte flushes the receive buffer.

pub mod engine;
pub mod lexer;

pub use engine::{ProtocolStats, SettingsEngine};
pub use lexer::{Lexer, Mode, Token};
