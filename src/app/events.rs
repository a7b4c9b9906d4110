//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use serde::Serialize;

use crate::error::SensorError;
use crate::serial::ProtocolStats;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// A settings message was committed to the store.
    SettingsApplied,

    /// The light switch changed state.
    LightToggled { on: bool },

    /// The settings view was requested (button or boot flag).
    SettingsShown,

    /// A button press was ignored because the panel is locked.
    Locked,

    /// The temperature sensor failed; the tick was skipped.
    SensorFault(SensorError),

    /// The application service has started.
    Started,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryData {
    pub uptime_secs: u32,
    pub temperature_c: f32,
    pub all_time_high_c: Option<f32>,
    pub all_time_low_c: Option<f32>,
    pub hourly_high_c: Option<f32>,
    pub hourly_low_c: Option<f32>,
    /// Last duties sent to the indicator, `[red, green, blue]`.
    pub rgb: [u8; 3],
    pub power_on: bool,
    pub lock: bool,
    pub protocol: ProtocolStats,
}
