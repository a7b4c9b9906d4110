//! Log-based sink adapters.
//!
//! [`LogEventSink`] writes structured application events to the ESP-IDF
//! logger (UART / USB-CDC in production); telemetry additionally goes out
//! as a single JSON line for host-side tooling.  [`LogDisplay`] stands in
//! for the 16×2 character display by logging each rendered frame when it
//! changes.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{DisplaySink, EventSink};
use crate::display::{DisplayFrame, Line, Reading};

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | up={}s | T={:.1}\u{00b0}C | hi={}/{} lo={}/{} | \
                     rgb={:?} | light={} lock={} | proto ok={} bad={}",
                    t.uptime_secs,
                    t.temperature_c,
                    Reading(t.all_time_high_c),
                    Reading(t.hourly_high_c),
                    Reading(t.all_time_low_c),
                    Reading(t.hourly_low_c),
                    t.rgb,
                    if t.power_on { "on" } else { "off" },
                    t.lock,
                    t.protocol.applied,
                    t.protocol.rejected,
                );
                match serde_json::to_string(t) {
                    Ok(json) => info!("JSON | {}", json),
                    Err(e) => warn!("telemetry encode failed: {}", e),
                }
            }
            AppEvent::SettingsApplied => info!("SETTINGS | applied"),
            AppEvent::LightToggled { on } => {
                info!("LIGHT | {}", if *on { "on" } else { "off" });
            }
            AppEvent::SettingsShown => info!("SETTINGS | shown"),
            AppEvent::Locked => info!("PANEL | locked, press ignored"),
            AppEvent::SensorFault(e) => warn!("SENSOR | {}", e),
            AppEvent::Started => info!("START | thermolight"),
        }
    }
}

/// Display stand-in that logs the two rendered lines.  Only frames that
/// differ from the previous one are logged.
#[derive(Default)]
pub struct LogDisplay {
    last: Option<[Line; 2]>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of the last frame shown.
    pub fn lines(&self) -> Option<&[Line; 2]> {
        self.last.as_ref()
    }
}

impl DisplaySink for LogDisplay {
    fn show(&mut self, frame: &DisplayFrame) {
        let lines = frame.render();
        if self.last.as_ref() == Some(&lines) {
            return;
        }
        info!("LCD | {} | {}", lines[0], lines[1]);
        self.last = Some(lines);
    }
}
