//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the extremum tracker, the settings working copy and
//! the protocol engine.  It exposes a clean, hardware-agnostic API.  All
//! I/O flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!   ByteSource ──▶ │        AppService        │ ──▶ DisplaySink
//!                  │ Tracker · Mapper · Engine│
//! ActuatorPort ◀── └──────────────────────────┘ ◀─▶ PersistentStore
//! ```
//!
//! One [`tick`](AppService::tick) per control period:
//!
//! 1. read a sample, feed the tracker, run the rotation check;
//! 2. map the three channel duties and send them to the indicator;
//! 3. drain the serial port through the settings engine;
//! 4. hand the display a frame;
//! 5. emit telemetry when due.

use log::{debug, info, warn};

use crate::config::{ChannelProfile, SystemConfig};
use crate::control::intensity;
use crate::display::{DisplayFrame, ExtremeCategory, Uptime};
use crate::extrema::ExtremumTracker;
use crate::serial::{ProtocolStats, SettingsEngine};
use crate::settings::{Channel, DeviceSettings, offsets};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ByteSource, DisplaySink, EventSink, PersistentStore, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    settings: DeviceSettings,
    tracker: ExtremumTracker,
    engine: SettingsEngine,
    /// Ticks completed since start.
    tick_count: u32,
    /// Last good sample; `None` until the sensor has answered once.
    temperature: Option<f32>,
    rgb: [u8; 3],
    /// Ticks left on the settings view.
    settings_view_ticks: u32,
}

impl AppService {
    /// Construct the service from configuration and the settings loaded
    /// from the store.
    pub fn new(config: SystemConfig, settings: DeviceSettings) -> Self {
        let tracker = ExtremumTracker::new(config.rotation_period_ticks, config.rotation_clock);
        Self {
            config,
            settings,
            tracker,
            engine: SettingsEngine::default(),
            tick_count: 0,
            temperature: None,
            rgb: [0; 3],
            settings_view_ticks: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce startup.  Opens the settings view when the stored
    /// startup-show flag is set.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "AppService started (power={}, lock={}, rotation={:?})",
            self.settings.power_on, self.settings.lock, self.config.rotation_clock
        );
        if self.settings.startup_show_settings {
            self.open_settings_view(sink);
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        serial: &mut impl ByteSource,
        store: &mut impl PersistentStore,
        display: &mut impl DisplaySink,
        sink: &mut impl EventSink,
    ) {
        // 1. Sample → tracker.  Rotation is clocked by ticks, not samples.
        let reading = hw.read_temperature();
        match reading {
            Ok(sample) => {
                self.temperature = Some(sample);
                self.tracker.ingest(sample);
            }
            Err(e) => {
                warn!("sensor read failed: {}", e);
                sink.emit(&AppEvent::SensorFault(e));
            }
        }
        self.tracker.maybe_rotate();

        // 2. Indicator
        if let Ok(sample) = reading {
            self.rgb = self.channel_duties(sample);
            let [r, g, b] = self.rgb;
            hw.set_rgb(r, g, b);
        }

        // 3. Settings protocol
        if self
            .engine
            .poll(serial, &mut self.settings, store)
        {
            sink.emit(&AppEvent::SettingsApplied);
        }

        // 4. Display
        display.show(&self.display_frame());
        self.settings_view_ticks = self.settings_view_ticks.saturating_sub(1);

        // 5. Telemetry
        self.tick_count = self.tick_count.wrapping_add(1);
        if self.tick_count % self.config.telemetry_interval_ticks.max(1) == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a button command.  Both commands are ignored while the
    /// settings lock is set.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        store: &mut impl PersistentStore,
        sink: &mut impl EventSink,
    ) {
        if self.settings.lock {
            debug!("{:?} ignored: panel locked", cmd);
            sink.emit(&AppEvent::Locked);
            return;
        }
        match cmd {
            AppCommand::ToggleLight => {
                let on = !self.settings.power_on;
                self.settings
                    .commit_byte(store, offsets::POWER_ON, u8::from(on));
                info!("light switched {}", if on { "on" } else { "off" });
                sink.emit(&AppEvent::LightToggled { on });
            }
            AppCommand::ShowSettings => self.open_settings_view(sink),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            uptime_secs: self.uptime().0,
            temperature_c: self.temperature.unwrap_or(f32::NAN),
            all_time_high_c: self.tracker.all_time_high(),
            all_time_low_c: self.tracker.all_time_low(),
            hourly_high_c: self.tracker.hourly_high(),
            hourly_low_c: self.tracker.hourly_low(),
            rgb: self.rgb,
            power_on: self.settings.power_on,
            lock: self.settings.lock,
            protocol: self.engine.stats(),
        }
    }

    /// Frame for the current tick.
    pub fn display_frame(&self) -> DisplayFrame {
        if self.settings_view_ticks > 0 {
            return DisplayFrame::settings(&self.settings);
        }
        let uptime = self.uptime();
        let category = ExtremeCategory::for_uptime(uptime.0, self.config.display_rotate_secs);
        let extreme = match category {
            ExtremeCategory::AllTimeHigh => self.tracker.all_time_high(),
            ExtremeCategory::AllTimeLow => self.tracker.all_time_low(),
            ExtremeCategory::HourlyHigh => self.tracker.hourly_high(),
            ExtremeCategory::HourlyLow => self.tracker.hourly_low(),
        };
        DisplayFrame::Status {
            temperature: self.temperature.unwrap_or(0.0),
            category,
            extreme,
            uptime,
        }
    }

    /// Time since start, derived from completed ticks.
    pub fn uptime(&self) -> Uptime {
        let ms = u64::from(self.tick_count) * u64::from(self.config.tick_interval_ms);
        Uptime(u32::try_from(ms / 1000).unwrap_or(u32::MAX))
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn tracker(&self) -> &ExtremumTracker {
        &self.tracker
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn protocol_stats(&self) -> ProtocolStats {
        self.engine.stats()
    }

    /// Last duties sent to the indicator, `[red, green, blue]`.
    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    pub fn is_showing_settings(&self) -> bool {
        self.settings_view_ticks > 0
    }

    // ── Internal ──────────────────────────────────────────────

    fn open_settings_view(&mut self, sink: &mut impl EventSink) {
        self.settings_view_ticks = self.config.settings_view_ticks();
        sink.emit(&AppEvent::SettingsShown);
    }

    /// `[red, green, blue]` for `sample` under the current settings.
    fn channel_duties(&self, sample: f32) -> [u8; 3] {
        if !self.settings.power_on {
            return [0; 3];
        }
        // Truncate toward zero, as the mapper works in whole degrees.
        let temp = sample as i32;
        let duty = |channel: Channel, profile: &ChannelProfile| {
            let b = self.settings.bounds.get(channel);
            intensity(
                temp,
                i32::from(b.low),
                i32::from(b.high),
                profile.max_intensity,
                profile.boost_near_high,
            )
        };

        let mut red = duty(Channel::Red, &self.config.red);
        if self.config.red_saturates_above_high
            && temp >= i32::from(self.settings.bounds.red.high)
        {
            red = u8::MAX;
        }
        [
            red,
            duty(Channel::Green, &self.config.green),
            duty(Channel::Blue, &self.config.blue),
        ]
    }
}
