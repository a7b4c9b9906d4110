//! System configuration parameters
//!
//! Build-time tunables for the Thermolight firmware.  The user-facing
//! settings (thresholds, pins, flags) are not here; they live in the
//! persistent store and are edited over the serial protocol (see
//! [`crate::settings`]).  `SystemConfig` can be overridden from NVS.

use serde::{Deserialize, Serialize};

use crate::extrema::RotationClock;

/// Output shaping for one LED channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// Duty ceiling for the linear ramp (0–255).
    pub max_intensity: u8,
    /// Accelerate the ramp over the top sixth of the threshold range.
    pub boost_near_high: bool,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Control loop interval (milliseconds).  One tick per interval.
    pub tick_interval_ms: u32,
    /// Telemetry report interval (ticks).
    pub telemetry_interval_ticks: u32,

    // --- Extremum tracking ---
    /// Ticks per 10-minute bin (one sixth of the hourly window).
    pub rotation_period_ticks: u32,
    /// Which counter schedules window rotation.
    pub rotation_clock: RotationClock,

    // --- LED channels ---
    pub blue: ChannelProfile,
    pub green: ChannelProfile,
    pub red: ChannelProfile,
    /// Drive red at full duty once the temperature reaches the red upper bound.
    pub red_saturates_above_high: bool,

    // --- Display ---
    /// Seconds each extreme category stays on screen.
    pub display_rotate_secs: u32,
    /// Seconds the settings view stays up after a request.
    pub settings_view_secs: u32,

    // --- Buttons ---
    /// Button debounce window (milliseconds).
    pub button_debounce_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_interval_ms: 1000, // 1 Hz
            telemetry_interval_ticks: 60,

            // Extrema: 600 × 1 s = 10 min bins, 6 bins = 1 h
            rotation_period_ticks: 600,
            rotation_clock: RotationClock::RecordAge,

            // Channels
            blue: ChannelProfile {
                max_intensity: 255,
                boost_near_high: false,
            },
            green: ChannelProfile {
                max_intensity: 190,
                boost_near_high: false,
            },
            red: ChannelProfile {
                max_intensity: 255,
                boost_near_high: true,
            },
            red_saturates_above_high: true,

            // Display
            display_rotate_secs: 5,
            settings_view_secs: 5,

            // Buttons
            button_debounce_ms: 50,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(100..=10_000).contains(&self.tick_interval_ms) {
            return Err("tick_interval_ms must be 100–10000");
        }
        if self.telemetry_interval_ticks == 0 {
            return Err("telemetry_interval_ticks must be > 0");
        }
        if self.rotation_period_ticks == 0 {
            return Err("rotation_period_ticks must be > 0");
        }
        if self.display_rotate_secs == 0 {
            return Err("display_rotate_secs must be > 0");
        }
        if self.settings_view_secs > 60 {
            return Err("settings_view_secs must be 0–60");
        }
        if !(5..=500).contains(&self.button_debounce_ms) {
            return Err("button_debounce_ms must be 5–500");
        }
        Ok(())
    }

    /// Settings view duration expressed in control ticks (at least one).
    pub fn settings_view_ticks(&self) -> u32 {
        (self.settings_view_secs * 1000)
            .div_ceil(self.tick_interval_ms.max(1))
            .max(1)
    }
}
