//! Display frame model for the 16×2 character LCD.
//!
//! The core decides *what* is on screen each tick; the [`DisplaySink`]
//! adapter decides how it gets there.  Frames render into two fixed-width
//! lines:
//!
//! ```text
//!  ┌────────────────┐        ┌────────────────┐
//!  │21.4C    H1:27.9│        │B 0-23  G18-31  │
//!  │Time:   01:02:03│        │R25-33  P1 L0   │
//!  └────────────────┘        └────────────────┘
//!      status view              settings view
//! ```
//!
//! [`DisplaySink`]: crate::app::ports::DisplaySink

use core::fmt::{self, Write};

use heapless::String;

use crate::settings::{DeviceSettings, LedBounds};

/// LCD columns.
pub const COLUMNS: usize = 16;

/// One rendered LCD row.
pub type Line = String<COLUMNS>;

// ---------------------------------------------------------------------------
// Extreme category rotation
// ---------------------------------------------------------------------------

/// Which extreme the status view shows.  Rotates every few seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeCategory {
    AllTimeHigh,
    AllTimeLow,
    HourlyHigh,
    HourlyLow,
}

impl ExtremeCategory {
    const ROTATION: [Self; 4] = [
        Self::AllTimeHigh,
        Self::AllTimeLow,
        Self::HourlyHigh,
        Self::HourlyLow,
    ];

    /// Category for `uptime_secs`, changing every `rotate_secs` and
    /// restarting the cycle each hour.
    pub fn for_uptime(uptime_secs: u32, rotate_secs: u32) -> Self {
        let slot = (uptime_secs % 3600) / rotate_secs.max(1) % 4;
        Self::ROTATION[slot as usize]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AllTimeHigh => "H:",
            Self::AllTimeLow => "L:",
            Self::HourlyHigh => "H1:",
            Self::HourlyLow => "L1:",
        }
    }
}

// ---------------------------------------------------------------------------
// Uptime
// ---------------------------------------------------------------------------

/// Seconds since boot, shown as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Uptime(pub u32);

impl Uptime {
    pub const fn hours(self) -> u32 {
        self.0 / 3600
    }

    pub const fn minutes(self) -> u32 {
        self.0 / 60 % 60
    }

    pub const fn seconds(self) -> u32 {
        self.0 % 60
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours(), self.minutes(), self.seconds())
    }
}

/// A temperature that may not have been observed yet, as `21.3` or `--.-`.
pub(crate) struct Reading(pub(crate) Option<f32>);

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.1}", v),
            None => f.write_str("--.-"),
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Everything on screen for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayFrame {
    Status {
        temperature: f32,
        category: ExtremeCategory,
        /// Value of `category`, `None` until first observed.
        extreme: Option<f32>,
        uptime: Uptime,
    },
    Settings {
        bounds: LedBounds,
        power_on: bool,
        lock: bool,
    },
}

impl DisplayFrame {
    pub fn settings(settings: &DeviceSettings) -> Self {
        Self::Settings {
            bounds: settings.bounds,
            power_on: settings.power_on,
            lock: settings.lock,
        }
    }

    /// Render into two LCD rows.  Anything past column 16 is cut off.
    pub fn render(&self) -> [Line; 2] {
        match *self {
            Self::Status {
                temperature,
                category,
                extreme,
                uptime,
            } => {
                let mut temp = String::<8>::new();
                let _ = write!(temp, "{:.1}C", temperature);
                let mut ext = String::<12>::new();
                let _ = write!(ext, "{}{}", category.label(), Reading(extreme));
                [
                    fit(format_args!("{:<7}{:>9}", temp.as_str(), ext.as_str())),
                    fit(format_args!("Time:   {}", uptime)),
                ]
            }
            Self::Settings {
                bounds,
                power_on,
                lock,
            } => [
                fit(format_args!(
                    "B{:>2}-{:<3} G{:>2}-{:<3}",
                    bounds.blue.low, bounds.blue.high, bounds.green.low, bounds.green.high
                )),
                fit(format_args!(
                    "R{:>2}-{:<3} P{} L{}",
                    bounds.red.low,
                    bounds.red.high,
                    u8::from(power_on),
                    u8::from(lock)
                )),
            ],
        }
    }
}

/// Writer that drops whatever does not fit.
struct Truncate<'a>(&'a mut Line);

impl Write for Truncate<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn fit(args: fmt::Arguments<'_>) -> Line {
    let mut line = Line::new();
    let _ = Truncate(&mut line).write_fmt(args);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_shows_placeholder_until_observed() {
        assert_eq!(format!("{}", Reading(None)), "--.-");
        assert_eq!(format!("{}", Reading(Some(21.26))), "21.3");
    }

    #[test]
    fn category_rotates_every_five_seconds() {
        let at = |s| ExtremeCategory::for_uptime(s, 5);
        assert_eq!(at(0), ExtremeCategory::AllTimeHigh);
        assert_eq!(at(4), ExtremeCategory::AllTimeHigh);
        assert_eq!(at(5), ExtremeCategory::AllTimeLow);
        assert_eq!(at(10), ExtremeCategory::HourlyHigh);
        assert_eq!(at(15), ExtremeCategory::HourlyLow);
        assert_eq!(at(20), ExtremeCategory::AllTimeHigh);
        // Restarts on the hour.
        assert_eq!(at(3600 + 5), ExtremeCategory::AllTimeLow);
    }

    #[test]
    fn uptime_formats_as_hh_mm_ss() {
        assert_eq!(format!("{}", Uptime(0)), "00:00:00");
        assert_eq!(format!("{}", Uptime(3723)), "01:02:03");
        assert_eq!(format!("{}", Uptime(100 * 3600)), "100:00:00");
    }

    #[test]
    fn status_frame_renders_two_lines() {
        let frame = DisplayFrame::Status {
            temperature: 21.0,
            category: ExtremeCategory::HourlyHigh,
            extreme: Some(27.5),
            uptime: Uptime(3723),
        };
        let [top, bottom] = frame.render();
        assert_eq!(top.as_str(), "21.0C    H1:27.5");
        assert_eq!(bottom.as_str(), "Time:   01:02:03");
    }

    #[test]
    fn unset_extreme_shows_placeholder() {
        let frame = DisplayFrame::Status {
            temperature: -3.0,
            category: ExtremeCategory::AllTimeLow,
            extreme: None,
            uptime: Uptime(0),
        };
        let [top, _] = frame.render();
        assert_eq!(top.as_str(), "-3.0C     L:--.-");
    }

    #[test]
    fn settings_frame_shows_bounds_and_flags() {
        let frame = DisplayFrame::settings(&DeviceSettings::default());
        let [top, bottom] = frame.render();
        assert_eq!(top.as_str(), "B 0-23  G18-31 ");
        assert_eq!(bottom.as_str(), "R25-33  P1 L0");
    }

    #[test]
    fn long_lines_are_truncated_to_the_lcd_width() {
        let frame = DisplayFrame::Status {
            temperature: 21.0,
            category: ExtremeCategory::AllTimeHigh,
            extreme: Some(20.0),
            uptime: Uptime(100 * 3600),
        };
        let [_, bottom] = frame.render();
        assert_eq!(bottom.len(), COLUMNS);
        assert_eq!(bottom.as_str(), "Time:   100:00:0");
    }
}
