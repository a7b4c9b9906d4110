//! Multi-resolution rolling extremum tracker.
//!
//! For each polarity (high and low) the tracker keeps:
//!
//! - an **all-time** extreme since boot,
//! - an **hourly** extreme over a six-bin sliding window,
//! - a **sliding window** of six 10-minute bins, oldest first, where the
//!   newest bin accumulates the extreme of the current period.
//!
//! ```text
//!  sample ─▶ newest bin ─▶ hourly ─▶ all-time        (cascade, per tick)
//!
//!  ┌──────┬──────┬──────┬──────┬──────┬──────┐
//!  │ bin0 │ bin1 │ bin2 │ bin3 │ bin4 │ bin5 │ ◀─ accumulating
//!  └──────┴──────┴──────┴──────┴──────┴──────┘
//!     ▲ evicted on rotation            fresh unset bin appended ─▶
//! ```
//!
//! ## Rotation schedule
//!
//! Each polarity counts `age_ticks`.  When `age_ticks` is a non-zero
//! multiple of the rotation period the window rotates.  With
//! [`RotationClock::RecordAge`] the same counter is reset whenever the
//! hourly extreme is replaced, so a run of new records postpones the next
//! rotation.  [`RotationClock::FreeRunning`] schedules rotation from a
//! separate counter that is never reset.

use serde::{Deserialize, Serialize};

/// Number of bins in a sliding window.
pub const WINDOW_BINS: usize = 6;

// ---------------------------------------------------------------------------
// Extreme value
// ---------------------------------------------------------------------------

/// Direction of an extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    High,
    Low,
}

impl Polarity {
    /// Whether `candidate` is strictly more extreme than `current`.
    fn beats(self, candidate: f32, current: f32) -> bool {
        match self {
            Self::High => candidate > current,
            Self::Low => candidate < current,
        }
    }
}

/// An extreme that may not have been observed yet.
///
/// Comparison semantics:
/// - every sample beats an unset extreme, for either polarity;
/// - an unset extreme never beats anything;
/// - two unset extremes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extreme(Option<f32>);

impl Extreme {
    pub const UNSET: Self = Self(None);

    pub const fn new(value: f32) -> Self {
        Self(Some(value))
    }

    pub const fn value(self) -> Option<f32> {
        self.0
    }

    pub const fn is_set(self) -> bool {
        self.0.is_some()
    }

    /// Whether `self` is strictly more extreme than `other` in `polarity`.
    pub fn beats(self, other: Self, polarity: Polarity) -> bool {
        match (self.0, other.0) {
            (Some(candidate), Some(current)) => polarity.beats(candidate, current),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-polarity state
// ---------------------------------------------------------------------------

/// Which counter schedules window rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationClock {
    /// Rotation is scheduled from `age_ticks`, which also resets whenever
    /// the hourly extreme changes.
    RecordAge,
    /// Rotation is scheduled from a counter that only ever increments.
    FreeRunning,
}

/// Extremes for one polarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremeRecord {
    pub all_time: Extreme,
    pub hourly: Extreme,
    /// Ticks since `hourly` was last set.
    pub age_ticks: u32,
}

/// Six bins, oldest first.  The last bin is accumulating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlidingWindow {
    bins: [Extreme; WINDOW_BINS],
}

impl SlidingWindow {
    const fn new() -> Self {
        Self {
            bins: [Extreme::UNSET; WINDOW_BINS],
        }
    }

    pub fn bins(&self) -> &[Extreme; WINDOW_BINS] {
        &self.bins
    }

    pub fn oldest(&self) -> Extreme {
        self.bins[0]
    }

    pub fn newest(&self) -> Extreme {
        self.bins[WINDOW_BINS - 1]
    }

    fn set_newest(&mut self, value: Extreme) {
        self.bins[WINDOW_BINS - 1] = value;
    }

    /// Most extreme bin in `polarity`.  Ties keep the oldest match.
    pub fn extreme(&self, polarity: Polarity) -> Extreme {
        Self::scan(&self.bins, polarity)
    }

    fn scan(bins: &[Extreme], polarity: Polarity) -> Extreme {
        bins.iter()
            .fold(Extreme::UNSET, |best, &bin| if bin.beats(best, polarity) { bin } else { best })
    }

    /// Drop the oldest bin and append an unset one.
    fn shift(&mut self) {
        self.bins.rotate_left(1);
        self.set_newest(Extreme::UNSET);
    }
}

/// Record + window + rotation counter for one polarity.
#[derive(Debug, Clone, Copy)]
struct Track {
    polarity: Polarity,
    record: ExtremeRecord,
    window: SlidingWindow,
    /// Only consulted with [`RotationClock::FreeRunning`].
    free_ticks: u32,
}

impl Track {
    const fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            record: ExtremeRecord {
                all_time: Extreme::UNSET,
                hourly: Extreme::UNSET,
                age_ticks: 0,
            },
            window: SlidingWindow::new(),
            free_ticks: 0,
        }
    }

    /// Apply the newest-bin → hourly → all-time cascade.  Returns `false`
    /// without touching anything if `sample` does not beat the newest bin.
    fn offer(&mut self, sample: f32) -> bool {
        let sample = Extreme::new(sample);
        if !sample.beats(self.window.newest(), self.polarity) {
            return false;
        }
        self.window.set_newest(sample);
        if sample.beats(self.record.hourly, self.polarity) {
            self.record.hourly = sample;
            self.record.age_ticks = 0;
            if sample.beats(self.record.all_time, self.polarity) {
                self.record.all_time = sample;
            }
        }
        true
    }

    /// Rotation check for this tick, then advance the counters.
    /// Returns whether the window rotated.
    fn tick(&mut self, period: u32, clock: RotationClock) -> bool {
        let counter = match clock {
            RotationClock::RecordAge => self.record.age_ticks,
            RotationClock::FreeRunning => self.free_ticks,
        };
        let due = period != 0 && counter != 0 && counter % period == 0;
        if due {
            self.rotate();
        }
        self.record.age_ticks = self.record.age_ticks.wrapping_add(1);
        self.free_ticks = self.free_ticks.wrapping_add(1);
        due
    }

    fn rotate(&mut self) {
        if self.window.oldest() == self.record.hourly {
            let remaining = &self.window.bins()[1..];
            self.record.hourly = SlidingWindow::scan(remaining, self.polarity);
            self.record.age_ticks = 0;
        }
        self.window.shift();
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// High and low extremum tracking over a stream of samples.
#[derive(Debug, Clone)]
pub struct ExtremumTracker {
    high: Track,
    low: Track,
    rotation_period: u32,
    clock: RotationClock,
}

impl ExtremumTracker {
    /// `rotation_period` is in ticks (600 for 10-minute bins at 1 Hz).
    pub const fn new(rotation_period: u32, clock: RotationClock) -> Self {
        Self {
            high: Track::new(Polarity::High),
            low: Track::new(Polarity::Low),
            rotation_period,
            clock,
        }
    }

    /// Feed one sample.  The high track is tried first; the low track only
    /// sees the sample if it did not raise the high newest bin.
    pub fn ingest(&mut self, sample: f32) {
        if !self.high.offer(sample) {
            self.low.offer(sample);
        }
    }

    /// Run the per-tick rotation check for both polarities.  Call once per
    /// tick, after [`ingest`](Self::ingest).  Returns `(high_rotated,
    /// low_rotated)`.
    pub fn maybe_rotate(&mut self) -> (bool, bool) {
        let high = self.high.tick(self.rotation_period, self.clock);
        let low = self.low.tick(self.rotation_period, self.clock);
        if high || low {
            log::debug!(
                "extrema: rotated (high={}, low={}) hourly={:?}/{:?}",
                high,
                low,
                self.hourly_high(),
                self.hourly_low()
            );
        }
        (high, low)
    }

    pub fn all_time_high(&self) -> Option<f32> {
        self.high.record.all_time.value()
    }

    pub fn all_time_low(&self) -> Option<f32> {
        self.low.record.all_time.value()
    }

    pub fn hourly_high(&self) -> Option<f32> {
        self.high.record.hourly.value()
    }

    pub fn hourly_low(&self) -> Option<f32> {
        self.low.record.hourly.value()
    }

    pub fn record(&self, polarity: Polarity) -> &ExtremeRecord {
        match polarity {
            Polarity::High => &self.high.record,
            Polarity::Low => &self.low.record,
        }
    }

    pub fn window(&self, polarity: Polarity) -> &SlidingWindow {
        match polarity {
            Polarity::High => &self.high.window,
            Polarity::Low => &self.low.window,
        }
    }
}
