//! Mock adapters for integration tests.
//!
//! Records every actuator, display and event call so tests can assert on
//! the full history without touching real ADC/PWM/UART registers.

use std::collections::VecDeque;

use thermolight::app::events::AppEvent;
use thermolight::app::ports::{ActuatorPort, ByteSource, DisplaySink, EventSink, SensorPort};
use thermolight::display::DisplayFrame;
use thermolight::error::SensorError;

// ── MockHardware ──────────────────────────────────────────────

/// Sensor with a scripted sample queue plus a recording RGB output.
///
/// When the script runs dry the last sample is repeated.
pub struct MockHardware {
    script: VecDeque<Result<f32, SensorError>>,
    last: f32,
    pub rgb_calls: Vec<[u8; 3]>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(initial: f32) -> Self {
        Self {
            script: VecDeque::new(),
            last: initial,
            rgb_calls: Vec::new(),
        }
    }

    pub fn push_sample(&mut self, celsius: f32) {
        self.script.push_back(Ok(celsius));
    }

    pub fn push_fault(&mut self) {
        self.script.push_back(Err(SensorError::AdcReadFailed));
    }

    pub fn last_rgb(&self) -> Option<[u8; 3]> {
        self.rgb_calls.last().copied()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        match self.script.pop_front() {
            Some(Ok(v)) => {
                self.last = v;
                Ok(v)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last),
        }
    }
}

impl ActuatorPort for MockHardware {
    fn set_rgb(&mut self, red: u8, green: u8, blue: u8) {
        self.rgb_calls.push([red, green, blue]);
    }
}

// ── MockSerial ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSerial {
    rx: VecDeque<u8>,
}

#[allow(dead_code)]
impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl ByteSource for MockSerial {
    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn peek(&mut self) -> Option<u8> {
        self.rx.front().copied()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

// ── Recording sinks ───────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub frames: Vec<DisplayFrame>,
}

#[allow(dead_code)]
impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&DisplayFrame> {
        self.frames.last()
    }
}

impl DisplaySink for RecordingDisplay {
    fn show(&mut self, frame: &DisplayFrame) {
        self.frames.push(*frame);
    }
}
