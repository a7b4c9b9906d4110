//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the temperature sensor and the RGB indicator, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets
//! the underlying drivers use cfg-gated simulation stubs.

use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::hw_init;
use crate::drivers::rgb_led::{LedcChannel, RgbLed};
use crate::error::{Result, SensorError};
use crate::sensors::TemperatureSensor;
use crate::settings::PinAssignments;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensor: TemperatureSensor,
    led: RgbLed<LedcChannel>,
}

impl HardwareAdapter {
    pub fn new(sensor: TemperatureSensor, led: RgbLed<LedcChannel>) -> Self {
        Self { sensor, led }
    }

    /// Configure the peripherals for `pins` and wrap them in an adapter.
    /// Called once at boot.
    pub fn init(pins: &PinAssignments) -> Result<Self> {
        hw_init::init_peripherals(pins)?;
        let sensor = TemperatureSensor::new(pins.temp_sensor)?;
        Ok(Self::new(sensor, RgbLed::ledc()))
    }

    /// Duties last written to the indicator.
    pub fn led_colour(&self) -> (u8, u8, u8) {
        self.led.current()
    }
}

impl SensorPort for HardwareAdapter {
    fn read_temperature(&mut self) -> core::result::Result<f32, SensorError> {
        self.sensor.read()
    }
}

impl ActuatorPort for HardwareAdapter {
    fn set_rgb(&mut self, r: u8, g: u8, b: u8) {
        if let Err(e) = self.led.set(r, g, b) {
            warn!("indicator write failed: {:?}", e);
        }
    }
}
