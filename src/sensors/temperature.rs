//! TMP36-style analog temperature sensor.
//!
//! Linear output: 10 mV/°C with a 500 mV offset at 0 °C, read via the
//! ESP32-S3 ADC1 at 12 bits over a 3.3 V range.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the oneshot ADC channel initialised by hw_init.
//! On host/test: reads from a static AtomicU16 for injection.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::pins;

static SIM_TEMP_ADC: AtomicU16 = AtomicU16::new(0);
static SIM_ADC_FAULT: AtomicBool = AtomicBool::new(false);

/// Inject the raw ADC value the simulated sensor will return.
pub fn sim_set_temp_adc(raw: u16) {
    SIM_TEMP_ADC.store(raw, Ordering::Relaxed);
}

/// Make simulated reads fail (`true`) or succeed (`false`).
pub fn sim_set_adc_fault(fault: bool) {
    SIM_ADC_FAULT.store(fault, Ordering::Relaxed);
}

const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;
const OFFSET_V: f32 = 0.5;
const DEG_PER_V: f32 = 100.0;

/// Convert a raw 12-bit sample to degrees Celsius.
pub fn adc_to_celsius(raw: u16) -> f32 {
    let volts = (f32::from(raw) / ADC_MAX) * V_REF;
    (volts - OFFSET_V) * DEG_PER_V
}

pub struct TemperatureSensor {
    gpio: u8,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    channel: u32,
}

impl TemperatureSensor {
    /// Bind to an analog GPIO.  Fails if the pin has no ADC1 channel.
    pub fn new(gpio: u8) -> Result<Self, SensorError> {
        let channel = pins::adc1_channel(gpio).ok_or(SensorError::NotAnalogPin(gpio))?;
        Ok(Self { gpio, channel })
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    pub fn read(&self) -> Result<f32, SensorError> {
        self.read_adc().map(adc_to_celsius)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(self.channel).ok_or(SensorError::AdcReadFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        if SIM_ADC_FAULT.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(SIM_TEMP_ADC.load(Ordering::Relaxed))
    }
}
