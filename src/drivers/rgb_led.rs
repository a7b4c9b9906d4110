//! RGB indicator LED driver.
//!
//! Three PWM channels drive the discrete R/G/B dies of a common-cathode
//! LED.  The driver is generic over [`SetDutyCycle`] so it can sit on the
//! LEDC peripheral on hardware and on a recording mock in tests.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`LedcChannel`] writes the LEDC duty register via hw_init.
//! On host/test: `ledc_set` is a no-op and the driver tracks state in memory.

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::drivers::hw_init;

/// One LEDC channel at 8-bit resolution.
pub struct LedcChannel {
    channel: u32,
}

impl LedcChannel {
    pub const fn new(channel: u32) -> Self {
        Self { channel }
    }
}

impl ErrorType for LedcChannel {
    type Error = core::convert::Infallible;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        u16::from(u8::MAX)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        hw_init::ledc_set(self.channel, duty.min(u16::from(u8::MAX)) as u8);
        Ok(())
    }
}

pub struct RgbLed<P> {
    red: P,
    green: P,
    blue: P,
    current: (u8, u8, u8),
}

impl RgbLed<LedcChannel> {
    /// The indicator on LEDC channels 0-2 (configured by hw_init).
    pub const fn ledc() -> Self {
        Self::new(
            LedcChannel::new(hw_init::LEDC_CH_LED_R),
            LedcChannel::new(hw_init::LEDC_CH_LED_G),
            LedcChannel::new(hw_init::LEDC_CH_LED_B),
        )
    }
}

impl<P: SetDutyCycle> RgbLed<P> {
    pub const fn new(red: P, green: P, blue: P) -> Self {
        Self {
            red,
            green,
            blue,
            current: (0, 0, 0),
        }
    }

    /// Set all three duties.  Values are 0-255 and scaled to each
    /// channel's resolution.
    pub fn set(&mut self, r: u8, g: u8, b: u8) -> Result<(), P::Error> {
        Self::write(&mut self.red, r)?;
        Self::write(&mut self.green, g)?;
        Self::write(&mut self.blue, b)?;
        self.current = (r, g, b);
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.set(0, 0, 0)
    }

    pub fn current(&self) -> (u8, u8, u8) {
        self.current
    }

    fn write(pin: &mut P, value: u8) -> Result<(), P::Error> {
        pin.set_duty_cycle_fraction(u16::from(value), u16::from(u8::MAX))
    }
}
