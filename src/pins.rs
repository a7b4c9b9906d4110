//! Pin assignments and the header-label lookup table for the Thermolight board.
//!
//! The board exposes an Uno-style header (`A0`–`A5`, `D0`–`D13`) routed to
//! ESP32-S3 GPIOs.  The settings protocol names pins by header label; the
//! [`PinTable`] resolves a label to the GPIO number that is persisted and
//! used by the drivers.  Build the table once and share it.
//!
//! Default role assignments live here too.  At runtime the assignments come
//! from the persistent store and may differ.

// ---------------------------------------------------------------------------
// Header layout
// ---------------------------------------------------------------------------

/// Number of analog header pins (`A0`–`A5`).
pub const ANALOG_PINS: usize = 6;
/// Number of digital header pins (`D0`–`D13`).
pub const DIGITAL_PINS: usize = 14;

/// `A0`–`A5` are wired to ADC1 channels 0–5 (GPIO 1–6).
const ANALOG_GPIOS: [u8; ANALOG_PINS] = [1, 2, 3, 4, 5, 6];

/// `D0`/`D1` sit on the UART0 pins; `D2`–`D13` are plain GPIOs with LEDC
/// capability.
const DIGITAL_GPIOS: [u8; DIGITAL_PINS] = [44, 43, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18];

/// Lookup table from the board's header labels to GPIO numbers.
pub static BOARD_PIN_TABLE: PinTable = PinTable::new(ANALOG_GPIOS, DIGITAL_GPIOS);

// ---------------------------------------------------------------------------
// Default role assignments (used when the store is blank)
// ---------------------------------------------------------------------------

/// TMP36 output, header `A0`.
pub const DEFAULT_TEMP_SENSOR_GPIO: u8 = ANALOG_GPIOS[0];
/// "Show settings" push-button, header `D7`.
pub const DEFAULT_SETTINGS_BUTTON_GPIO: u8 = DIGITAL_GPIOS[7];
/// Light on/off push-button, header `D13`.
pub const DEFAULT_LED_BUTTON_GPIO: u8 = DIGITAL_GPIOS[13];
/// Red LED channel, header `D11~`.
pub const DEFAULT_RED_GPIO: u8 = DIGITAL_GPIOS[11];
/// Green LED channel, header `D10~`.
pub const DEFAULT_GREEN_GPIO: u8 = DIGITAL_GPIOS[10];
/// Blue LED channel, header `D9~`.
pub const DEFAULT_BLUE_GPIO: u8 = DIGITAL_GPIOS[9];

// ---------------------------------------------------------------------------
// UART (settings protocol shares the console UART)
// ---------------------------------------------------------------------------

pub const UART_PORT: i32 = 0;
pub const UART_BAUD: u32 = 9600;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC frequency for the RGB indicator (1 kHz).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// Pin names
// ---------------------------------------------------------------------------

/// Header bank of a pin label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBank {
    /// `A<n>`
    Analog,
    /// `D<n>` (optionally suffixed `~` on PWM-capable pins)
    Digital,
}

/// A header pin label as it appears on the wire, e.g. `A0` or `D10~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinName {
    pub bank: PinBank,
    pub number: u32,
    /// Whether the label carried the `~` PWM marker.  Informational only;
    /// the marker does not change the resolved pin.
    pub pwm_marker: bool,
}

/// Resolves header labels to GPIO numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTable {
    analog: [u8; ANALOG_PINS],
    digital: [u8; DIGITAL_PINS],
}

impl PinTable {
    pub const fn new(analog: [u8; ANALOG_PINS], digital: [u8; DIGITAL_PINS]) -> Self {
        Self { analog, digital }
    }

    /// GPIO for `name`, or `None` if the label is not on this header.
    pub fn resolve(&self, name: PinName) -> Option<u8> {
        let index = usize::try_from(name.number).ok()?;
        match name.bank {
            PinBank::Analog => self.analog.get(index).copied(),
            PinBank::Digital => self.digital.get(index).copied(),
        }
    }
}

/// ADC1 channel for an ESP32-S3 GPIO (GPIO 1–10 map to channels 0–9).
pub fn adc1_channel(gpio: u8) -> Option<u32> {
    match gpio {
        1..=10 => Some(u32::from(gpio) - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(bank: PinBank, number: u32) -> PinName {
        PinName {
            bank,
            number,
            pwm_marker: false,
        }
    }

    #[test]
    fn resolves_analog_and_digital_labels() {
        assert_eq!(BOARD_PIN_TABLE.resolve(pin(PinBank::Analog, 0)), Some(1));
        assert_eq!(BOARD_PIN_TABLE.resolve(pin(PinBank::Analog, 5)), Some(6));
        assert_eq!(BOARD_PIN_TABLE.resolve(pin(PinBank::Digital, 13)), Some(18));
    }

    #[test]
    fn pwm_marker_does_not_change_resolution() {
        let plain = pin(PinBank::Digital, 9);
        let marked = PinName {
            pwm_marker: true,
            ..plain
        };
        assert_eq!(BOARD_PIN_TABLE.resolve(plain), BOARD_PIN_TABLE.resolve(marked));
    }

    #[test]
    fn labels_off_the_header_are_rejected() {
        assert_eq!(BOARD_PIN_TABLE.resolve(pin(PinBank::Analog, 6)), None);
        assert_eq!(BOARD_PIN_TABLE.resolve(pin(PinBank::Digital, 14)), None);
        assert_eq!(BOARD_PIN_TABLE.resolve(pin(PinBank::Digital, u32::MAX)), None);
    }

    #[test]
    fn default_sensor_pin_is_on_adc1() {
        assert_eq!(adc1_channel(DEFAULT_TEMP_SENSOR_GPIO), Some(0));
        assert_eq!(adc1_channel(DEFAULT_RED_GPIO), None);
    }
}
