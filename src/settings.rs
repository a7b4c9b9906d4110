//! User-facing device settings and their persistent-store image.
//!
//! The store holds a fixed 15-byte layout:
//!
//! ```text
//!  offset  0  1 │ 2  3 │ 4  5 │ 6     │ 7    │ 8 .. 13          │ 14
//!         blue  │green │ red  │ power │ lock │ pins (6 roles)   │ startup-show
//!        lo hi  │lo hi │lo hi │       │      │                  │
//! ```
//!
//! The store is the source of truth.  [`DeviceSettings`] is the in-memory
//! working copy; every change goes through [`PersistentStore::update`] so
//! unchanged bytes are never rewritten.

use crate::app::ports::PersistentStore;
use crate::pins;

/// Bytes in the settings image.
pub const STORE_LEN: usize = 15;

/// Store offsets.
pub mod offsets {
    pub const BLUE_LOW: usize = 0;
    pub const BLUE_HIGH: usize = 1;
    pub const GREEN_LOW: usize = 2;
    pub const GREEN_HIGH: usize = 3;
    pub const RED_LOW: usize = 4;
    pub const RED_HIGH: usize = 5;
    pub const POWER_ON: usize = 6;
    pub const LOCK: usize = 7;
    /// First of the six pin-role bytes (8–13), in [`PinRole`](super::PinRole) order.
    pub const PINS: usize = 8;
    pub const STARTUP_SHOW: usize = 14;
}

// ---------------------------------------------------------------------------
// LED bounds
// ---------------------------------------------------------------------------

/// One of the three indicator channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Blue,
    Green,
    Red,
}

impl Channel {
    pub const ALL: [Self; 3] = [Self::Blue, Self::Green, Self::Red];

    /// Offset of this channel's low byte; the high byte follows.
    pub const fn store_offset(self) -> usize {
        match self {
            Self::Blue => offsets::BLUE_LOW,
            Self::Green => offsets::GREEN_LOW,
            Self::Red => offsets::RED_LOW,
        }
    }
}

/// Temperature thresholds for one channel, in whole °C.
///
/// `low < high` by convention.  Inverted or equal bounds are stored as
/// given; the intensity mapper handles them without panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBounds {
    pub low: u8,
    pub high: u8,
}

impl ChannelBounds {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedBounds {
    pub blue: ChannelBounds,
    pub green: ChannelBounds,
    pub red: ChannelBounds,
}

impl LedBounds {
    pub const fn get(&self, channel: Channel) -> ChannelBounds {
        match channel {
            Channel::Blue => self.blue,
            Channel::Green => self.green,
            Channel::Red => self.red,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> &mut ChannelBounds {
        match channel {
            Channel::Blue => &mut self.blue,
            Channel::Green => &mut self.green,
            Channel::Red => &mut self.red,
        }
    }
}

impl Default for LedBounds {
    fn default() -> Self {
        Self {
            blue: ChannelBounds::new(0, 23),
            green: ChannelBounds::new(18, 31),
            red: ChannelBounds::new(25, 33),
        }
    }
}

// ---------------------------------------------------------------------------
// Pin assignments
// ---------------------------------------------------------------------------

/// Logical pin roles, in store order.  The discriminant is the wire channel
/// index used by `P` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    TempSensor = 0,
    SettingsButton = 1,
    LedButton = 2,
    Red = 3,
    Green = 4,
    Blue = 5,
}

impl PinRole {
    pub const ALL: [Self; 6] = [
        Self::TempSensor,
        Self::SettingsButton,
        Self::LedButton,
        Self::Red,
        Self::Green,
        Self::Blue,
    ];

    /// Role for a wire channel index (0–5).
    pub fn from_index(index: u32) -> Option<Self> {
        let index = usize::try_from(index).ok()?;
        Self::ALL.get(index).copied()
    }

    pub const fn store_offset(self) -> usize {
        offsets::PINS + self as usize
    }
}

/// GPIO number for each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignments {
    pub temp_sensor: u8,
    pub settings_button: u8,
    pub led_button: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl PinAssignments {
    pub const fn get(&self, role: PinRole) -> u8 {
        match role {
            PinRole::TempSensor => self.temp_sensor,
            PinRole::SettingsButton => self.settings_button,
            PinRole::LedButton => self.led_button,
            PinRole::Red => self.red,
            PinRole::Green => self.green,
            PinRole::Blue => self.blue,
        }
    }

    pub fn set(&mut self, role: PinRole, gpio: u8) {
        let slot = match role {
            PinRole::TempSensor => &mut self.temp_sensor,
            PinRole::SettingsButton => &mut self.settings_button,
            PinRole::LedButton => &mut self.led_button,
            PinRole::Red => &mut self.red,
            PinRole::Green => &mut self.green,
            PinRole::Blue => &mut self.blue,
        };
        *slot = gpio;
    }
}

impl Default for PinAssignments {
    fn default() -> Self {
        Self {
            temp_sensor: pins::DEFAULT_TEMP_SENSOR_GPIO,
            settings_button: pins::DEFAULT_SETTINGS_BUTTON_GPIO,
            led_button: pins::DEFAULT_LED_BUTTON_GPIO,
            red: pins::DEFAULT_RED_GPIO,
            green: pins::DEFAULT_GREEN_GPIO,
            blue: pins::DEFAULT_BLUE_GPIO,
        }
    }
}

// ---------------------------------------------------------------------------
// Device settings
// ---------------------------------------------------------------------------

/// Everything the user can change over the settings protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    pub bounds: LedBounds,
    /// Indicator light on.
    pub power_on: bool,
    /// Ignore both buttons.
    pub lock: bool,
    /// Show the settings view once at boot.
    pub startup_show_settings: bool,
    pub pins: PinAssignments,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            bounds: LedBounds::default(),
            power_on: true,
            lock: false,
            startup_show_settings: false,
            pins: PinAssignments::default(),
        }
    }
}

impl DeviceSettings {
    /// Decode a settings image.  Flags are true for any non-zero byte.
    pub fn from_image(image: &[u8; STORE_LEN]) -> Self {
        let mut settings = Self::default();
        for (offset, &value) in image.iter().enumerate() {
            settings.apply_byte(offset, value);
        }
        settings
    }

    pub fn to_image(&self) -> [u8; STORE_LEN] {
        let mut image = [0u8; STORE_LEN];
        for (offset, slot) in image.iter_mut().enumerate() {
            // every offset below STORE_LEN is mapped
            *slot = self.byte(offset).unwrap_or(0);
        }
        image
    }

    /// Read the settings image from `store`.
    pub fn load(store: &impl PersistentStore) -> Self {
        let mut image = [0u8; STORE_LEN];
        for (offset, slot) in image.iter_mut().enumerate() {
            *slot = store.read(offset);
        }
        Self::from_image(&image)
    }

    /// Boot-time load.  An erased store (every byte `0xFF`) is initialised
    /// with [`DeviceSettings::default`] first.
    pub fn load_or_init(store: &mut impl PersistentStore) -> Self {
        if is_blank(store) {
            log::info!("settings: store is blank, writing defaults");
            let settings = Self::default();
            settings.persist(store);
            return settings;
        }
        Self::load(store)
    }

    /// Write every byte through `update`.  Returns how many bytes changed.
    pub fn persist(&self, store: &mut impl PersistentStore) -> usize {
        self.to_image()
            .iter()
            .enumerate()
            .filter(|&(offset, &value)| store.update(offset, value))
            .count()
    }

    /// In-memory value of the byte at `offset`.
    pub fn byte(&self, offset: usize) -> Option<u8> {
        let value = match offset {
            offsets::BLUE_LOW..=offsets::RED_HIGH => {
                let bounds = self.bounds.get(Channel::ALL[offset / 2]);
                if offset % 2 == 0 { bounds.low } else { bounds.high }
            }
            offsets::POWER_ON => u8::from(self.power_on),
            offsets::LOCK => u8::from(self.lock),
            offsets::STARTUP_SHOW => u8::from(self.startup_show_settings),
            _ => {
                let role = PinRole::ALL.get(offset.checked_sub(offsets::PINS)?)?;
                self.pins.get(*role)
            }
        };
        Some(value)
    }

    /// Update the in-memory field at `offset`.  Unknown offsets are ignored.
    pub fn apply_byte(&mut self, offset: usize, value: u8) {
        match offset {
            offsets::BLUE_LOW..=offsets::RED_HIGH => {
                let bounds = self.bounds.get_mut(Channel::ALL[offset / 2]);
                if offset % 2 == 0 {
                    bounds.low = value;
                } else {
                    bounds.high = value;
                }
            }
            offsets::POWER_ON => self.power_on = value != 0,
            offsets::LOCK => self.lock = value != 0,
            offsets::STARTUP_SHOW => self.startup_show_settings = value != 0,
            _ => {
                if let Some(role) = offset
                    .checked_sub(offsets::PINS)
                    .and_then(|i| PinRole::ALL.get(i))
                {
                    self.pins.set(*role, value);
                }
            }
        }
    }

    /// Store `value` at `offset` (only if it differs) and mirror it in
    /// memory.  Returns whether the store was written.
    pub fn commit_byte(&mut self, store: &mut impl PersistentStore, offset: usize, value: u8) -> bool {
        self.apply_byte(offset, value);
        store.update(offset, value)
    }
}

/// Whether every settings byte in `store` reads as erased flash.
pub fn is_blank(store: &impl PersistentStore) -> bool {
    (0..STORE_LEN).all(|offset| store.read(offset) == 0xFF)
}

/// Fixed-size in-memory store.  Used on the host in place of NVS and in
/// tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    bytes: [u8; STORE_LEN],
    writes: usize,
}

impl MemoryStore {
    /// An erased store.
    pub const fn blank() -> Self {
        Self {
            bytes: [0xFF; STORE_LEN],
            writes: 0,
        }
    }

    pub const fn from_image(bytes: [u8; STORE_LEN]) -> Self {
        Self { bytes, writes: 0 }
    }

    pub const fn image(&self) -> &[u8; STORE_LEN] {
        &self.bytes
    }

    /// Physical writes since creation.
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::blank()
    }
}

impl PersistentStore for MemoryStore {
    fn read(&self, offset: usize) -> u8 {
        self.bytes.get(offset).copied().unwrap_or(0xFF)
    }

    fn write(&mut self, offset: usize, value: u8) {
        if let Some(slot) = self.bytes.get_mut(offset) {
            *slot = value;
            self.writes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_image_layout() {
        let image = DeviceSettings::default().to_image();
        assert_eq!(&image[..8], &[0, 23, 18, 31, 25, 33, 1, 0]);
        assert_eq!(image[offsets::PINS], pins::DEFAULT_TEMP_SENSOR_GPIO);
        assert_eq!(image[13], pins::DEFAULT_BLUE_GPIO);
        assert_eq!(image[offsets::STARTUP_SHOW], 0);
    }

    #[test]
    fn image_roundtrip_preserves_every_field() {
        let mut s = DeviceSettings::default();
        s.bounds.green = ChannelBounds::new(5, 6);
        s.lock = true;
        s.power_on = false;
        s.startup_show_settings = true;
        s.pins.set(PinRole::Green, 9);
        assert_eq!(DeviceSettings::from_image(&s.to_image()), s);
    }

    #[test]
    fn blank_store_is_initialised_with_defaults() {
        let mut store = MemoryStore::blank();
        let s = DeviceSettings::load_or_init(&mut store);
        assert_eq!(s, DeviceSettings::default());
        assert_eq!(store.image(), &DeviceSettings::default().to_image());
        assert!(!is_blank(&store));
    }

    #[test]
    fn existing_store_is_loaded_as_is() {
        let mut image = DeviceSettings::default().to_image();
        image[offsets::RED_HIGH] = 40;
        image[offsets::LOCK] = 1;
        let mut store = MemoryStore::from_image(image);
        let s = DeviceSettings::load_or_init(&mut store);
        assert_eq!(s.bounds.red, ChannelBounds::new(25, 40));
        assert!(s.lock);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn persist_skips_unchanged_bytes() {
        let mut store = MemoryStore::blank();
        let mut s = DeviceSettings::default();
        assert_eq!(s.persist(&mut store), STORE_LEN);
        s.bounds.blue.high = 24;
        assert_eq!(s.persist(&mut store), 1);
        assert_eq!(store.writes(), STORE_LEN + 1);
    }

    #[test]
    fn commit_byte_mirrors_in_memory() {
        let mut store = MemoryStore::from_image(DeviceSettings::default().to_image());
        let mut s = DeviceSettings::default();
        assert!(s.commit_byte(&mut store, offsets::POWER_ON, 0));
        assert!(!s.power_on);
        assert!(!s.commit_byte(&mut store, offsets::POWER_ON, 0));
        assert!(s.commit_byte(&mut store, PinRole::Blue.store_offset(), 3));
        assert_eq!(s.pins.blue, 3);
        assert_eq!(store.read(13), 3);
    }

    #[test]
    fn out_of_range_offsets_are_ignored() {
        let mut s = DeviceSettings::default();
        s.apply_byte(STORE_LEN, 7);
        assert_eq!(s, DeviceSettings::default());
        assert_eq!(s.byte(STORE_LEN), None);
        assert_eq!(MemoryStore::blank().read(99), 0xFF);
    }

    #[test]
    fn pin_roles_map_to_offsets_8_through_13() {
        let offsets: Vec<usize> = PinRole::ALL.iter().map(|r| r.store_offset()).collect();
        assert_eq!(offsets, vec![8, 9, 10, 11, 12, 13]);
        assert_eq!(PinRole::from_index(3), Some(PinRole::Red));
        assert_eq!(PinRole::from_index(6), None);
    }
}
