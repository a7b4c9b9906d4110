//! Settings protocol driven through the full tick loop: bytes arrive on the
//! serial port, get committed to the store and change the indicator.

use super::mock_hw::{MockHardware, MockSerial, RecordingDisplay, RecordingSink};

use thermolight::app::events::AppEvent;
use thermolight::app::ports::PersistentStore;
use thermolight::app::service::AppService;
use thermolight::config::SystemConfig;
use thermolight::settings::{ChannelBounds, DeviceSettings, MemoryStore, PinRole, STORE_LEN, offsets};

struct Rig {
    app: AppService,
    hw: MockHardware,
    serial: MockSerial,
    store: MemoryStore,
    lcd: RecordingDisplay,
    sink: RecordingSink,
}

impl Rig {
    fn new(temp: f32) -> Self {
        let mut store = MemoryStore::blank();
        let settings = DeviceSettings::load_or_init(&mut store);
        let mut rig = Self {
            app: AppService::new(SystemConfig::default(), settings),
            hw: MockHardware::new(temp),
            serial: MockSerial::new(),
            store,
            lcd: RecordingDisplay::new(),
            sink: RecordingSink::new(),
        };
        rig.app.start(&mut rig.sink);
        rig
    }

    fn tick(&mut self) {
        self.app.tick(
            &mut self.hw,
            &mut self.serial,
            &mut self.store,
            &mut self.lcd,
            &mut self.sink,
        );
    }

    fn applied(&self) -> usize {
        self.sink.count(|e| matches!(e, AppEvent::SettingsApplied))
    }
}

#[test]
fn blank_store_boots_with_defaults() {
    let rig = Rig::new(20.0);
    assert_eq!(*rig.app.settings(), DeviceSettings::default());
    assert_eq!(rig.store.image(), &DeviceSettings::default().to_image());
    assert_eq!(rig.store.writes(), STORE_LEN);
}

#[test]
fn new_bounds_take_effect_on_next_tick() {
    let mut rig = Rig::new(20.0);
    rig.serial.send(b"SL|0|40|;");
    rig.tick();

    // The sample was mapped before the message was read.
    assert_eq!(rig.hw.last_rgb(), Some([0, 29, 221]));
    assert_eq!(rig.applied(), 1);
    assert_eq!(rig.store.read(offsets::BLUE_HIGH), 40);
    assert_eq!(rig.app.settings().bounds.blue, ChannelBounds::new(0, 40));

    rig.tick();
    // 255 * 20 / 40
    assert_eq!(rig.hw.last_rgb(), Some([0, 29, 127]));
}

#[test]
fn message_split_across_ticks_is_applied_once() {
    let mut rig = Rig::new(20.0);
    rig.serial.send(b"SL|0|23|M|10");
    rig.tick();
    assert_eq!(rig.applied(), 0);
    assert_eq!(rig.store.read(offsets::GREEN_LOW), 18);

    rig.serial.send(b"|30|;");
    rig.tick();
    assert_eq!(rig.applied(), 1);
    assert_eq!(rig.store.read(offsets::GREEN_LOW), 10);
    assert_eq!(rig.store.read(offsets::GREEN_HIGH), 30);
    assert_eq!(rig.app.protocol_stats().applied, 1);
}

#[test]
fn rejected_message_leaves_store_untouched() {
    let mut rig = Rig::new(20.0);
    let before = *rig.store.image();
    let writes = rig.store.writes();

    rig.serial.send(b"SL|1|2|M|300|4|;");
    rig.tick();

    assert_eq!(rig.applied(), 0);
    assert_eq!(rig.store.image(), &before);
    assert_eq!(rig.store.writes(), writes);
    assert_eq!(rig.app.protocol_stats().rejected, 1);
}

#[test]
fn power_field_over_serial_turns_light_off_and_locks() {
    let mut rig = Rig::new(20.0);
    rig.serial.send(b"SL|0|23|M|18|31|H|25|33|P|0|1|;");
    rig.tick();
    rig.tick();

    assert_eq!(rig.hw.last_rgb(), Some([0, 0, 0]));
    assert!(rig.app.settings().lock);
    assert_eq!(rig.store.read(offsets::POWER_ON), 0);
    assert_eq!(rig.store.read(offsets::LOCK), 1);
}

#[test]
fn pin_remap_is_stored_but_not_live() {
    let mut rig = Rig::new(20.0);
    rig.serial.send(b"PD8|3|;");
    rig.tick();

    assert_eq!(rig.applied(), 1);
    assert_eq!(rig.store.read(PinRole::Red.store_offset()), 13);
    assert_eq!(rig.app.settings().pins.red, 13);
    // Indicator output is unaffected within this boot.
    rig.tick();
    assert_eq!(rig.hw.last_rgb(), Some([0, 29, 221]));
}

#[test]
fn garbage_is_flushed_then_protocol_recovers() {
    let mut rig = Rig::new(20.0);
    rig.serial.send(b"hello;SL|5|6|;");
    rig.tick();
    assert_eq!(rig.applied(), 0);
    assert_eq!(rig.serial.pending(), 0);
    assert_eq!(rig.app.protocol_stats().flushed, 1);

    rig.serial.send(b"SL|5|6|;");
    rig.tick();
    assert_eq!(rig.applied(), 1);
    assert_eq!(rig.app.settings().bounds.blue, ChannelBounds::new(5, 6));
}

#[test]
fn settings_survive_a_reboot() {
    let mut rig = Rig::new(20.0);
    rig.serial.send(b"SL|2|24|M|16|29|H|27|35|P|1|11|;");
    rig.tick();

    let mut store = MemoryStore::from_image(*rig.store.image());
    let reloaded = DeviceSettings::load_or_init(&mut store);
    assert_eq!(reloaded, *rig.app.settings());
    assert_eq!(reloaded.bounds.red, ChannelBounds::new(27, 35));
    assert!(reloaded.startup_show_settings);
    assert_eq!(store.writes(), 0);
}
