//! Integration tests for the AppService tick pipeline: sensor → tracker →
//! indicator, button commands, display frames and telemetry.

use super::mock_hw::{MockHardware, MockSerial, RecordingDisplay, RecordingSink};

use thermolight::app::commands::AppCommand;
use thermolight::app::events::AppEvent;
use thermolight::app::ports::PersistentStore;
use thermolight::app::service::AppService;
use thermolight::config::SystemConfig;
use thermolight::display::{DisplayFrame, ExtremeCategory};
use thermolight::extrema::Polarity;
use thermolight::settings::{DeviceSettings, MemoryStore, offsets};

struct Rig {
    app: AppService,
    hw: MockHardware,
    serial: MockSerial,
    store: MemoryStore,
    lcd: RecordingDisplay,
    sink: RecordingSink,
}

impl Rig {
    fn with(config: SystemConfig, settings: DeviceSettings, temp: f32) -> Self {
        let store = MemoryStore::from_image(settings.to_image());
        let mut rig = Self {
            app: AppService::new(config, settings),
            hw: MockHardware::new(temp),
            serial: MockSerial::new(),
            store,
            lcd: RecordingDisplay::new(),
            sink: RecordingSink::new(),
        };
        rig.app.start(&mut rig.sink);
        rig
    }

    fn new(temp: f32) -> Self {
        Self::with(SystemConfig::default(), DeviceSettings::default(), temp)
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

    fn command(&mut self, cmd: AppCommand) {
        self.app.handle_command(cmd, &mut self.store, &mut self.sink);
    }
}

// ── Indicator ─────────────────────────────────────────────────

#[test]
fn start_emits_started_event() {
    let rig = Rig::new(20.0);
    assert!(matches!(rig.sink.events.first(), Some(AppEvent::Started)));
    assert!(!rig.app.is_showing_settings());
}

#[test]
fn tick_drives_indicator_from_sample() {
    let mut rig = Rig::new(20.0);
    rig.tick();
    // red 25–33 off, green 18–31 → 190*2/13, blue 0–23 → 255*20/23
    assert_eq!(rig.hw.last_rgb(), Some([0, 29, 221]));
    assert_eq!(rig.app.rgb(), [0, 29, 221]);
    assert_eq!(rig.app.tick_count(), 1);
}

#[test]
fn hot_sample_saturates_red() {
    let mut rig = Rig::new(35.0);
    rig.tick();
    let [r, g, b] = rig.hw.last_rgb().unwrap();
    assert_eq!(r, 255);
    assert_eq!(g, 0);
    assert_eq!(b, 0);
}

#[test]
fn sensor_fault_skips_indicator_but_still_ticks() {
    let mut rig = Rig::new(20.0);
    rig.hw.push_fault();
    rig.tick();

    assert!(rig.hw.rgb_calls.is_empty());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SensorFault(_))), 1);
    assert_eq!(rig.lcd.frames.len(), 1);
    assert_eq!(rig.app.tick_count(), 1);
    assert_eq!(rig.app.tracker().all_time_high(), None);

    rig.tick();
    assert_eq!(rig.hw.last_rgb(), Some([0, 29, 221]));
}

// ── Extremum tracking ─────────────────────────────────────────

#[test]
fn rotation_clock_keeps_running_through_sensor_faults() {
    let mut rig = Rig::new(20.0);
    rig.hw.push_sample(20.0);
    rig.hw.push_fault();
    rig.hw.push_fault();
    for _ in 0..3 {
        rig.tick();
    }
    assert_eq!(rig.app.tracker().record(Polarity::High).age_ticks, 3);
}

#[test]
fn extremes_follow_sample_stream() {
    let mut rig = Rig::new(20.0);
    for t in [20.0, 25.0, 15.0, 22.0] {
        rig.hw.push_sample(t);
        rig.tick();
    }
    let tracker = rig.app.tracker();
    assert_eq!(tracker.all_time_high(), Some(25.0));
    assert_eq!(tracker.all_time_low(), Some(15.0));
    assert_eq!(tracker.hourly_high(), Some(25.0));
    assert_eq!(tracker.hourly_low(), Some(15.0));
}

#[test]
fn status_frame_shows_current_sample_and_all_time_high_first() {
    let mut rig = Rig::new(21.5);
    rig.tick();
    match rig.lcd.last() {
        Some(DisplayFrame::Status {
            temperature,
            category,
            extreme,
            ..
        }) => {
            assert_eq!(*temperature, 21.5);
            assert_eq!(*category, ExtremeCategory::AllTimeHigh);
            assert_eq!(*extreme, Some(21.5));
        }
        other => panic!("expected status frame, got {:?}", other),
    }
}

// ── Buttons ───────────────────────────────────────────────────

#[test]
fn light_toggle_persists_and_blanks_indicator() {
    let mut rig = Rig::new(20.0);
    rig.command(AppCommand::ToggleLight);

    assert_eq!(rig.store.read(offsets::POWER_ON), 0);
    assert!(!rig.app.settings().power_on);
    assert!(matches!(
        rig.sink.events.last(),
        Some(AppEvent::LightToggled { on: false })
    ));

    rig.tick();
    assert_eq!(rig.hw.last_rgb(), Some([0, 0, 0]));

    rig.command(AppCommand::ToggleLight);
    assert_eq!(rig.store.read(offsets::POWER_ON), 1);
    rig.tick();
    assert_eq!(rig.hw.last_rgb(), Some([0, 29, 221]));
}

#[test]
fn lock_ignores_both_buttons() {
    let settings = DeviceSettings {
        lock: true,
        ..DeviceSettings::default()
    };
    let mut rig = Rig::with(SystemConfig::default(), settings, 20.0);
    let writes = rig.store.writes();

    rig.command(AppCommand::ToggleLight);
    rig.command(AppCommand::ShowSettings);

    assert!(rig.app.settings().power_on);
    assert!(!rig.app.is_showing_settings());
    assert_eq!(rig.store.writes(), writes);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Locked)), 2);
}

#[test]
fn show_settings_holds_view_for_configured_ticks() {
    let config = SystemConfig {
        tick_interval_ms: 1000,
        settings_view_secs: 3,
        ..SystemConfig::default()
    };
    let mut rig = Rig::with(config, DeviceSettings::default(), 20.0);
    rig.command(AppCommand::ShowSettings);
    assert!(rig.app.is_showing_settings());

    for _ in 0..4 {
        rig.tick();
    }
    let kinds: Vec<bool> = rig
        .lcd
        .frames
        .iter()
        .map(|f| matches!(f, DisplayFrame::Settings { .. }))
        .collect();
    assert_eq!(kinds, [true, true, true, false]);
    assert!(!rig.app.is_showing_settings());
}

#[test]
fn startup_flag_opens_settings_view_at_boot() {
    let settings = DeviceSettings {
        startup_show_settings: true,
        ..DeviceSettings::default()
    };
    let mut rig = Rig::with(SystemConfig::default(), settings, 20.0);
    assert!(rig.app.is_showing_settings());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SettingsShown)), 1);
    rig.tick();
    assert!(matches!(rig.lcd.last(), Some(DisplayFrame::Settings { .. })));
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_emitted_every_interval() {
    let config = SystemConfig {
        telemetry_interval_ticks: 3,
        ..SystemConfig::default()
    };
    let mut rig = Rig::with(config, DeviceSettings::default(), 20.0);
    for _ in 0..7 {
        rig.tick();
    }
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 2);

    let t = rig.app.build_telemetry();
    assert_eq!(t.uptime_secs, 7);
    assert_eq!(t.rgb, [0, 29, 221]);
    assert_eq!(t.all_time_high_c, Some(20.0));
    assert!(t.power_on);
}

#[test]
fn telemetry_serialises_to_json() {
    let mut rig = Rig::new(20.0);
    rig.tick();
    let json = serde_json::to_string(&rig.app.build_telemetry()).unwrap();
    assert!(json.contains("\"temperature_c\":20.0"));
    assert!(json.contains("\"all_time_low_c\":null"));
    assert!(json.contains("\"protocol\":{\"applied\":0"));
}
