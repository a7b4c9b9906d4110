//! Thermolight Firmware: Main Entry Point
//!
//! Hexagonal architecture with a fixed-rate control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter     UartSource    │
//! │  (Sensor+Actuator) (EventSink)    (Config+Store) (ByteSource)  │
//! │  LogDisplay        ButtonDriver × 2                            │
//! │  (DisplaySink)     (AppCommand)                                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Extremum tracker · Intensity map · Settings engine    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Result, anyhow};
use log::{error, info, warn};

use thermolight::adapters::hardware::HardwareAdapter;
use thermolight::adapters::log_sink::{LogDisplay, LogEventSink};
use thermolight::adapters::nvs::NvsAdapter;
use thermolight::adapters::serial::UartSource;
use thermolight::adapters::time::Esp32TimeAdapter;
use thermolight::app::commands::AppCommand;
use thermolight::app::ports::ConfigPort;
use thermolight::app::service::AppService;
use thermolight::config::SystemConfig;
use thermolight::drivers::button::{ButtonDriver, ButtonEvent, LIGHT_BUTTON, SETTINGS_BUTTON};
use thermolight::drivers::hw_init;
use thermolight::pins;
use thermolight::settings::DeviceSettings;

/// Button sampling period between control ticks.
const BUTTON_POLL: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Thermolight v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Persistent store + config ──────────────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    let settings = DeviceSettings::load_or_init(&mut nvs);

    // ── 3. Peripherals (pins as stored at boot) ───────────────
    let mut assign = settings.pins;
    if pins::adc1_channel(assign.temp_sensor).is_none() {
        warn!(
            "stored sensor pin GPIO {} is not analog, using GPIO {}",
            assign.temp_sensor,
            pins::DEFAULT_TEMP_SENSOR_GPIO
        );
        assign.temp_sensor = pins::DEFAULT_TEMP_SENSOR_GPIO;
    }
    // Without peripherals there is nothing to run.
    let mut hw = HardwareAdapter::init(&assign).map_err(|e| {
        error!("hardware init failed: {}, halting", e);
        anyhow!("{}", e)
    })?;
    if let Err(e) = hw_init::init_isr_service(&[
        (assign.settings_button, &SETTINGS_BUTTON),
        (assign.led_button, &LIGHT_BUTTON),
    ]) {
        error!("ISR service init failed: {}, continuing without buttons", e);
    }

    // ── 4. Adapters ───────────────────────────────────────────
    let mut uart = UartSource::new(pins::UART_PORT);
    let mut lcd = LogDisplay::new();
    let mut log_sink = LogEventSink::new();
    let clock = Esp32TimeAdapter::new();

    let mut settings_button = ButtonDriver::new(
        &SETTINGS_BUTTON,
        i32::from(assign.settings_button),
        config.button_debounce_ms,
    );
    let mut light_button = ButtonDriver::new(
        &LIGHT_BUTTON,
        i32::from(assign.led_button),
        config.button_debounce_ms,
    );

    // ── 5. App service ────────────────────────────────────────
    let tick_ms = config.tick_interval_ms;
    let mut app = AppService::new(config, settings);
    app.start(&mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    let mut next_tick_ms = clock.now_ms();
    loop {
        let now_ms = clock.now_ms();
        if let Some(ButtonEvent::Pressed) = settings_button.tick(now_ms) {
            app.handle_command(AppCommand::ShowSettings, &mut nvs, &mut log_sink);
        }
        if let Some(ButtonEvent::Pressed) = light_button.tick(now_ms) {
            app.handle_command(AppCommand::ToggleLight, &mut nvs, &mut log_sink);
        }

        // Wrapping-safe "now >= next_tick".
        if now_ms.wrapping_sub(next_tick_ms) < u32::MAX / 2 {
            app.tick(&mut hw, &mut uart, &mut nvs, &mut lcd, &mut log_sink);
            next_tick_ms = next_tick_ms.wrapping_add(tick_ms);
        }

        std::thread::sleep(BUTTON_POLL);
    }
}
