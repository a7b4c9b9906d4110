//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`PersistentStore`] for Thermolight.
//!
//! - `SystemConfig` is a postcard blob under `thermo/syscfg`.
//! - The 15-byte settings image is a blob under `thermo/settings`,
//!   mirrored in RAM.  Each byte write rewrites the blob and commits.
//! - A missing settings blob reads as erased (`0xFF`), which the boot path
//!   treats as a blank store.
//!
//! The simulation backend keeps everything in memory (dev/test only).

use crate::app::ports::{ConfigError, ConfigPort, PersistentStore};
use crate::config::SystemConfig;
use crate::settings::STORE_LEN;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "thermo";
#[cfg(not(target_os = "espidf"))]
const CONFIG_KEY: &str = "syscfg";

#[cfg(target_os = "espidf")]
const CONFIG_KEY_C: &[u8] = b"syscfg\0";
#[cfg(target_os = "espidf")]
const SETTINGS_KEY_C: &[u8] = b"settings\0";
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    /// RAM mirror of the settings image.
    image: [u8; STORE_LEN],
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably.  On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32 {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK as i32 {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK as i32 {
                return Err(ConfigError::IoError);
            }

            let mut image = [0xFF; STORE_LEN];
            match Self::with_nvs_handle(false, |handle| {
                let mut size = STORE_LEN;
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        SETTINGS_KEY_C.as_ptr() as *const _,
                        image.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(size)
            }) {
                Ok(STORE_LEN) => info!("NvsAdapter: settings image loaded"),
                Ok(size) => {
                    warn!("NvsAdapter: settings image is {} bytes, treating as blank", size);
                    image = [0xFF; STORE_LEN];
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => info!("NvsAdapter: no settings image yet"),
                Err(e) => warn!("NvsAdapter: settings read error {}, treating as blank", e),
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
            Ok(Self { image })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsAdapter: simulation backend");
            Ok(Self {
                image: [0xFF; STORE_LEN],
                store: std::cell::RefCell::new(HashMap::new()),
            })
        }
    }

    /// Simulation backend pre-loaded with a settings image.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_image(image: [u8; STORE_LEN]) -> Self {
        Self {
            image,
            store: std::cell::RefCell::new(HashMap::new()),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(key: &str) -> String {
        format!("{}::{}", NAMESPACE, key)
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = NAMESPACE.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(key: &[u8], data: &[u8]) -> Result<(), i32> {
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            Ok(())
        })
    }
}

// ── Settings image ─────────────────────────────────────────────

impl PersistentStore for NvsAdapter {
    fn read(&self, offset: usize) -> u8 {
        self.image.get(offset).copied().unwrap_or(0xFF)
    }

    fn write(&mut self, offset: usize, value: u8) {
        let Some(slot) = self.image.get_mut(offset) else {
            return;
        };
        *slot = value;

        #[cfg(target_os = "espidf")]
        if let Err(e) = Self::write_blob(SETTINGS_KEY_C, &self.image) {
            warn!("NvsAdapter: settings write error {} at offset {}", e, offset);
        }
    }
}

// ── System config ──────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_KEY);
            if let Some(bytes) = self.store.borrow().get(&key) {
                let cfg: SystemConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate().map_err(ConfigError::ValidationFailed)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(false, |handle| {
                let mut size: usize = 0;

                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        CONFIG_KEY_C.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret != ESP_OK as i32 || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        CONFIG_KEY_C.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    cfg.validate().map_err(ConfigError::ValidationFailed)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(SystemConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(CONFIG_KEY), bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            match Self::write_blob(CONFIG_KEY_C, &bytes) {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrema::RotationClock;
    use crate::settings::{DeviceSettings, is_blank};

    #[test]
    fn fresh_store_is_blank() {
        let nvs = NvsAdapter::new().unwrap();
        assert!(is_blank(&nvs));
        assert_eq!(nvs.read(STORE_LEN + 3), 0xFF);
    }

    #[test]
    fn settings_bytes_persist_through_update() {
        let mut nvs = NvsAdapter::new().unwrap();
        let settings = DeviceSettings::load_or_init(&mut nvs);
        assert_eq!(DeviceSettings::load(&nvs), settings);
        assert!(!nvs.update(0, settings.bounds.blue.low));
        assert!(nvs.update(0, 7));
        assert_eq!(nvs.read(0), 7);
    }

    #[test]
    fn config_roundtrip() {
        let nvs = NvsAdapter::new().unwrap();
        assert_eq!(nvs.load().unwrap(), SystemConfig::default());
        let cfg = SystemConfig {
            rotation_clock: RotationClock::FreeRunning,
            telemetry_interval_ticks: 10,
            ..SystemConfig::default()
        };
        nvs.save(&cfg).unwrap();
        assert_eq!(nvs.load().unwrap(), cfg);
    }

    #[test]
    fn invalid_config_is_not_saved() {
        let nvs = NvsAdapter::new().unwrap();
        let cfg = SystemConfig {
            button_debounce_ms: 0,
            ..SystemConfig::default()
        };
        assert_eq!(
            nvs.save(&cfg),
            Err(ConfigError::ValidationFailed("button_debounce_ms must be 5–500"))
        );
        assert_eq!(nvs.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn stored_config_out_of_range_is_rejected_on_load() {
        let nvs = NvsAdapter::new().unwrap();
        let cfg = SystemConfig {
            tick_interval_ms: 0,
            ..SystemConfig::default()
        };
        let bytes = postcard::to_allocvec(&cfg).unwrap();
        nvs.store
            .borrow_mut()
            .insert(NvsAdapter::composite_key(CONFIG_KEY), bytes);

        assert_eq!(
            nvs.load(),
            Err(ConfigError::ValidationFailed("tick_interval_ms must be 100–10000"))
        );
    }
}
