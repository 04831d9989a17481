//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`PreferencePort`] and [`ConfigPort`] for the pH probe.
//!
//! - Preference slots are stored as postcard blobs under `slot<N>` in the
//!   `phprobe` namespace.
//! - The probe configuration is a single postcard blob, range-checked
//!   before it is written.
//! - ESP-IDF NVS commits are atomic per `nvs_commit()`; the simulation
//!   backend is an in-memory map (dev/test only).

use crate::app::ports::{ConfigError, ConfigPort, PreferencePort, SlotId, StorageError};
use crate::config::ProbeConfig;
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "phprobe";
const CONFIG_KEY: &str = "probecfg";

/// Largest blob accepted from flash.
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsAdapter {
    /// False when flash could not be initialised: every read misses and
    /// every write fails, so the firmware runs on defaults.
    persistent: bool,
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK as esp_err_t {
                    return Err(StorageError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK as esp_err_t {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK as esp_err_t {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            persistent: true,
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// An adapter with no backing storage, used when [`NvsAdapter::new`]
    /// fails.  Calibration and config stay in memory for this boot only.
    pub fn degraded() -> Self {
        warn!("NvsAdapter: running without persistence");
        Self {
            persistent: false,
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn slot_key(slot: SlotId) -> String {
        format!("slot{}", slot.0)
    }

    // ── Raw blob access ───────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.persistent {
            return Ok(None);
        }
        let composite = format!("{}::{}", NAMESPACE, key);
        Ok(self.store.borrow().get(&composite).cloned())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if !self.persistent {
            return Err(StorageError::IoError);
        }
        let composite = format!("{}::{}", NAMESPACE, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.persistent {
            return Ok(None);
        }
        let key_buf = Self::c_key(key);
        let result = Self::with_nvs_handle(false, |handle| {
            // First call: get size
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH as esp_err_t);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(buf)
        });

        match result {
            Ok(buf) => Ok(Some(buf)),
            // A namespace that was never written cannot be opened read-only.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND as esp_err_t => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH as esp_err_t => Err(StorageError::Corrupted),
            Err(e) => {
                warn!("NvsAdapter: read '{}' failed ({})", key, e);
                Err(StorageError::IoError)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if !self.persistent {
            return Err(StorageError::IoError);
        }
        let key_buf = Self::c_key(key);
        let result = Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t => Err(StorageError::Full),
            Err(e) => {
                warn!("NvsAdapter: write '{}' failed ({})", key, e);
                Err(StorageError::IoError)
            }
        }
    }

    /// NUL-terminated NVS key (max 15 chars).
    #[cfg(target_os = "espidf")]
    fn c_key(key: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let kb = key.as_bytes();
        let len = kb.len().min(15);
        buf[..len].copy_from_slice(&kb[..len]);
        buf
    }

    /// Open the probe namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, esp_err_t>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    {
        let ns_buf = Self::c_key(NAMESPACE);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as esp_err_t {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl PreferencePort for NvsAdapter {
    fn load<T: DeserializeOwned>(&self, slot: SlotId) -> Result<Option<T>, StorageError> {
        match self.read_blob(&Self::slot_key(slot))? {
            Some(bytes) => postcard::from_bytes(&bytes)
                .map(Some)
                .map_err(|_| StorageError::Corrupted),
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&mut self, slot: SlotId, value: &T) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(value).map_err(|_| StorageError::IoError)?;
        self.write_blob(&Self::slot_key(slot), &bytes)
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<ProbeConfig, ConfigError> {
        match self.read_blob(CONFIG_KEY) {
            Ok(Some(bytes)) => {
                let cfg: ProbeConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Ok(None) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(ProbeConfig::default())
            }
            Err(StorageError::Corrupted) => Err(ConfigError::Corrupted),
            Err(_) => Err(ConfigError::IoError),
        }
    }

    fn save(&self, config: &ProbeConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write_blob(CONFIG_KEY, &bytes)
            .map_err(|_| ConfigError::IoError)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
