//! NVS (Non-Volatile Storage) adapter for the alarm configuration.
//!
//! Implements [`AlarmStorePort`] with a postcard-encoded blob under the
//! `vitaclock` namespace. ESP-IDF NVS commits are atomic per
//! `nvs_commit()`, which is what lets the core persist on every
//! mutation without torn-write handling. The non-espidf backend is a
//! plain in-memory blob for host runs and tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::alarm::AlarmConfig;
use crate::app::ports::AlarmStorePort;
use crate::error::StoreError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "vitaclock";
#[allow(dead_code)]
const KEY: &[u8] = b"alarm\0";
#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 64;

pub struct NvsAlarmStore {
    #[cfg(not(target_os = "espidf"))]
    blob: Option<Vec<u8>>,
}

impl NvsAlarmStore {
    /// Create the store and initialise NVS flash.
    ///
    /// On first boot or after an IDF version bump the partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StoreError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase run from the single
            // main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StoreError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StoreError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StoreError::IoError);
            }
            info!("NvsAlarmStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAlarmStore: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blob: None,
        })
    }

    /// Open the namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns = NAMESPACE.as_bytes();
        ns_buf[..ns.len()].copy_from_slice(ns);

        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(all(test, not(target_os = "espidf")))]
    fn inject_raw(&mut self, bytes: Vec<u8>) {
        self.blob = Some(bytes);
    }
}

impl AlarmStorePort for NvsAlarmStore {
    fn load(&self) -> Result<AlarmConfig, StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let bytes = self.blob.as_ref().ok_or(StoreError::NotFound)?;
            postcard::from_bytes(bytes).map_err(|_| StoreError::Corrupted)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_handle(false, |handle| {
                let mut size: usize = 0;
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        KEY.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        KEY.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    info!("NvsAlarmStore: loaded alarm ({} bytes)", bytes.len());
                    postcard::from_bytes(&bytes).map_err(|_| StoreError::Corrupted)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StoreError::NotFound),
                Err(e) => {
                    warn!("NvsAlarmStore: NVS read error {e}");
                    Err(StoreError::IoError)
                }
            }
        }
    }

    fn save(&mut self, config: &AlarmConfig) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(config).map_err(|_| StoreError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.blob = Some(bytes);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        KEY.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAlarmStore: alarm saved ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAlarmStore: NVS write error {e}");
                    Err(StoreError::IoError)
                }
            }
        }
    }
}
