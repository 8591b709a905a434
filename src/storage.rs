//! Enabled/pinned flags in localStorage.

use hoverzoom_core::config::{ConfigError, PersistedFlags};
use hoverzoom_core::constants::STORAGE_KEY;
use web_sys::Storage;

fn local_storage() -> Result<Storage, ConfigError> {
    let window = web_sys::window()
        .ok_or_else(|| ConfigError::StorageError("No window object available".to_string()))?;
    window
        .local_storage()
        .map_err(|e| ConfigError::StorageError(format!("localStorage access error: {:?}", e)))?
        .ok_or_else(|| ConfigError::StorageError("localStorage not available".to_string()))
}

/// Stored flags, or the defaults when nothing usable is stored.
pub fn load_flags() -> PersistedFlags {
    let stored = match local_storage() {
        Ok(storage) => match storage.get_item(STORAGE_KEY) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read from localStorage: {:?}", e);
                None
            }
        },
        Err(e) => {
            log::debug!("{}", e);
            None
        }
    };
    PersistedFlags::from_json_or_default(stored.as_deref())
}

pub fn save_flags(flags: &PersistedFlags) -> Result<(), ConfigError> {
    let json = flags.to_json()?;
    local_storage()?
        .set_item(STORAGE_KEY, &json)
        .map_err(|e| ConfigError::StorageError(format!("Failed to save to localStorage: {:?}", e)))?;
    log::debug!("Saved flags {:?}", flags);
    Ok(())
}
