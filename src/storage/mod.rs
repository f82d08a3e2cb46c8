//! Save persistence
//!
//! Saves go through [`SaveStore`], a narrow synchronous key-value
//! interface modeled on the browser's localStorage. Slot logic sits on
//! top: ten numbered slots plus a reserved autosave slot, each holding one
//! JSON-serialized [`SaveRecord`]. A failed read or parse leaves the
//! in-memory state untouched; the caller decides what to tell the player.

use crate::state::GameState;
use crate::types::save::{SavePreview, SaveRecord};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Slot 0 is reserved for the autosave.
pub const AUTOSAVE_SLOT: u8 = 0;
/// Numbered slots run 1..=SLOT_COUNT.
pub const SLOT_COUNT: u8 = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("save I/O error: {message}")]
    Io { message: String },

    #[error("save data error: {message}")]
    Serialization { message: String },

    #[error("no save in slot {slot}")]
    MissingSlot { slot: u8 },

    #[error("slot {slot} is out of range (0-{SLOT_COUNT})")]
    InvalidSlot { slot: u8 },
}

/// The persistence boundary: a synchronous string key-value store
pub trait SaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and headless runs
#[derive(Debug, Default)]
pub struct MemorySaveStore {
    entries: HashMap<String, String>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemorySaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one file per key
#[derive(Debug)]
pub struct DirSaveStore {
    base_path: PathBuf,
}

impl DirSaveStore {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> anyhow::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{key}.json"))
    }
}

impl SaveStore for DirSaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io {
                message: e.to_string(),
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.path_for(key), value).map_err(|e| StoreError::Io {
            message: e.to_string(),
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io {
                message: e.to_string(),
            }),
        }
    }
}

pub fn slot_key(slot: u8) -> String {
    if slot == AUTOSAVE_SLOT {
        "save_auto".to_string()
    } else {
        format!("save_slot_{slot}")
    }
}

fn check_slot(slot: u8) -> Result<(), StoreError> {
    if slot > SLOT_COUNT {
        return Err(StoreError::InvalidSlot { slot });
    }
    Ok(())
}

pub fn save_to_slot(
    store: &mut dyn SaveStore,
    record: &SaveRecord,
    slot: u8,
) -> Result<(), StoreError> {
    check_slot(slot)?;
    let json = serde_json::to_string_pretty(record).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })?;
    store.write(&slot_key(slot), &json)
}

pub fn load_slot(store: &dyn SaveStore, slot: u8) -> Result<SaveRecord, StoreError> {
    check_slot(slot)?;
    let json = store
        .read(&slot_key(slot))?
        .ok_or(StoreError::MissingSlot { slot })?;
    serde_json::from_str(&json).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

pub fn delete_slot(store: &mut dyn SaveStore, slot: u8) -> Result<(), StoreError> {
    check_slot(slot)?;
    store.remove(&slot_key(slot))
}

/// Slot number and preview for every occupied slot, autosave first.
pub fn list_slots(store: &dyn SaveStore) -> Vec<(u8, SavePreview)> {
    (0..=SLOT_COUNT)
        .filter_map(|slot| match load_slot(store, slot) {
            Ok(record) => Some((slot, record.preview)),
            Err(StoreError::MissingSlot { .. }) => None,
            Err(e) => {
                log::warn!("skipping unreadable save slot {slot}: {e}");
                None
            }
        })
        .collect()
}

/// Build a save record with its preview from the current state.
pub fn make_record(
    state: &GameState,
    chapter_title: &str,
    content_hash: &str,
    timestamp_secs: u64,
) -> SaveRecord {
    SaveRecord {
        chapter: state.chapter,
        scene: state.scene.clone(),
        playtime_ms: state.playtime_ms,
        timestamp: timestamp_secs,
        content_hash: content_hash.to_string(),
        state: state.clone(),
        preview: SavePreview {
            chapter_text: format!("Chapter {}", state.chapter),
            chapter_title: chapter_title.to_string(),
            date_text: format_date(timestamp_secs),
            playtime_text: format_playtime(state.playtime_ms),
        },
    }
}

/// "H:MM:SS" elapsed-time form
pub fn format_playtime(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// "YYYY-MM-DD HH:MM" UTC from epoch seconds
pub fn format_date(epoch_secs: u64) -> String {
    let days = epoch_secs / 86_400;
    let secs_of_day = epoch_secs % 86_400;
    let (year, month, day) = civil_from_days(days as i64);
    format!(
        "{year:04}-{month:02}-{day:02} {:02}:{:02}",
        secs_of_day / 3600,
        (secs_of_day % 3600) / 60
    )
}

// Days-since-epoch to (y, m, d), Gregorian.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}
