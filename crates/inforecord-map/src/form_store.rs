//! Key-value storage for the "name this place" fields.
//!
//! The naming screen writes a label and keyword here; the weather map reads
//! them once at startup to pre-fill the next draft.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use inforecord_core::StorageError;

use crate::overlay::OverlayFields;

pub const LABEL_KEY: &str = "placeText";
pub const KEYWORD_KEY: &str = "placeKeyword";

pub trait KeyValueStore {
    /// Stored value, `None` when the key was never set.
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Backend write failures.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read the pre-fill values, `None` when both are empty.
pub fn load_prefill(store: &impl KeyValueStore) -> Option<OverlayFields> {
    let fields = OverlayFields::new(
        store.get(LABEL_KEY).unwrap_or_default(),
        store.get(KEYWORD_KEY).unwrap_or_default(),
    );
    (!fields.is_empty()).then_some(fields)
}

/// Write both pre-fill values.
pub fn save_prefill(store: &mut impl KeyValueStore, fields: &OverlayFields) -> Result<(), StorageError> {
    store.set(LABEL_KEY, &fields.label)?;
    store.set(KEYWORD_KEY, &fields.keyword)
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the file at `path`; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}
