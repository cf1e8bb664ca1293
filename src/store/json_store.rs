use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::store::StorageError;
use crate::store::schema::{KeyStatsData, ResultHistoryData};

const RESULTS_FILE: &str = "results.json";
const KEY_STATS_FILE: &str = "key_stats.json";

/// Versioned JSON files in one directory, written atomically.
#[derive(Clone, Debug)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keystep")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Missing or unreadable files load as the default value.
    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(StorageError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(StorageError::from));
        match parsed {
            Ok(data) => {
                debug!(file = %path.display(), "loaded store file");
                data
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "ignoring unreadable store file");
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StorageError> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        debug!(file = %path.display(), bytes = json.len(), "saved store file");
        Ok(())
    }

    pub fn load_results(&self) -> ResultHistoryData {
        self.load(RESULTS_FILE)
    }

    pub fn save_results(&self, data: &ResultHistoryData) -> Result<(), StorageError> {
        self.save(RESULTS_FILE, data)
    }

    pub fn load_key_stats(&self) -> KeyStatsData {
        let data: KeyStatsData = self.load(KEY_STATS_FILE);
        if data.needs_reset() {
            warn!(found = data.schema_version, "resetting key stats with stale schema");
            return KeyStatsData::default();
        }
        data
    }

    pub fn save_key_stats(&self, data: &KeyStatsData) -> Result<(), StorageError> {
        self.save(KEY_STATS_FILE, data)
    }
}
