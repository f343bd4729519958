//! Calibration persistence through an injected key-value blob store.

use crate::calibration::{CalibrationError, RoiCalibration};
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fixed key the calibration blob is stored under.
pub const CALIBRATION_KEY: &str = "roi_calibration";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("stored calibration is invalid: {0}")]
    Invalid(#[from] CalibrationError),
    #[error("blob store lock poisoned")]
    Poisoned,
}

/// Minimal string blob store: load/save by key.
pub trait BlobStore {
    /// Blob stored under `key`, `None` when absent.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-process store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let blobs = self.blobs.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut blobs = self.blobs.lock().map_err(|_| StoreError::Poisoned)?;
        blobs.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut blobs = self.blobs.lock().map_err(|_| StoreError::Poisoned)?;
        blobs.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per blob inside a directory.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl BlobStore for DirBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Typed access to the calibration blob under [`CALIBRATION_KEY`].
#[derive(Debug)]
pub struct CalibrationStore<S> {
    backend: S,
}

impl<S: BlobStore> CalibrationStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Load and validate the calibration. `Ok(None)` when none is stored.
    pub fn load(&self) -> Result<Option<RoiCalibration>, StoreError> {
        let Some(raw) = self.backend.load(CALIBRATION_KEY)? else {
            return Ok(None);
        };
        let calibration: RoiCalibration = serde_json::from_str(&raw)?;
        calibration.validate()?;
        Ok(Some(calibration))
    }

    /// Like [`load`](Self::load), but a missing, unreadable or malformed
    /// blob all read as "no calibration".
    pub fn load_or_none(&self) -> Option<RoiCalibration> {
        match self.load() {
            Ok(calibration) => calibration,
            Err(e) => {
                warn!("ignoring stored calibration: {e}");
                None
            }
        }
    }

    /// Validate and persist `calibration` as pretty JSON.
    pub fn save(&self, calibration: &RoiCalibration) -> Result<(), StoreError> {
        calibration.validate()?;
        let json = serde_json::to_string_pretty(calibration)?;
        self.backend.save(CALIBRATION_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(CALIBRATION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationMetadata;
    use crate::region::{NormalizedRoi, RoiSet};
    use foot_thermal_core::FootSide;

    fn calibration() -> RoiCalibration {
        let roi = NormalizedRoi {
            min_row: 0.1,
            max_row: 0.2,
            min_col: 0.3,
            max_col: 0.4,
        };
        RoiCalibration {
            regions: RoiSet {
                hallux: roi,
                first_metatarsal: roi,
                heel: roi,
            },
            metadata: CalibrationMetadata {
                foot_side: FootSide::Left,
                bbox_height: 28,
                bbox_width: 10,
            },
        }
    }

    #[test]
    fn absent_calibration_is_none() {
        let store = CalibrationStore::new(MemoryBlobStore::default());
        assert!(store.load().unwrap().is_none());
        assert!(store.load_or_none().is_none());
    }

    #[test]
    fn save_then_load_in_memory() {
        let store = CalibrationStore::new(MemoryBlobStore::default());
        store.save(&calibration()).unwrap();
        assert_eq!(store.load().unwrap(), Some(calibration()));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn malformed_blob_reads_as_no_calibration() {
        let backend = MemoryBlobStore::default();
        backend.save(CALIBRATION_KEY, "{ not json").unwrap();
        let store = CalibrationStore::new(&backend);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
        assert!(store.load_or_none().is_none());

        let mut bad = serde_json::to_value(calibration()).unwrap();
        bad["hallux"]["minRowNorm"] = serde_json::json!(0.9);
        backend.save(CALIBRATION_KEY, &bad.to_string()).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Invalid(_))));
        assert!(store.load_or_none().is_none());
    }

    #[test]
    fn directory_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(DirBlobStore::new(dir.path().join("nested")));
        assert!(store.load().unwrap().is_none());
        store.save(&calibration()).unwrap();
        assert!(dir.path().join("nested/roi_calibration.json").exists());
        assert_eq!(store.load().unwrap(), Some(calibration()));
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
