//! One JSON file per identity.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::core::store::StoreSnapshot;

use super::{PersistError, PersistResult, StoreBackend};

/// Longest hex stem that still fits a 255-byte file name with `.json`.
const MAX_HEX_STEM: usize = 240;

/// Stores each owner's records in `<root>/<hex(owner)>.json`.
///
/// Hex-encoding the owner keeps distinct identities in distinct files, even
/// on case-insensitive file systems. Owners too long for that are stored as
/// `<sha256(owner)>.sha256.json`; hex stems never contain a dot, so the two
/// forms cannot collide.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    root: PathBuf,
}

impl JsonFileBackend {
    /// Uses `root` as the data directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> PersistResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| PersistError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds `owner`'s records.
    pub fn path_for(&self, owner: &str) -> PathBuf {
        let stem = hex::encode(owner.as_bytes());
        if stem.len() <= MAX_HEX_STEM {
            return self.root.join(format!("{stem}.json"));
        }
        let digest = Sha256::digest(owner.as_bytes());
        self.root.join(format!("{}.sha256.json", hex::encode(digest)))
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self, owner: &str) -> PersistResult<Option<StoreSnapshot>> {
        let path = self.path_for(owner);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(PersistError::Io { path, source }),
        };

        let snapshot = serde_json::from_slice(&bytes).map_err(|source| PersistError::Corrupt {
            owner: owner.to_string(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, owner: &str, snapshot: &StoreSnapshot) -> PersistResult<()> {
        let path = self.path_for(owner);
        let payload = serde_json::to_vec_pretty(snapshot)?;
        let io_err = |source| PersistError::Io {
            path: path.clone(),
            source,
        };

        // Write beside the target so the rename stays on one file system.
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(&payload).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;

        tracing::debug!(owner, path = %path.display(), records = snapshot.records.len(), "saved store");
        Ok(())
    }
}
