use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

use crate::constants::SHARE_FILE_EXTENSION;
use crate::error::Error as ShareError;
use crate::field::Gf256;
use crate::share::ShareEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid share in {path:?}: {source}")]
    Share {
        path: PathBuf,
        #[source]
        source: ShareError,
    },

    #[error("share store lock poisoned")]
    LockPoisoned,

    /// A rename failed after every staged file was written. `written` lists the targets already
    /// replaced, in order.
    #[error("rewrote {written:?} before failing on {failed:?}: {source}")]
    PartialWrite {
        written: Vec<PathBuf>,
        failed: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Storage for the share entries of a single secret, keyed by x-coordinate.
pub trait ShareStore: Send + Sync {
    /// Inserts or replaces the entry held at `entry.x`.
    fn put(&self, entry: &ShareEntry) -> Result<(), StoreError>;

    /// Retrieves the entry for player `x`. `None` if the store holds none.
    fn get(&self, x: Gf256) -> Result<Option<ShareEntry>, StoreError>;

    /// All entries, ordered by x-coordinate.
    fn get_all(&self) -> Result<Vec<ShareEntry>, StoreError>;

    /// Removes the entry for player `x`.
    ///
    /// # Arguments
    ///
    /// * `x` - The player's x-coordinate.
    ///
    /// # Returns
    ///
    /// `Ok(())` whether or not an entry was held, so deleting twice is not an error.
    fn delete(&self, x: Gf256) -> Result<(), StoreError>;
}

/// A `ShareStore` backed by a directory of share files named `{prefix}{x}.share`.
///
/// Each file holds the raw layout `[x, y_0, y_1, ..]`.
pub struct FileShareStore {
    dir: PathBuf,
    prefix: String,
}

impl FileShareStore {
    /// Opens the store, creating `dir` if it does not exist.
    pub fn open(dir: impl Into<PathBuf>, prefix: &str) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("📂 Opened share store at {:?}", dir);
        Ok(FileShareStore {
            dir,
            prefix: prefix.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding player `x`'s entry.
    pub fn path_for(&self, x: Gf256) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", self.prefix, x, SHARE_FILE_EXTENSION))
    }

    /// Reads a share file from an arbitrary location.
    pub fn read_file(path: &Path) -> Result<ShareEntry, StoreError> {
        let bytes = fs::read(path)?;
        let entry = ShareEntry::from_bytes(&bytes).map_err(|source| StoreError::Share {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("📄 Read share x={} ({} bytes) from {:?}", entry.x, entry.len(), path);
        Ok(entry)
    }

    /// Writes a share file to an arbitrary location.
    pub fn write_file(path: &Path, entry: &ShareEntry) -> Result<(), StoreError> {
        fs::write(path, entry.to_bytes())?;
        debug!("💾 Wrote share x={} ({} bytes) to {:?}", entry.x, entry.len(), path);
        Ok(())
    }

    /// Replaces several share files so that a failed write leaves every target untouched.
    ///
    /// Each entry is first written to a `.tmp` file next to its target. Only once all of them
    /// are on disk are they renamed over the targets, so the files never mix two epochs unless a
    /// rename itself fails.
    ///
    /// # Arguments
    ///
    /// * `updates` - Target paths paired with the entries to store there.
    ///
    /// # Errors
    ///
    /// * [`StoreError::Io`] if a staged file cannot be written. The staged files are removed and
    ///   no target has changed.
    /// * [`StoreError::PartialWrite`] if a rename fails, naming the targets already replaced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reshard::field::Gf256;
    /// use reshard::repository::FileShareStore;
    /// use reshard::share::ShareEntry;
    ///
    /// let dir = std::env::temp_dir().join(format!("reshard-doc-{}", std::process::id()));
    /// std::fs::create_dir_all(&dir).unwrap();
    /// let updates = vec![
    ///     (dir.join("a.share"), ShareEntry::new(Gf256::new(1), vec![7])),
    ///     (dir.join("b.share"), ShareEntry::new(Gf256::new(2), vec![8])),
    /// ];
    /// FileShareStore::write_files(&updates).unwrap();
    /// assert_eq!(std::fs::read(dir.join("b.share")).unwrap(), vec![2, 8]);
    /// std::fs::remove_dir_all(&dir).unwrap();
    /// ```
    pub fn write_files(updates: &[(PathBuf, ShareEntry)]) -> Result<(), StoreError> {
        let mut staged = Vec::with_capacity(updates.len());
        for (path, entry) in updates {
            let tmp = staging_path(path);
            if let Err(err) = fs::write(&tmp, entry.to_bytes()) {
                let _ = fs::remove_file(&tmp);
                discard(&staged);
                return Err(err.into());
            }
            staged.push(tmp);
        }

        let mut written = Vec::with_capacity(updates.len());
        for (i, ((path, entry), tmp)) in updates.iter().zip(&staged).enumerate() {
            if let Err(source) = fs::rename(tmp, path) {
                discard(&staged[i..]);
                return Err(StoreError::PartialWrite {
                    written,
                    failed: path.clone(),
                    source,
                });
            }
            debug!("💾 Wrote share x={} ({} bytes) to {:?}", entry.x, entry.len(), path);
            written.push(path.clone());
        }
        Ok(())
    }

    fn is_share_file(&self, path: &Path) -> bool {
        let matches_prefix = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(&self.prefix))
            .unwrap_or(false);
        let matches_extension = path
            .extension()
            .map(|ext| ext == SHARE_FILE_EXTENSION)
            .unwrap_or(false);
        matches_prefix && matches_extension
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        let _ = fs::remove_file(tmp);
    }
}

impl ShareStore for FileShareStore {
    fn put(&self, entry: &ShareEntry) -> Result<(), StoreError> {
        FileShareStore::write_file(&self.path_for(entry.x), entry)
    }

    fn get(&self, x: Gf256) -> Result<Option<ShareEntry>, StoreError> {
        let path = self.path_for(x);
        if !path.exists() {
            return Ok(None);
        }
        FileShareStore::read_file(&path).map(Some)
    }

    fn get_all(&self) -> Result<Vec<ShareEntry>, StoreError> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.is_file() && self.is_share_file(&path) {
                entries.push(FileShareStore::read_file(&path)?);
            }
        }
        entries.sort_by_key(|e| e.x);
        Ok(entries)
    }

    fn delete(&self, x: Gf256) -> Result<(), StoreError> {
        let path = self.path_for(x);
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("🗑️ Deleted share file {:?}", path);
        }
        Ok(())
    }
}

/// An in-memory `ShareStore`.
#[derive(Default)]
pub struct MemoryShareStore {
    pub map: Mutex<HashMap<u8, ShareEntry>>,
}

impl ShareStore for MemoryShareStore {
    fn put(&self, entry: &ShareEntry) -> Result<(), StoreError> {
        let mut map = self.map.lock().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(entry.x.value(), entry.clone());
        Ok(())
    }

    fn get(&self, x: Gf256) -> Result<Option<ShareEntry>, StoreError> {
        let map = self.map.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(&x.value()).cloned())
    }

    fn get_all(&self) -> Result<Vec<ShareEntry>, StoreError> {
        let map = self.map.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut entries: Vec<ShareEntry> = map.values().cloned().collect();
        entries.sort_by_key(|e| e.x);
        Ok(entries)
    }

    fn delete(&self, x: Gf256) -> Result<(), StoreError> {
        let mut map = self.map.lock().map_err(|_| StoreError::LockPoisoned)?;
        map.remove(&x.value());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SHARE_FILE_PREFIX;
    use crate::sss::{combine_shares, split_secret};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reshard-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryShareStore::default();
        let entry = ShareEntry::new(Gf256::new(2), vec![1, 2, 3]);

        assert_eq!(store.get(Gf256::new(2)).unwrap(), None);
        store.put(&entry).unwrap();
        assert_eq!(store.get(Gf256::new(2)).unwrap(), Some(entry.clone()));

        let updated = ShareEntry::new(Gf256::new(2), vec![9]);
        store.put(&updated).unwrap();
        assert_eq!(store.get_all().unwrap(), vec![updated]);

        store.delete(Gf256::new(2)).unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = temp_dir("store");
        let store = FileShareStore::open(&dir, SHARE_FILE_PREFIX).unwrap();
        let secret = b"file backed secret";

        for entry in split_secret(secret, 3, 5).unwrap() {
            store.put(&entry).unwrap();
        }
        assert!(dir.join("output1.share").exists());
        assert!(dir.join("output5.share").exists());

        let raw = fs::read(dir.join("output4.share")).unwrap();
        assert_eq!(raw[0], 4);
        assert_eq!(raw.len(), secret.len() + 1);

        store.delete(Gf256::new(1)).unwrap();
        let entries = store.get_all().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].x, Gf256::new(2));
        assert_eq!(combine_shares(&entries, 3).unwrap(), secret);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_files_replaces_every_target() {
        let dir = temp_dir("batch");
        let store = FileShareStore::open(&dir, SHARE_FILE_PREFIX).unwrap();
        let mut entries = split_secret(b"batch", 2, 3).unwrap();
        for entry in &entries {
            store.put(entry).unwrap();
        }

        crate::renewal::refresh_shares(&mut entries, 2).unwrap();
        let updates: Vec<(PathBuf, ShareEntry)> = entries
            .iter()
            .map(|e| (store.path_for(e.x), e.clone()))
            .collect();
        FileShareStore::write_files(&updates).unwrap();

        assert_eq!(store.get_all().unwrap(), entries);
        let leftovers = fs::read_dir(&dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_files_failure_leaves_targets_untouched() {
        let dir = temp_dir("batch-fail");
        let store = FileShareStore::open(&dir, SHARE_FILE_PREFIX).unwrap();
        let original = split_secret(b"keep me", 2, 3).unwrap();
        for entry in &original {
            store.put(entry).unwrap();
        }

        let mut renewed = original.clone();
        crate::renewal::refresh_shares(&mut renewed, 2).unwrap();
        let mut updates: Vec<(PathBuf, ShareEntry)> = renewed[..2]
            .iter()
            .map(|e| (store.path_for(e.x), e.clone()))
            .collect();
        // the last target's directory does not exist, so staging it fails
        updates.push((dir.join("missing").join("output3.share"), renewed[2].clone()));

        assert!(matches!(
            FileShareStore::write_files(&updates),
            Err(StoreError::Io(_))
        ));
        assert_eq!(store.get_all().unwrap(), original);
        assert!(!dir.join("output1.share.tmp").exists());
        assert!(!dir.join("output2.share.tmp").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_delete_missing_entry() {
        let dir = temp_dir("delete");
        let store = FileShareStore::open(&dir, SHARE_FILE_PREFIX).unwrap();
        store.delete(Gf256::new(9)).unwrap();
        assert!(MemoryShareStore::default().delete(Gf256::new(9)).is_ok());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_rejects_zero_abscissa() {
        let dir = temp_dir("zero");
        let store = FileShareStore::open(&dir, SHARE_FILE_PREFIX).unwrap();
        let path = store.path_for(Gf256::new(1));
        fs::write(&path, [0u8, 1, 2]).unwrap();

        match FileShareStore::read_file(&path) {
            Err(StoreError::Share { source, .. }) => assert_eq!(source, ShareError::ZeroAbscissa),
            other => panic!("unexpected result: {other:?}"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
