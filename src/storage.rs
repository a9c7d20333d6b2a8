// File: ./src/storage.rs
// File locking and atomic writes shared by every on-disk store
// (tickets, demo login, reminder index, config).
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

// --- Android Specific Imports ---
#[cfg(target_os = "android")]
use std::collections::HashMap;
#[cfg(target_os = "android")]
use std::sync::{Arc, Mutex, OnceLock};

// --- Desktop Specific Imports ---
#[cfg(not(target_os = "android"))]
use fs2::FileExt;

// --- Android Global Lock Map ---
#[cfg(target_os = "android")]
static ANDROID_FILE_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

pub struct LocalStorage;

impl LocalStorage {
    /// Helper to get a sidecar lock file path (Desktop only)
    #[cfg(not(target_os = "android"))]
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    // --- DESKTOP IMPLEMENTATION (fs2) ---
    #[cfg(not(target_os = "android"))]
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    // --- ANDROID IMPLEMENTATION (In-Memory Mutex) ---
    // The app process is the only writer, so an in-process lock is enough.
    #[cfg(target_os = "android")]
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let map_mutex = ANDROID_FILE_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));

        // Canonicalize so relative paths and symlinks share one lock
        let key = file_path
            .canonicalize()
            .unwrap_or_else(|_| file_path.to_path_buf());

        let file_mutex = {
            let mut map = map_mutex
                .lock()
                .map_err(|_| anyhow::anyhow!("file lock map poisoned"))?;
            map.entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let _guard = file_mutex
            .lock()
            .map_err(|_| anyhow::anyhow!("file lock poisoned: {:?}", file_path))?;

        f()
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, path).with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    /// Reads and parses a JSON file without taking the lock.
    /// `Ok(None)` when the file does not exist.
    pub fn read_json_unlocked<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(Some(value))
    }

    /// Locked variant of [`LocalStorage::read_json_unlocked`].
    pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::with_lock(path, || Self::read_json_unlocked(path))
    }

    /// Serializes `value` as pretty JSON and writes it atomically, under the lock.
    pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        Self::with_lock(path, || {
            let json = serde_json::to_string_pretty(value)?;
            Self::atomic_write(path, json)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn unique_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kinopass_{}_{}", tag, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_atomic_write_and_load() {
        let temp_dir = unique_dir("storage");
        let file_path = temp_dir.join("test.json");

        let values: Vec<String> = vec!["a".into(), "b".into()];
        LocalStorage::write_json(&file_path, &values).unwrap();

        let loaded: Vec<String> = LocalStorage::read_json(&file_path).unwrap().unwrap();
        assert_eq!(loaded, values);
        assert!(!file_path.with_extension("tmp").exists());

        let _ = fs::remove_dir_all(temp_dir);
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let temp_dir = unique_dir("missing");
        let loaded: Option<Vec<String>> =
            LocalStorage::read_json(&temp_dir.join("nope.json")).unwrap();
        assert!(loaded.is_none());
        let _ = fs::remove_dir_all(temp_dir);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = unique_dir("corrupt");
        let file_path = temp_dir.join("bad.json");
        fs::write(&file_path, "{ not json").unwrap();

        let loaded: Result<Option<Vec<String>>> = LocalStorage::read_json(&file_path);
        assert!(loaded.is_err());
        let _ = fs::remove_dir_all(temp_dir);
    }

    #[test]
    fn test_locking_concurrency() {
        let temp_dir = unique_dir("lock");
        let file_path = temp_dir.join("lock_test.txt");
        let path_ref = Arc::new(file_path.clone());

        let _ = fs::write(&file_path, "0");

        let mut handles = vec![];
        for _ in 0..10 {
            let p = path_ref.clone();
            handles.push(thread::spawn(move || {
                LocalStorage::with_lock(&p, || {
                    let content = fs::read_to_string(&*p).unwrap();
                    let num: i32 = content.parse().unwrap();
                    std::thread::sleep(std::time::Duration::from_millis(10));
                    fs::write(&*p, (num + 1).to_string()).unwrap();
                    Ok(())
                })
                .unwrap();
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "10");

        let _ = fs::remove_dir_all(temp_dir);
    }
}
