/*
[INPUT]:  Storage key (prefix.subject.appId) and token string
[OUTPUT]: Persisted bearer tokens, in memory or one file per key
[POS]:    Auth layer - credential persistence boundary
[UPDATE]: When key derivation or on-disk layout changes
*/

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tempfile::NamedTempFile;

use crate::types::Identity;

/// Prefix used when the caller does not pick one
pub const DEFAULT_KEY_PREFIX: &str = "fusedvr.token";

const CREDENTIAL_FILE_SUFFIX: &str = ".cred";

/// Key a session's token is stored under: `prefix.subject.appId`
///
/// Distinct (subject, appId) pairs map to distinct keys as long as neither
/// part contains the `.` separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(prefix: &str, identity: &Identity) -> Self {
        Self(format!(
            "{prefix}.{}.{}",
            identity.subject(),
            identity.app_id()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persists one opaque string per key
///
/// Concurrent writers to the same key race; the last write wins.
pub trait CredentialStore: Send + Sync {
    fn load(&self, key: &StorageKey) -> io::Result<Option<String>>;

    fn save(&self, key: &StorageKey, value: &str) -> io::Result<()>;

    /// Removing a missing key succeeds
    fn remove(&self, key: &StorageKey) -> io::Result<()>;
}

/// Process-local store; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    entries: Arc<RwLock<HashMap<StorageKey, String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, key: &StorageKey) -> io::Result<Option<String>> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn save(&self, key: &StorageKey, value: &str) -> io::Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.clone(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> io::Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory, survives restarts
///
/// Tokens are stored in plain text (owner-only permissions on Unix).
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Create a store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the file path backing a key
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        let name = urlencoding::encode(key.as_str());
        self.dir.join(format!("{name}{CREDENTIAL_FILE_SUFFIX}"))
    }

    /// List every key that currently has a stored value
    pub fn list_keys(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut keys = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(encoded) = name.strip_suffix(CREDENTIAL_FILE_SUFFIX) else {
                continue;
            };
            if let Ok(key) = urlencoding::decode(encoded) {
                keys.push(key.into_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, key: &StorageKey) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) if content.is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&self, key: &StorageKey, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut temp_file = NamedTempFile::new_in(&self.dir)?;
        temp_file.write_all(value.as_bytes())?;
        temp_file.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp_file.path(), fs::Permissions::from_mode(0o600))?;
        }

        temp_file
            .persist(self.path_for(key))
            .map_err(|err| err.error)?;
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(subject: &str, app_id: &str) -> StorageKey {
        StorageKey::new(DEFAULT_KEY_PREFIX, &Identity::email(subject, app_id))
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(key("a@b.com", "app1").as_str(), "fusedvr.token.a@b.com.app1");
        assert_eq!(key("a@b.com", "").to_string(), "fusedvr.token.a@b.com.");
    }

    #[test]
    fn test_storage_key_changes_with_either_part() {
        let base = key("alice", "app1");
        assert_ne!(base, key("bob", "app1"));
        assert_ne!(base, key("alice", "app2"));
        assert_eq!(base, key("alice", "app1"));
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        let k = key("alice", "app1");

        assert_eq!(store.load(&k).unwrap(), None);
        store.save(&k, "tok").unwrap();
        assert_eq!(store.load(&k).unwrap().as_deref(), Some("tok"));

        // clones share contents
        let shared = store.clone();
        assert_eq!(shared.load(&k).unwrap().as_deref(), Some("tok"));

        store.remove(&k).unwrap();
        store.remove(&k).unwrap();
        assert!(shared.is_empty());
    }

    #[test]
    fn test_file_store_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let k = key("a@b.com", "app1");

        FileCredentialStore::new(dir.path()).save(&k, "header.payload.sig").unwrap();

        let reopened = FileCredentialStore::new(dir.path());
        assert_eq!(
            reopened.load(&k).unwrap().as_deref(),
            Some("header.payload.sig")
        );
        assert_eq!(reopened.list_keys().unwrap(), vec![k.as_str().to_string()]);
    }

    #[test]
    fn test_file_store_overwrite_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested"));
        let k = key("alice", "app1");

        assert_eq!(store.load(&k).unwrap(), None);
        assert!(store.list_keys().unwrap().is_empty());

        store.save(&k, "first").unwrap();
        store.save(&k, "second").unwrap();
        assert_eq!(store.load(&k).unwrap().as_deref(), Some("second"));

        store.remove(&k).unwrap();
        store.remove(&k).unwrap();
        assert_eq!(store.load(&k).unwrap(), None);
    }

    #[test]
    fn test_file_store_escapes_path_characters() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        let k = key("../../etc/passwd", "app1");

        store.save(&k, "tok").unwrap();
        let path = store.path_for(&k);
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(store.list_keys().unwrap(), vec![k.as_str().to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        let k = key("alice", "app1");
        store.save(&k, "tok").unwrap();

        let metadata = fs::metadata(store.path_for(&k)).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }
}
