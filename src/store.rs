use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Synchronous string key-value medium. Every `set` is durable when it returns.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn has(&self, key: &str) -> bool;
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("writing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encoding store: {0}")]
    Encode(#[from] serde_yaml::Error),
}

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// YAML-backed store; the whole map is rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    location: StoreLocation,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(location: StoreLocation) -> Result<Self> {
        let entries = if location.path.exists() {
            let data = fs::read_to_string(&location.path)
                .with_context(|| format!("reading {:?}", location.path))?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&data).context("parsing store file")?
            }
        } else {
            BTreeMap::new()
        };
        log::info!(
            "opened store {} ({} entries)",
            location.path.display(),
            entries.len()
        );
        Ok(FileStore { location, entries })
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let path = &self.location.path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = serde_yaml::to_string(entries)?;
        fs::write(path, serialized).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        if let Err(err) = self.flush(&next) {
            log::error!("store write for {} failed: {}", key, err);
            return Err(err);
        }
        self.entries = next;
        Ok(())
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Project,
    Global,
    Configured,
}

impl StoreScope {
    pub fn label(&self) -> &'static str {
        match self {
            StoreScope::Project => "project",
            StoreScope::Global => "global",
            StoreScope::Configured => "configured",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub path: PathBuf,
    pub scope: StoreScope,
}

pub fn init_project_store() -> Result<StoreLocation> {
    let cwd = env::current_dir()?;
    let dir = cwd.join(".dayplan");
    fs::create_dir_all(&dir).context("failed to create .dayplan directory")?;
    let path = dir.join("store.yml");
    if !path.exists() {
        fs::write(&path, "{}\n").with_context(|| format!("writing {:?}", path))?;
    }
    Ok(StoreLocation {
        path,
        scope: StoreScope::Project,
    })
}

pub fn locate_store(start: &Path, configured: Option<&Path>) -> Result<StoreLocation> {
    if let Some(path) = configured {
        return Ok(StoreLocation {
            path: path.to_path_buf(),
            scope: StoreScope::Configured,
        });
    }
    if let Some(project_path) = find_project_store(start) {
        return Ok(StoreLocation {
            path: project_path,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        path: data_dir()?.join("store.yml"),
        scope: StoreScope::Global,
    })
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "dayplan").context("locating data directory")
}

pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(".dayplan/store.yml");
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn location_in(dir: &TempDir) -> StoreLocation {
        StoreLocation {
            path: dir.path().join("nested/store.yml"),
            scope: StoreScope::Configured,
        }
    }

    #[test]
    fn memory_store_overwrites() {
        let mut store = MemoryStore::new();
        assert!(!store.has("k"));
        assert_eq!(store.get("k"), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert!(store.has("k"));
        assert_eq!(store.get("k").as_deref(), Some("two"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(location_in(&dir)).unwrap();
        store.set("journal_2025-01-05", "").unwrap();
        store.set("monthly_2025-01", "focus\nand rest").unwrap();

        let reopened = FileStore::open(location_in(&dir)).unwrap();
        assert!(reopened.has("journal_2025-01-05"));
        assert_eq!(reopened.get("journal_2025-01-05").as_deref(), Some(""));
        assert_eq!(
            reopened.get("monthly_2025-01").as_deref(),
            Some("focus\nand rest")
        );
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(location_in(&dir)).unwrap();
        assert!(!store.has("anything"));
        assert!(!store.location().path.exists());
    }

    #[test]
    fn corrupt_file_is_an_open_error() {
        let dir = TempDir::new().unwrap();
        let location = location_in(&dir);
        fs::create_dir_all(location.path.parent().unwrap()).unwrap();
        fs::write(&location.path, "- not\n- a map\n").unwrap();
        assert!(FileStore::open(location).is_err());
    }

    #[test]
    fn failed_write_leaves_entries_untouched() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let mut store = FileStore::open(StoreLocation {
            path: blocker.join("store.yml"),
            scope: StoreScope::Configured,
        })
        .unwrap();
        assert!(store.set("k", "v").is_err());
        assert!(!store.has("k"));
    }

    #[test]
    fn project_store_is_found_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".dayplan")).unwrap();
        fs::write(dir.path().join(".dayplan/store.yml"), "{}\n").unwrap();
        let sub = dir.path().join("a/b");
        fs::create_dir_all(&sub).unwrap();

        let location = locate_store(&sub, None).unwrap();
        assert_eq!(location.scope, StoreScope::Project);
        assert_eq!(location.path, dir.path().join(".dayplan/store.yml"));
    }

    #[test]
    fn configured_path_wins() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("mine.yml");
        let location = locate_store(dir.path(), Some(&explicit)).unwrap();
        assert_eq!(location.scope, StoreScope::Configured);
        assert_eq!(location.path, explicit);
    }
}
