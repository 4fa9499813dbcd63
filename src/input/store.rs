//! Persistence gateway for handler bindings
//!
//! One record per handler, keyed by handler name. The on-disk store writes
//! one YAML file per handler.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::binding::Bindings;

/// Errors that can occur when reading or writing bindings
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("failed to serialize bindings for {handler}: {message}")]
    Serialize { handler: String, message: String },
}

/// Reads and writes saved bindings by handler name
pub trait BindingStore {
    /// Saved bindings for a handler, or `None` if nothing was saved
    fn read(&self, handler: &str) -> Result<Option<Bindings>, StoreError>;

    fn write(&self, handler: &str, bindings: &Bindings) -> Result<(), StoreError>;

    /// Forget saved bindings; returns whether anything was removed
    fn remove(&self, handler: &str) -> Result<bool, StoreError>;

    /// Names of handlers with saved bindings, sorted
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// File contents: the handler name travels with its bindings so that
/// sanitized file names can be mapped back
#[derive(Debug, Serialize, Deserialize)]
struct BindingsFile {
    handler: String,
    #[serde(flatten)]
    bindings: Bindings,
}

fn parse_bindings_file(yaml: &str, origin: &str) -> Result<BindingsFile, StoreError> {
    serde_yaml::from_str::<BindingsFile>(yaml).map_err(|e| StoreError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}

/// Parse a bindings file
pub fn parse_bindings_yaml(yaml: &str, origin: &str) -> Result<Bindings, StoreError> {
    parse_bindings_file(yaml, origin).map(|file| file.bindings)
}

/// Render bindings as a bindings file
pub fn bindings_to_yaml(handler: &str, bindings: &Bindings) -> Result<String, StoreError> {
    let file = BindingsFile {
        handler: handler.to_string(),
        bindings: bindings.clone(),
    };
    serde_yaml::to_string(&file).map_err(|e| StoreError::Serialize {
        handler: handler.to_string(),
        message: e.to_string(),
    })
}

/// File stem for a handler name
///
/// Characters that are unsafe in file names, `%` itself, and leading/trailing
/// dots and spaces are percent-encoded, so distinct handler names
/// always get distinct files.
pub fn file_stem_for(handler: &str) -> String {
    if handler.is_empty() {
        return "%".to_string();
    }

    let last = handler.chars().count() - 1;
    let mut stem = String::with_capacity(handler.len());
    for (i, c) in handler.chars().enumerate() {
        let encode = match c {
            '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => true,
            '.' => i == 0 || i == last,
            ' ' => i == 0 || i == last,
            c => c.is_control(),
        };
        if encode {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                stem.push_str(&format!("%{byte:02X}"));
            }
        } else {
            stem.push(c);
        }
    }
    stem
}

/// Stores each handler as `<dir>/<handler>.yaml`
#[derive(Debug, Clone)]
pub struct YamlBindingStore {
    dir: PathBuf,
}

impl YamlBindingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, handler: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", file_stem_for(handler)))
    }
}

impl BindingStore for YamlBindingStore {
    fn read(&self, handler: &str) -> Result<Option<Bindings>, StoreError> {
        let path = self.path_for(handler);
        if !path.exists() {
            tracing::debug!(handler, "No saved bindings at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let file = parse_bindings_file(&content, &path.display().to_string())?;
        if file.handler != handler {
            tracing::warn!(
                handler,
                recorded = %file.handler,
                "Bindings file {} belongs to another handler; ignoring it",
                path.display()
            );
            return Ok(None);
        }
        tracing::info!(handler, "Loaded bindings from {}", path.display());
        Ok(Some(file.bindings))
    }

    fn write(&self, handler: &str, bindings: &Bindings) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(handler);
        let content = bindings_to_yaml(handler, bindings)?;
        fs::write(&path, content).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(handler, "Saved bindings to {}", path.display());
        Ok(())
    }

    fn remove(&self, handler: &str) -> Result<bool, StoreError> {
        let path = self.path_for(handler);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("yaml") {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping unreadable bindings file {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_yaml::from_str::<BindingsFile>(&content) {
                Ok(file) => names.push(file.handler),
                Err(e) => {
                    tracing::warn!("Skipping invalid bindings file {}: {}", path.display(), e)
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory store; clones share the same records
#[derive(Debug, Clone, Default)]
pub struct MemoryBindingStore {
    records: Rc<RefCell<BTreeMap<String, Bindings>>>,
}

impl MemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes is not tracked; this is the number of handlers saved
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl BindingStore for MemoryBindingStore {
    fn read(&self, handler: &str) -> Result<Option<Bindings>, StoreError> {
        Ok(self.records.borrow().get(handler).cloned())
    }

    fn write(&self, handler: &str, bindings: &Bindings) -> Result<(), StoreError> {
        self.records
            .borrow_mut()
            .insert(handler.to_string(), bindings.clone());
        Ok(())
    }

    fn remove(&self, handler: &str) -> Result<bool, StoreError> {
        Ok(self.records.borrow_mut().remove(handler).is_some())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.borrow().keys().cloned().collect())
    }
}

/// Store with no saved state that discards writes
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBindingStore;

impl BindingStore for NullBindingStore {
    fn read(&self, _handler: &str) -> Result<Option<Bindings>, StoreError> {
        Ok(None)
    }

    fn write(&self, _handler: &str, _bindings: &Bindings) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove(&self, _handler: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::axis::AxisKind;
    use crate::input::types::{KeyCode, Phase};
    use tempfile::tempdir;

    fn sample() -> Bindings {
        Bindings::new()
            .listener(Phase::Held, "Forward", Some(KeyCode::Char('w')), Some(KeyCode::Up))
            .listener(Phase::JustPressed, "Jump", Some(KeyCode::Space), None)
            .listener(Phase::JustReleased, "Idle", None, None)
            .axis("Look X", AxisKind::MouseHorizontal)
    }

    #[test]
    fn test_yaml_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = YamlBindingStore::new(dir.path());

        store.write("Player Movement", &sample()).unwrap();
        let loaded = store.read("Player Movement").unwrap();

        assert_eq!(loaded, Some(sample()));
    }

    #[test]
    fn test_yaml_store_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = YamlBindingStore::new(dir.path().join("not-created-yet"));
        assert_eq!(store.read("Anything").unwrap(), None);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_yaml_store_creates_directory_on_write() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("bindings");
        let store = YamlBindingStore::new(&nested);

        store.write("Chat", &Bindings::new()).unwrap();
        assert!(nested.join("Chat.yaml").exists());
    }

    #[test]
    fn test_yaml_store_list_uses_recorded_names() {
        let dir = tempdir().unwrap();
        let store = YamlBindingStore::new(dir.path());
        store.write("Menu/Pause", &sample()).unwrap();
        store.write("Chat", &sample()).unwrap();

        assert!(store.path_for("Menu/Pause").ends_with("Menu%2FPause.yaml"));
        assert_eq!(store.list().unwrap(), vec!["Chat", "Menu/Pause"]);
    }

    #[test]
    fn test_yaml_store_remove() {
        let dir = tempdir().unwrap();
        let store = YamlBindingStore::new(dir.path());
        store.write("Chat", &sample()).unwrap();

        assert!(store.remove("Chat").unwrap());
        assert!(!store.remove("Chat").unwrap());
        assert_eq!(store.read("Chat").unwrap(), None);
    }

    #[test]
    fn test_yaml_store_reports_parse_error() {
        let dir = tempdir().unwrap();
        let store = YamlBindingStore::new(dir.path());
        std::fs::write(store.path_for("Broken"), "handler: Broken\nheld: [ {name: X, positive: hyperkey} ]\n")
            .unwrap();

        let err = store.read("Broken").unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_memory_store_clones_share_records() {
        let store = MemoryBindingStore::new();
        let view = store.clone();
        store.write("Chat", &sample()).unwrap();

        assert_eq!(view.read("Chat").unwrap(), Some(sample()));
        assert_eq!(view.list().unwrap(), vec!["Chat"]);
        assert!(view.remove("Chat").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_stem_sanitizing() {
        assert_eq!(file_stem_for("Player Movement"), "Player Movement");
        assert_eq!(file_stem_for("a/b\\c"), "a%2Fb%5Cc");
        assert_eq!(file_stem_for(".."), "%2E%2E");
        assert_eq!(file_stem_for("v1.2"), "v1.2");
        assert_eq!(file_stem_for("  "), "%20%20");
        assert_eq!(file_stem_for("50%"), "50%25");
        assert_eq!(file_stem_for(""), "%");
    }

    #[test]
    fn test_file_stems_do_not_collide() {
        let names = ["Menu/Pause", "Menu_Pause", "Menu%2FPause", "Menu:Pause", " Menu", "Menu", ".Menu", "Menu."];
        let stems: std::collections::BTreeSet<String> = names.iter().map(|n| file_stem_for(n)).collect();
        assert_eq!(stems.len(), names.len());
    }

    #[test]
    fn test_yaml_store_ignores_file_of_other_handler() {
        let dir = tempdir().unwrap();
        let store = YamlBindingStore::new(dir.path());
        std::fs::write(store.path_for("Chat"), bindings_to_yaml("Lobby Chat", &sample()).unwrap()).unwrap();

        assert_eq!(store.read("Chat").unwrap(), None);
    }

    #[test]
    fn test_written_yaml_is_readable_text() {
        let yaml = bindings_to_yaml("Player Movement", &sample()).unwrap();
        assert!(yaml.contains("handler: Player Movement"));
        assert!(yaml.contains("mouse_horizontal"));
        assert_eq!(parse_bindings_yaml(&yaml, "test").unwrap(), sample());
    }
}
