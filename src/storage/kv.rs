// ============================================================================
// Stockage clé-valeur injectable
// ============================================================================
// Équivalent du "local storage" d'un navigateur : des chaînes indexées par
// clé. Le trait permet de substituer un stockage en mémoire dans les tests.
//
// CONCEPTS RUST :
// 1. Trait comme interface (get/set)
// 2. impl<T: ?Sized> pour Box<T> : un Box<dyn KeyValueStore> est lui-même
//    un KeyValueStore
// 3. Écriture atomique : fichier temporaire + rename
// ============================================================================

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

/// Erreurs de lecture/écriture du stockage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Capacité de stockage durable clé → valeur
pub trait KeyValueStore {
    /// Lit la valeur d'une clé (None si absente)
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Écrit (remplace) la valeur d'une clé
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Stockage dynamique partageable entre threads
pub type DynStore = Box<dyn KeyValueStore + Send>;

// ============================================================================
// MemoryStore
// ============================================================================

/// Stockage en mémoire (tests, mode sans fichier)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stockage pré-rempli avec une entrée
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// FileStore
// ============================================================================

/// Stockage dans un fichier JSON `{ "clé": "valeur", ... }`
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lit toutes les entrées (fichier absent → map vide)
    fn read_entries(&self) -> Result<HashMap<String, String>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(serde_json::from_str(&content)?)
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Un fichier corrompu est remplacé plutôt que de bloquer l'écriture
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            warn!(path = ?self.path, error = %e, "Storage file unreadable, starting fresh");
            HashMap::new()
        });
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&tmp_path, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = ?self.path, key, "Storage entry written");
        Ok(())
    }
}
