// ============================================================================
// Module : storage
// ============================================================================
// Persistance locale : stockage clé-valeur injectable et watchlist
// ============================================================================

pub mod kv;        // KeyValueStore, MemoryStore, FileStore
pub mod watchlist; // WatchlistStore

pub use kv::{DynStore, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use watchlist::{WatchlistStore, WATCHLIST_KEY};
