// ============================================================================
// Structure : WatchlistStore
// ============================================================================
// Liste des cryptos surveillées, recopiée dans le stockage à chaque mutation.
//
// INVARIANTS :
// - Pas de doublon d'id
// - Après chaque appel qui modifie la liste, la liste en mémoire et la liste
//   persistée sont identiques. Si l'écriture échoue, la liste en mémoire
//   n'est pas modifiée.
// ============================================================================

use tracing::{debug, info, warn};

use crate::models::CoinSummary;
use crate::storage::kv::{KeyValueStore, StorageError};

/// Clé de stockage de la watchlist
pub const WATCHLIST_KEY: &str = "watchedCoins";

/// Watchlist en mémoire + stockage durable injecté
#[derive(Debug)]
pub struct WatchlistStore<S: KeyValueStore> {
    storage: S,
    coins: Vec<CoinSummary>,
}

impl<S: KeyValueStore> WatchlistStore<S> {
    /// Charge la watchlist depuis le stockage
    ///
    /// Une valeur absente, illisible ou corrompue donne une liste vide :
    /// ce n'est jamais une erreur fatale.
    pub fn load(storage: S) -> Self {
        let coins = match storage.get(WATCHLIST_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CoinSummary>>(&raw) {
                Ok(coins) => coins,
                Err(e) => {
                    warn!(error = %e, "Persisted watchlist is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted watchlist, starting empty");
                Vec::new()
            }
        };

        info!(count = coins.len(), "Watchlist loaded");
        Self { storage, coins }
    }

    /// Cryptos surveillées, dans l'ordre d'ajout
    pub fn coins(&self) -> &[CoinSummary] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn is_watched(&self, coin_id: &str) -> bool {
        self.coins.iter().any(|c| c.id == coin_id)
    }

    /// Ajoute la crypto si absente, la retire sinon
    ///
    /// Retourne `true` si la crypto est surveillée après l'appel.
    pub fn toggle_watch(&mut self, coin: &CoinSummary) -> Result<bool, StorageError> {
        let now_watched = !self.is_watched(&coin.id);

        let next = if now_watched {
            let mut next = self.coins.clone();
            next.push(coin.clone());
            next
        } else {
            self.without(&coin.id)
        };

        self.commit(next)?;
        debug!(coin = %coin.id, watched = now_watched, "Watchlist toggled");
        Ok(now_watched)
    }

    /// Retire une crypto par id (sans effet si absente)
    pub fn remove(&mut self, coin_id: &str) -> Result<(), StorageError> {
        let next = self.without(coin_id);
        self.commit(next)?;
        debug!(coin = %coin_id, "Removed from watchlist");
        Ok(())
    }

    /// Accès au stockage sous-jacent
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn without(&self, coin_id: &str) -> Vec<CoinSummary> {
        self.coins
            .iter()
            .filter(|c| c.id != coin_id)
            .cloned()
            .collect()
    }

    /// Écrit la nouvelle liste puis la rend visible en mémoire
    fn commit(&mut self, next: Vec<CoinSummary>) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&next)?;
        self.storage.set(WATCHLIST_KEY, &serialized)?;
        self.coins = next;
        Ok(())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
