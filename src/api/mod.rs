// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les clients API pour récupérer les données de marché
// (CoinGecko) et les taux de change (exchangerate-api)
// ============================================================================

pub mod coingecko;      // Classement, fiche et historique des cryptos
pub mod error;          // FetchError, FetchOperation
pub mod exchange_rates; // Table de taux par rapport à l'USD
mod http;               // Helpers reqwest partagés

// Re-export des types principaux
pub use coingecko::{CoinGeckoClient, MAX_PAGE, MIN_PAGE, PAGE_SIZE};
pub use error::{FetchError, FetchOperation};
pub use exchange_rates::ExchangeRateClient;
