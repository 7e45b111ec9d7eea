// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod coin;     // CoinSummary, CoinDetail, MarketData
pub mod currency; // Currency, RateTable, conversion et formatage
pub mod history;  // Timeframe, PricePoint, PriceHistory

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use cryptofolio::models::coin::CoinSummary;
// On peut faire : use cryptofolio::models::CoinSummary;
pub use coin::{CoinDetail, CoinSummary, MarketData};
pub use currency::{convert, format_change, format_compact_millions, format_price, Currency, RateTable};
pub use history::{PriceHistory, PricePoint, Timeframe};
