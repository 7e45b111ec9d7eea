// ============================================================================
// Cryptofolio - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;       // Clients CoinGecko et taux de change
pub mod app;       // État de l'application
pub mod config;    // Arguments et configuration
pub mod models;    // Structures de données
pub mod storage;   // Stockage clé-valeur et watchlist
pub mod ui;        // Interface utilisateur
