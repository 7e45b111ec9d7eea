// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod events;          // Gestion des événements clavier
pub mod dashboard;       // Écran principal : tableau des cryptos
pub mod chart;           // Écran détail : fiche + graphique
pub mod slider;          // Bandeau des cryptos en vedette
pub mod watchlist_panel; // Panneau de watchlist

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};
pub use dashboard::render;
