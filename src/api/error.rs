//! Erreurs des clients HTTP.
//!
//! Chaque variante porte l'opération tentée (`FetchOperation`) pour que les
//! logs et le message affiché à l'utilisateur disent *quoi* a échoué.

use std::fmt;

use thiserror::Error;

/// Opération réseau tentée
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOperation {
    /// Page du classement `/coins/markets`
    CoinsPage(u32),
    /// Fiche `/coins/{id}`
    CoinDetail(String),
    /// Historique `/coins/{id}/market_chart`
    PriceHistory { coin_id: String, days: u32 },
    /// Table de taux `/v4/latest/USD`
    ExchangeRates,
}

impl fmt::Display for FetchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOperation::CoinsPage(page) => write!(f, "coins page {}", page),
            FetchOperation::CoinDetail(id) => write!(f, "coin detail '{}'", id),
            FetchOperation::PriceHistory { coin_id, days } => {
                write!(f, "price history '{}' ({} days)", coin_id, days)
            }
            FetchOperation::ExchangeRates => f.write_str("exchange rates"),
        }
    }
}

/// Échec d'un appel API (statut non-2xx, réseau, JSON inattendu)
#[derive(Error, Debug)]
pub enum FetchError {
    /// Page hors de [1, 10], rejetée avant tout appel réseau
    #[error("Invalid page {page}: must be between {min} and {max}")]
    InvalidPage { page: u32, min: u32, max: u32 },

    /// Le serveur a répondu avec un statut non-2xx
    #[error("Failed to fetch {operation}: HTTP {status}")]
    Status {
        operation: FetchOperation,
        status: u16,
    },

    /// Erreur de transport (DNS, connexion, timeout)
    #[error("Failed to fetch {operation}: {source}")]
    Network {
        operation: FetchOperation,
        #[source]
        source: reqwest::Error,
    },

    /// Corps de réponse illisible
    #[error("Failed to decode {operation}: {source}")]
    Decode {
        operation: FetchOperation,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Opération concernée (None pour une page invalide)
    pub fn operation(&self) -> Option<&FetchOperation> {
        match self {
            FetchError::InvalidPage { .. } => None,
            FetchError::Status { operation, .. }
            | FetchError::Network { operation, .. }
            | FetchError::Decode { operation, .. } => Some(operation),
        }
    }

    /// Statut HTTP, si le serveur a répondu
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_names_operation() {
        let err = FetchError::Status {
            operation: FetchOperation::CoinsPage(3),
            status: 429,
        };
        assert_eq!(err.to_string(), "Failed to fetch coins page 3: HTTP 429");
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.operation(), Some(&FetchOperation::CoinsPage(3)));
    }

    #[test]
    fn test_invalid_page_has_no_operation() {
        let err = FetchError::InvalidPage { page: 11, min: 1, max: 10 };
        assert!(err.operation().is_none());
        assert!(err.to_string().contains("11"));
    }
}
