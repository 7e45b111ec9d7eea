// ============================================================================
// Structures : CoinSummary et CoinDetail
// ============================================================================
// CoinSummary : une ligne du tableau (endpoint /coins/markets). C'est aussi
// l'enregistrement persisté dans la watchlist.
// CoinDetail : la fiche d'une crypto (endpoint /coins/{id}), transitoire.
//
// CONCEPTS RUST :
// 1. Les noms des champs Rust = les noms JSON de CoinGecko (snake_case)
//    → pas besoin de #[serde(rename)]
// 2. #[serde(deserialize_with)] : transforme les `null` numériques en 0.0
// 3. Champs inconnus (sparkline_in_7d, ath, ...) ignorés par défaut
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::currency::Currency;

/// Une crypto telle que listée par `/coins/markets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    /// Identifiant stable CoinGecko (ex: "bitcoin")
    pub id: String,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// Symbole en minuscules (ex: "btc")
    pub symbol: String,

    /// URL du logo
    #[serde(default)]
    pub image: String,

    /// Prix actuel en USD
    #[serde(default, deserialize_with = "null_as_zero")]
    pub current_price: f64,

    /// Capitalisation en USD
    #[serde(default, deserialize_with = "null_as_zero")]
    pub market_cap: f64,

    /// Variation sur 24h en pourcentage (peut être absente)
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

impl CoinSummary {
    /// Constructeur minimal (prix et capitalisation à fournir ensuite)
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            image: String::new(),
            current_price: 0.0,
            market_cap: 0.0,
            price_change_percentage_24h: None,
        }
    }

    /// Symbole en majuscules pour l'affichage (ex: "BTC")
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// true si la variation sur 24h est strictement positive
    ///
    /// Même règle que l'affichage web : 0 ou absent → rouge.
    pub fn is_up(&self) -> bool {
        self.price_change_percentage_24h.map(|c| c > 0.0).unwrap_or(false)
    }

    /// Filtre de recherche : nom ou symbole, insensible à la casse
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.symbol.to_lowercase().contains(&query)
    }
}

/// Fiche détaillée d'une crypto (`/coins/{id}`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    /// URL du grand logo
    pub image: String,
    /// Description en anglais (peut contenir plusieurs paragraphes)
    pub description: String,
    /// Rang par capitalisation (absent pour les petites cryptos)
    pub market_cap_rank: Option<u32>,
    pub market_data: MarketData,
}

impl CoinDetail {
    /// Première phrase de la description, terminée par un point
    pub fn short_description(&self) -> String {
        let first = self.description.split(". ").next().unwrap_or("").trim();
        if first.is_empty() {
            String::new()
        } else if first.ends_with('.') {
            first.to_string()
        } else {
            format!("{}.", first)
        }
    }

    /// Prix actuel dans une devise proposée par CoinGecko
    pub fn current_price(&self, currency: Currency) -> Option<f64> {
        self.market_data.current_price(currency)
    }

    /// Capitalisation dans une devise proposée par CoinGecko
    pub fn market_cap(&self, currency: Currency) -> Option<f64> {
        self.market_data.market_cap(currency)
    }
}

/// Sous-objet `market_data`, indexé par code devise en minuscules
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: HashMap<String, f64>,
    #[serde(default)]
    pub market_cap: HashMap<String, f64>,
}

impl MarketData {
    pub fn current_price(&self, currency: Currency) -> Option<f64> {
        self.current_price
            .get(&currency.code().to_lowercase())
            .copied()
    }

    pub fn market_cap(&self, currency: Currency) -> Option<f64> {
        self.market_cap.get(&currency.code().to_lowercase()).copied()
    }
}

/// Désérialise un nombre nullable en f64 (null → 0.0)
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_summary_from_markets_json() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 64000.5,
            "market_cap": 1260000000000,
            "market_cap_rank": 1,
            "price_change_percentage_24h": -1.25,
            "sparkline_in_7d": { "price": [1.0, 2.0] }
        }"#;

        let coin: CoinSummary = serde_json::from_str(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.display_symbol(), "BTC");
        assert_eq!(coin.current_price, 64000.5);
        assert_eq!(coin.market_cap, 1.26e12);
        assert_eq!(coin.price_change_percentage_24h, Some(-1.25));
        assert!(!coin.is_up());
    }

    #[test]
    fn test_coin_summary_null_numbers() {
        let json = r#"{"id":"dead","symbol":"dd","name":"Dead","image":"",
            "current_price":null,"market_cap":null,"price_change_percentage_24h":null}"#;

        let coin: CoinSummary = serde_json::from_str(json).unwrap();
        assert_eq!(coin.current_price, 0.0);
        assert_eq!(coin.market_cap, 0.0);
        assert_eq!(coin.price_change_percentage_24h, None);
    }

    #[test]
    fn test_matches_name_or_symbol() {
        let coin = CoinSummary::new("ethereum", "Ethereum", "eth");
        assert!(coin.matches("ETH"));
        assert!(coin.matches("ther"));
        assert!(coin.matches(""));
        assert!(!coin.matches("doge"));
    }

    #[test]
    fn test_short_description() {
        let detail = CoinDetail {
            description: "Bitcoin is the first cryptocurrency. It was created in 2009.".to_string(),
            ..CoinDetail::default()
        };
        assert_eq!(detail.short_description(), "Bitcoin is the first cryptocurrency.");

        assert_eq!(CoinDetail::default().short_description(), "");
    }

    #[test]
    fn test_market_data_lookup_is_lowercase() {
        let mut data = MarketData::default();
        data.current_price.insert("usd".to_string(), 3000.0);
        assert_eq!(data.current_price(Currency::Usd), Some(3000.0));
        assert_eq!(data.current_price(Currency::Rub), None);
    }
}
