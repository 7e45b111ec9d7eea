// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère le classement par capitalisation, la fiche d'une crypto et son
// historique de prix depuis l'API publique CoinGecko.
//
// CONCEPTS RUST :
// 1. async/await : les appels réseau ne bloquent pas le thread
// 2. tokio::join! : lance deux futures en parallèle et attend les deux
// 3. Structures "wire" privées : le JSON de l'API est converti en types
//    du domaine (CoinDetail, PriceHistory) à la frontière du module
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::api::error::{FetchError, FetchOperation};
use crate::api::http::{build_client, get_json, trim_base_url};
use crate::models::{CoinDetail, CoinSummary, MarketData, PriceHistory, PricePoint, Timeframe};

/// URL de base de l'API publique
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Nombre de cryptos par page
pub const PAGE_SIZE: u32 = 10;

/// Première page du classement
pub const MIN_PAGE: u32 = 1;

/// Dernière page accessible
pub const MAX_PAGE: u32 = 10;

/// true si la page est dans [MIN_PAGE, MAX_PAGE]
pub fn is_valid_page(page: u32) -> bool {
    (MIN_PAGE..=MAX_PAGE).contains(&page)
}

// ============================================================================
// Structures pour parser les réponses JSON
// ============================================================================

/// Réponse de `/coins/{id}` (seuls les champs utilisés)
#[derive(Debug, Deserialize)]
struct DetailResponse {
    id: String,
    name: String,
    #[serde(default)]
    image: ImageUrls,
    #[serde(default)]
    description: Description,
    market_cap_rank: Option<u32>,
    #[serde(default)]
    market_data: MarketData,
}

#[derive(Debug, Default, Deserialize)]
struct ImageUrls {
    #[serde(default)]
    large: String,
}

#[derive(Debug, Default, Deserialize)]
struct Description {
    #[serde(default)]
    en: String,
}

impl From<DetailResponse> for CoinDetail {
    fn from(wire: DetailResponse) -> Self {
        CoinDetail {
            id: wire.id,
            name: wire.name,
            image: wire.image.large,
            description: wire.description.en,
            market_cap_rank: wire.market_cap_rank,
            market_data: wire.market_data,
        }
    }
}

/// Réponse de `/coins/{id}/market_chart` : `prices: [[ts_ms, prix], ...]`
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

// ============================================================================
// Client
// ============================================================================

/// Client CoinGecko
///
/// CONCEPT RUST : Clone bon marché
/// - reqwest::Client est un Arc en interne
/// - Cloner le client pour chaque tâche tokio ne recrée pas de connexions
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoClient {
    /// Crée un client pointant sur `base_url` (ex: un serveur de test)
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: trim_base_url(base_url),
            client: build_client(timeout)?,
        })
    }

    /// Récupère une page du classement par capitalisation
    ///
    /// # Arguments
    /// * `page` - numéro de page dans [1, 10]
    #[instrument(skip(self))]
    pub async fn fetch_coins_page(&self, page: u32) -> Result<Vec<CoinSummary>, FetchError> {
        if !is_valid_page(page) {
            return Err(FetchError::InvalidPage {
                page,
                min: MIN_PAGE,
                max: MAX_PAGE,
            });
        }

        let url = build_markets_url(&self.base_url, page);
        let coins: Vec<CoinSummary> =
            get_json(&self.client, &url, FetchOperation::CoinsPage(page)).await?;

        info!(count = coins.len(), "Fetched coins page");
        Ok(coins)
    }

    /// Récupère la fiche d'une crypto
    #[instrument(skip(self))]
    pub async fn fetch_coin_detail(&self, coin_id: &str) -> Result<CoinDetail, FetchError> {
        let url = format!("{}/coins/{}", self.base_url, coin_id);
        let wire: DetailResponse = get_json(
            &self.client,
            &url,
            FetchOperation::CoinDetail(coin_id.to_string()),
        )
        .await?;

        info!(name = %wire.name, "Fetched coin detail");
        Ok(wire.into())
    }

    /// Récupère l'historique de prix pour un Timeframe
    #[instrument(skip(self), fields(days = timeframe.to_days()))]
    pub async fn fetch_price_history(
        &self,
        coin_id: &str,
        timeframe: Timeframe,
    ) -> Result<PriceHistory, FetchError> {
        let days = timeframe.to_days();
        let url = build_market_chart_url(&self.base_url, coin_id, days);
        let wire: MarketChartResponse = get_json(
            &self.client,
            &url,
            FetchOperation::PriceHistory {
                coin_id: coin_id.to_string(),
                days,
            },
        )
        .await?;

        let points = wire
            .prices
            .into_iter()
            .map(|(ts, price)| PricePoint::new(ts as i64, price))
            .collect::<Vec<_>>();

        info!(points = points.len(), "Fetched price history");
        Ok(PriceHistory::new(timeframe, points))
    }

    /// Lance la fiche et l'historique en parallèle et attend les deux
    ///
    /// CONCEPT RUST : tokio::join!
    /// - Les deux requêtes partent en même temps
    /// - Chaque résultat est indépendant (l'une peut échouer sans l'autre)
    pub async fn fetch_detail_and_history(
        &self,
        coin_id: &str,
        timeframe: Timeframe,
    ) -> (
        Result<CoinDetail, FetchError>,
        Result<PriceHistory, FetchError>,
    ) {
        tokio::join!(
            self.fetch_coin_detail(coin_id),
            self.fetch_price_history(coin_id, timeframe)
        )
    }
}

/// URL du classement (10 par page, tri par capitalisation)
fn build_markets_url(base_url: &str, page: u32) -> String {
    format!(
        "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page={}&sparkline=true&price_change_percentage=24h",
        base_url, PAGE_SIZE, page
    )
}

/// URL de l'historique de prix
fn build_market_chart_url(base_url: &str, coin_id: &str, days: u32) -> String {
    format!(
        "{}/coins/{}/market_chart?vs_currency=usd&days={}",
        base_url, coin_id, days
    )
}

// ============================================================================
// Tests unitaires
// ============================================================================
// CONCEPT : wiremock
// - Démarre un vrai serveur HTTP local pour chaque test
// - Les matchers vérifient le chemin et les paramètres de la requête
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CoinGeckoClient {
        CoinGeckoClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn coin_json(id: &str, price: f64) -> serde_json::Value {
        json!({
            "id": id,
            "symbol": &id[..3],
            "name": id,
            "image": format!("https://img.example/{}.png", id),
            "current_price": price,
            "market_cap": price * 1000.0,
            "price_change_percentage_24h": 1.5
        })
    }

    #[test]
    fn test_build_markets_url() {
        let url = build_markets_url("https://api.coingecko.com/api/v3", 3);
        assert!(url.starts_with("https://api.coingecko.com/api/v3/coins/markets?"));
        assert!(url.contains("vs_currency=usd"));
        assert!(url.contains("order=market_cap_desc"));
        assert!(url.contains("per_page=10"));
        assert!(url.contains("page=3"));
        assert!(url.contains("sparkline=true"));
        assert!(url.contains("price_change_percentage=24h"));
    }

    #[test]
    fn test_page_bounds() {
        assert!(!is_valid_page(0));
        assert!(is_valid_page(1));
        assert!(is_valid_page(10));
        assert!(!is_valid_page(11));
    }

    #[tokio::test]
    async fn test_fetch_coins_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                coin_json("bitcoin", 64000.0),
                coin_json("ethereum", 3000.0),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let coins = client_for(&server).fetch_coins_page(2).await.unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(coins[1].current_price, 3000.0);
    }

    #[tokio::test]
    async fn test_fetch_coins_page_rejects_out_of_range() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client.fetch_coins_page(11).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidPage { page: 11, .. }));

        let err = client.fetch_coins_page(0).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidPage { page: 0, .. }));
    }

    #[tokio::test]
    async fn test_fetch_coins_page_http_error_carries_operation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_coins_page(1).await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.operation(), Some(&FetchOperation::CoinsPage(1)));
    }

    #[tokio::test]
    async fn test_fetch_coins_page_bad_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_coins_page(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_fetch_coin_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/ethereum"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ethereum",
                "name": "Ethereum",
                "image": { "thumb": "t.png", "large": "large.png" },
                "description": { "en": "Ethereum is a platform. It runs smart contracts." },
                "market_cap_rank": 2,
                "market_data": {
                    "current_price": { "usd": 3000.0, "rub": 270000.0 },
                    "market_cap": { "usd": 360000000000.0 }
                }
            })))
            .mount(&server)
            .await;

        let detail = client_for(&server).fetch_coin_detail("ethereum").await.unwrap();
        assert_eq!(detail.name, "Ethereum");
        assert_eq!(detail.image, "large.png");
        assert_eq!(detail.market_cap_rank, Some(2));
        assert_eq!(detail.short_description(), "Ethereum is a platform.");
        assert_eq!(detail.market_data.current_price.get("rub"), Some(&270000.0));
    }

    #[tokio::test]
    async fn test_fetch_price_history_uses_timeframe_days() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/ethereum/market_chart"))
            .and(query_param("vs_currency", "usd"))
            .and(query_param("days", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "prices": [[1709647620000u64, 3500.5], [1709734020000u64, 3600.0]],
                "market_caps": [],
                "total_volumes": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let history = client_for(&server)
            .fetch_price_history("ethereum", Timeframe::ThirtyDays)
            .await
            .unwrap();

        assert_eq!(history.timeframe, Timeframe::ThirtyDays);
        assert_eq!(history.len(), 2);
        assert_eq!(history.labels(), vec!["Mar 5".to_string(), "Mar 6".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_detail_and_history_independent_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "prices": [[0, 1.0]] })),
            )
            .mount(&server)
            .await;

        let (detail, history) = client_for(&server)
            .fetch_detail_and_history("bitcoin", Timeframe::TwentyFourHours)
            .await;

        assert_eq!(detail.unwrap_err().status(), Some(500));
        assert_eq!(history.unwrap().len(), 1);
    }
}
