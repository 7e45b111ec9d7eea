// ============================================================================
// API Client : exchangerate-api
// ============================================================================
// Une seule requête au démarrage : `GET /v4/latest/USD`.
// Si elle échoue, l'appelant garde une table vide et toutes les conversions
// retombent sur le montant USD (mode dégradé accepté).
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::api::error::{FetchError, FetchOperation};
use crate::api::http::{build_client, get_json, trim_base_url};
use crate::models::RateTable;

/// URL de base de l'API publique
pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate-api.com";

/// Réponse de `/v4/latest/USD` (on ignore `base`, `date`, ...)
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: RateTable,
}

/// Client exchangerate-api
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateClient {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: trim_base_url(base_url),
            client: build_client(timeout)?,
        })
    }

    /// Récupère la table des taux par rapport à l'USD
    #[instrument(skip(self))]
    pub async fn fetch_rates(&self) -> Result<RateTable, FetchError> {
        let url = format!("{}/v4/latest/USD", self.base_url);
        let response: LatestRatesResponse =
            get_json(&self.client, &url, FetchOperation::ExchangeRates).await?;

        info!(currencies = response.rates.len(), "Fetched exchange rates");
        Ok(response.rates)
    }
}
