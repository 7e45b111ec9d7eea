// ============================================================================
// Helpers HTTP partagés par les clients API
// ============================================================================
// Même séquence que pour tous les appels :
// 1. GET avec le client configuré (User-Agent + timeout)
// 2. Statut non-2xx → FetchError::Status
// 3. Parsing JSON → FetchError::Decode si la structure ne correspond pas
// ============================================================================

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::api::error::{FetchError, FetchOperation};

/// User-Agent envoyé aux APIs (CoinGecko bloque parfois les clients anonymes)
pub const USER_AGENT: &str = concat!("cryptofolio/", env!("CARGO_PKG_VERSION"));

/// Construit le client reqwest commun
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// GET + vérification du statut + désérialisation JSON
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    operation: FetchOperation,
) -> Result<T, FetchError> {
    debug!(url = %url, %operation, "Sending HTTP request");

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(source) => {
            error!(%operation, error = %source, "HTTP request failed");
            return Err(FetchError::Network { operation, source });
        }
    };

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    if !status.is_success() {
        error!(%operation, status = %status, "API returned error status");
        return Err(FetchError::Status {
            operation,
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|source| {
        error!(%operation, error = %source, "Failed to parse JSON response");
        FetchError::Decode { operation, source }
    })
}

/// Retire le '/' final d'une URL de base
pub fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
