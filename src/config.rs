//! Configuration de l'application.
//!
//! Les valeurs par défaut pointent vers les APIs publiques. Chaque option
//! peut être surchargée en ligne de commande ou par une variable
//! d'environnement `CRYPTOFOLIO_*` (utile pour viser un serveur de test).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::api::{coingecko, exchange_rates, MAX_PAGE, MIN_PAGE};
use crate::models::Currency;

/// Arguments de ligne de commande
#[derive(Debug, Parser)]
#[command(name = "cryptofolio", version, about = "Crypto prices dashboard in your terminal")]
pub struct Args {
    /// Base URL of the CoinGecko API
    #[arg(long, env = "CRYPTOFOLIO_COINGECKO_URL", default_value = coingecko::DEFAULT_BASE_URL)]
    pub coingecko_url: String,

    /// Base URL of the exchange rate API
    #[arg(long, env = "CRYPTOFOLIO_RATES_URL", default_value = exchange_rates::DEFAULT_BASE_URL)]
    pub rates_url: String,

    /// HTTP request timeout, in seconds
    #[arg(long, env = "CRYPTOFOLIO_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Watchlist storage file (default: <data dir>/cryptofolio/storage.json)
    #[arg(long, env = "CRYPTOFOLIO_STORAGE")]
    pub storage: Option<PathBuf>,

    /// Directory for the rolling log files
    #[arg(long, env = "CRYPTOFOLIO_LOG_DIR", default_value = "./logs")]
    pub log_dir: PathBuf,

    /// First page of the market cap ranking to show (1-10)
    #[arg(long, env = "CRYPTOFOLIO_PAGE", default_value_t = 1, value_parser = clap::value_parser!(u32).range(MIN_PAGE as i64..=MAX_PAGE as i64))]
    pub page: u32,

    /// Display currency (USD, RUB, UZS)
    #[arg(long, env = "CRYPTOFOLIO_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Open the detail screen of this coin id on startup (e.g. "bitcoin")
    #[arg(long, env = "CRYPTOFOLIO_COIN")]
    pub coin: Option<String>,
}

/// Configuration résolue
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub coingecko_url: String,
    pub rates_url: String,
    pub timeout: Duration,
    pub storage_path: PathBuf,
    pub log_dir: PathBuf,
    pub initial_page: u32,
    pub initial_currency: Currency,
    pub initial_coin: Option<String>,
}

impl Config {
    /// Construit la configuration depuis les arguments
    ///
    /// Une devise inconnue retombe sur USD.
    pub fn from_args(args: Args) -> Self {
        Self {
            coingecko_url: args.coingecko_url,
            rates_url: args.rates_url,
            timeout: Duration::from_secs(args.timeout_secs),
            storage_path: args.storage.unwrap_or_else(default_storage_path),
            log_dir: args.log_dir,
            initial_page: args.page,
            initial_currency: Currency::from_code(&args.currency).unwrap_or_default(),
            initial_coin: args.coin.filter(|id| !id.trim().is_empty()),
        }
    }
}

/// `<data_local_dir>/cryptofolio/storage.json`, ou le répertoire courant
pub fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("cryptofolio"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storage.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["cryptofolio"]);
        let config = Config::from_args(args);
        assert_eq!(config.coingecko_url, coingecko::DEFAULT_BASE_URL);
        assert_eq!(config.initial_page, 1);
        assert_eq!(config.initial_currency, Currency::Usd);
        assert!(config.storage_path.ends_with("storage.json"));
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "cryptofolio",
            "--page",
            "4",
            "--currency",
            "uzs",
            "--coin",
            "ethereum",
            "--storage",
            "/tmp/watch.json",
        ]);
        let config = Config::from_args(args);
        assert_eq!(config.initial_page, 4);
        assert_eq!(config.initial_currency, Currency::Uzs);
        assert_eq!(config.initial_coin.as_deref(), Some("ethereum"));
        assert_eq!(config.storage_path, PathBuf::from("/tmp/watch.json"));
    }

    #[test]
    fn test_page_out_of_range_is_rejected() {
        assert!(Args::try_parse_from(["cryptofolio", "--page", "11"]).is_err());
        assert!(Args::try_parse_from(["cryptofolio", "--page", "0"]).is_err());
    }

    #[test]
    fn test_page_and_coin_read_from_environment() {
        let command = Args::command();
        let env_of = |name: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id().as_str() == name)
                .and_then(|arg| arg.get_env())
                .map(|env| env.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("page").as_deref(), Some("CRYPTOFOLIO_PAGE"));
        assert_eq!(env_of("coin").as_deref(), Some("CRYPTOFOLIO_COIN"));
    }

    #[test]
    fn test_unknown_currency_falls_back_to_usd() {
        let config = Config::from_args(Args::parse_from(["cryptofolio", "--currency", "EUR"]));
        assert_eq!(config.initial_currency, Currency::Usd);
    }
}
