use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which Binance USDT-M deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinanceEnvironment {
    Production,
    /// Sandbox with fake funds.
    #[default]
    Testnet,
}

impl BinanceEnvironment {
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://fapi.binance.com",
            Self::Testnet => "https://testnet.binancefuture.com",
        }
    }

    /// Reads `BINANCE_ENVIRONMENT`; unset means testnet.
    pub fn from_env() -> Result<Self> {
        match std::env::var("BINANCE_ENVIRONMENT") {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }
}

impl fmt::Display for BinanceEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for BinanceEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" | "mainnet" => Ok(Self::Production),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(Error::Config(format!(
                "unknown Binance environment {other:?} (expected production or testnet)"
            ))),
        }
    }
}

/// Configuration for BinancePerpsClient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinancePerpsClientConfig {
    /// Base URL for API endpoints, without trailing slash
    pub base_url: String,
    /// `recvWindow` sent with signed requests, in milliseconds
    pub recv_window: Option<u64>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra attempts after a network failure
    pub max_retries: u32,
    /// First backoff delay; doubles per attempt
    pub retry_base_delay: Duration,
    /// Upper bound for a single backoff delay
    pub retry_max_delay: Duration,
}

impl Default for BinancePerpsClientConfig {
    fn default() -> Self {
        Self::for_environment(BinanceEnvironment::default())
    }
}

impl BinancePerpsClientConfig {
    pub fn for_environment(environment: BinanceEnvironment) -> Self {
        Self {
            base_url: environment.rest_base_url().to_string(),
            recv_window: Some(5000),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(250),
            retry_max_delay: Duration::from_secs(5),
        }
    }

    /// Builds a config from `BINANCE_ENVIRONMENT` and `BINANCE_BASE_URL`.
    ///
    /// An explicit base URL wins over the environment's default.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::for_environment(BinanceEnvironment::from_env()?);
        if let Ok(base_url) = std::env::var("BINANCE_BASE_URL") {
            config = config.with_base_url(&base_url)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if url::Url::parse(trimmed).is_err() {
            return Err(Error::Config(format!("invalid base URL {base_url:?}")));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }
}
