use std::time::Duration;

use thiserror::Error;

use crate::types::ApiErrorBody;

/// Binance error codes that mean the key, signature or permissions were rejected.
const AUTH_ERROR_CODES: &[i64] = &[
    -1002, // unauthorized
    -1022, // signature for this request is not valid
    -2014, // API-key format invalid
    -2015, // invalid API-key, IP, or permissions for action
];

/// "Invalid symbol."
const INVALID_SYMBOL_CODE: i64 = -1121;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by [`crate::BinancePerpsClient`] and its helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unusable configuration (credentials, base URL, arguments).
    #[error("configuration error: {0}")]
    Config(String),

    /// The exchange rejected the API key or the request signature.
    #[error("authentication rejected (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// The requested symbol does not exist on the exchange.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP 429 or 418 from the exchange.
    #[error("rate limited (HTTP {status}){}", retry_after_suffix(.retry_after))]
    RateLimited {
        status: u16,
        retry_after: Option<Duration>,
    },

    /// Any other non-2xx response.
    #[error("Binance API error (HTTP {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Coarse classification of [`Error`], used by callers to pick exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Auth,
    NotFound,
    Network,
    RateLimited,
    Api,
    Decode,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Network(_) => ErrorKind::Network,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Api { .. } => ErrorKind::Api,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Only transport failures are worth another attempt; an HTTP response,
    /// whatever its status, is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Classify a non-2xx response.
    ///
    /// Binance returns errors as `{"code": -1121, "msg": "Invalid symbol."}`,
    /// but proxies and the 418/429 paths may return anything, so the body is
    /// parsed on a best-effort basis.
    pub(crate) fn from_response(status: u16, retry_after: Option<Duration>, body: &str) -> Self {
        if status == 429 || status == 418 {
            return Self::RateLimited {
                status,
                retry_after,
            };
        }

        let api_error = serde_json::from_str::<ApiErrorBody>(body).ok();
        let (code, message) = match api_error {
            Some(e) => (e.code, e.msg),
            None => (0, body.trim().to_string()),
        };

        if status == 401 || status == 403 || AUTH_ERROR_CODES.contains(&code) {
            return Self::Auth { status, message };
        }
        if code == INVALID_SYMBOL_CODE {
            return Self::NotFound(message);
        }
        Self::Api {
            status,
            code,
            message,
        }
    }
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}
