use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use sha2::Sha256;
use url::form_urlencoded;

use crate::credentials::Credentials;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// A fully signed request, ready to send.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    /// Base URL, path and signed query string.
    pub url: String,
    /// Carries `X-MBX-APIKEY`.
    pub headers: HeaderMap,
}

/// Builds `timestamp`/`signature` query strings for SIGNED endpoints.
pub struct RequestSigner<'a> {
    credentials: &'a Credentials,
    base_url: &'a str,
    recv_window: Option<u64>,
}

impl<'a> RequestSigner<'a> {
    pub fn new(credentials: &'a Credentials, base_url: &'a str, recv_window: Option<u64>) -> Self {
        Self {
            credentials,
            base_url,
            recv_window,
        }
    }

    /// Signs with the current wall-clock time.
    pub fn sign(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<SignedRequest> {
        self.sign_at(method, path, params, timestamp_ms())
    }

    /// Signs at a fixed timestamp. Same inputs always give the same request.
    pub fn sign_at(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        timestamp_ms: u64,
    ) -> Result<SignedRequest> {
        let query = self.signed_query(params, timestamp_ms)?;

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(self.credentials.api_key())
            .map_err(|_| Error::Config("API key is not a valid header value".into()))?;
        headers.insert(API_KEY_HEADER, api_key);

        Ok(SignedRequest {
            method,
            url: format!("{}{}?{}", self.base_url, path, query),
            headers,
        })
    }

    /// Appends `timestamp` and `recvWindow` when missing, then the signature.
    pub fn signed_query(&self, params: &[(&str, String)], timestamp_ms: u64) -> Result<String> {
        let mut params = params.to_vec();
        if !params.iter().any(|(k, _)| *k == "timestamp") {
            params.push(("timestamp", timestamp_ms.to_string()));
        }
        if let Some(window) = self.recv_window {
            if !params.iter().any(|(k, _)| *k == "recvWindow") {
                params.push(("recvWindow", window.to_string()));
            }
        }

        let query = build_query(&params);
        let sig = sign_query(self.credentials.expose_secret(), &query)?;
        Ok(format!("{}&signature={}", query, sig))
    }
}

/// Milliseconds since the Unix epoch, as Binance expects in `timestamp`.
pub fn timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Encode params as query string (URL-encoded), keeping their order.
/// The signature must be computed over this string.
pub(crate) fn build_query(params: &[(&str, String)]) -> String {
    let mut ser = form_urlencoded::Serializer::new(String::new());
    for (k, v) in params {
        ser.append_pair(k, v);
    }
    ser.finish()
}

/// HMAC-SHA256(secret, query) -> lowercase hex.
pub fn sign_query(api_secret: &str, query: &str) -> Result<String> {
    if api_secret.is_empty() {
        return Err(Error::Config("API secret is empty".into()));
    }
    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .map_err(|e| Error::Config(format!("invalid API secret: {e}")))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
