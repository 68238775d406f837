use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::retry::Backoff;
use crate::signer::{self, RequestSigner};
use crate::types::{AssetBalance, ServerTime, TickerPrice};
use crate::BinancePerpsClientConfig;

const TICKER_PRICE_PATH: &str = "/fapi/v1/ticker/price";
const BALANCE_PATH: &str = "/fapi/v2/balance";
const SERVER_TIME_PATH: &str = "/fapi/v1/time";

const USED_WEIGHT_HEADER: &str = "x-mbx-used-weight-1m";

/// Client for Binance perpetual futures (USDT-M) API.
pub struct BinancePerpsClient {
    client: reqwest::Client,
    credentials: Credentials,
    config: BinancePerpsClientConfig,
}

impl BinancePerpsClient {
    pub fn new(
        client: reqwest::Client,
        credentials: Credentials,
        config: BinancePerpsClientConfig,
    ) -> Self {
        Self {
            client,
            credentials,
            config,
        }
    }

    /// Builds its own HTTP client using the configured timeout.
    pub fn from_config(credentials: Credentials, config: BinancePerpsClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, credentials, config))
    }

    pub fn config(&self) -> &BinancePerpsClientConfig {
        &self.config
    }

    /// Latest price for `symbol`. Public endpoint, not signed.
    pub async fn get_price(&self, symbol: &str) -> Result<TickerPrice> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(Error::Config("symbol must not be empty".into()));
        }
        let params = vec![("symbol", symbol)];
        self.send(TICKER_PRICE_PATH, &params, false).await
    }

    /// Futures account balances, in the order the exchange returns them.
    pub async fn get_balance(&self) -> Result<Vec<AssetBalance>> {
        self.send(BALANCE_PATH, &[], true).await
    }

    pub async fn get_server_time(&self) -> Result<ServerTime> {
        self.send(SERVER_TIME_PATH, &[], false).await
    }

    /// GETs `path`, retrying transport failures with backoff.
    ///
    /// Signed requests are rebuilt on every attempt so the timestamp stays
    /// inside `recvWindow`.
    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        signed: bool,
    ) -> Result<T> {
        let mut backoff = Backoff::new(self.config.retry_base_delay, self.config.retry_max_delay);
        loop {
            let request = if signed {
                let req = RequestSigner::new(
                    &self.credentials,
                    &self.config.base_url,
                    self.config.recv_window,
                )
                .sign(Method::GET, path, params)?;
                self.client
                    .request(req.method, &req.url)
                    .headers(req.headers)
            } else {
                self.client.get(self.public_url(path, params))
            };

            match self.execute(request).await {
                Err(e) if e.is_retryable() && backoff.attempt() < self.config.max_retries => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        path,
                        error = %e,
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(Error::Network)?;

        let status = resp.status();
        let url = resp.url().path().to_string();
        if let Some(weight) = resp
            .headers()
            .get(USED_WEIGHT_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            tracing::debug!(path = %url, used_weight_1m = weight, "request weight");
        }
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = resp.text().await.map_err(Error::Network)?;
        tracing::debug!(path = %url, status = status.as_u16(), body = %body, "response");

        if !status.is_success() {
            let err = Error::from_response(status.as_u16(), retry_after, &body);
            tracing::warn!(path = %url, status = status.as_u16(), error = %err, "request rejected");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(path = %url, error = %e, "failed to parse response");
            Error::Decode(e)
        })
    }

    fn public_url(&self, path: &str, params: &[(&str, String)]) -> String {
        if params.is_empty() {
            format!("{}{}", self.config.base_url, path)
        } else {
            format!(
                "{}{}?{}",
                self.config.base_url,
                path,
                signer::build_query(params)
            )
        }
    }
}
