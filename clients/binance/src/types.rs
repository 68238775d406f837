use serde::{Deserialize, Serialize};

/// Latest price for a symbol, from `GET /fapi/v1/ticker/price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
    /// Transaction time in milliseconds since Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

/// One asset of the futures account, from `GET /fapi/v2/balance`.
///
/// Decimal amounts are kept as the strings Binance sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    #[serde(default)]
    pub account_alias: String,
    pub asset: String,
    pub balance: String,
    #[serde(default)]
    pub cross_wallet_balance: String,
    #[serde(default)]
    pub cross_un_pnl: String,
    #[serde(default)]
    pub available_balance: String,
    #[serde(default)]
    pub max_withdraw_amount: String,
    #[serde(default)]
    pub margin_available: bool,
    #[serde(default)]
    pub update_time: u64,
}

impl AssetBalance {
    /// True when the wallet balance parses as exactly zero.
    pub fn is_zero(&self) -> bool {
        self.balance
            .parse::<f64>()
            .map(|b| b == 0.0)
            .unwrap_or(false)
    }
}

/// Exchange clock, from `GET /fapi/v1/time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: u64,
}

/// Error payload Binance attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}
