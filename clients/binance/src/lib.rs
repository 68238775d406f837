mod config;
mod credentials;
mod error;
mod perps;
mod retry;
mod signer;
mod types;

pub use config::{BinanceEnvironment, BinancePerpsClientConfig};
pub use credentials::{Credentials, API_KEY_VAR, API_SECRET_VAR};
pub use error::{Error, ErrorKind, Result};
pub use perps::BinancePerpsClient;
pub use signer::{sign_query, timestamp_ms, RequestSigner, SignedRequest, API_KEY_HEADER};
pub use types::{AssetBalance, ServerTime, TickerPrice};
