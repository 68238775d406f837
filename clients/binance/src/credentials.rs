use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

pub const API_KEY_VAR: &str = "BINANCE_API_KEY";
pub const API_SECRET_VAR: &str = "BINANCE_API_SECRET";

#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// Loads `BINANCE_API_KEY` and `BINANCE_API_SECRET`, reading `.env` first
    /// if one exists. Explicit values take precedence over the environment.
    pub fn from_env(api_key: Option<String>, api_secret: Option<String>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(api_key, api_secret, |name| std::env::var(name).ok())
    }

    /// Same as [`Credentials::from_env`] with an arbitrary variable source.
    pub fn resolve<F>(
        api_key: Option<String>,
        api_secret: Option<String>,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(api_key, API_KEY_VAR, &lookup)?;
        let api_secret = required(api_secret, API_SECRET_VAR, &lookup)?;
        Ok(Self::new(api_key, api_secret))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Only for signing. Never log the return value.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

fn required<F>(explicit: Option<String>, var: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .or_else(|| lookup(var))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{var} is not set")))
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}
