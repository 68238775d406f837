use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clients_binance::{
    timestamp_ms, AssetBalance, BinanceEnvironment, BinancePerpsClient, BinancePerpsClientConfig,
    Credentials, Error, ErrorKind, ServerTime, TickerPrice,
};

use crate::cli::{Cli, Command};

/// Exit code for missing or unusable configuration. Clap already uses 2 for
/// usage errors.
pub const CONFIG_EXIT_CODE: u8 = 7;

/// Loads credentials, builds the client and runs the selected command.
pub async fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    dotenvy::dotenv().ok();
    run_with_env(cli, out, |name| std::env::var(name).ok()).await
}

/// [`run`] with an arbitrary variable source and no `.env` loading.
///
/// Credentials are checked before anything touches the network.
pub async fn run_with_env<W, F>(cli: &Cli, out: &mut W, lookup: F) -> Result<()>
where
    W: Write,
    F: Fn(&str) -> Option<String>,
{
    let credentials = Credentials::resolve(cli.api_key.clone(), cli.api_secret.clone(), lookup)?;
    let config = client_config(cli)?;
    tracing::info!(base_url = %config.base_url, "using Binance futures endpoint");

    let client = BinancePerpsClient::from_config(credentials, config)?;
    execute(&client, &cli.command, cli.json, out).await
}

fn client_config(cli: &Cli) -> Result<BinancePerpsClientConfig, Error> {
    let mut config = if cli.production {
        BinancePerpsClientConfig::for_environment(BinanceEnvironment::Production)
    } else if cli.testnet {
        BinancePerpsClientConfig::for_environment(BinanceEnvironment::Testnet)
    } else {
        BinancePerpsClientConfig::from_env()?
    };
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(n) = cli.max_retries {
        config.max_retries = n;
    }
    Ok(config)
}

pub async fn execute<W: Write>(
    client: &BinancePerpsClient,
    command: &Command,
    json: bool,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Price { symbol } => {
            let price = client.get_price(symbol).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&price)?)?;
            } else {
                write_price(out, &price)?;
            }
        }
        Command::Balance { non_zero } => {
            let mut balances = client.get_balance().await?;
            if *non_zero {
                balances.retain(|b| !b.is_zero());
            }
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&balances)?)?;
            } else {
                write_balances(out, &balances)?;
            }
        }
        Command::Time => {
            let time = client.get_server_time().await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&time)?)?;
            } else {
                write_server_time(out, &time, timestamp_ms())?;
            }
        }
    }
    Ok(())
}

fn write_price<W: Write>(out: &mut W, price: &TickerPrice) -> std::io::Result<()> {
    writeln!(out, "{} {}", price.symbol, price.price)
}

fn write_balances<W: Write>(out: &mut W, balances: &[AssetBalance]) -> std::io::Result<()> {
    if balances.is_empty() {
        return writeln!(out, "no balances");
    }
    writeln!(out, "{:<8} {:>20} {:>20}", "ASSET", "BALANCE", "AVAILABLE")?;
    for b in balances {
        writeln!(
            out,
            "{:<8} {:>20} {:>20}",
            b.asset, b.balance, b.available_balance
        )?;
    }
    Ok(())
}

fn write_server_time<W: Write>(
    out: &mut W,
    time: &ServerTime,
    local_ms: u64,
) -> std::io::Result<()> {
    let skew = local_ms as i64 - time.server_time as i64;
    writeln!(
        out,
        "server time {} ms (local clock {:+} ms)",
        time.server_time, skew
    )
}

/// Non-zero exit code for a failed command, distinct per error kind.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>().map(Error::kind) {
        Some(ErrorKind::Config) => CONFIG_EXIT_CODE,
        Some(ErrorKind::Auth) => 3,
        Some(ErrorKind::NotFound) => 4,
        Some(ErrorKind::Network) => 5,
        Some(ErrorKind::RateLimited) => 6,
        Some(ErrorKind::Api) | Some(ErrorKind::Decode) | None => 1,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("futures-bot").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_price_command_prints_price() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/ticker/price"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"symbol": "BTCUSDT", "price": "65000.10"})),
            )
            .mount(&mock_server)
            .await;

        let uri = mock_server.uri();
        let cli = cli(&[
            "--api-key",
            "k",
            "--api-secret",
            "s",
            "--base-url",
            uri.as_str(),
            "price",
            "-s",
            "BTCUSDT",
        ]);
        let mut out = Vec::new();
        run(&cli, &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "BTCUSDT 65000.10\n");
    }

    #[tokio::test]
    async fn test_balance_unauthorized_exits_non_zero() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v2/balance"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                serde_json::json!({"code": -2015, "msg": "Invalid API-key, IP, or permissions for action."}),
            ))
            .mount(&mock_server)
            .await;

        let uri = mock_server.uri();
        let cli = cli(&[
            "--api-key",
            "k",
            "--api-secret",
            "s",
            "--base-url",
            uri.as_str(),
            "balance",
        ]);
        let mut out = Vec::new();
        let err = run(&cli, &mut out).await.unwrap_err();

        assert_eq!(exit_code(&err), 3);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let uri = mock_server.uri();
        let cli = cli(&["--base-url", uri.as_str(), "balance"]);
        let mut out = Vec::new();
        let err = run_with_env(&cli, &mut out, |name| {
            (name == clients_binance::API_SECRET_VAR).then(|| "s".to_string())
        })
        .await
        .unwrap_err();

        assert_eq!(exit_code(&err), CONFIG_EXIT_CODE);
        assert!(err.to_string().contains(clients_binance::API_KEY_VAR));
        assert!(out.is_empty());
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balance_non_zero_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v2/balance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"asset": "USDT", "balance": "12.5", "availableBalance": "10.0"},
                {"asset": "BNB", "balance": "0.00000000", "availableBalance": "0.00000000"}
            ])))
            .mount(&mock_server)
            .await;

        let uri = mock_server.uri();
        let cli = cli(&[
            "--api-key",
            "k",
            "--api-secret",
            "s",
            "--base-url",
            uri.as_str(),
            "--json",
            "balance",
            "--non-zero",
        ]);
        let mut out = Vec::new();
        run(&cli, &mut out).await.unwrap();

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let assets: Vec<&str> = printed
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["asset"].as_str().unwrap())
            .collect();
        assert_eq!(assets, vec!["USDT"]);
    }

    #[test]
    fn test_balance_table() {
        let balances: Vec<AssetBalance> = serde_json::from_value(serde_json::json!([
            {"asset": "USDT", "balance": "12.5", "availableBalance": "10.0"}
        ]))
        .unwrap();
        let mut out = Vec::new();
        write_balances(&mut out, &balances).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ASSET"));
        assert!(lines[1].starts_with("USDT"));
        assert!(lines[1].ends_with("10.0"));
    }

    #[test]
    fn test_server_time_shows_skew() {
        let mut out = Vec::new();
        write_server_time(&mut out, &ServerTime { server_time: 1_000 }, 1_250).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "server time 1000 ms (local clock +250 ms)\n"
        );
    }

    #[test]
    fn test_exit_codes_by_kind() {
        let config = anyhow::Error::from(Error::Config("BINANCE_API_KEY is not set".into()));
        assert_eq!(exit_code(&config), CONFIG_EXIT_CODE);

        let not_found = anyhow::Error::from(Error::NotFound("Invalid symbol.".into()));
        assert_eq!(exit_code(&not_found), 4);

        let io = anyhow::Error::from(std::io::Error::other("broken pipe"));
        assert_eq!(exit_code(&io), 1);
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let cli = cli(&["--production", "--base-url", "http://127.0.0.1:9/", "time"]);
        let config = client_config(&cli).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9");
    }

    #[test]
    fn test_production_flag_selects_production() {
        let cli = cli(&["--production", "--timeout-secs", "3", "--max-retries", "0", "time"]);
        let config = client_config(&cli).unwrap();
        assert_eq!(config.base_url, "https://fapi.binance.com");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_retries, 0);
    }
}
