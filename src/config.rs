use std::{fmt, path::Path, str::FromStr, time::Duration};

use eyre::WrapErr;

use alloy::primitives::TxHash;
use reqwest::Url;
use serde::Deserialize;

use crate::{
    amount::{Amount, AmountRange},
    constants::{
        CONFIG_FILE_PATH, DEFAULT_EXPLORER_URL, DEFAULT_INTERVAL_MINUTES, DEFAULT_MAX_AMOUNT,
        DEFAULT_MIN_AMOUNT, DEFAULT_RPC_URL, DEFAULT_TOKEN_SYMBOL, MAX_INTERVAL_MINUTES,
    },
};

/// Optional overrides read from `data/config.toml`. Keys match the environment variables.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub interval_minutes: Option<u64>,
    pub explorer_url: Option<String>,
    pub token_symbol: Option<String>,
    pub log_rotation: Option<LogRotation>,
}

impl FileConfig {
    async fn read_from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            return Ok(Self::default());
        }

        let cfg_str = tokio::fs::read_to_string(path).await?;
        Ok(toml::from_str(&cfg_str)?)
    }
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

impl FromStr for LogRotation {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            other => eyre::bail!("Unknown LOG_ROTATION value: {other}"),
        }
    }
}

/// Hex-encoded signing key. Never printed.
#[derive(Clone)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_url: Url,
    pub private_key: PrivateKey,
    pub amount_range: AmountRange,
    pub interval_minutes: u64,
    pub explorer_url: String,
    pub token_symbol: String,
    pub log_rotation: LogRotation,
    /// Values that were replaced by defaults while loading. Logged once the logger is up.
    pub warnings: Vec<String>,
}

impl Config {
    /// Reads `data/config.toml` (if present) and overlays the process environment on top of it.
    pub async fn read_default() -> eyre::Result<Self> {
        let file = FileConfig::read_from_file(CONFIG_FILE_PATH)
            .await
            .wrap_err_with(|| format!("Failed to read {CONFIG_FILE_PATH}"))?;

        Self::from_sources(|key| std::env::var(key).ok(), file)
    }

    pub fn from_sources(
        env: impl Fn(&str) -> Option<String>,
        file: FileConfig,
    ) -> eyre::Result<Self> {
        // Empty variables count as unset.
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let private_key = env("PRIVATE_KEY")
            .map(|key| PrivateKey(key.trim().to_owned()))
            .ok_or_else(|| eyre::eyre!("PRIVATE_KEY is required in .env file"))?;

        let rpc_url = env("RPC_URL")
            .or(file.rpc_url)
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_owned());
        let rpc_url = Url::parse(rpc_url.trim())
            .wrap_err_with(|| format!("Invalid RPC_URL '{rpc_url}'"))?;

        let min_amount: Amount = env("MIN_AMOUNT")
            .or(file.min_amount)
            .as_deref()
            .unwrap_or(DEFAULT_MIN_AMOUNT)
            .parse()?;
        let max_amount: Amount = env("MAX_AMOUNT")
            .or(file.max_amount)
            .as_deref()
            .unwrap_or(DEFAULT_MAX_AMOUNT)
            .parse()?;
        let amount_range = AmountRange::new(min_amount, max_amount)?;

        let mut warnings = Vec::new();

        let raw_interval = match env("INTERVAL_MINUTES") {
            Some(value) => Some(value.trim().to_owned()),
            None => file.interval_minutes.map(|minutes| minutes.to_string()),
        };
        let interval_minutes = match raw_interval {
            None => DEFAULT_INTERVAL_MINUTES,
            Some(raw) => match raw.parse::<u64>() {
                Ok(minutes) if (1..=MAX_INTERVAL_MINUTES).contains(&minutes) => minutes,
                _ => {
                    warnings.push(format!(
                        "Invalid INTERVAL_MINUTES '{raw}', falling back to {DEFAULT_INTERVAL_MINUTES}"
                    ));
                    DEFAULT_INTERVAL_MINUTES
                }
            },
        };

        let explorer_url = env("EXPLORER_URL")
            .or(file.explorer_url)
            .unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let token_symbol = env("TOKEN_SYMBOL")
            .or(file.token_symbol)
            .unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_owned());

        let log_rotation = match env("LOG_ROTATION") {
            Some(value) => value.parse()?,
            None => file.log_rotation.unwrap_or_default(),
        };

        Ok(Self {
            rpc_url,
            private_key,
            amount_range,
            interval_minutes,
            explorer_url,
            token_symbol,
            log_rotation,
            warnings,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn tx_url(&self, tx_hash: &TxHash) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    pub(crate) const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn from_vars(vars: &[(&str, &str)], file: FileConfig) -> eyre::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_sources(|key| vars.get(key).cloned(), file)
    }

    pub(crate) fn test_config() -> Config {
        from_vars(&[("PRIVATE_KEY", TEST_PRIVATE_KEY)], FileConfig::default()).unwrap()
    }

    #[test]
    fn applies_defaults() {
        let config = test_config();

        assert_eq!(config.rpc_url.as_str(), "https://tea-sepolia.g.alchemy.com/public");
        assert_eq!(config.amount_range.min().to_string(), "0.001000");
        assert_eq!(config.amount_range.max().to_string(), "0.010000");
        assert_eq!(config.interval_minutes, 1);
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.token_symbol, "TEA");
        assert_eq!(config.log_rotation, LogRotation::Never);
    }

    #[test]
    fn missing_private_key_is_fatal() {
        let err = from_vars(&[], FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("PRIVATE_KEY"));

        let err = from_vars(&[("PRIVATE_KEY", "  ")], FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("PRIVATE_KEY"));
    }

    #[test]
    fn environment_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            RPC_URL = "http://file.example:8545"
            MIN_AMOUNT = "0.5"
            MAX_AMOUNT = "1.5"
            INTERVAL_MINUTES = 10
            TOKEN_SYMBOL = "ETH"
            LOG_ROTATION = "daily"
            "#,
        )
        .unwrap();

        let config = from_vars(
            &[
                ("PRIVATE_KEY", TEST_PRIVATE_KEY),
                ("MAX_AMOUNT", "2"),
                ("INTERVAL_MINUTES", "3"),
            ],
            file,
        )
        .unwrap();

        assert_eq!(config.rpc_url.as_str(), "http://file.example:8545/");
        assert_eq!(config.amount_range.min().to_string(), "0.500000");
        assert_eq!(config.amount_range.max().to_string(), "2.000000");
        assert_eq!(config.interval_minutes, 3);
        assert_eq!(config.token_symbol, "ETH");
        assert_eq!(config.log_rotation, LogRotation::Daily);
    }

    #[test]
    fn invalid_interval_falls_back_to_default() {
        for value in ["abc", "0", "-5", "999999999999999999"] {
            let config = from_vars(
                &[("PRIVATE_KEY", TEST_PRIVATE_KEY), ("INTERVAL_MINUTES", value)],
                FileConfig::default(),
            )
            .unwrap();
            assert_eq!(config.interval_minutes, 1, "{value}");
            assert_eq!(config.interval(), Duration::from_secs(60));
            assert_eq!(config.warnings.len(), 1, "{value}");
            assert!(config.warnings[0].contains(value), "{:?}", config.warnings);
        }
    }

    #[test]
    fn valid_interval_has_no_warnings() {
        let config = from_vars(
            &[("PRIVATE_KEY", TEST_PRIVATE_KEY), ("INTERVAL_MINUTES", "15")],
            FileConfig::default(),
        )
        .unwrap();

        assert_eq!(config.interval(), Duration::from_secs(15 * 60));
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn largest_accepted_interval_does_not_overflow() {
        let max = MAX_INTERVAL_MINUTES.to_string();
        let config = from_vars(
            &[("PRIVATE_KEY", TEST_PRIVATE_KEY), ("INTERVAL_MINUTES", max.as_str())],
            FileConfig::default(),
        )
        .unwrap();

        assert_eq!(config.interval_minutes, MAX_INTERVAL_MINUTES);
        assert_eq!(config.interval().as_secs(), MAX_INTERVAL_MINUTES * 60);
    }

    #[test]
    fn rejects_inverted_amount_range() {
        let result = from_vars(
            &[
                ("PRIVATE_KEY", TEST_PRIVATE_KEY),
                ("MIN_AMOUNT", "0.2"),
                ("MAX_AMOUNT", "0.1"),
            ],
            FileConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_invalid_rpc_url() {
        let result = from_vars(
            &[("PRIVATE_KEY", TEST_PRIVATE_KEY), ("RPC_URL", "not a url")],
            FileConfig::default(),
        );

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Invalid RPC_URL 'not a url'");
        assert_eq!(err.chain().count(), 2);
    }

    #[test]
    fn builds_explorer_links() {
        let config = from_vars(
            &[
                ("PRIVATE_KEY", TEST_PRIVATE_KEY),
                ("EXPLORER_URL", "https://explorer.example/"),
            ],
            FileConfig::default(),
        )
        .unwrap();

        let url = config.tx_url(&TxHash::ZERO);
        assert!(url.starts_with("https://explorer.example/tx/0x0000"));
    }

    #[test]
    fn debug_output_hides_private_key() {
        let debug = format!("{:?}", test_config());
        assert!(!debug.contains("ac0974bec39a17e3"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn parses_log_rotation() {
        assert_eq!("Daily".parse::<LogRotation>().unwrap(), LogRotation::Daily);
        assert_eq!("hourly".parse::<LogRotation>().unwrap(), LogRotation::Hourly);
        assert!("weekly".parse::<LogRotation>().is_err());
    }
}
