use std::time::Duration;

use interfaces_exchange_ticker::index::DEFAULT_BASE_URL;
use interfaces_zcoin_rpc::index::ZcoinRpcConfig;
use thiserror::Error;
use utils_trace::LogFormat;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc: ZcoinRpcConfig,
    pub exchange_base_url: String,
    pub public_couchdb: String,
    pub couchdb_url: String,
    pub port: u16,
    pub debug: bool,
    pub cache_max_age: chrono::Duration,
    pub refresh_interval: Duration,
    pub refresh_spread: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv()?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing { key });

        let rpc = ZcoinRpcConfig {
            protocol: var("ZCOIN_RPC_PROTOCOL", "http"),
            host: var("ZCOIN_RPC_HOST", "127.0.0.1"),
            port: parse(&lookup, "ZCOIN_RPC_PORT", 8888)?,
            user: required("ZCOIN_RPC_USER")?,
            password: required("ZCOIN_RPC_PASSWORD")?,
        };
        if rpc.protocol != "http" && rpc.protocol != "https" {
            return Err(ConfigError::Invalid {
                key: "ZCOIN_RPC_PROTOCOL",
                value: rpc.protocol,
            });
        }

        let max_age_mins: i64 = parse(&lookup, "CACHE_MAX_AGE_MINS", 60)?;
        let cache_max_age = chrono::Duration::try_minutes(max_age_mins)
            .filter(|age| *age > chrono::Duration::zero())
            .ok_or(ConfigError::Invalid {
                key: "CACHE_MAX_AGE_MINS",
                value: max_age_mins.to_string(),
            })?;

        let refresh_interval_secs: u64 = parse(&lookup, "REFRESH_INTERVAL_SECS", 60)?;
        if refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REFRESH_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let log_format_raw = var("LOG_FORMAT", "compact");
        let log_format: LogFormat = log_format_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "LOG_FORMAT",
            value: log_format_raw.clone(),
        })?;

        Ok(Self {
            rpc,
            exchange_base_url: var("EXCHANGE_BASE_URL", DEFAULT_BASE_URL),
            public_couchdb: var("PUBLIC_COUCHDB", ""),
            couchdb_url: var("COUCHDB_URL", "http://127.0.0.1:5984"),
            port: parse(&lookup, "PORT", 5000)?,
            debug: parse_bool(&lookup, "DEBUG")?,
            cache_max_age,
            refresh_interval: Duration::from_secs(refresh_interval_secs),
            refresh_spread: Duration::from_secs(parse(&lookup, "REFRESH_SPREAD_SECS", 55)?),
            log_format,
        })
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

/// Loads `.env` when present. A missing file is fine; an unreadable or malformed one is not.
fn load_dotenv() -> Result<(), ConfigError> {
    dotenv_outcome(dotenvy::dotenv().map(|_| ()))
}

fn dotenv_outcome(loaded: Result<(), dotenvy::Error>) -> Result<(), ConfigError> {
    match loaded {
        Ok(()) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(source) => Err(ConfigError::DotEnv { source }),
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {key}")]
    Missing {
        key: &'static str,
    },

    #[error("Invalid value for {key}: {value}")]
    Invalid {
        key: &'static str,
        value: String,
    },

    #[error("DotEnv: {source}")]
    DotEnv {
        source: dotenvy::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = Config::from_lookup(lookup_from(&[
            ("ZCOIN_RPC_USER", "zcoinrpc"),
            ("ZCOIN_RPC_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.rpc.url(), "http://127.0.0.1:8888/");
        assert_eq!(config.port, 5000);
        assert!(!config.debug);
        assert_eq!(config.cache_max_age, chrono::Duration::minutes(60));
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.refresh_spread, Duration::from_secs(55));
        assert_eq!(config.exchange_base_url, "https://bittrex.com");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn missing_credentials_are_reported() {
        let err = Config::from_lookup(lookup_from(&[("ZCOIN_RPC_USER", "zcoinrpc")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "ZCOIN_RPC_PASSWORD" }));
    }

    #[test]
    fn bad_values_are_rejected() {
        let base = [("ZCOIN_RPC_USER", "u"), ("ZCOIN_RPC_PASSWORD", "p")];

        let err = Config::from_lookup(lookup_from(&[base[0], base[1], ("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = Config::from_lookup(lookup_from(&[base[0], base[1], ("DEBUG", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DEBUG", .. }));

        let err = Config::from_lookup(lookup_from(&[base[0], base[1], ("CACHE_MAX_AGE_MINS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CACHE_MAX_AGE_MINS", .. }));

        let err = Config::from_lookup(lookup_from(&[base[0], base[1], ("ZCOIN_RPC_PROTOCOL", "ftp")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ZCOIN_RPC_PROTOCOL", .. }));
    }

    #[test]
    fn only_a_missing_dotenv_is_ignored() {
        let missing = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(dotenv_outcome(Err(missing)).is_ok());

        let malformed = dotenvy::Error::LineParse("ZCOIN_RPC_USER='u".to_string(), 15);
        assert!(matches!(
            dotenv_outcome(Err(malformed)),
            Err(ConfigError::DotEnv { .. })
        ));
    }

    #[tokio::test]
    async fn huge_cache_max_age_reads_without_overflow() {
        let config = Config::from_lookup(lookup_from(&[
            ("ZCOIN_RPC_USER", "u"),
            ("ZCOIN_RPC_PASSWORD", "p"),
            ("CACHE_MAX_AGE_MINS", "100000000000000"),
        ]))
        .unwrap();

        let cache = crate::cache::CacheStore::new();
        cache.put("winners", serde_json::json!([])).await;
        let value = cache.get("winners", config.cache_max_age).await.unwrap();
        assert_eq!(value, Some(serde_json::json!([])));
    }

    #[test]
    fn debug_switches_log_level() {
        let config = Config::from_lookup(lookup_from(&[
            ("ZCOIN_RPC_USER", "u"),
            ("ZCOIN_RPC_PASSWORD", "p"),
            ("DEBUG", "True"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
