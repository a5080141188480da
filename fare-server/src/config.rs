//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::fares::FareClientConfig;

const ADDR: &str = "FARE_SERVER_ADDR";
const STATIONS_PATH: &str = "FARE_STATIONS_PATH";
const CACHE_PATH: &str = "FARE_CACHE_PATH";
const API_URL: &str = "FARE_API_URL";
const API_TIMEOUT_SECS: &str = "FARE_API_TIMEOUT_SECS";
const API_INSECURE_TLS: &str = "FARE_API_INSECURE_TLS";

/// A configuration variable held a value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// Everything the binary needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,
    /// JSON station list
    pub stations_path: PathBuf,
    /// JSON fare cache file
    pub cache_path: PathBuf,
    /// Fare API ticket info endpoint
    pub fare_api_url: String,
    /// Fare API request timeout
    pub fare_api_timeout_secs: u64,
    /// Skip TLS certificate validation for the fare API
    pub fare_api_insecure_tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let client = FareClientConfig::default();
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            stations_path: PathBuf::from("mrt.json"),
            cache_path: PathBuf::from("cache.json"),
            fare_api_url: client.endpoint,
            fare_api_timeout_secs: client.timeout_secs,
            fare_api_insecure_tls: client.accept_invalid_certs,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration from an arbitrary variable source.
    ///
    /// Unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            addr: parse_var(&lookup, ADDR, defaults.addr)?,
            stations_path: lookup(STATIONS_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.stations_path),
            cache_path: lookup(CACHE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            fare_api_url: lookup(API_URL).unwrap_or(defaults.fare_api_url),
            fare_api_timeout_secs: parse_var(
                &lookup,
                API_TIMEOUT_SECS,
                defaults.fare_api_timeout_secs,
            )?,
            fare_api_insecure_tls: match lookup(API_INSECURE_TLS) {
                Some(value) => parse_bool(API_INSECURE_TLS, value)?,
                None => defaults.fare_api_insecure_tls,
            },
        })
    }

    /// Fare API client settings.
    pub fn fare_client_config(&self) -> FareClientConfig {
        FareClientConfig::new()
            .with_endpoint(&self.fare_api_url)
            .with_timeout(self.fare_api_timeout_secs)
            .with_accept_invalid_certs(self.fare_api_insecure_tls)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { key, value }),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.stations_path, PathBuf::from("mrt.json"));
        assert_eq!(config.cache_path, PathBuf::from("cache.json"));
        assert!(!config.fare_api_insecure_tls);
    }

    #[test]
    fn overrides() {
        let config = from_pairs(&[
            (ADDR, "127.0.0.1:3000"),
            (STATIONS_PATH, "/data/mrt.json"),
            (CACHE_PATH, "/var/cache/fares.json"),
            (API_URL, "http://localhost:9000/ticketinfo"),
            (API_TIMEOUT_SECS, "5"),
            (API_INSECURE_TLS, "true"),
        ])
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.stations_path, PathBuf::from("/data/mrt.json"));
        assert_eq!(config.cache_path, PathBuf::from("/var/cache/fares.json"));
        assert_eq!(config.fare_api_url, "http://localhost:9000/ticketinfo");
        assert_eq!(config.fare_api_timeout_secs, 5);
        assert!(config.fare_api_insecure_tls);

        let client = config.fare_client_config();
        assert_eq!(client.endpoint, "http://localhost:9000/ticketinfo");
        assert_eq!(client.timeout_secs, 5);
        assert!(client.accept_invalid_certs);
        assert_eq!(client.language, "tw");
    }

    #[test]
    fn insecure_tls_spellings() {
        for on in ["1", "TRUE", "yes", "On"] {
            assert!(from_pairs(&[(API_INSECURE_TLS, on)]).unwrap().fare_api_insecure_tls);
        }
        for off in ["0", "false", "NO", ""] {
            assert!(!from_pairs(&[(API_INSECURE_TLS, off)]).unwrap().fare_api_insecure_tls);
        }
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = from_pairs(&[(API_TIMEOUT_SECS, "soon")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError {
                key: API_TIMEOUT_SECS,
                value: "soon".into()
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid value for FARE_API_TIMEOUT_SECS: \"soon\""
        );

        assert!(from_pairs(&[(ADDR, "localhost")]).is_err());
        assert!(from_pairs(&[(API_INSECURE_TLS, "maybe")]).is_err());
    }
}
