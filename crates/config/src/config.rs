use std::path::PathBuf;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::btcio::ReaderConfig;

/// Default value for `datadir` in [`Config`].
const DEFAULT_DATADIR: &str = "stela-data";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection to the bitcoind the follower reads from.
    pub bitcoind: BitcoindConfig,

    /// Reader loop tuning.
    #[serde(default)]
    pub reader: ReaderConfig,

    /// The data directory where database contents reside.
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

fn default_datadir() -> PathBuf {
    DEFAULT_DATADIR.into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoindConfig {
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
    pub network: Network,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_label: Option<String>,

    /// Emit logs as JSON instead of the compact human format.
    #[serde(default)]
    pub json_format: bool,

    /// If set, also write rotated log files into this directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses_minimal_toml() {
        let raw = r#"
            [bitcoind]
            rpc_url = "http://localhost:18443"
            rpc_user = "user"
            rpc_password = "password"
            network = "regtest"
        "#;
        let config = Config::from_toml_str(raw).unwrap();
        assert_eq!(config.bitcoind.network, Network::Regtest);
        assert_eq!(config.datadir, PathBuf::from("stela-data"));
        assert_eq!(config.reader.client_poll_dur_ms, 1_000);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_config_reader_overrides() {
        let raw = r#"
            [bitcoind]
            rpc_url = "http://localhost:18443"
            rpc_user = "user"
            rpc_password = "password"
            network = "signet"

            [reader]
            client_poll_dur_ms = 200
        "#;
        let config = Config::from_toml_str(raw).unwrap();
        assert_eq!(config.reader.client_poll_dur_ms, 200);
        assert_eq!(config.reader.retry_base_ms, 500);
    }
}
