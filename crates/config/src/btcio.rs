//! Reader-side tuning knobs.

use serde::{Deserialize, Serialize};

/// Default poll interval for new blocks, in ms.
const DEFAULT_POLL_DUR_MS: u64 = 1_000;

/// Default initial backoff after a failed poll, in ms.
const DEFAULT_RETRY_BASE_MS: u64 = 500;

/// Default cap on the backoff delay, in ms.
const DEFAULT_RETRY_MAX_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Time between polls for new L1 blocks, in ms.
    #[serde(default = "default_poll_dur_ms")]
    pub client_poll_dur_ms: u64,

    /// Initial backoff delay after a failed poll, in ms. Doubles per
    /// consecutive failure.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Upper bound on the backoff delay, in ms.
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            client_poll_dur_ms: DEFAULT_POLL_DUR_MS,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
            retry_max_ms: DEFAULT_RETRY_MAX_MS,
        }
    }
}

fn default_poll_dur_ms() -> u64 {
    DEFAULT_POLL_DUR_MS
}

fn default_retry_base_ms() -> u64 {
    DEFAULT_RETRY_BASE_MS
}

fn default_retry_max_ms() -> u64 {
    DEFAULT_RETRY_MAX_MS
}
