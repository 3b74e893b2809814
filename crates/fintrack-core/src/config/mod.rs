//! Client configuration for FinTrack interfaces.
//!
//! Carries the safe-to-ship endpoints and knobs needed to reach the
//! FinTrack API. Secret credentials (the session access token) come
//! from the environment at runtime and are never serialized.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::DEFAULT_POLL_INTERVAL;
use crate::util::{is_http_url, normalize_text_option};

/// Runtime configuration for the sync client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the FinTrack API (e.g. `https://api.fintrack.app`).
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Poll cadence for pending sync jobs, in seconds.
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    /// Session access token attached to API requests.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl ClientConfig {
    /// Build configuration from `FINTRACK_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_base_url: normalize_text_option(std::env::var("FINTRACK_API_URL").ok()),
            poll_interval_secs: std::env::var("FINTRACK_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|raw| raw.trim().parse().ok()),
            access_token: normalize_text_option(std::env::var("FINTRACK_ACCESS_TOKEN").ok()),
        }
    }

    /// The normalized API base URL, if one is configured and valid.
    #[must_use]
    pub fn api_base_url(&self) -> Option<String> {
        let url = normalize_text_option(self.api_base_url.clone())?;
        if is_http_url(&url) {
            Some(url.trim_end_matches('/').to_string())
        } else {
            None
        }
    }

    /// Effective poll interval (defaults to the reference 2 seconds).
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_secs
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs)
    }
}
