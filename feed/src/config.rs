// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Settings for [`HttpFetcher`](crate::HttpFetcher).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds, covering connect and body.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound for a feed document in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl FetchConfig {
    /// The request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("shiftsync-feed/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}
