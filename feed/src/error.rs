// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// A source URL rejected by the [`UrlPolicy`](crate::UrlPolicy).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSourceUrl {
    /// The text is not a URL at all.
    #[error("not a valid URL: {0}")]
    Malformed(String),

    /// The scheme is not in the allow-list.
    #[error("scheme `{scheme}` is not allowed, expected one of: {allowed}")]
    Scheme {
        /// The rejected scheme.
        scheme: String,
        /// Comma separated list of allowed schemes.
        allowed: String,
    },

    /// The URL carries no host.
    #[error("URL has no host")]
    MissingHost,

    /// The host does not end with any allowed suffix.
    #[error("host `{0}` is not in the allow-list")]
    Host(String),

    /// The URL embeds a username or password.
    #[error("URLs with embedded credentials are not allowed")]
    Credentials,
}

/// Failure of a single fetch attempt.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("fetch timeout")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The response body exceeds the configured limit.
    #[error("response body exceeds {limit} bytes")]
    TooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// Connection, TLS or protocol error.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(e)
        }
    }
}

/// Failure to read a calendar document as a whole.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The document has no `VCALENDAR` block.
    #[error("document is not an iCalendar feed (no VCALENDAR block)")]
    MissingCalendar,

    /// The iCalendar syntax could not be read.
    #[error("malformed iCalendar document: {0}")]
    Syntax(String),
}
