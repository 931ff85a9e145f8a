// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Source URL allow-listing.
//!
//! Feeds are fetched by the server on behalf of users, so every source URL is
//! checked against a scheme and host-suffix allow-list before it is stored.

use std::fmt;

use reqwest::Url;

use crate::error::InvalidSourceUrl;

const WEBCAL: &str = "webcal";

/// Scheme and host-suffix allow-list for feed source URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    schemes: Vec<String>,
    host_suffixes: Vec<String>,
}

impl UrlPolicy {
    /// Creates a policy from allowed schemes and host suffixes.
    ///
    /// Entries are compared case-insensitively; a leading dot on a suffix is ignored.
    pub fn new<S, H>(schemes: S, host_suffixes: H) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        let schemes = schemes
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let host_suffixes = host_suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            schemes,
            host_suffixes,
        }
    }

    /// Validates a raw URL, returning the normalized source on success.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSourceUrl`] describing the first rule the URL breaks.
    pub fn validate(&self, raw: &str) -> Result<SourceUrl, InvalidSourceUrl> {
        let raw = raw.trim();
        let parsed = Url::parse(raw).map_err(|e| InvalidSourceUrl::Malformed(e.to_string()))?;

        let scheme = parsed.scheme().to_string();
        if !self.schemes.contains(&scheme) {
            return Err(InvalidSourceUrl::Scheme {
                scheme,
                allowed: self.schemes.join(", "),
            });
        }

        let fetch_url = to_fetch_url(raw, parsed)?;

        if !fetch_url.username().is_empty() || fetch_url.password().is_some() {
            return Err(InvalidSourceUrl::Credentials);
        }

        let host = fetch_url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(InvalidSourceUrl::MissingHost)?
            .trim_end_matches('.')
            .to_ascii_lowercase();
        if !self.host_allowed(&host) {
            return Err(InvalidSourceUrl::Host(host));
        }

        Ok(SourceUrl {
            original: raw.to_string(),
            fetch_url,
        })
    }

    fn host_allowed(&self, host: &str) -> bool {
        self.host_suffixes.iter().any(|suffix| {
            host == suffix
                || host
                    .strip_suffix(suffix.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

// `webcal` is a non-special scheme for the URL parser, so its host is
// opaque. Re-parse as https to get a normalized host.
fn to_fetch_url(raw: &str, parsed: Url) -> Result<Url, InvalidSourceUrl> {
    if parsed.scheme() != WEBCAL {
        return Ok(parsed);
    }
    let rest = raw.get(WEBCAL.len()..).unwrap_or_default();
    Url::parse(&format!("https{rest}")).map_err(|e| InvalidSourceUrl::Malformed(e.to_string()))
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(["https", WEBCAL], ["icloud.com"])
    }
}

/// A feed URL that passed a [`UrlPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    original: String,
    fetch_url: Url,
}

impl SourceUrl {
    /// Rebuilds the source of a feed that passed a [`UrlPolicy`] when it was saved.
    ///
    /// No allow-list applies here, so tightening the policy later does not break
    /// existing feeds; only the `webcal` rewrite is redone.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSourceUrl::Malformed`] if `raw` is not a URL at all.
    pub fn from_stored(raw: &str) -> Result<Self, InvalidSourceUrl> {
        let raw = raw.trim();
        let parsed = Url::parse(raw).map_err(|e| InvalidSourceUrl::Malformed(e.to_string()))?;
        Ok(Self {
            original: raw.to_string(),
            fetch_url: to_fetch_url(raw, parsed)?,
        })
    }

    /// The URL as entered by the user.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The URL actually requested, with `webcal` rewritten to `https`.
    #[must_use]
    pub fn fetch_url(&self) -> &Url {
        &self.fetch_url
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
