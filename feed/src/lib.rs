// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Remote calendar feeds: source URL allow-listing, HTTP retrieval and ICS normalization.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

mod config;
mod error;
mod fetch;
mod parse;
mod url;

pub use crate::config::FetchConfig;
pub use crate::error::{FetchError, InvalidSourceUrl, ParseError};
pub use crate::fetch::{FeedSource, HttpFetcher};
pub use crate::parse::{ExternalEvent, parse_feed};
pub use crate::url::{SourceUrl, UrlPolicy};
