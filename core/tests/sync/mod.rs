// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of the sync pipeline: fetch, parse, reconcile, store and log.

mod concurrency;
mod feeds;
mod http;
mod reconcile;
mod scheduler;
