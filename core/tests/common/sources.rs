// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Feed sources that never touch the network.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shiftsync_feed::{FeedSource, FetchError, SourceUrl};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Status(u16),
    Timeout,
}

/// Serves whatever document the test last set.
#[derive(Debug)]
pub struct ScriptedSource {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            reply: Mutex::new(Reply::Body(body.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_body(&self, body: impl Into<String>) {
        *self.reply.lock().unwrap() = Reply::Body(body.into());
    }

    pub fn fail_with_status(&self, status: u16) {
        *self.reply.lock().unwrap() = Reply::Status(status);
    }

    pub fn fail_with_timeout(&self) {
        *self.reply.lock().unwrap() = Reply::Timeout;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, _url: &SourceUrl) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Body(body) => Ok(body),
            Reply::Status(status) => Err(FetchError::Status(status)),
            Reply::Timeout => Err(FetchError::Timeout),
        }
    }
}

/// Blocks every fetch until the test releases it.
#[derive(Debug)]
pub struct GatedSource {
    body: String,
    entered: Notify,
    release: Notify,
}

#[allow(dead_code)]
impl GatedSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Waits until a fetch is in flight.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets one in-flight fetch complete.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl FeedSource for GatedSource {
    async fn fetch(&self, _url: &SourceUrl) -> Result<String, FetchError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.body.clone())
    }
}
