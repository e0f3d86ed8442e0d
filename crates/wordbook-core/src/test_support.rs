//! In-process fakes for the remote collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::remote::{
    StaticTokenProvider, SyncRemote, SyncRequest, SyncResponse, TranslationRemote,
    TranslationResponse,
};
use crate::sync::SessionContext;

pub fn session(user_id: &str) -> SessionContext {
    SessionContext::new(
        user_id,
        Arc::new(StaticTokenProvider::new(Some("test-token".to_string()))),
    )
}

pub fn online() -> ConnectivityMonitor {
    ConnectivityMonitor::with_initial(true)
}

pub fn offline() -> ConnectivityMonitor {
    ConnectivityMonitor::with_initial(false)
}

/// Translator answering from a fixed table; unknown words fail.
#[derive(Default)]
pub struct FakeTranslator {
    responses: Mutex<HashMap<String, TranslationResponse>>,
    calls: AtomicUsize,
}

impl FakeTranslator {
    pub fn with(self, word: &str, translated: &str, tags: &[&str], meanings: &[&[&str]]) -> Self {
        let response = TranslationResponse {
            word: word.to_string(),
            translated_word: translated.to_string(),
            part_of_speech: tags.iter().map(|tag| (*tag).to_string()).collect(),
            english_meanings: meanings
                .iter()
                .map(|glosses| glosses.iter().map(|gloss| (*gloss).to_string()).collect())
                .collect(),
        };
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(word.to_string(), response);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationRemote for FakeTranslator {
    async fn translate(
        &self,
        _token: &str,
        word: &str,
        _target_language: &str,
    ) -> Result<TranslationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(word)
            .cloned()
            .ok_or_else(|| Error::RemoteRejected(format!("no translation for {word}")))
    }
}

/// Sync endpoint that records batches, fails on demand and can hold a
/// push open until released.
#[derive(Default)]
pub struct FakeSyncRemote {
    fail: AtomicBool,
    gated: AtomicBool,
    entered: Notify,
    release: Notify,
    requests: Mutex<Vec<SyncRequest>>,
}

impl FakeSyncRemote {
    pub fn failing() -> Self {
        let remote = Self::default();
        remote.fail.store(true, Ordering::SeqCst);
        remote
    }

    pub fn gated() -> Self {
        let remote = Self::default();
        remote.gated.store(true, Ordering::SeqCst);
        remote
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Wait until a push is in progress.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn pushes(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<SyncRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SyncRemote for FakeSyncRemote {
    async fn push(&self, _token: &str, request: &SyncRequest) -> Result<SyncResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::RemoteRejected("push refused (503)".to_string()));
        }
        Ok(SyncResponse {
            sync_timestamp: "2024-06-01T12:00:00".to_string(),
            success: true,
            message: None,
            processed_operations: u64::try_from(request.operations.len()).ok(),
            failed_operations: Some(0),
        })
    }
}
