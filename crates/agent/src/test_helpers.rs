//! Shared test doubles for turn-runner tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tripcover_core::channel::{Channel, ChannelId, ChannelMessage};
use tripcover_core::error::{ChannelError, ProviderError};
use tripcover_core::message::Turn;
use tripcover_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk,
};

/// A provider that streams a fixed list of fragments, or fails.
///
/// Clones share the recorded requests.
#[derive(Clone)]
pub struct ScriptedProvider {
    fragments: Vec<String>,
    failure: Option<ProviderError>,
    stalled: bool,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl ScriptedProvider {
    pub fn fragments(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            failure: None,
            stalled: false,
            requests: Arc::default(),
        }
    }

    /// A provider whose stream request never gets a response.
    pub fn stalled() -> Self {
        Self {
            fragments: Vec::new(),
            failure: None,
            stalled: true,
            requests: Arc::default(),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            fragments: Vec::new(),
            failure: Some(error),
            stalled: false,
            requests: Arc::default(),
        }
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(ProviderResponse {
            turn: Turn::assistant(self.fragments.concat()),
            usage: None,
            model: request.model,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if self.stalled {
            std::future::pending::<()>().await;
        }
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let (tx, rx) = tokio::sync::mpsc::channel(self.fragments.len() + 1);
        for f in &self.fragments {
            let _ = tx.try_send(Ok(StreamChunk::text(f.clone())));
        }
        let _ = tx.try_send(Ok(StreamChunk::finished(None)));
        Ok(rx)
    }
}

/// A channel that records what was rendered instead of printing it.
pub struct RecordingChannel {
    id: ChannelId,
    partials: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            id: ChannelId("recording".into()),
            partials: Mutex::new(Vec::new()),
        }
    }

    pub fn partials(&self) -> Vec<String> {
        self.partials.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(
        &self,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(rx)
    }

    async fn render_transcript(&self, _turns: &[Turn]) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn render_partial(&self, partial: &str) -> Result<(), ChannelError> {
        self.partials.lock().unwrap().push(partial.to_string());
        Ok(())
    }

    async fn render_reply(&self, _reply: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn notify(&self, _notice: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn report_error(&self, _error: &str) -> Result<(), ChannelError> {
        Ok(())
    }
}
