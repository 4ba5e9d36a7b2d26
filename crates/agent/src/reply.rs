//! Incremental consumption of a streamed reply.
//!
//! Fragments are concatenated in arrival order. While the stream is open the
//! visible text carries a trailing [`CURSOR`]; once it ends the cursor goes.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use tripcover_core::error::ProviderError;
use tripcover_core::provider::{ChunkReceiver, Usage};

/// Marker shown after partial text while more is expected.
pub const CURSOR: char = '▌';

/// The reply buffer, in progress or complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum ReplyState {
    InProgress(String),
    Complete(String),
}

impl ReplyState {
    pub fn new() -> Self {
        Self::InProgress(String::new())
    }

    /// Accumulated text without the cursor.
    pub fn text(&self) -> &str {
        match self {
            Self::InProgress(text) | Self::Complete(text) => text,
        }
    }

    /// What the user should see right now.
    pub fn display(&self) -> String {
        match self {
            Self::InProgress(text) => format!("{text}{CURSOR}"),
            Self::Complete(text) => text.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Append a fragment. Ignored once complete.
    pub fn push(&mut self, fragment: &str) {
        if let Self::InProgress(text) = self {
            text.push_str(fragment);
        }
    }

    pub fn finish(self) -> Self {
        match self {
            Self::InProgress(text) => Self::Complete(text),
            complete => complete,
        }
    }
}

impl Default for ReplyState {
    fn default() -> Self {
        Self::new()
    }
}

/// How a streamed reply ended.
#[derive(Debug, Clone)]
pub enum ReplyOutcome {
    Complete { text: String, usage: Option<Usage> },
    Cancelled { partial: String },
    Failed { error: ProviderError, partial: String },
}

/// One step of consumption.
#[derive(Debug)]
pub enum ReplyStep {
    /// New text arrived; the state's `display()` has changed.
    Updated,
    Finished(ReplyOutcome),
}

/// A provider stream paired with its reply buffer.
pub struct ReplyStream {
    rx: ChunkReceiver,
    state: ReplyState,
    usage: Option<Usage>,
}

impl ReplyStream {
    pub fn new(rx: ChunkReceiver) -> Self {
        Self {
            rx,
            state: ReplyState::new(),
            usage: None,
        }
    }

    pub fn state(&self) -> &ReplyState {
        &self.state
    }

    /// Wait for the next fragment, the end of the stream, or cancellation.
    /// Empty fragments are skipped without reporting an update.
    pub async fn advance(&mut self, cancel: &CancellationToken) -> ReplyStep {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(chars = self.state.text().len(), "Reply cancelled");
                    return ReplyStep::Finished(ReplyOutcome::Cancelled {
                        partial: self.state.text().to_string(),
                    });
                }
                next = self.rx.recv() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if chunk.usage.is_some() {
                        self.usage = chunk.usage;
                    }
                    if chunk.done {
                        return self.complete();
                    }
                    match chunk.content {
                        Some(fragment) if !fragment.is_empty() => {
                            trace!(len = fragment.len(), "Reply fragment");
                            self.state.push(&fragment);
                            return ReplyStep::Updated;
                        }
                        _ => continue,
                    }
                }
                Some(Err(error)) => {
                    return ReplyStep::Finished(ReplyOutcome::Failed {
                        error,
                        partial: self.state.text().to_string(),
                    });
                }
                None => return self.complete(),
            }
        }
    }

    fn complete(&mut self) -> ReplyStep {
        self.state = std::mem::take(&mut self.state).finish();
        ReplyStep::Finished(ReplyOutcome::Complete {
            text: self.state.text().to_string(),
            usage: self.usage.take(),
        })
    }
}
