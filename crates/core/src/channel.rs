//! Channel trait: the abstraction over the conversational surface.
//!
//! A Channel accepts utterances from the traveller one at a time, renders
//! the transcript and streamed replies, and offers a one-shot document upload.

use crate::error::ChannelError;
use crate::message::Turn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a channel instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something the user did on the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelInput {
    /// A free-text utterance
    Utterance { content: String },

    /// The user attached a document
    Upload { path: PathBuf },

    /// The user asked to see the whole transcript again
    ShowTranscript,

    /// Start over with an empty session
    Restart,
}

/// An input received from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// The channel this input came from
    pub channel_id: ChannelId,

    /// Sender identifier
    pub sender_id: String,

    /// What the user did
    pub input: ChannelInput,
}

/// The core Channel trait.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "cli").
    fn name(&self) -> &str;

    /// Unique ID for this channel instance.
    fn id(&self) -> &ChannelId;

    /// Start listening for user input.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ChannelMessage, ChannelError>>,
        ChannelError,
    >;

    /// Render a list of turns, role-tagged.
    async fn render_transcript(&self, turns: &[Turn]) -> std::result::Result<(), ChannelError>;

    /// Show the partial reply while it is still streaming.
    async fn render_partial(&self, partial: &str) -> std::result::Result<(), ChannelError>;

    /// Show the finished reply.
    async fn render_reply(&self, reply: &str) -> std::result::Result<(), ChannelError>;

    /// Show an informational notice (e.g. "Destination list loaded!").
    async fn notify(&self, notice: &str) -> std::result::Result<(), ChannelError>;

    /// Show an error line.
    async fn report_error(&self, error: &str) -> std::result::Result<(), ChannelError>;
}
