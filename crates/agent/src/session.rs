//! Per-user conversation state.

use crate::advisory::AdvisoryState;
use crate::persona;
use tripcover_core::message::{Conversation, Turn};
use tripcover_corpus::UploadedDocument;

/// One traveller's session: transcript, derived advisory state and the
/// document they uploaded. Reference material lives elsewhere and is shared.
#[derive(Debug, Clone, Default)]
pub struct Session {
    conversation: Conversation,
    pub advisory: AdvisoryState,
    pub uploaded: Option<UploadedDocument>,
    greeted: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the greeting if the transcript is empty and no greeting was ever
    /// added. Returns whether a greeting was appended.
    pub fn ensure_greeting(&mut self) -> bool {
        if self.greeted || !self.conversation.is_empty() {
            return false;
        }
        self.greeted = true;
        self.conversation.push(Turn::assistant(persona::greeting(&self.advisory)));
        true
    }

    pub fn append(&mut self, turn: Turn) {
        self.conversation.push(turn);
    }

    pub fn all(&self) -> &[Turn] {
        self.conversation.turns()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Replace any previously uploaded document.
    pub fn set_upload(&mut self, doc: UploadedDocument) {
        self.uploaded = Some(doc);
    }
}
