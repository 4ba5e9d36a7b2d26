//! Processes one user utterance end to end.

use crate::advisory::AdvisoryPolicy;
use crate::context::{AssemblyInput, ContextAssembler};
use crate::reply::{ReplyOutcome, ReplyStep, ReplyStream};
use crate::session::Session;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tripcover_config::AppConfig;
use tripcover_core::channel::Channel;
use tripcover_core::error::ProviderError;
use tripcover_core::message::Turn;
use tripcover_core::provider::{Provider, ProviderRequest, Usage};
use tripcover_corpus::ReferenceLibrary;

/// Result of a single turn.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The reply was appended to the transcript.
    Replied { text: String, usage: Option<Usage> },
    /// The user cancelled; nothing was appended.
    Cancelled { partial: String },
    /// The completion service failed; nothing was appended.
    Failed(ProviderError),
}

/// Runs turns against a provider using shared reference material.
pub struct TurnRunner {
    /// The completion service
    provider: Arc<dyn Provider>,

    /// Model identifier sent with each request
    model: String,

    temperature: f32,

    max_tokens: Option<u32>,

    /// Reference material, loaded once and shared between sessions
    library: Arc<ReferenceLibrary>,

    policy: AdvisoryPolicy,

    assembler: ContextAssembler,
}

impl TurnRunner {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        library: Arc<ReferenceLibrary>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            library,
            policy: AdvisoryPolicy::default(),
            assembler: ContextAssembler::default(),
        }
    }

    /// Build a runner with model, sampling and advisory settings from config.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        library: Arc<ReferenceLibrary>,
    ) -> Self {
        let runner = Self::new(provider, &config.model, config.temperature, library)
            .with_policy(AdvisoryPolicy::from_config(&config.advisory));
        match config.max_tokens {
            Some(max) => runner.with_max_tokens(max),
            None => runner,
        }
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_policy(mut self, policy: AdvisoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn library(&self) -> &Arc<ReferenceLibrary> {
        &self.library
    }

    /// Process one utterance.
    ///
    /// 1. Append the user turn and fold it into the advisory state
    /// 2. Assemble the context
    /// 3. Stream the reply, rendering each partial on `channel`
    /// 4. Append the reply only if the stream completed
    pub async fn run(
        &self,
        session: &mut Session,
        utterance: &str,
        channel: &dyn Channel,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        session.append(Turn::user(utterance));
        session.advisory = self.policy.derive(utterance, &session.advisory);

        let context = self.assembler.assemble(&AssemblyInput {
            conversation: session.conversation(),
            library: &self.library,
            advisory: &session.advisory,
            uploaded: session.uploaded.as_ref(),
        });

        info!(
            conversation_id = %session.conversation().id,
            turns = context.turns.len(),
            estimated_tokens = context.metadata.total_tokens,
            "Processing turn"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            turns: context.turns,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Reply cancelled before the stream opened");
                return TurnOutcome::Cancelled { partial: String::new() };
            }
            opened = self.provider.stream(request) => opened,
        };
        let rx = match opened {
            Ok(rx) => rx,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Completion request failed");
                return TurnOutcome::Failed(e);
            }
        };

        let mut stream = ReplyStream::new(rx);
        let outcome = loop {
            match stream.advance(cancel).await {
                ReplyStep::Updated => {
                    if let Err(e) = channel.render_partial(&stream.state().display()).await {
                        debug!(error = %e, "Partial render failed");
                    }
                }
                ReplyStep::Finished(outcome) => break outcome,
            }
        };

        match outcome {
            ReplyOutcome::Complete { text, usage } => {
                if let Some(usage) = &usage {
                    debug!(total_tokens = usage.total_tokens, "Reply complete");
                }
                session.append(Turn::assistant(&text));
                TurnOutcome::Replied { text, usage }
            }
            ReplyOutcome::Cancelled { partial } => TurnOutcome::Cancelled { partial },
            ReplyOutcome::Failed { error, partial } => {
                warn!(error = %error, partial_chars = partial.len(), "Reply stream failed");
                TurnOutcome::Failed(error)
            }
        }
    }
}
