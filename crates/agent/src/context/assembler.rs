//! Context assembly: everything the completion service sees for one turn.
//!
//! Layers, first to last:
//!
//! | # | Layer | Included when |
//! |---|-------|---------------|
//! | 1 | Advisor instructions | always |
//! | 2 | Disaster-risk advisory | narrative known |
//! | 3 | Weather forecast | narrative known |
//! | 4 | Destination list | table loaded |
//! | 5 | Policy documents | one per corpus entry, load order |
//! | 6 | Uploaded document | user uploaded one |
//! | 7 | Conversation | always, original order |
//!
//! # Determinism
//!
//! Assembly reads its inputs and builds a fresh turn list. The stored
//! conversation is never touched, and identical inputs produce identical
//! sequences.

use crate::advisory::AdvisoryState;
use crate::context::token;
use crate::persona::ADVISOR_INSTRUCTIONS;
use serde::{Deserialize, Serialize};
use tripcover_core::message::{Conversation, Turn};
use tripcover_corpus::{ReferenceLibrary, UploadedDocument};

/// Everything the assembler reads for a single completion call.
pub struct AssemblyInput<'a> {
    pub conversation: &'a Conversation,
    pub library: &'a ReferenceLibrary,
    pub advisory: &'a AdvisoryState,
    pub uploaded: Option<&'a UploadedDocument>,
}

/// The assembled turn sequence, ready for a provider request.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub turns: Vec<Turn>,
    pub metadata: AssemblyMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// Estimated tokens across every layer.
    pub total_tokens: usize,
    /// Only layers that contributed at least one turn.
    pub per_layer: Vec<LayerStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStats {
    pub name: String,
    pub tokens: usize,
    pub turns: usize,
}

/// Stateless. Create one and reuse it.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    instructions: String,
}

impl ContextAssembler {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    pub fn assemble(&self, input: &AssemblyInput<'_>) -> AssembledContext {
        let mut turns = Vec::new();
        let mut per_layer = Vec::new();

        let mut layer = |name: &str, layer_turns: Vec<Turn>| {
            if layer_turns.is_empty() {
                return;
            }
            per_layer.push(LayerStats {
                name: name.to_string(),
                tokens: token::estimate_turns_tokens(&layer_turns),
                turns: layer_turns.len(),
            });
            turns.extend(layer_turns);
        };

        layer("instructions", vec![Turn::system(&self.instructions)]);

        let advisory = input.advisory;
        layer(
            "disaster_risk",
            advisory
                .disaster_risk
                .iter()
                .map(|risk| Turn::system(format!("Natural disaster risk advisory:\n{risk}")))
                .collect(),
        );
        layer(
            "weather",
            advisory
                .weather
                .iter()
                .map(|weather| Turn::system(weather_text(advisory, weather)))
                .collect(),
        );

        layer(
            "destinations",
            input
                .library
                .destinations
                .iter()
                .map(|table| Turn::system(table.to_context_text()))
                .collect(),
        );
        layer(
            "policies",
            input
                .library
                .corpus
                .entries()
                .iter()
                .map(|entry| Turn::system(entry.to_context_text()))
                .collect(),
        );
        layer(
            "uploaded",
            input
                .uploaded
                .iter()
                .filter(|doc| !doc.text.trim().is_empty())
                .map(|doc| Turn::system(doc.to_context_text()))
                .collect(),
        );

        layer("conversation", input.conversation.turns().to_vec());

        let total_tokens = per_layer.iter().map(|l| l.tokens).sum();
        AssembledContext {
            turns,
            metadata: AssemblyMetadata {
                total_tokens,
                per_layer,
            },
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(ADVISOR_INSTRUCTIONS)
    }
}

fn weather_text(advisory: &AdvisoryState, weather: &str) -> String {
    match (&advisory.destination, &advisory.duration) {
        (Some(destination), Some(duration)) => format!(
            "Latest weather forecast for {destination} ({duration}-day trip):\n{weather}"
        ),
        _ => format!("Latest weather forecast:\n{weather}"),
    }
}
