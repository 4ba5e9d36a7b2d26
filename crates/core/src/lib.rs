//! # TripCover Core
//!
//! Domain types, traits, and error definitions for the TripCover travel
//! insurance assistant. It defines the domain model that all other crates
//! implement against.
//!
//! The completion service and the conversational surface are both traits
//! here; their implementations live in `tripcover-providers` and
//! `tripcover-channels`.

pub mod channel;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, ChannelInput, ChannelMessage};
pub use error::{ChannelError, CorpusError, Error, ProviderError, Result};
pub use message::{Conversation, ConversationId, Role, Turn};
pub use provider::{ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
