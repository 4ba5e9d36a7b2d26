//! Conversational surfaces for TripCover.
//!
//! Channels are trait-based; the turn loop only sees `tripcover_core::Channel`.
//!
//! Available channels:
//! - **CLI**: interactive terminal chat (stdin/stdout)

pub mod cli;

pub use cli::{CliChannel, ParsedLine, parse_line};
