//! The advisor turn loop.
//!
//! Each user utterance goes through the same steps:
//!
//! 1. **Append** the utterance to the session transcript
//! 2. **Derive** destination, trip length and the advisory narratives
//! 3. **Assemble** instructions, advisories, reference material and history
//! 4. **Stream** the reply from the provider, rendering partial text
//! 5. **Append** the finished reply (failed or cancelled replies are dropped)

pub mod advisory;
pub mod context;
pub mod persona;
pub mod reply;
pub mod session;
pub mod turn_runner;

#[cfg(test)]
mod test_helpers;

pub use advisory::{AdvisoryPolicy, AdvisoryState};
pub use context::{AssembledContext, AssemblyInput, AssemblyMetadata, ContextAssembler, LayerStats};
pub use reply::{CURSOR, ReplyOutcome, ReplyState, ReplyStep, ReplyStream};
pub use session::Session;
pub use turn_runner::{TurnOutcome, TurnRunner};
