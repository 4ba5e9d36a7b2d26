//! Context assembly for the completion call.

pub mod assembler;
pub mod token;

pub use assembler::{AssembledContext, AssemblyInput, AssemblyMetadata, ContextAssembler, LayerStats};
