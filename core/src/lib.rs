//! Gramux core — compile terminal session descriptions into batched
//! multiplexer commands.
//!
//! The pipeline is strictly forward: the source normalizer turns either
//! surface syntax into one annotated line stream, the section state machine
//! parses it into windows, the compiler joins each window's directives with
//! the layout engine's geometry to produce atomic commands, and the emitter
//! packs those commands into size-bounded batches for the executor. The
//! geometric layout engine and the executor are external collaborators,
//! injected through the traits in [`layout::engine`] and [`emit`].

pub mod compile;
pub mod data;
pub mod emit;
pub mod error;
pub mod infrastructure;
pub mod layout;
pub mod pipeline;
pub mod types;

pub use error::{Attribution, Error, Precision, Result};

/// Name of this program, used as the session name prefix.
pub const PROGRAM: &str = "gramux";
