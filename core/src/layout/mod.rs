//! Layout concerns — the contract with the external geometry engine.
//!
//! The engine that decomposes a windowgram into rectangular panes and a
//! binary split sequence ships separately; this module defines the types
//! and trait it is consumed through.

pub mod engine;
