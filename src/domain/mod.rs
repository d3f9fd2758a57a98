//! Domain layer containing dialogue logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, state machine trait)
//! - `dialogue` - Stage model, decisions, builders and the transition table

pub mod dialogue;
pub mod foundation;
