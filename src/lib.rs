//! Socratic Dialogue - Four-stage Socratic tutoring orchestrator
//!
//! Guides a student from an initial stance, through challenge cases and
//! principle reasoning, to a confirmed synthesis. Language-model calls
//! classify each student message and generate the tutor's replies; all
//! stage logic is a pure transition table over a persisted dialogue state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
