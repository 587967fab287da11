//! Triage Assistant - conversational mental-health triage
//!
//! A small graph engine walks the user through a fixed sequence of stages,
//! classifies how they feel from free text, optionally grounds its generated
//! questions in a knowledge base, and escalates to fixed crisis resources
//! whenever self-harm language appears.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)] // consumed only by our binary

pub mod classifier;
pub mod config;
pub mod console;
pub mod followup;
pub mod graph;
pub mod llm;
pub mod prompts;
pub mod retrieval;
pub mod session;
pub mod stages;
pub mod state;
pub mod workflow;

#[cfg(test)]
pub mod testing;
