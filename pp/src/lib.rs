//! PoolPro - conservative pool water treatment plans
//!
//! PoolPro turns water-test readings and symptom descriptions into treatment
//! recommendations that err on the side of under-dosing.
//!
//! # Core Concepts
//!
//! - **Deterministic dosing**: bounded chemical amounts from volume and readings
//! - **Fallback first**: a rule-based plan is always built and always valid
//! - **Untrusted LLM output**: an optional LLM plan replaces the fallback only
//!   after passing the same validator plus a safety screen
//!
//! # Modules
//!
//! - [`domain`] - readings, pool context, plan records
//! - [`dosing`] - dosing calculator
//! - [`plan`] - fallback builder, validator, safety guard, orchestrator
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`prompts`] - prompt templates
//! - [`server`] - HTTP API
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod dosing;
pub mod llm;
pub mod plan;
pub mod prompts;
pub mod server;

pub use config::{Config, ResolvedLlmConfig};
pub use dosing::{DosingRequest, DosingResult, calculate};
pub use plan::{DiagnoseOutcome, DiagnoseRequest, PlanOrchestrator};
