//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for plan generation.
//!
//! Template loading chain:
//! 1. `{llm.prompts-dir}/{name}.pmt` (operator override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{DiagnosePromptContext, PromptLoader};
