//! Plan generation and validation
//!
//! - [`fallback`] - deterministic plan that always validates
//! - [`validator`] - gate for candidate plans
//! - [`safety`] - extra screening and clamping for external plans
//! - [`source`] / [`llm_source`] - external plan sources
//! - [`orchestrator`] - composes the above per request

pub mod fallback;
pub mod llm_source;
pub mod orchestrator;
mod request;
pub mod safety;
pub mod schema;
pub mod source;
pub mod validator;

pub use llm_source::{LlmPlanSource, extract_json_object};
pub use orchestrator::{DiagnoseOutcome, ExternalFailure, FALLBACK_WARNING, PlanOrchestrator};
pub use request::{DiagnoseRequest, RequestError};
pub use schema::plan_schema;
pub use source::{ExternalPlanSource, SourceError};
pub use validator::{PlanRejection, check, validate};
