//! Domain types for pool water treatment
//!
//! Everything here is constructed per request and dropped once the response
//! is serialized.

mod confidence;
mod context;
mod plan;
mod reading;

pub use confidence::Confidence;
pub use context::{DiagnoseContext, LatestTest};
pub use plan::{CandidateAddition, CandidatePlan, ChemicalAddition, DiagnosePlan, PlanSource};
pub use reading::{ProductStrengths, WaterReading};
