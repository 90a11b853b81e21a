//! Plan validator
//!
//! Gates every externally-sourced plan before it can reach a user. Rules are
//! checked in a fixed order and the first failure is reported.

use thiserror::Error;
use tracing::debug;

use crate::domain::{CandidatePlan, ChemicalAddition, Confidence, DiagnosePlan};

pub const MIN_RETEST_HOURS: i64 = 1;
pub const MAX_RETEST_HOURS: i64 = 48;

/// Why a candidate plan was rejected, one variant per rule in check order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanRejection {
    #[error("diagnosis is required")]
    MissingDiagnosis,

    #[error("confidence must be one of High, Medium, Low (got {0:?})")]
    InvalidConfidence(String),

    #[error("steps must contain at least one non-empty entry")]
    InvalidSteps,

    #[error("chemical addition {index} must have non-empty chemical, amount, unit and instructions")]
    IncompleteChemicalAddition { index: usize },

    #[error("safety notes must be non-empty and include retest guidance")]
    MissingRetestGuidance,

    #[error("retest_in_hours must be between 1 and 48 (got {0})")]
    RetestOutOfRange(i64),

    #[error("when_to_call_pro must contain at least one non-empty entry")]
    InvalidWhenToCallPro,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn all_present(items: &[String]) -> bool {
    !items.is_empty() && items.iter().all(|s| !is_blank(s))
}

fn present(field: &Option<String>) -> Option<String> {
    field.as_deref().filter(|s| !is_blank(s)).map(str::to_string)
}

/// Validate a candidate plan, producing the typed plan on success
pub fn validate(candidate: &CandidatePlan) -> Result<DiagnosePlan, PlanRejection> {
    debug!(
        steps = candidate.steps.len(),
        additions = candidate.chemical_additions.len(),
        "validate: called"
    );

    if is_blank(&candidate.diagnosis) {
        return Err(PlanRejection::MissingDiagnosis);
    }

    let confidence: Confidence = candidate
        .confidence
        .parse()
        .map_err(|_| PlanRejection::InvalidConfidence(candidate.confidence.clone()))?;

    if !all_present(&candidate.steps) {
        return Err(PlanRejection::InvalidSteps);
    }

    let mut additions = Vec::with_capacity(candidate.chemical_additions.len());
    for (index, a) in candidate.chemical_additions.iter().enumerate() {
        match (
            present(&a.chemical),
            present(&a.amount),
            present(&a.unit),
            present(&a.instructions),
        ) {
            (Some(chemical), Some(amount), Some(unit), Some(instructions)) => {
                additions.push(ChemicalAddition {
                    chemical,
                    amount,
                    unit,
                    instructions,
                });
            }
            _ => {
                debug!(%index, "validate: incomplete chemical addition");
                return Err(PlanRejection::IncompleteChemicalAddition { index });
            }
        }
    }

    if !all_present(&candidate.safety_notes)
        || !candidate
            .safety_notes
            .iter()
            .any(|note| note.to_lowercase().contains("retest"))
    {
        return Err(PlanRejection::MissingRetestGuidance);
    }

    if !(MIN_RETEST_HOURS..=MAX_RETEST_HOURS).contains(&candidate.retest_in_hours) {
        return Err(PlanRejection::RetestOutOfRange(candidate.retest_in_hours));
    }

    if !all_present(&candidate.when_to_call_pro) {
        return Err(PlanRejection::InvalidWhenToCallPro);
    }

    debug!(%confidence, "validate: accepted");
    Ok(DiagnosePlan {
        diagnosis: candidate.diagnosis.clone(),
        confidence,
        steps: candidate.steps.clone(),
        chemical_additions: additions,
        safety_notes: candidate.safety_notes.clone(),
        retest_in_hours: candidate.retest_in_hours as u32,
        when_to_call_pro: candidate.when_to_call_pro.clone(),
    })
}

/// Re-check an already typed plan against the same rules
pub fn check(plan: &DiagnosePlan) -> Result<(), PlanRejection> {
    validate(&CandidatePlan::from(plan)).map(|_| ())
}
