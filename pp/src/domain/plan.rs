//! Treatment plan records
//!
//! [`DiagnosePlan`] is a plan that has passed validation and may be shown to a
//! user. [`CandidatePlan`] is the loosely-typed shape an external source hands
//! back; it only becomes a `DiagnosePlan` through `plan::validate`.

use serde::{Deserialize, Serialize};

use super::Confidence;

/// One chemical to add as part of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalAddition {
    pub chemical: String,
    pub amount: String,
    pub unit: String,
    pub instructions: String,
}

impl ChemicalAddition {
    pub fn new(
        chemical: impl Into<String>,
        amount: impl Into<String>,
        unit: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            chemical: chemical.into(),
            amount: amount.into(),
            unit: unit.into(),
            instructions: instructions.into(),
        }
    }
}

/// A validated treatment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosePlan {
    pub diagnosis: String,
    pub confidence: Confidence,
    pub steps: Vec<String>,
    pub chemical_additions: Vec<ChemicalAddition>,
    pub safety_notes: Vec<String>,
    pub retest_in_hours: u32,
    pub when_to_call_pro: Vec<String>,
}

/// Where the returned plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Fallback,
    Llm,
}

impl std::fmt::Display for PlanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fallback => write!(f, "fallback"),
            Self::Llm => write!(f, "llm"),
        }
    }
}

/// Chemical addition as received from an external source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateAddition {
    pub chemical: Option<String>,
    pub amount: Option<String>,
    pub unit: Option<String>,
    pub instructions: Option<String>,
}

/// Unvalidated plan as received from an external source
///
/// Missing fields deserialize to empty values so the validator can report
/// which rule they break instead of failing at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidatePlan {
    pub diagnosis: String,
    pub confidence: String,
    pub steps: Vec<String>,
    pub chemical_additions: Vec<CandidateAddition>,
    pub safety_notes: Vec<String>,
    pub retest_in_hours: i64,
    pub when_to_call_pro: Vec<String>,
}

impl From<&ChemicalAddition> for CandidateAddition {
    fn from(a: &ChemicalAddition) -> Self {
        Self {
            chemical: Some(a.chemical.clone()),
            amount: Some(a.amount.clone()),
            unit: Some(a.unit.clone()),
            instructions: Some(a.instructions.clone()),
        }
    }
}

impl From<&DiagnosePlan> for CandidatePlan {
    fn from(plan: &DiagnosePlan) -> Self {
        Self {
            diagnosis: plan.diagnosis.clone(),
            confidence: plan.confidence.to_string(),
            steps: plan.steps.clone(),
            chemical_additions: plan.chemical_additions.iter().map(CandidateAddition::from).collect(),
            safety_notes: plan.safety_notes.clone(),
            retest_in_hours: i64::from(plan.retest_in_hours),
            when_to_call_pro: plan.when_to_call_pro.clone(),
        }
    }
}
