//! Fallback plan builder
//!
//! Rule-ordered heuristics that turn symptom text and an optional pool profile
//! into a complete plan with no external dependency. The output must always
//! pass `plan::validate`; it is the plan returned whenever anything else goes
//! wrong.

use tracing::debug;

use crate::domain::{ChemicalAddition, Confidence, DiagnoseContext, DiagnosePlan};

/// Free chlorine below this points at low sanitizer
const LOW_FC_PPM: f64 = 2.0;

/// pH above this should be lowered before more oxidizer goes in
const HIGH_PH: f64 = 7.8;

/// Combined chlorine at or above this needs its own step
const HIGH_CC_PPM: f64 = 0.5;

const LARGE_POOL_GALLONS: f64 = 25_000.0;
const SMALL_POOL_GALLONS: f64 = 10_000.0;

const RETEST_IN_HOURS: u32 = 4;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Baseline liquid chlorine amount in ounces, scaled by pool size
fn chlorine_amount(volume: Option<f64>) -> &'static str {
    match volume {
        Some(v) if v > LARGE_POOL_GALLONS => "96",
        Some(v) if v < SMALL_POOL_GALLONS => "40",
        _ => "64",
    }
}

/// Build the fallback plan
pub fn build(symptoms: &str, context: Option<&DiagnoseContext>) -> DiagnosePlan {
    debug!(symptoms_len = symptoms.len(), has_context = context.is_some(), "build: called");

    let mut diagnosis = "Likely sanitizer imbalance or filtration issue.".to_string();
    let mut confidence = Confidence::Low;
    let mut steps = strings(&[
        "Check and clean filter",
        "Raise free chlorine conservatively",
        "Brush pool walls and circulate",
    ]);

    if !symptoms.trim().is_empty() {
        debug!("build: symptoms present, raising confidence");
        confidence = Confidence::Medium;
    }

    let reading = context.map(DiagnoseContext::latest_reading).unwrap_or_default();

    if let Some(fc) = reading.fc
        && fc < LOW_FC_PPM
    {
        debug!(%fc, "build: low free chlorine");
        diagnosis = "Likely low sanitizer with early algae/organics load.".to_string();
        steps = strings(&[
            "Clean or backwash the filter",
            "Add liquid chlorine in split doses, retesting between additions",
            "Run circulation continuously until the water clears",
        ]);
        confidence = Confidence::Medium;
    }

    if let Some(ph) = reading.ph
        && ph > HIGH_PH
    {
        debug!(%ph, "build: high pH");
        steps.insert(0, "Lower pH before adding more oxidizer".to_string());
    }

    if let Some(cc) = reading.cc
        && cc >= HIGH_CC_PPM
    {
        debug!(%cc, "build: high combined chlorine");
        steps.push("Treat combined chlorine conservatively and retest".to_string());
    }

    let amount = chlorine_amount(context.and_then(|c| c.pool_volume_gallons));
    debug!(%amount, %confidence, steps = steps.len(), "build: done");

    DiagnosePlan {
        diagnosis,
        confidence,
        steps,
        chemical_additions: vec![ChemicalAddition::new(
            "liquid_chlorine_10pct",
            amount,
            "oz",
            "Add half now, retest in 4 hours.",
        )],
        safety_notes: strings(&[
            "Never mix chemicals directly.",
            "Wear gloves and eye protection.",
            "Always retest before additional chemical additions.",
        ]),
        retest_in_hours: RETEST_IN_HOURS,
        when_to_call_pro: strings(&[
            "If strong chlorine odor persists with high combined chlorine",
            "If water remains cloudy after 24-48h",
            "If pump/filter has abnormal pressure or electrical issues",
        ]),
    }
}
