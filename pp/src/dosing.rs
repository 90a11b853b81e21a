//! Deterministic dosing calculator
//!
//! Turns pool volume plus current/target readings into bounded, conservative
//! first-step chemical additions. Rule-of-thumb formulas from common pool
//! industry dosing tables; every dose has a hard ceiling that applies no
//! matter what the formula produces.
//!
//! The calculator never fails. Bad or missing input lowers confidence and
//! drops doses instead.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Confidence, ProductStrengths, WaterReading};

/// Liquid chlorine strength assumed when the caller does not say otherwise
pub const DEFAULT_CHLORINE_PERCENT: f64 = 10.0;

/// Hours to wait before testing again
pub const RETEST_IN_HOURS: u32 = 4;

/// Ceiling for a single liquid chlorine addition, fluid ounces
pub const MAX_CHLORINE_OZ: f64 = 512.0;

/// Ceiling for a single sodium bicarbonate addition, pounds
pub const MAX_ALKALINITY_LB: f64 = 25.0;

/// Ceiling for a single muriatic acid addition, fluid ounces
pub const MAX_ACID_OZ: f64 = 64.0;

/// Ceiling for a single calcium chloride addition, pounds
pub const MAX_CALCIUM_LB: f64 = 30.0;

/// Ceiling for a single cyanuric acid addition, ounces
pub const MAX_STABILIZER_OZ: f64 = 128.0;

/// TA assumed for acid demand when no alkalinity reading is supplied
const ASSUMED_TA_FOR_ACID: f64 = 90.0;

pub const MISSING_VOLUME: &str = "poolVolumeGallons";
pub const MISSING_CYA: &str = "cya";

/// Input to [`calculate`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DosingRequest {
    pub pool_volume_gallons: Option<f64>,
    pub readings: WaterReading,
    pub targets: WaterReading,
    pub product_strengths: ProductStrengths,
}

/// One recommended chemical addition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dose {
    pub chemical: String,
    pub amount: f64,
    pub unit: String,
    pub notes: String,
}

impl Dose {
    fn new(chemical: &str, amount: f64, unit: &str, notes: &str) -> Self {
        Self {
            chemical: chemical.to_string(),
            amount,
            unit: unit.to_string(),
            notes: notes.to_string(),
        }
    }
}

/// Output of [`calculate`]
///
/// `doses` is in evaluation order: chlorine, pH reducer, alkalinity, calcium,
/// stabilizer. If `missing_fields` is non-empty, `confidence` is `Low`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosingResult {
    pub confidence: Confidence,
    pub doses: Vec<Dose>,
    pub assumptions: Vec<String>,
    pub safety_notes: Vec<String>,
    pub missing_fields: Vec<String>,
    pub retest_in_hours: u32,
}

impl DosingResult {
    fn empty() -> Self {
        Self {
            confidence: Confidence::Medium,
            doses: Vec::new(),
            assumptions: vec!["Conservative first-step dosing.".to_string()],
            safety_notes: vec!["Always retest before additional dosing.".to_string()],
            missing_fields: Vec::new(),
            retest_in_hours: RETEST_IN_HOURS,
        }
    }

    /// Find the first dose for a chemical
    pub fn dose(&self, chemical: &str) -> Option<&Dose> {
        self.doses.iter().find(|d| d.chemical == chemical)
    }
}

/// Round to one decimal place, half away from zero
fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// `Some(target - current)` when both exist and the target is higher
fn rise(current: Option<f64>, target: Option<f64>) -> Option<f64> {
    match (current, target) {
        (Some(c), Some(t)) if t > c => Some(t - c),
        _ => None,
    }
}

fn chlorine_strength(strengths: &ProductStrengths) -> f64 {
    match strengths.liquid_chlorine_percent {
        Some(p) if p.is_finite() && p > 0.0 => p,
        other => {
            debug!(?other, "chlorine_strength: using default strength");
            DEFAULT_CHLORINE_PERCENT
        }
    }
}

/// Calculate conservative first-step doses
pub fn calculate(request: &DosingRequest) -> DosingResult {
    debug!(volume = ?request.pool_volume_gallons, "calculate: called");
    let mut out = DosingResult::empty();

    let volume = match request.pool_volume_gallons {
        Some(v) if v.is_finite() && v > 0.0 => v,
        other => {
            debug!(?other, "calculate: no usable pool volume");
            out.missing_fields.push(MISSING_VOLUME.to_string());
            out.confidence = Confidence::Low;
            return out;
        }
    };

    let readings = &request.readings;
    let targets = &request.targets;
    let strength = chlorine_strength(&request.product_strengths);

    if let Some(delta) = rise(readings.fc, targets.fc) {
        let oz = ((delta * volume) / (10_000.0 * strength) * 128.0).min(MAX_CHLORINE_OZ);
        debug!(%delta, %strength, %oz, "calculate: chlorine dose");
        out.doses.push(Dose::new("liquid_chlorine", round1(oz), "oz", "Add half, circulate, retest."));
    }

    if let (Some(current), Some(target)) = (readings.ph, targets.ph)
        && current > target
    {
        let ta = readings.ta.unwrap_or(ASSUMED_TA_FOR_ACID);
        let oz = ((current - target) * 12.0 * (ta / 100.0) * (volume / 10_000.0)).clamp(0.0, MAX_ACID_OZ);
        debug!(%current, %target, %ta, %oz, "calculate: acid dose");
        out.doses.push(Dose::new(
            "muriatic_acid",
            round1(oz),
            "oz",
            "Pre-dilute, pour slowly with pump running, retest.",
        ));
    }

    if let Some(delta) = rise(readings.ta, targets.ta) {
        let lb = ((delta / 10.0) * (volume / 10_000.0) * 1.4).min(MAX_ALKALINITY_LB);
        debug!(%delta, %lb, "calculate: alkalinity dose");
        out.doses.push(Dose::new("sodium_bicarbonate", round1(lb), "lb", "Split additions."));
    }

    if let Some(delta) = rise(readings.ch, targets.ch) {
        let lb = ((delta / 10.0) * (volume / 10_000.0) * 1.25).min(MAX_CALCIUM_LB);
        debug!(%delta, %lb, "calculate: calcium dose");
        out.doses.push(Dose::new("calcium_chloride", round1(lb), "lb", "Dissolve first, add in portions."));
    }

    if let Some(delta) = rise(readings.cya, targets.cya) {
        let oz = ((delta / 10.0) * (volume / 10_000.0) * 13.0).min(MAX_STABILIZER_OZ);
        debug!(%delta, %oz, "calculate: stabilizer dose");
        out.doses.push(Dose::new(
            "cyanuric_acid",
            round1(oz),
            "oz",
            "Add via skimmer sock, avoid backwashing for 24-48h.",
        ));
    }

    if readings.cya.is_none() {
        debug!("calculate: no stabilizer reading");
        out.missing_fields.push(MISSING_CYA.to_string());
    }

    if !out.missing_fields.is_empty() {
        out.confidence = Confidence::Low;
    }

    debug!(doses = out.doses.len(), confidence = %out.confidence, "calculate: done");
    out
}
