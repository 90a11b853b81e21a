//! Safety guard for externally-sourced plans
//!
//! Runs after the validator accepts a plan. `screen` rejects plans with
//! unsafe phrasing outright; `enforce` clamps what can be clamped and reports
//! every change it made.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, info};

use crate::domain::{DiagnoseContext, DiagnosePlan, WaterReading};
use crate::dosing::{self, DosingRequest};

/// Multiplier over the deterministic chlorine dose an external plan may ask for
const CHLORINE_CAP_FACTOR: f64 = 1.5;

/// Minimum retest interval for externally-sourced plans, hours
const MIN_RETEST_HOURS: u32 = 2;

const UNSAFE_PHRASES: [&str; 3] = [r"(?i)combine .*chlorine .*acid", r"(?i)\bno retest", r"(?i)\bskip retest"];

static UNSAFE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&UNSAFE_PHRASES));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                error!(pattern = %p, error = %e, "Invalid unsafe-phrase pattern");
                None
            }
        })
        .collect()
}

fn is_chlorine(chemical: &str) -> bool {
    let chemical = chemical.to_lowercase();
    chemical.contains("chlorine") || chemical.contains("hypochlorite")
}

/// Reject plans that tell the user to do something unsafe
///
/// Returns the offending text on rejection.
pub fn screen(plan: &DiagnosePlan) -> Result<(), String> {
    debug!("screen: called");
    let texts = std::iter::once(plan.diagnosis.as_str())
        .chain(plan.steps.iter().map(String::as_str))
        .chain(plan.safety_notes.iter().map(String::as_str))
        .chain(plan.chemical_additions.iter().map(|a| a.instructions.as_str()));

    for text in texts {
        if UNSAFE_PATTERNS.iter().any(|re| re.is_match(text)) {
            debug!(%text, "screen: unsafe instruction");
            return Err(text.to_string());
        }
    }
    Ok(())
}

/// Numeric part of a free-text amount like "64 oz" or "~1.5"
fn parse_amount(value: &str) -> Option<f64> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Largest chlorine addition in ounces this pool can take, if it can be computed
fn chlorine_cap_oz(context: Option<&DiagnoseContext>) -> Option<f64> {
    let ctx = context?;
    let volume = ctx.pool_volume_gallons?;
    let fc = ctx.latest_reading().fc?;
    let target = (fc + 2.0).clamp(3.0, 8.0);

    let result = dosing::calculate(&DosingRequest {
        pool_volume_gallons: Some(volume),
        readings: WaterReading {
            fc: Some(fc),
            ..Default::default()
        },
        targets: WaterReading {
            fc: Some(target),
            ..Default::default()
        },
        ..Default::default()
    });

    let dose = result.dose("liquid_chlorine")?;
    let cap = (dose.amount * CHLORINE_CAP_FACTOR * 10.0).round() / 10.0;
    debug!(%volume, %fc, %target, %cap, "chlorine_cap_oz: computed");
    Some(cap)
}

/// Clamp an accepted external plan to conservative limits
///
/// Returns one message per adjustment. The adjusted plan still passes the
/// validator.
pub fn enforce(plan: &mut DiagnosePlan, context: Option<&DiagnoseContext>) -> Vec<String> {
    debug!("enforce: called");
    let mut adjustments = Vec::new();

    if let Some(cap) = chlorine_cap_oz(context) {
        for addition in plan.chemical_additions.iter_mut() {
            let is_chlorine_oz = is_chlorine(&addition.chemical) && addition.unit.eq_ignore_ascii_case("oz");
            if let Some(amount) = parse_amount(&addition.amount)
                && is_chlorine_oz
                && amount > cap
            {
                info!(%amount, %cap, chemical = %addition.chemical, "enforce: capping chlorine addition");
                addition.amount = cap.to_string();
                addition.instructions = format!(
                    "{} Capped to conservative threshold using deterministic dosing check.",
                    addition.instructions.trim_end()
                );
                adjustments.push(format!("Capped chlorine addition to {} oz.", cap));
            }
        }
    }

    if plan.retest_in_hours < MIN_RETEST_HOURS {
        info!(hours = plan.retest_in_hours, "enforce: raising retest window");
        plan.retest_in_hours = MIN_RETEST_HOURS;
        adjustments.push(format!(
            "Raised retest window to {} hours minimum for conservative safety.",
            MIN_RETEST_HOURS
        ));
    }

    adjustments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChemicalAddition, Confidence, LatestTest};
    use crate::plan::validator::check;

    fn plan(amount: &str, retest: u32) -> DiagnosePlan {
        DiagnosePlan {
            diagnosis: "Likely low chlorine.".to_string(),
            confidence: Confidence::High,
            steps: vec!["Shock now".to_string()],
            chemical_additions: vec![ChemicalAddition::new("liquid_chlorine_10pct", amount, "oz", "Add now")],
            safety_notes: vec!["Retest in 4 hours".to_string()],
            retest_in_hours: retest,
            when_to_call_pro: vec!["If still cloudy".to_string()],
        }
    }

    fn context(volume: f64, fc: f64) -> DiagnoseContext {
        DiagnoseContext {
            pool_volume_gallons: Some(volume),
            latest_test: Some(LatestTest {
                fc: Some(fc),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("64"), Some(64.0));
        assert_eq!(parse_amount("~1.5 gal"), Some(1.5));
        assert_eq!(parse_amount("a splash"), None);
    }

    #[test]
    fn test_caps_oversized_chlorine() {
        let mut p = plan("500", 4);
        let adjustments = enforce(&mut p, Some(&context(15_000.0, 1.0)));
        // fc 1 -> 3 at 10%: 2 * 15000 / 100000 * 128 = 38.4 oz, cap 57.6
        assert_eq!(p.chemical_additions[0].amount, "57.6");
        assert!(p.chemical_additions[0].instructions.contains("Capped"));
        assert_eq!(adjustments.len(), 1);
        assert!(check(&p).is_ok());
    }

    #[test]
    fn test_leaves_reasonable_chlorine() {
        let mut p = plan("40", 4);
        assert!(enforce(&mut p, Some(&context(15_000.0, 1.0))).is_empty());
        assert_eq!(p.chemical_additions[0].amount, "40");
    }

    #[test]
    fn test_no_cap_without_volume_or_fc() {
        let mut p = plan("500", 4);
        assert!(enforce(&mut p, None).is_empty());
        let ctx = DiagnoseContext {
            pool_volume_gallons: Some(15_000.0),
            ..Default::default()
        };
        assert!(enforce(&mut p, Some(&ctx)).is_empty());
        assert_eq!(p.chemical_additions[0].amount, "500");
    }

    #[test]
    fn test_non_chlorine_untouched() {
        let mut p = plan("500", 4);
        p.chemical_additions[0].chemical = "sodium_bicarbonate".to_string();
        assert!(enforce(&mut p, Some(&context(15_000.0, 1.0))).is_empty());
    }

    #[test]
    fn test_chlorine_in_other_units_untouched() {
        let mut p = plan("500", 4);
        p.chemical_additions[0].chemical = "liquid_chlorine".to_string();
        p.chemical_additions[0].unit = "gal".to_string();
        assert!(enforce(&mut p, Some(&context(15_000.0, 1.0))).is_empty());
        assert_eq!(p.chemical_additions[0].amount, "500");
    }

    #[test]
    fn test_hypochlorite_is_chlorine() {
        assert!(is_chlorine("Sodium Hypochlorite"));
        assert!(is_chlorine("LIQUID_CHLORINE"));
        assert!(!is_chlorine("muriatic_acid"));
    }

    #[test]
    fn test_unsafe_patterns_compile() {
        assert_eq!(UNSAFE_PATTERNS.len(), UNSAFE_PHRASES.len());
    }

    #[test]
    fn test_raises_short_retest() {
        let mut p = plan("10", 1);
        let adjustments = enforce(&mut p, None);
        assert_eq!(p.retest_in_hours, 2);
        assert_eq!(adjustments.len(), 1);
    }

    #[test]
    fn test_screen() {
        assert!(screen(&plan("10", 4)).is_ok());

        let mut p = plan("10", 4);
        p.steps.push("Combine the chlorine with acid in a bucket".to_string());
        assert!(screen(&p).is_err());

        let mut p = plan("10", 4);
        p.chemical_additions[0].instructions = "Add all at once, no retest needed".to_string();
        assert!(screen(&p).is_err());

        let mut p = plan("10", 4);
        p.safety_notes.push("You can skip retesting tomorrow".to_string());
        assert_eq!(screen(&p), Err("You can skip retesting tomorrow".to_string()));
    }

    #[test]
    fn test_screen_allows_fallback_wording() {
        let fallback = crate::plan::fallback::build("cloudy", None);
        assert!(screen(&fallback).is_ok());
    }
}
