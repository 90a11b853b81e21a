//! Property tests for dosing bounds and plan validation

use proptest::option;
use proptest::prelude::*;

use poolpro::domain::{CandidatePlan, DiagnoseContext, LatestTest, WaterReading};
use poolpro::dosing::{self, DosingRequest, MAX_ALKALINITY_LB, MAX_CHLORINE_OZ, MISSING_VOLUME};
use poolpro::plan::{PlanRejection, check, fallback, validate};

fn chlorine_request(volume: f64, current: f64, rise: f64) -> DosingRequest {
    DosingRequest {
        pool_volume_gallons: Some(volume),
        readings: WaterReading {
            fc: Some(current),
            cya: Some(40.0),
            ..Default::default()
        },
        targets: WaterReading {
            fc: Some(current + rise),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn chlorine_oz(request: &DosingRequest) -> f64 {
    dosing::calculate(request)
        .dose("liquid_chlorine")
        .map(|d| d.amount)
        .unwrap_or(0.0)
}

fn reading() -> impl Strategy<Value = Option<f64>> {
    option::of(0.0f64..200.0)
}

fn context() -> impl Strategy<Value = Option<DiagnoseContext>> {
    let latest = option::of(
        (reading(), reading(), option::of(0.0f64..14.0), reading(), reading(), reading()).prop_map(
            |(fc, cc, ph, ta, ch, cya)| LatestTest {
                fc,
                cc,
                ph,
                ta,
                ch,
                cya,
                ..Default::default()
            },
        ),
    );
    option::of(
        (
            option::of(-1000.0f64..200_000.0),
            option::of("[a-z]{0,10}"),
            option::of(any::<bool>()),
            latest,
        )
            .prop_map(|(pool_volume_gallons, surface_type, is_salt, latest_test)| DiagnoseContext {
                pool_volume_gallons,
                surface_type,
                is_salt,
                latest_test,
                ..Default::default()
            }),
    )
}

fn valid_candidate() -> CandidatePlan {
    CandidatePlan::from(&fallback::build("cloudy water", None))
}

proptest! {
    #[test]
    fn no_volume_means_no_doses(volume in option::of(-100_000.0f64..=0.0), fc in 0.0f64..10.0, rise in 0.1f64..10.0) {
        let mut request = chlorine_request(1.0, fc, rise);
        request.pool_volume_gallons = volume;

        let result = dosing::calculate(&request);
        prop_assert_eq!(result.confidence.as_str(), "Low");
        prop_assert!(result.doses.is_empty());
        prop_assert!(result.missing_fields.iter().any(|f| f == MISSING_VOLUME));
    }

    #[test]
    fn chlorine_dose_is_capped(volume in 1.0f64..2_000_000.0, fc in 0.0f64..10.0, rise in 0.01f64..100.0, strength in option::of(0.1f64..20.0)) {
        let mut request = chlorine_request(volume, fc, rise);
        request.product_strengths.liquid_chlorine_percent = strength;

        let oz = chlorine_oz(&request);
        prop_assert!(oz >= 0.0);
        prop_assert!(oz <= MAX_CHLORINE_OZ);
    }

    #[test]
    fn chlorine_dose_is_monotonic(volume in 1.0f64..200_000.0, fc in 0.0f64..10.0, rise in 0.01f64..20.0, extra in 0.0f64..20.0) {
        let smaller = chlorine_oz(&chlorine_request(volume, fc, rise));
        let larger = chlorine_oz(&chlorine_request(volume, fc, rise + extra));
        prop_assert!(larger >= smaller);
    }

    #[test]
    fn alkalinity_dose_is_capped(volume in 1.0f64..2_000_000.0, ta in 0.0f64..200.0, rise in 0.01f64..500.0) {
        let request = DosingRequest {
            pool_volume_gallons: Some(volume),
            readings: WaterReading { ta: Some(ta), cya: Some(30.0), ..Default::default() },
            targets: WaterReading { ta: Some(ta + rise), ..Default::default() },
            ..Default::default()
        };
        let result = dosing::calculate(&request);
        let lb = result.dose("sodium_bicarbonate").map(|d| d.amount).unwrap_or(0.0);
        prop_assert!(lb <= MAX_ALKALINITY_LB);
    }

    #[test]
    fn dosing_is_idempotent(volume in option::of(-10.0f64..100_000.0), fc in option::of(0.0f64..10.0), target in option::of(0.0f64..10.0), cya in option::of(0.0f64..100.0)) {
        let request = DosingRequest {
            pool_volume_gallons: volume,
            readings: WaterReading { fc, cya, ..Default::default() },
            targets: WaterReading { fc: target, ..Default::default() },
            ..Default::default()
        };
        let first = serde_json::to_string(&dosing::calculate(&request)).unwrap();
        let second = serde_json::to_string(&dosing::calculate(&request)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn dosing_never_high_and_missing_means_low(volume in option::of(-10.0f64..100_000.0), cya in option::of(0.0f64..100.0)) {
        let request = DosingRequest {
            pool_volume_gallons: volume,
            readings: WaterReading { fc: Some(1.0), cya, ..Default::default() },
            targets: WaterReading { fc: Some(3.0), ..Default::default() },
            ..Default::default()
        };
        let result = dosing::calculate(&request);
        prop_assert_ne!(result.confidence.as_str(), "High");
        if !result.missing_fields.is_empty() {
            prop_assert_eq!(result.confidence.as_str(), "Low");
        }
    }

    #[test]
    fn fallback_always_validates(symptoms in ".{0,60}", ctx in context()) {
        let plan = fallback::build(&symptoms, ctx.as_ref());
        prop_assert!(check(&plan).is_ok());
        prop_assert!(validate(&CandidatePlan::from(&plan)).is_ok());
    }

    #[test]
    fn notes_without_retest_are_rejected(notes in prop::collection::vec("[a-qs-z][a-qs-z ]{0,30}", 1..4)) {
        let mut candidate = valid_candidate();
        candidate.safety_notes = notes;
        prop_assert_eq!(validate(&candidate), Err(PlanRejection::MissingRetestGuidance));
    }

    #[test]
    fn unknown_confidence_is_rejected(confidence in "[A-Za-z]{0,10}") {
        prop_assume!(!["High", "Medium", "Low"].contains(&confidence.as_str()));
        let mut candidate = valid_candidate();
        candidate.confidence = confidence.clone();
        prop_assert_eq!(validate(&candidate), Err(PlanRejection::InvalidConfidence(confidence)));
    }

    #[test]
    fn retest_outside_window_is_rejected(hours in prop_oneof![-100i64..1, 49i64..1000]) {
        let mut candidate = valid_candidate();
        candidate.retest_in_hours = hours;
        prop_assert_eq!(validate(&candidate), Err(PlanRejection::RetestOutOfRange(hours)));
    }
}

#[test]
fn scenario_a_chlorine_dose() {
    let request = DosingRequest {
        pool_volume_gallons: Some(10_000.0),
        readings: WaterReading {
            fc: Some(1.0),
            cya: Some(30.0),
            ..Default::default()
        },
        targets: WaterReading {
            fc: Some(3.0),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = dosing::calculate(&request);
    let oz = result.dose("liquid_chlorine").map(|d| d.amount).unwrap();
    assert!(oz > 0.0 && oz <= MAX_CHLORINE_OZ);
    assert!(result.missing_fields.is_empty());
    assert_eq!(result.confidence.as_str(), "Medium");
}
