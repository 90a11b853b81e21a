//! Water chemistry readings and product strengths

use serde::{Deserialize, Serialize};

/// A set of measured (or target) water chemistry values
///
/// Every parameter is optional. No unit conversion happens anywhere: callers
/// supply ppm for chemistry and °F for temperature. Unknown keys are ignored
/// when deserializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterReading {
    /// Free chlorine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fc: Option<f64>,
    /// Combined chlorine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    /// Total alkalinity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ta: Option<f64>,
    /// Calcium hardness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch: Option<f64>,
    /// Cyanuric acid (stabilizer)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cya: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<f64>,
    #[serde(rename = "tempF", alias = "temp", skip_serializing_if = "Option::is_none")]
    pub temp_f: Option<f64>,
}

/// Strengths of the products the owner actually has on hand, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductStrengths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquid_chlorine_percent: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_ignored() {
        let r: WaterReading = serde_json::from_str(r#"{"fc": 1.5, "phosphates": 300}"#).unwrap();
        assert_eq!(r.fc, Some(1.5));
        assert!(r.cya.is_none());
    }

    #[test]
    fn test_temperature_aliases() {
        let a: WaterReading = serde_json::from_str(r#"{"tempF": 82}"#).unwrap();
        let b: WaterReading = serde_json::from_str(r#"{"temp": 82}"#).unwrap();
        assert_eq!(a.temp_f, Some(82.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_product_strengths_camel_case() {
        let s: ProductStrengths = serde_json::from_str(r#"{"liquidChlorinePercent": 12.5}"#).unwrap();
        assert_eq!(s.liquid_chlorine_percent, Some(12.5));
    }
}
