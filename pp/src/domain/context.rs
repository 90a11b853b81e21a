//! Structured pool profile supplied alongside diagnose symptoms

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::WaterReading;

/// Optional pool profile for a diagnose request
///
/// Every field is independently optional. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DiagnoseContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_volume_gallons: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitizer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_salt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_test: Option<LatestTest>,
}

/// Most recent water test snapshot
///
/// Values may be `null`, which is treated the same as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LatestTest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tested_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cya: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<f64>,
    #[serde(rename = "tempF", skip_serializing_if = "Option::is_none")]
    pub temp_f: Option<f64>,
}

impl LatestTest {
    /// The chemistry values of this test as a reading set
    pub fn reading(&self) -> WaterReading {
        WaterReading {
            fc: self.fc,
            cc: self.cc,
            ph: self.ph,
            ta: self.ta,
            ch: self.ch,
            cya: self.cya,
            salt: self.salt,
            temp_f: self.temp_f,
        }
    }
}

impl DiagnoseContext {
    /// Latest test readings, or an empty reading set
    pub fn latest_reading(&self) -> WaterReading {
        self.latest_test.as_ref().map(LatestTest::reading).unwrap_or_default()
    }
}
