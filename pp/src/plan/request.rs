//! Diagnose request and request-shape validation

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::DiagnoseContext;

pub const MAX_SYMPTOMS_CHARS: usize = 2000;
pub const MAX_PROFILE_TEXT_CHARS: usize = 50;
pub const MAX_POOL_VOLUME_GALLONS: f64 = 1_000_000.0;

/// Request-shape failures, reported to the caller as client errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("poolId is required")]
    MissingPoolId,

    #[error("provide symptoms or context.latestTest")]
    MissingInput,

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: f64, max: f64 },

    #[error("context.poolVolumeGallons must be greater than 0 and at most {max}")]
    InvalidVolume { max: f64 },
}

/// Body of the diagnose operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DiagnoseRequest {
    #[serde(default)]
    pub pool_id: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DiagnoseContext>,
}

fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), RequestError> {
    match value {
        Some(v) if v.trim().chars().count() > max => Err(RequestError::TooLong { field, max }),
        _ => Ok(()),
    }
}

fn check_range(field: &'static str, value: Option<f64>, min: f64, max: f64) -> Result<(), RequestError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => {
            debug!(%field, %v, "check_range: out of range");
            Err(RequestError::OutOfRange { field, min, max })
        }
        _ => Ok(()),
    }
}

impl DiagnoseRequest {
    pub fn new(pool_id: impl Into<String>, symptoms: impl Into<String>, context: Option<DiagnoseContext>) -> Self {
        Self {
            pool_id: pool_id.into(),
            symptoms: symptoms.into(),
            context,
        }
    }

    /// Check the request can be diagnosed at all
    pub fn validate(&self) -> Result<(), RequestError> {
        debug!(pool_id = %self.pool_id, "DiagnoseRequest::validate: called");
        if self.pool_id.trim().is_empty() {
            return Err(RequestError::MissingPoolId);
        }

        let has_test = self.context.as_ref().is_some_and(|c| c.latest_test.is_some());
        if self.symptoms.trim().is_empty() && !has_test {
            return Err(RequestError::MissingInput);
        }

        check_len("symptoms", Some(&self.symptoms), MAX_SYMPTOMS_CHARS)?;

        let Some(ctx) = &self.context else {
            return Ok(());
        };

        if let Some(v) = ctx.pool_volume_gallons
            && !(v > 0.0 && v <= MAX_POOL_VOLUME_GALLONS)
        {
            return Err(RequestError::InvalidVolume {
                max: MAX_POOL_VOLUME_GALLONS,
            });
        }
        check_len("context.surfaceType", ctx.surface_type.as_deref(), MAX_PROFILE_TEXT_CHARS)?;
        check_len("context.sanitizerType", ctx.sanitizer_type.as_deref(), MAX_PROFILE_TEXT_CHARS)?;

        if let Some(t) = &ctx.latest_test {
            check_range("latestTest.fc", t.fc, 0.0, 100.0)?;
            check_range("latestTest.cc", t.cc, 0.0, 30.0)?;
            check_range("latestTest.ph", t.ph, 0.0, 14.0)?;
            check_range("latestTest.ta", t.ta, 0.0, 1000.0)?;
            check_range("latestTest.ch", t.ch, 0.0, 5000.0)?;
            check_range("latestTest.cya", t.cya, 0.0, 500.0)?;
            check_range("latestTest.salt", t.salt, 0.0, 20_000.0)?;
            check_range("latestTest.tempF", t.temp_f, -20.0, 180.0)?;
        }

        Ok(())
    }
}
