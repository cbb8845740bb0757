//! Request DTOs for the relay API

use serde::Deserialize;

use crate::error::Result;
use crate::validators::AlertSeverity;

/// Query string of `GET /alerts/:state`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertsQuery {
    /// Optional severity filter (Extreme, Severe, Moderate, Minor)
    #[serde(default)]
    pub severity: Option<String>,
}

impl AlertsQuery {
    /// Parses the severity filter. Blank values mean no filter.
    pub fn severity(&self) -> Result<Option<AlertSeverity>> {
        match self.severity.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}
