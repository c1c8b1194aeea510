//! Run summary (condaci_summary.json)
//!
//! A small machine-readable record of what a build invocation did, written
//! next to the build output so CI artifact collection picks it up.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version for condaci_summary.json
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "condaci/run_summary@1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub schema_id: String,

    /// Invocation identifier (ULID).
    pub run_id: String,

    pub created_at: DateTime<Utc>,

    /// CI provider name.
    pub provider: String,

    /// Whether the build was triggered by a pull request.
    pub pull_request: bool,

    /// Detected package version, when the build got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Channel the artifact was published to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Whether a binstar upload happened.
    pub uploaded: bool,

    /// PyPI repository the sdist went to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pypi_repository: Option<String>,

    /// Full names of purged channel files.
    pub purged: Vec<String>,

    /// True when the invocation was a duplicate-build no-op.
    pub duplicate_build: bool,
}

impl RunSummary {
    pub fn new(run_id: impl Into<String>, provider: impl Into<String>, pull_request: bool) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            run_id: run_id.into(),
            created_at: Utc::now(),
            provider: provider.into(),
            pull_request,
            version: None,
            channel: None,
            uploaded: false,
            pypi_repository: None,
            purged: Vec::new(),
            duplicate_build: false,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serialization() {
        let mut summary = RunSummary::new("01ARZ3NDEKTSV4RRFFQ69G5FAV", "Travis", false);
        summary.version = Some("1.2.3+2.bbb".to_string());
        summary.channel = Some("develop".to_string());
        summary.uploaded = true;
        summary.purged.push("menpo/pkga/1.2.3+1.aaa/linux-64/x".to_string());

        let json = summary.to_json().unwrap();
        assert!(json.contains(r#""schema_id": "condaci/run_summary@1""#));
        assert!(json.contains(r#""channel": "develop""#));
        assert!(json.contains(r#""uploaded": true"#));

        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, summary.run_id);
        assert_eq!(parsed.purged.len(), 1);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let summary = RunSummary::new("run", "AppVeyor", true);
        let json = summary.to_json().unwrap();
        assert!(!json.contains(r#""version":"#));
        assert!(!json.contains(r#""channel":"#));
        assert!(!json.contains(r#""pypi_repository":"#));
    }
}
