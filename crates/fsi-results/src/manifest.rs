//! Run manifest written next to the results of every launched run.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use fsi_project::ProblemDescription;

use crate::{ResultsError, ResultsResult};

pub const MANIFEST_FILE: &str = "manifest.json";

/// What was launched, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub prefix: String,
    /// Hex SHA-256 of the solver input document.
    pub document_sha256: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub steps: usize,
}

/// SHA-256 of a rendered document, lowercase hex.
pub fn document_hash(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl RunManifest {
    pub fn new(desc: &ProblemDescription, document: &str) -> Self {
        Self {
            prefix: desc.prefix.clone(),
            document_sha256: document_hash(document),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            steps: desc.time.step_count(),
        }
    }

    pub fn path(desc: &ProblemDescription) -> PathBuf {
        desc.run_dir().join(MANIFEST_FILE)
    }

    /// Write the manifest under the run directory, which must exist.
    pub fn save(&self, desc: &ProblemDescription) -> ResultsResult<PathBuf> {
        let path = Self::path(desc);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(ResultsError::io(&path))?;
        Ok(path)
    }

    pub fn load(path: &Path) -> ResultsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(ResultsError::io(path))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Whether `document` is the one this manifest was written for.
    pub fn matches(&self, document: &str) -> bool {
        self.document_sha256 == document_hash(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_hex() {
        let h = document_hash("!SetOutputPath={out/}\n");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, document_hash("!SetOutputPath={out/}\n"));
        assert_ne!(h, document_hash("!SetOutputPath={other/}\n"));
    }
}
