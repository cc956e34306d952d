//! Operation result model

use crate::scan::ScanOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Failure,
}

/// Structured result of one invocation. Built exactly once and returned to
/// the caller as-is.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            status: OperationStatus::Success,
            image_digest: None,
            namespaces: None,
            scan: None,
            error_message: None,
            note: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Failure,
            image_digest: None,
            namespaces: None,
            scan: None,
            error_message: Some(message.into()),
            note: None,
        }
    }

    pub fn with_digest(mut self, digest: Option<String>) -> Self {
        self.image_digest = digest;
        self
    }

    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    pub fn with_scan(mut self, scan: Option<ScanOutcome>) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
