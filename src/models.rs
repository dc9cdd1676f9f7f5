use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

/// Origin channel of a submission. Adapters set this; the pipeline only
/// branches on it when notifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Email,
    Chat,
    WebForm,
}

/// Canonical submission every channel adapter must produce.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub source: Source,
    pub user_id: String,
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success,
    Error,
}

/// Generated listing copy keyed by the per-submission SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDraft {
    pub sku: String,
    pub title: String,
    pub description: String,
}

/// Terminal payload returned to the adapter for every submission. `draft`
/// is present on success and on publish failure so an operator can finish
/// the listing by hand.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub status: SubmissionStatus,
    pub message: String,
    pub sku: Option<String>,
    pub stage: Option<String>,
    pub draft: Option<ListingDraft>,
    pub stages: Vec<StageReport>,
}

impl ProcessResponse {
    pub fn success(message: String, draft: ListingDraft, stages: Vec<StageReport>) -> Self {
        Self {
            status: SubmissionStatus::Success,
            message,
            sku: Some(draft.sku.clone()),
            stage: None,
            draft: Some(draft),
            stages,
        }
    }

    pub fn failure(
        message: String,
        stage: &str,
        sku: Option<String>,
        draft: Option<ListingDraft>,
        stages: Vec<StageReport>,
    ) -> Self {
        Self {
            status: SubmissionStatus::Error,
            message,
            sku,
            stage: Some(stage.to_string()),
            draft,
            stages,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}
