use crate::config::AppConfig;
use crate::http::build_client;
use crate::listing::{self, GeneratedCopy};
use crate::llm::LlmClient;
use crate::marketplace::auth::{self, MarketplaceAuthError};
use crate::marketplace::inventory::{self, InventoryItemRequest};
use crate::models::{ListingDraft, ProcessResponse, StageReport, Submission};
use crate::notify::Notifier;
use serde_json::{Value, json};
use std::{future::Future, sync::Arc, time::Instant};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Drives one submission through the listing pipeline:
/// validate -> generate -> extract -> token -> publish -> notify.
/// Every stage failure becomes a structured response; `run` never errors.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<AppConfig>,
    http: reqwest::Client,
    llm: Arc<LlmClient>,
    notifier: Arc<Notifier>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        let http = build_client(&config.http);
        let llm = LlmClient::new(http.clone(), config.llm.clone());
        let notifier = Notifier::new(config.smtp.clone());
        Self {
            config: Arc::new(config),
            http,
            llm: Arc::new(llm),
            notifier: Arc::new(notifier),
        }
    }

    pub async fn run(&self, submission: Submission) -> ProcessResponse {
        let request_id = Uuid::new_v4();
        let mut stages = Vec::new();
        info!(
            target = "hawker.pipeline",
            %request_id,
            source = ?submission.source,
            images = submission.images.len(),
            "submission accepted"
        );

        if let Err(err) = self
            .capture_stage("validate", &mut stages, async {
                stages::validate(&submission)
            })
            .await
        {
            warn!(target = "hawker.pipeline", %request_id, error = %err, "rejected");
            return ProcessResponse::failure(
                err.detail().to_string(),
                err.stage(),
                None,
                None,
                stages,
            );
        }

        let sku = listing::new_sku();

        let generated = match self
            .capture_stage(
                "generate_listing",
                &mut stages,
                stages::generate_listing(&self.llm, &submission),
            )
            .await
        {
            Ok(copy) => copy,
            Err(err) => {
                warn!(target = "hawker.pipeline", %request_id, kind = ?err.kind(), error = %err, "generation failed");
                return ProcessResponse::failure(
                    format!("generation error: {}", err.detail()),
                    err.stage(),
                    None,
                    None,
                    stages,
                );
            }
        };

        let draft = match self
            .capture_stage("extract_draft", &mut stages, async {
                Ok::<_, PipelineError>(stages::extract_draft(&sku, &generated.text))
            })
            .await
        {
            Ok(draft) => draft,
            Err(err) => {
                return ProcessResponse::failure(
                    err.detail().to_string(),
                    err.stage(),
                    Some(sku),
                    None,
                    stages,
                );
            }
        };

        let token = match self
            .capture_stage(
                "acquire_token",
                &mut stages,
                stages::acquire_token(&self.http, &self.config),
            )
            .await
        {
            Ok(token) => token,
            Err(err) => {
                warn!(target = "hawker.pipeline", %request_id, kind = ?err.kind(), error = %err, "token exchange failed");
                return ProcessResponse::failure(
                    format!("token error: {}", err.detail()),
                    err.stage(),
                    None,
                    None,
                    stages,
                );
            }
        };

        if let Err(err) = self
            .capture_stage(
                "publish_inventory",
                &mut stages,
                stages::publish_inventory(&self.http, &self.config, &token, &draft),
            )
            .await
        {
            warn!(target = "hawker.pipeline", %request_id, sku = %draft.sku, error = %err, "publish failed");
            // Partial failure: the generated copy and attempted SKU go back
            // to the caller so the listing can be finished manually.
            return ProcessResponse::failure(
                format!("publish error: {}", err.detail()),
                err.stage(),
                Some(draft.sku.clone()),
                Some(draft),
                stages,
            );
        }

        let message = success_message(&draft);
        let delivered = self
            .capture_stage(
                "notify",
                &mut stages,
                stages::notify(&self.notifier, &submission, &message),
            )
            .await
            .unwrap_or(false);

        info!(
            target = "hawker.pipeline",
            %request_id,
            sku = %draft.sku,
            delivered,
            "submission published"
        );
        ProcessResponse::success(message, draft, stages)
    }

    async fn capture_stage<T, Fut>(
        &self,
        name: &'static str,
        stages: &mut Vec<StageReport>,
        fut: Fut,
    ) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<StageOutcome<T>, PipelineError>>,
    {
        let started = Instant::now();
        let outcome = fut.await?;
        let elapsed_ms = started.elapsed().as_millis();
        crate::metrics::stage_elapsed(name, elapsed_ms);
        stages.push(StageReport::new(name, elapsed_ms, outcome.output));
        Ok(outcome.value)
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {detail}")]
pub struct PipelineError {
    stage: &'static str,
    detail: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    Validation,
    Configuration,
    Upstream,
}

impl PipelineError {
    pub fn validation(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
            kind: PipelineErrorKind::Validation,
        }
    }

    pub fn configuration(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
            kind: PipelineErrorKind::Configuration,
        }
    }

    pub fn upstream(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
            kind: PipelineErrorKind::Upstream,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[derive(Debug)]
pub struct StageOutcome<T> {
    pub value: T,
    pub output: Value,
}

impl<T> StageOutcome<T> {
    fn new(value: T, output: Value) -> Self {
        Self { value, output }
    }
}

fn success_message(draft: &ListingDraft) -> String {
    format!(
        "Listing created!\n\n{}\n\n{}\n\nSKU: {}",
        draft.title, draft.description, draft.sku
    )
}

pub mod stages {
    use super::*;

    pub fn validate(submission: &Submission) -> Result<StageOutcome<()>, PipelineError> {
        if submission.text.trim().is_empty() {
            return Err(PipelineError::validation("validate", "missing text"));
        }
        Ok(StageOutcome::new(
            (),
            json!({
                "source": submission.source,
                "text_chars": submission.text.len(),
                "images": submission.images.len(),
            }),
        ))
    }

    pub async fn generate_listing(
        llm: &LlmClient,
        submission: &Submission,
    ) -> Result<StageOutcome<GeneratedCopy>, PipelineError> {
        let copy = listing::generate_listing(llm, &submission.text, &submission.images)
            .await
            .map_err(|err| PipelineError::upstream("generate_listing", err.to_string()))?;
        Ok(StageOutcome::new(
            copy.clone(),
            json!({
                "generated_chars": copy.text.len(),
                "images_used": copy.images_used,
                "images_skipped": copy.images_skipped,
            }),
        ))
    }

    pub fn extract_draft(sku: &str, generated: &str) -> StageOutcome<ListingDraft> {
        let (title, description) = listing::split_generated(generated, sku);
        let draft = ListingDraft {
            sku: sku.to_string(),
            title,
            description,
        };
        StageOutcome::new(
            draft.clone(),
            json!({
                "sku": draft.sku,
                "title": draft.title,
                "description_chars": draft.description.len(),
            }),
        )
    }

    pub async fn acquire_token(
        http: &reqwest::Client,
        config: &AppConfig,
    ) -> Result<StageOutcome<String>, PipelineError> {
        let token = auth::acquire_access_token(http, &config.marketplace)
            .await
            .map_err(|err| match err {
                MarketplaceAuthError::MissingCredentials => {
                    PipelineError::configuration("acquire_token", err.to_string())
                }
                other => PipelineError::upstream("acquire_token", other.to_string()),
            })?;
        Ok(StageOutcome::new(
            token.clone(),
            json!({
                "token_preview": preview_token(&token),
                "scopes": auth::TOKEN_SCOPES,
            }),
        ))
    }

    pub async fn publish_inventory(
        http: &reqwest::Client,
        config: &AppConfig,
        access_token: &str,
        draft: &ListingDraft,
    ) -> Result<StageOutcome<()>, PipelineError> {
        let payload = InventoryItemRequest::for_draft(draft);
        inventory::upsert_inventory_item(
            http,
            &config.marketplace,
            &draft.sku,
            &payload,
            access_token,
        )
        .await
        .map_err(|err| PipelineError::upstream("publish_inventory", err.to_string()))?;
        Ok(StageOutcome::new(
            (),
            json!({
                "sku": draft.sku,
                "marketplace_id": config.marketplace.marketplace_id,
                "quantity": 1,
                "condition": "NEW",
            }),
        ))
    }

    pub async fn notify(
        notifier: &Notifier,
        submission: &Submission,
        message: &str,
    ) -> Result<StageOutcome<bool>, PipelineError> {
        let delivered = notifier.deliver(submission, message).await;
        Ok(StageOutcome::new(
            delivered,
            json!({
                "channel": submission.source,
                "delivered": delivered,
            }),
        ))
    }

    fn preview_token(token: &str) -> String {
        token.chars().take(6).collect::<String>() + "…"
    }
}
