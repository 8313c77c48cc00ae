//! One evaluation run, start to finish.
//!
//! ```text
//! RunContext ──► build prompt ──► gateway ──► interpret_for ──► report
//!                                    │              │
//!                                    └──── error ───┴──► fallback::evaluate
//! ```
//!
//! Input errors stop the run. Gateway and parse errors never reach the
//! caller of [`Evaluator::evaluate`]; they are recorded in
//! [`RunOutcome::fallback`] and the heuristic report is returned instead.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use checkmate_extract::TextExtractor;
use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::domain::{
    parse_requirements, CheckmateError, EvaluationReport, ParseFailure, Requirement, Result,
    Strictness,
};
use crate::gateway::{CompletionRequest, GatewayError, ModelGateway};
use crate::metrics::METRICS;
use crate::{fallback, interpret, obs, prompt};

/// Input of one user action. Built fresh per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub run_id: String,
    pub requirements: Vec<Requirement>,
    pub submission: String,
    pub strictness: Strictness,
}

impl RunContext {
    /// Parse newline-separated requirements and validate the input.
    pub fn new(
        requirements_text: &str,
        submission: impl Into<String>,
        strictness: Strictness,
    ) -> Result<Self> {
        Self::from_requirements(parse_requirements(requirements_text), submission, strictness)
    }

    pub fn from_requirements(
        requirements: Vec<Requirement>,
        submission: impl Into<String>,
        strictness: Strictness,
    ) -> Result<Self> {
        let submission = submission.into();
        if requirements.is_empty() {
            return Err(CheckmateError::InvalidInput(
                "at least one requirement is needed".to_string(),
            ));
        }
        if submission.trim().is_empty() {
            return Err(CheckmateError::InvalidInput(
                "submission text is empty".to_string(),
            ));
        }
        Ok(Self {
            run_id: Uuid::new_v4().to_string(),
            requirements,
            submission,
            strictness,
        })
    }
}

/// Lines of a requirements file, in file order. Blank lines are kept here
/// and dropped by [`crate::domain::requirements_from_lines`].
pub fn requirement_lines_from_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Plain text of an uploaded submission file.
pub fn submission_from_file(extractor: &TextExtractor, path: &Path) -> Result<String> {
    let text = extractor.extract_path(path)?;
    debug!(path = %path.display(), chars = text.chars().count(), "submission text extracted");
    Ok(text)
}

/// Where the model path broke down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStage {
    Gateway,
    Parse,
}

impl fmt::Display for FallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackStage::Gateway => f.write_str("gateway"),
            FallbackStage::Parse => f.write_str("parse"),
        }
    }
}

/// Why the heuristic report was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackCause {
    pub stage: FallbackStage,
    /// Stable error tag, e.g. `timeout` or `syntax`
    pub kind: String,
    pub message: String,
    /// Model text when one was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl From<GatewayError> for FallbackCause {
    fn from(err: GatewayError) -> Self {
        FallbackCause {
            stage: FallbackStage::Gateway,
            kind: err.kind().to_string(),
            message: err.to_string(),
            raw_response: None,
        }
    }
}

impl From<ParseFailure> for FallbackCause {
    fn from(failure: ParseFailure) -> Self {
        FallbackCause {
            stage: FallbackStage::Parse,
            kind: failure.kind.to_string(),
            message: failure.to_string(),
            raw_response: Some(failure.raw),
        }
    }
}

/// Everything a run hands back to the renderer.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub requirements: Vec<Requirement>,
    pub report: EvaluationReport,
    /// Exact prompt sent (or that would have been sent, offline)
    pub prompt: String,
    pub raw_response: Option<String>,
    pub fallback: Option<FallbackCause>,
    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Runs evaluations against an optional model gateway.
#[derive(Clone)]
pub struct Evaluator {
    gateway: Option<Arc<dyn ModelGateway>>,
}

impl Evaluator {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            gateway: Some(gateway),
        }
    }

    /// Heuristic-only evaluator; never touches the network.
    pub fn offline() -> Self {
        Self { gateway: None }
    }

    pub fn is_offline(&self) -> bool {
        self.gateway.is_none()
    }

    fn gateway(&self) -> std::result::Result<&Arc<dyn ModelGateway>, GatewayError> {
        self.gateway.as_ref().ok_or(GatewayError::NotConfigured)
    }

    /// Evaluate the submission. Only input errors are returned; model
    /// failures end in the heuristic report.
    pub async fn evaluate(&self, ctx: &RunContext) -> Result<RunOutcome> {
        let span = obs::run_span(&ctx.run_id);
        self.evaluate_inner(ctx).instrument(span).await
    }

    async fn evaluate_inner(&self, ctx: &RunContext) -> Result<RunOutcome> {
        let started = Instant::now();
        let prompt = prompt::build_evaluation_prompt(
            &ctx.requirements,
            &ctx.submission,
            ctx.strictness,
        )?;

        METRICS.inc_runs();
        obs::emit_run_started(
            &ctx.run_id,
            ctx.requirements.len(),
            ctx.submission.chars().count(),
        );

        let mut raw_response = None;
        let model_report = match self.call_model(ctx, &prompt).await {
            Ok(raw) => {
                let parsed = interpret::interpret_for(&raw, &ctx.requirements);
                raw_response = Some(raw);
                parsed.map_err(FallbackCause::from)
            }
            Err(err) => Err(FallbackCause::from(err)),
        };

        let (report, fallback) = match model_report {
            Ok(report) => (report, None),
            Err(cause) => {
                METRICS.inc_fallbacks();
                obs::emit_run_fallback(&ctx.run_id, &cause.stage.to_string(), &cause.message);
                (
                    fallback::evaluate(&ctx.requirements, &ctx.submission),
                    Some(cause),
                )
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        obs::emit_run_finished(
            &ctx.run_id,
            duration_ms,
            report.score(),
            report.overall(),
            report.source(),
        );

        Ok(RunOutcome {
            run_id: ctx.run_id.clone(),
            requirements: ctx.requirements.clone(),
            report,
            prompt,
            raw_response,
            fallback,
            duration_ms,
        })
    }

    async fn call_model(
        &self,
        ctx: &RunContext,
        prompt: &str,
    ) -> std::result::Result<String, GatewayError> {
        let gateway = self.gateway()?;
        let started = Instant::now();
        let raw = gateway.complete(&CompletionRequest::new(prompt)).await?;
        obs::emit_gateway_completed(
            &ctx.run_id,
            started.elapsed().as_millis() as u64,
            raw.chars().count(),
        );
        Ok(raw)
    }

    /// Ask the model for the fully corrected text. Gateway errors are
    /// returned; there is no heuristic correction.
    pub async fn correct(&self, ctx: &RunContext) -> Result<String> {
        let prompt = prompt::build_correction_prompt(&ctx.requirements, &ctx.submission)?;
        let gateway = self.gateway()?;
        let text = gateway
            .complete(&CompletionRequest::new(prompt))
            .instrument(obs::run_span(&ctx.run_id))
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GatewayError::EmptyCompletion.into());
        }
        Ok(text.to_string())
    }
}
