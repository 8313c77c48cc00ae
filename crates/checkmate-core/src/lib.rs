//! Check Mate core library
//!
//! Grades a student submission against a teacher's requirement checklist:
//! - Prompt construction for an OpenAI-compatible chat model
//! - Tolerant interpretation of the model's JSON reply into a typed report
//! - A rule-based fallback when the model call or its reply fails
//! - Report export (JSON, Markdown, plain text)

pub mod domain;
pub mod fallback;
pub mod gateway;
pub mod interpret;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod prompt;
pub mod reporting;
pub mod revision;
pub mod score;
pub mod telemetry;

pub use domain::{
    parse_requirements, requirements_from_lines, CheckmateError, EvaluationReport, ParseFailure,
    ParseFailureKind, ReportSource, Requirement, RequirementResult, Result, Strictness,
    VerdictStatus,
};
pub use gateway::{
    CachedGateway, CompletionRequest, GatewayConfig, GatewayError, ModelGateway, OpenAiGateway,
};
pub use interpret::{interpret, interpret_for};
pub use pipeline::{
    requirement_lines_from_file, submission_from_file, Evaluator, FallbackCause, FallbackStage,
    RunContext, RunOutcome,
};
pub use prompt::{build_correction_prompt, build_evaluation_prompt, SYSTEM_INSTRUCTION};
pub use reporting::{
    render_report_md, render_report_text, write_report_json, write_report_md, ReportArtifact,
};
pub use revision::apply_suggestion;
pub use score::{aggregate, overall_verdict};
pub use telemetry::init_tracing;

/// Check Mate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
