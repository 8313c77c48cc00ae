//! Structured lifecycle events for evaluation runs.
//!
//! Every event carries `event` and `run_id` fields so a run can be followed
//! through JSON logs (`checkmate --json`).

use tracing::{info, warn};

use crate::domain::{ReportSource, VerdictStatus};

/// Run-scoped span. Attach it to the run future with
/// [`tracing::Instrument::instrument`]; an entered guard must not be held
/// across `.await`.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("checkmate.run", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str, requirements: usize, submission_chars: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        requirements = requirements,
        submission_chars = submission_chars,
    );
}

pub fn emit_gateway_completed(run_id: &str, elapsed_ms: u64, response_chars: usize) {
    info!(
        event = "gateway.completed",
        run_id = %run_id,
        elapsed_ms = elapsed_ms,
        response_chars = response_chars,
    );
}

/// The heuristic evaluator took over (warning level).
pub fn emit_run_fallback(run_id: &str, stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "run.fallback", run_id = %run_id, stage = %stage, error = %error);
}

pub fn emit_run_finished(
    run_id: &str,
    duration_ms: u64,
    score: u8,
    overall: VerdictStatus,
    source: ReportSource,
) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        score = score,
        overall = ?overall,
        source = ?source,
    );
}
