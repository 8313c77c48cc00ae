use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{EvaluationReport, ReportSource, Requirement, VerdictStatus};
use crate::pipeline::{FallbackCause, RunOutcome};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// One requirement in the exported report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportItemArtifact {
    pub index: u32,
    pub condition_text: String,
    pub status: VerdictStatus,
    pub reason: String,
    pub suggestion: String,
    pub evidence_excerpts: Vec<String>,
}

/// Exported evaluation report (`report.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub source: ReportSource,
    pub score: u8,
    pub overall: VerdictStatus,
    pub summary: String,
    pub items: Vec<ReportItemArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackCause>,
}

impl ReportArtifact {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        Self::from_parts(
            &outcome.run_id,
            &outcome.requirements,
            &outcome.report,
            outcome.fallback.clone(),
            Utc::now(),
        )
    }

    pub fn from_parts(
        run_id: &str,
        requirements: &[Requirement],
        report: &EvaluationReport,
        fallback: Option<FallbackCause>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let items = report
            .results()
            .iter()
            .map(|r| ReportItemArtifact {
                index: r.requirement_index,
                condition_text: requirements
                    .iter()
                    .find(|req| req.index == r.requirement_index)
                    .map(|req| req.text.clone())
                    .unwrap_or_default(),
                status: r.status,
                reason: r.reason.clone(),
                suggestion: r.suggestion.clone(),
                evidence_excerpts: r.evidence_excerpts.clone(),
            })
            .collect();

        ReportArtifact {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at,
            run_id: run_id.to_string(),
            source: report.source(),
            score: report.score(),
            overall: report.overall(),
            summary: report.summary().to_string(),
            items,
            fallback,
        }
    }
}

fn or_none(text: &str) -> &str {
    if text.trim().is_empty() {
        "없음"
    } else {
        text
    }
}

fn source_label(source: ReportSource) -> &'static str {
    match source {
        ReportSource::ModelDerived => "AI 평가",
        ReportSource::HeuristicFallback => "규칙 기반 평가",
    }
}

/// Write report.json in pretty JSON format.
pub fn write_report_json(path: &Path, artifact: &ReportArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize report artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render the checklist view.
pub fn render_report_md(artifact: &ReportArtifact) -> String {
    let mut out = String::new();
    out.push_str("# 평가 결과\n\n");
    out.push_str(&format!(
        "- 점수: {}/100\n- 종합: {} {}\n- 출처: {}\n\n",
        artifact.score,
        artifact.overall.glyph(),
        artifact.overall.label(),
        source_label(artifact.source)
    ));

    if artifact.source == ReportSource::HeuristicFallback {
        out.push_str("> AI 평가를 사용할 수 없어 규칙 기반으로 평가한 결과입니다.");
        if let Some(cause) = &artifact.fallback {
            out.push_str(&format!(" (원인: {})", cause.message));
        }
        out.push_str("\n\n");
    }

    out.push_str("## 총평\n");
    out.push_str(or_none(&artifact.summary));
    out.push_str("\n\n## 조건별 결과\n");

    for item in &artifact.items {
        out.push_str(&format!(
            "\n### {}. {} {}\n- 이유: {}\n- 수정 제안: {}\n",
            item.index,
            item.status.glyph(),
            item.condition_text,
            or_none(&item.reason),
            or_none(&item.suggestion)
        ));
        if !item.evidence_excerpts.is_empty() {
            let quoted: Vec<String> = item
                .evidence_excerpts
                .iter()
                .map(|e| format!("\"{e}\""))
                .collect();
            out.push_str(&format!("- 근거: {}\n", quoted.join(", ")));
        }
    }
    out
}

/// Write report.md.
pub fn write_report_md(path: &Path, artifact: &ReportArtifact) -> Result<()> {
    let md = render_report_md(artifact);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render the flat document view used for plain-text export.
pub fn render_report_text(artifact: &ReportArtifact) -> String {
    let mut out = format!(
        "점수: {}/100 ({})\n출처: {}\n총평: {}\n",
        artifact.score,
        artifact.overall.label(),
        source_label(artifact.source),
        or_none(&artifact.summary)
    );
    for item in &artifact.items {
        out.push_str(&format!(
            "\n[{}] {} {} ({})\n  이유: {}\n  수정 제안: {}\n",
            item.index,
            item.status.glyph(),
            item.condition_text,
            item.status.label(),
            or_none(&item.reason),
            or_none(&item.suggestion)
        ));
    }
    out
}
