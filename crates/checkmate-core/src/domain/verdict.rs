//! Per-requirement verdicts and the canonical evaluation report.

use serde::{Deserialize, Serialize};

use crate::score;

/// Outcome for one requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Satisfied,
    Partial,
    Unsatisfied,
}

impl VerdictStatus {
    /// Weight used by the completion score.
    pub fn weight_tenths(self) -> u64 {
        match self {
            VerdictStatus::Satisfied => 10,
            VerdictStatus::Partial => 3,
            VerdictStatus::Unsatisfied => 0,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            VerdictStatus::Satisfied => "✅",
            VerdictStatus::Partial => "⚠️",
            VerdictStatus::Unsatisfied => "❌",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VerdictStatus::Satisfied => "충족",
            VerdictStatus::Partial => "부분 충족",
            VerdictStatus::Unsatisfied => "미충족",
        }
    }

    /// Parse a status token emitted by the model.
    ///
    /// Accepts the glyphs, the snake_case tags and the Korean labels the
    /// prompts have used. Anything else is `None`.
    pub fn from_wire(token: &str) -> Option<Self> {
        let token = token.trim();
        match token {
            "✅" => return Some(VerdictStatus::Satisfied),
            "⚠️" | "⚠" => return Some(VerdictStatus::Partial),
            "❌" => return Some(VerdictStatus::Unsatisfied),
            "만족" | "충족" => return Some(VerdictStatus::Satisfied),
            "부분" | "부분 충족" => return Some(VerdictStatus::Partial),
            "미흡" | "미충족" => return Some(VerdictStatus::Unsatisfied),
            _ => {}
        }
        match token.to_ascii_lowercase().as_str() {
            "satisfied" => Some(VerdictStatus::Satisfied),
            "partial" => Some(VerdictStatus::Partial),
            "unsatisfied" => Some(VerdictStatus::Unsatisfied),
            _ => None,
        }
    }
}

/// Evaluation outcome for one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementResult {
    pub requirement_index: u32,
    pub status: VerdictStatus,
    pub reason: String,
    pub suggestion: String,
    pub evidence_excerpts: Vec<String>,
}

impl RequirementResult {
    pub fn new(requirement_index: u32, status: VerdictStatus) -> Self {
        Self {
            requirement_index,
            status,
            reason: String::new(),
            suggestion: String::new(),
            evidence_excerpts: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence_excerpts = evidence;
        self
    }
}

/// Provenance of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    ModelDerived,
    HeuristicFallback,
}

/// Canonical aggregate produced by one evaluation run.
///
/// Immutable after construction; the next run produces a new report.
/// Deserialization goes through [`EvaluationReport::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReportFields")]
pub struct EvaluationReport {
    results: Vec<RequirementResult>,
    score: u8,
    summary: String,
    source: ReportSource,
}

/// Wire shape of a report before the score is clamped or derived.
#[derive(Deserialize)]
struct ReportFields {
    results: Vec<RequirementResult>,
    #[serde(default)]
    score: Option<u8>,
    #[serde(default)]
    summary: String,
    source: ReportSource,
}

impl From<ReportFields> for EvaluationReport {
    fn from(fields: ReportFields) -> Self {
        EvaluationReport::new(fields.results, fields.score, fields.summary, fields.source)
    }
}

impl EvaluationReport {
    /// Build a report. `score` of `None` is derived from `results`; an
    /// explicit score is clamped to 100.
    pub fn new(
        results: Vec<RequirementResult>,
        score: Option<u8>,
        summary: impl Into<String>,
        source: ReportSource,
    ) -> Self {
        let score = score
            .map(|s| s.min(100))
            .unwrap_or_else(|| score::aggregate(&results));
        Self {
            results,
            score,
            summary: summary.into(),
            source,
        }
    }

    pub fn results(&self) -> &[RequirementResult] {
        &self.results
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn source(&self) -> ReportSource {
        self.source
    }

    /// Overall verdict projected from `results`.
    pub fn overall(&self) -> VerdictStatus {
        score::overall_verdict(&self.results)
    }

    pub fn result_for(&self, requirement_index: u32) -> Option<&RequirementResult> {
        self.results
            .iter()
            .find(|r| r.requirement_index == requirement_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_glyphs_and_tags() {
        assert_eq!(VerdictStatus::from_wire("✅"), Some(VerdictStatus::Satisfied));
        assert_eq!(VerdictStatus::from_wire(" ⚠️ "), Some(VerdictStatus::Partial));
        assert_eq!(VerdictStatus::from_wire("⚠"), Some(VerdictStatus::Partial));
        assert_eq!(VerdictStatus::from_wire("❌"), Some(VerdictStatus::Unsatisfied));
        assert_eq!(VerdictStatus::from_wire("Partial"), Some(VerdictStatus::Partial));
        assert_eq!(VerdictStatus::from_wire("미흡"), Some(VerdictStatus::Unsatisfied));
    }

    #[test]
    fn test_from_wire_rejects_unknown() {
        assert_eq!(VerdictStatus::from_wire("maybe"), None);
        assert_eq!(VerdictStatus::from_wire(""), None);
        assert_eq!(VerdictStatus::from_wire("🟡"), None);
    }

    #[test]
    fn test_report_derives_missing_score() {
        let report = EvaluationReport::new(
            vec![
                RequirementResult::new(1, VerdictStatus::Satisfied),
                RequirementResult::new(2, VerdictStatus::Unsatisfied),
            ],
            None,
            "",
            ReportSource::ModelDerived,
        );
        assert_eq!(report.score(), 50);
        assert_eq!(report.overall(), VerdictStatus::Unsatisfied);
    }

    #[test]
    fn test_report_keeps_explicit_score() {
        let report = EvaluationReport::new(
            vec![RequirementResult::new(1, VerdictStatus::Unsatisfied)],
            Some(72),
            "총평",
            ReportSource::ModelDerived,
        );
        assert_eq!(report.score(), 72);
        assert_eq!(report.summary(), "총평");
        assert!(report.result_for(1).is_some());
        assert!(report.result_for(2).is_none());
    }

    #[test]
    fn test_deserialized_report_is_clamped_and_derived() {
        let clamped: EvaluationReport = serde_json::from_str(
            r#"{"results":[],"score":250,"summary":"","source":"model_derived"}"#,
        )
        .unwrap();
        assert_eq!(clamped.score(), 100);

        let derived: EvaluationReport = serde_json::from_str(
            r#"{"results":[{"requirement_index":1,"status":"satisfied","reason":"","suggestion":"","evidence_excerpts":[]},{"requirement_index":2,"status":"unsatisfied","reason":"","suggestion":"","evidence_excerpts":[]}],"source":"heuristic_fallback"}"#,
        )
        .unwrap();
        assert_eq!(derived.score(), 50);
        assert_eq!(derived.source(), ReportSource::HeuristicFallback);
    }

    #[test]
    fn test_report_serialization_round_trips() {
        let report = EvaluationReport::new(
            vec![RequirementResult::new(1, VerdictStatus::Partial)],
            Some(70),
            "총평",
            ReportSource::ModelDerived,
        );
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"score\":70"));
        let back: EvaluationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_string(&ReportSource::HeuristicFallback).unwrap();
        assert_eq!(json, "\"heuristic_fallback\"");
    }
}
