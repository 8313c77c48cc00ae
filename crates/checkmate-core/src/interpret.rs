//! Turning raw model text into an [`EvaluationReport`].
//!
//! The chain is: locate the payload span, parse strictly, retry once with
//! single quotes repaired, then validate against the typed schema. Nothing
//! untyped leaves this module.

use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    EvaluationReport, ParseFailure, ParseFailureKind, ReportSource, Requirement,
    RequirementResult, VerdictStatus,
};

type ParseResult<T> = std::result::Result<T, ParseFailure>;

fn payload_span() -> Option<&'static Regex> {
    static SPAN: OnceLock<Option<Regex>> = OnceLock::new();
    // leftmost brace/bracket, greedy to the last matching closer
    SPAN.get_or_init(|| Regex::new(r"(?s)(\{.*\}|\[.*\])").ok())
        .as_ref()
}

/// The substring most likely to hold the JSON payload; the whole text when
/// no brace or bracket span exists.
pub fn payload_candidate(raw: &str) -> &str {
    payload_span()
        .and_then(|re| re.find(raw))
        .map(|m| m.as_str())
        .unwrap_or(raw)
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(alias = "requirements")]
    conditions: Vec<RawEntry>,
    #[serde(default)]
    score: Option<serde_json::Number>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default, alias = "evidence")]
    evidence_excerpts: Option<Vec<String>>,
}

fn parse_json(candidate: &str, raw: &str) -> ParseResult<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            let repaired = candidate.replace('\'', "\"");
            serde_json::from_str::<Value>(&repaired).map_err(|repair_err| {
                ParseFailure::new(
                    ParseFailureKind::Syntax,
                    format!("{strict_err}; after quote repair: {repair_err}"),
                    raw,
                )
            })
        }
    }
}

fn into_payload(value: Value, raw: &str) -> ParseResult<RawPayload> {
    let schema_err = |e: serde_json::Error| ParseFailure::new(ParseFailureKind::Schema, e.to_string(), raw);
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(schema_err),
        Value::Array(_) => Ok(RawPayload {
            conditions: serde_json::from_value(value).map_err(schema_err)?,
            score: None,
            summary: None,
        }),
        other => Err(ParseFailure::new(
            ParseFailureKind::Schema,
            format!("expected an object or array, found {}", json_kind(&other)),
            raw,
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn validate_score(score: Option<serde_json::Number>, raw: &str) -> ParseResult<Option<u8>> {
    let Some(number) = score else {
        return Ok(None);
    };
    let value = number.as_f64().map(f64::round).unwrap_or(f64::NAN);
    if (0.0..=100.0).contains(&value) {
        Ok(Some(value as u8))
    } else {
        Err(ParseFailure::new(
            ParseFailureKind::ScoreOutOfRange,
            format!("score {number} is outside 0..=100"),
            raw,
        ))
    }
}

fn into_results(entries: Vec<RawEntry>, raw: &str) -> ParseResult<Vec<RequirementResult>> {
    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(entries.len());

    for (position, entry) in (1u32..).zip(entries) {
        let index = entry.index.unwrap_or(position);
        if index == 0 || !seen.insert(index) {
            return Err(ParseFailure::new(
                ParseFailureKind::DuplicateIndex,
                format!("requirement index {index} is invalid or repeated"),
                raw,
            ));
        }

        let token = entry.status.unwrap_or_default();
        let status = VerdictStatus::from_wire(&token).ok_or_else(|| {
            ParseFailure::new(
                ParseFailureKind::UnknownStatus,
                format!("entry {index} has unrecognised status {token:?}"),
                raw,
            )
        })?;

        results.push(
            RequirementResult::new(index, status)
                .with_reason(entry.reason.unwrap_or_default())
                .with_suggestion(entry.suggestion.unwrap_or_default())
                .with_evidence(entry.evidence_excerpts.unwrap_or_default()),
        );
    }

    results.sort_by_key(|r| r.requirement_index);
    Ok(results)
}

/// Interpret raw model text as a model-derived report.
pub fn interpret(raw: &str) -> ParseResult<EvaluationReport> {
    let candidate = payload_candidate(raw);
    let value = parse_json(candidate, raw)?;
    let payload = into_payload(value, raw)?;
    let score = validate_score(payload.score, raw)?;
    let results = into_results(payload.conditions, raw)?;

    Ok(EvaluationReport::new(
        results,
        score,
        payload.summary.unwrap_or_default(),
        ReportSource::ModelDerived,
    ))
}

/// [`interpret`], then require exactly one result per submitted requirement.
pub fn interpret_for(raw: &str, requirements: &[Requirement]) -> ParseResult<EvaluationReport> {
    let report = interpret(raw)?;

    let expected: BTreeSet<u32> = requirements.iter().map(|r| r.index).collect();
    let actual: BTreeSet<u32> = report.results().iter().map(|r| r.requirement_index).collect();
    if expected != actual {
        let missing: Vec<_> = expected.difference(&actual).collect();
        let unknown: Vec<_> = actual.difference(&expected).collect();
        return Err(ParseFailure::new(
            ParseFailureKind::Coverage,
            format!("missing requirement indices {missing:?}, unknown indices {unknown:?}"),
            raw,
        ));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_spans_first_brace_to_last() {
        let raw = "Here you go:\n{\"a\": {\"b\": 1}}\nThanks! }";
        assert_eq!(payload_candidate(raw), "{\"a\": {\"b\": 1}}\nThanks! }");
    }

    #[test]
    fn test_candidate_prefers_leftmost_opener() {
        assert_eq!(payload_candidate("x [1, {\"a\": 2}] y"), "[1, {\"a\": 2}]");
        assert_eq!(payload_candidate("no payload"), "no payload");
    }

    #[test]
    fn test_candidate_skips_unclosed_opener() {
        // `{` never closes, so the match starts at the later bracket
        assert_eq!(payload_candidate("{ oops [1]"), "[1]");
    }

    #[test]
    fn test_score_accepts_integral_float() {
        let number = serde_json::Number::from_f64(84.6).unwrap();
        assert_eq!(validate_score(Some(number), "").unwrap(), Some(85));
    }

    #[test]
    fn test_score_rejects_negative() {
        let err = validate_score(Some((-1i64).into()), "").unwrap_err();
        assert_eq!(err.kind, ParseFailureKind::ScoreOutOfRange);
    }
}
