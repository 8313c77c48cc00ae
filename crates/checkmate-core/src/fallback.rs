//! Local, non-AI approximation of a model report.
//!
//! Used when the gateway or the response interpreter fails. Each requirement
//! is checked independently; the first matching rule decides:
//!
//! | Rule | Trigger in requirement text | Satisfied when |
//! |------|-----------------------------|----------------|
//! | length | `low ~ high` | submission length is in range |
//! | title | `제목` / `title` | first non-blank line is non-empty and < 80 chars |
//! | keyword | anything else | any word token of the requirement occurs |
//!
//! No rule yields `Partial`.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{
    EvaluationReport, ReportSource, Requirement, RequirementResult, VerdictStatus,
};

/// A title must be shorter than this many characters.
pub const TITLE_MAX_CHARS: usize = 80;

/// Missing tokens named in a keyword suggestion.
const MAX_MISSING_TOKENS: usize = 3;

fn length_range() -> Option<&'static Regex> {
    static RANGE: OnceLock<Option<Regex>> = OnceLock::new();
    RANGE
        .get_or_init(|| Regex::new(r"(\d+)\s*[~～]\s*(\d+)").ok())
        .as_ref()
}

fn word_token() -> Option<&'static Regex> {
    static WORD: OnceLock<Option<Regex>> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\w+").ok()).as_ref()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Length { low: usize, high: usize },
    Title,
    Keywords(Vec<String>),
}

fn classify(requirement: &str) -> Rule {
    if let Some(caps) = length_range().and_then(|re| re.captures(requirement)) {
        if let (Ok(a), Ok(b)) = (caps[1].parse::<usize>(), caps[2].parse::<usize>()) {
            return Rule::Length {
                low: a.min(b),
                high: a.max(b),
            };
        }
    }
    if requirement.contains("제목") || requirement.to_lowercase().contains("title") {
        return Rule::Title;
    }
    Rule::Keywords(tokens(requirement))
}

/// Lower-cased word tokens, first occurrence order, no duplicates.
fn tokens(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let Some(re) = word_token() else {
        return out;
    };
    for m in re.find_iter(text) {
        let token = m.as_str().to_lowercase();
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

fn check_length(index: u32, submission: &str, low: usize, high: usize) -> RequirementResult {
    let len = submission.chars().count();
    if (low..=high).contains(&len) {
        RequirementResult::new(index, VerdictStatus::Satisfied).with_reason(format!(
            "제출물 글자 수 {len}자가 {low}~{high}자 범위에 있습니다."
        ))
    } else {
        RequirementResult::new(index, VerdictStatus::Unsatisfied)
            .with_reason(format!(
                "제출물 글자 수 {len}자가 {low}~{high}자 범위를 벗어났습니다."
            ))
            .with_suggestion(format!("글자 수를 {low}~{high}자 범위로 맞추세요."))
    }
}

fn check_title(index: u32, submission: &str) -> RequirementResult {
    let first_line = submission
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if !first_line.is_empty() && first_line.chars().count() < TITLE_MAX_CHARS {
        RequirementResult::new(index, VerdictStatus::Satisfied)
            .with_reason("첫 줄을 제목으로 확인했습니다.")
            .with_evidence(vec![first_line.to_string()])
    } else {
        RequirementResult::new(index, VerdictStatus::Unsatisfied)
            .with_reason("첫 줄에서 적절한 제목을 찾지 못했습니다.")
            .with_suggestion(format!(
                "글의 첫 줄에 {TITLE_MAX_CHARS}자 미만의 간결한 제목을 작성하세요."
            ))
    }
}

/// First case-insensitive occurrence of `token` in `submission`, as written
/// there. Falls back to the token itself.
fn matched_span(submission: &str, token: &str) -> String {
    Regex::new(&format!("(?i){}", regex::escape(token)))
        .ok()
        .and_then(|re| re.find(submission).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| token.to_string())
}

fn check_keywords(index: u32, submission: &str, tokens: &[String]) -> RequirementResult {
    let haystack = submission.to_lowercase();
    let (matched, missing): (Vec<&String>, Vec<&String>) =
        tokens.iter().partition(|t| haystack.contains(t.as_str()));

    if !matched.is_empty() {
        let evidence: Vec<String> = matched
            .into_iter()
            .map(|token| matched_span(submission, token))
            .collect();
        return RequirementResult::new(index, VerdictStatus::Satisfied)
            .with_reason(format!(
                "제출물에서 관련 표현을 찾았습니다: {}",
                evidence.join(", ")
            ))
            .with_evidence(evidence);
    }

    if missing.is_empty() {
        return RequirementResult::new(index, VerdictStatus::Unsatisfied)
            .with_reason("조건에서 확인할 단어를 찾지 못했습니다.")
            .with_suggestion("조건을 직접 확인하고 관련 내용을 보완하세요.");
    }

    let named: Vec<&str> = missing
        .iter()
        .take(MAX_MISSING_TOKENS)
        .map(|t| t.as_str())
        .collect();
    RequirementResult::new(index, VerdictStatus::Unsatisfied)
        .with_reason("제출물에서 조건과 관련된 표현을 찾지 못했습니다.")
        .with_suggestion(format!("다음 내용을 포함하세요: {}", named.join(", ")))
}

fn evaluate_one(requirement: &Requirement, submission: &str) -> RequirementResult {
    let index = requirement.index;
    match classify(&requirement.text) {
        Rule::Length { low, high } => check_length(index, submission, low, high),
        Rule::Title => check_title(index, submission),
        Rule::Keywords(tokens) => check_keywords(index, submission, &tokens),
    }
}

/// Heuristic report for `requirements`. Never fails.
pub fn evaluate(requirements: &[Requirement], submission: &str) -> EvaluationReport {
    let results: Vec<RequirementResult> = requirements
        .iter()
        .map(|r| evaluate_one(r, submission))
        .collect();

    let met = results
        .iter()
        .filter(|r| r.status == VerdictStatus::Satisfied)
        .count();
    let summary = format!(
        "AI 평가를 사용할 수 없어 규칙 기반으로 평가했습니다. {met}/{}개 조건 충족.",
        results.len()
    );

    EvaluationReport::new(results, None, summary, ReportSource::HeuristicFallback)
}
