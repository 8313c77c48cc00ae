//! Prompt templates sent to the model gateway.
//!
//! Both builders are pure: identical arguments yield identical strings, which
//! is what lets [`crate::gateway::CachedGateway`] key its cache on the prompt.

use serde_json::json;

use crate::domain::{CheckmateError, Requirement, Result, Strictness};

/// Fixed system message sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "너는 수행평가 첨삭 및 채점 전문가 AI야.";

fn ensure_inputs(requirements: &[Requirement], submission: &str) -> Result<()> {
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
    Ok(())
}

fn numbered_list(requirements: &[Requirement]) -> String {
    requirements
        .iter()
        .map(|r| format!("{}. {}", r.index, r.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn payload_schema() -> Result<String> {
    let schema = json!({
        "type": "object",
        "properties": {
            "conditions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "index": {"type": "integer"},
                        "condition_text": {"type": "string"},
                        "status": {"type": "string", "enum": ["✅", "⚠️", "❌"]},
                        "reason": {"type": "string"},
                        "suggestion": {"type": "string"}
                    }
                }
            },
            "score": {"type": "integer"},
            "summary": {"type": "string"}
        }
    });
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Build the checklist evaluation prompt.
///
/// Fails with `InvalidInput` when `requirements` is empty or `submission` is
/// blank.
pub fn build_evaluation_prompt(
    requirements: &[Requirement],
    submission: &str,
    strictness: Strictness,
) -> Result<String> {
    ensure_inputs(requirements, submission)?;

    let schema = payload_schema()?;
    let conditions = numbered_list(requirements);
    let rubric = strictness.rubric();

    Ok(format!(
        "너는 수행평가 첨삭 및 채점 전문가이며 사실 검증 능력이 있다.
학생의 글이 아래 [조건 목록]에 얼마나 부합하는지, 사실/명칭/개념 오류까지 검사하여 체크리스트 형태로 평가해라.
평가 기준:
- 조건 충족: ✅
- 문법/표현/논리적 부족 또는 부분 충족: ⚠️
- 사실/명칭/개념 오류 또는 조건 미충족: ❌

검사 엄격도: {rubric}

출력 요구사항(반드시 따를 것):
1) **반드시** 아래의 JSON 스키마에 맞춰 **JSON 객체 하나만** 출력하라.
2) 조건들은 입력 순서대로 'conditions' 배열에 넣고 각 항목은 index(1-based), condition_text, status, reason, suggestion 을 포함하라.
3) suggestion은 수정된 문장(또는 문장 예시)을 포함하라. (가능하면 실제 교정 문장 제시)
4) score는 0~100 정수.
5) summary는 1-3문장 내외의 간단 총평.

JSON 스키마(예시):
{schema}

[조건 목록]
{conditions}

[학생 글]
{submission}

출력: **JSON 하나만** (다른 텍스트 금지).
"
    ))
}

/// Build the whole-document correction prompt. The model is asked to return
/// only the corrected text.
pub fn build_correction_prompt(requirements: &[Requirement], original_text: &str) -> Result<String> {
    ensure_inputs(requirements, original_text)?;

    let conditions = numbered_list(requirements);
    Ok(format!(
        "너는 문장 첨삭 전문가야. 아래 학생의 원문을 바탕으로,
- 조건에 어긋나거나 사실이 틀린 문장은 정확한 사실/명칭으로 바꿔라.
- 문법, 표현, 논리 흐름도 자연스럽게 다듬어라.
- 학생의 원래 의도와 톤을 최대한 유지하되, 오류는 바로잡아라.
- 출력은 '수정된 전체 글' 하나의 텍스트로만 출력하라. (설명 금지)

[조건 목록]
{conditions}

[원문]
{original_text}
"
    ))
}
