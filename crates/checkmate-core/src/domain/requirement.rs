//! Teacher-authored requirements and the strictness rubric.

use serde::{Deserialize, Serialize};

use super::error::{CheckmateError, Result};

/// One teacher-specified expectation a submission is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// 1-based position in the input list.
    pub index: u32,

    /// Requirement text as typed by the teacher.
    pub text: String,
}

impl Requirement {
    pub fn new(index: u32, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Number non-blank lines 1..=N in input order. Lines are trimmed.
pub fn requirements_from_lines<I, S>(lines: I) -> Vec<Requirement>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let trimmed = line.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .zip(1u32..)
        .map(|(text, index)| Requirement { index, text })
        .collect()
}

/// Parse the newline-separated requirements box. Blank lines are ignored.
pub fn parse_requirements(input: &str) -> Vec<Requirement> {
    requirements_from_lines(input.lines())
}

/// Rubric severity chosen by the teacher (1 lenient .. 3 strict).
///
/// Only changes the natural-language instruction given to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    Lenient,
    #[default]
    Normal,
    Strict,
}

impl Strictness {
    /// Numeric level as shown in the UI.
    pub fn level(self) -> u8 {
        match self {
            Strictness::Lenient => 1,
            Strictness::Normal => 2,
            Strictness::Strict => 3,
        }
    }

    /// Rubric description embedded into the evaluation prompt.
    pub fn rubric(self) -> &'static str {
        match self {
            Strictness::Lenient => {
                "1단계 (느슨하게): 애매한 경우 관대하게 처리. 가능한 한 ✅을 주되, 명백한 사실 오류만 ❌로 표시."
            }
            Strictness::Normal => {
                "2단계 (보통): 일반적인 기준. 사실/명칭 오류는 ❌, 표현/논리 오류는 ⚠️."
            }
            Strictness::Strict => {
                "3단계 (엄격하게): 엄격한 평가. 사소한 누락·애매함도 ⚠️ 또는 ❌로 처리."
            }
        }
    }
}

impl TryFrom<u8> for Strictness {
    type Error = CheckmateError;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            1 => Ok(Strictness::Lenient),
            2 => Ok(Strictness::Normal),
            3 => Ok(Strictness::Strict),
            other => Err(CheckmateError::InvalidInput(format!(
                "strictness must be 1, 2 or 3 (got {other})"
            ))),
        }
    }
}
