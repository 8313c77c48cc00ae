//! Domain models for Check Mate.
//!
//! Canonical definitions for the core entities:
//! - `Requirement`: one teacher-authored expectation
//! - `Strictness`: rubric severity selected by the teacher
//! - `RequirementResult` / `VerdictStatus`: outcome per requirement
//! - `EvaluationReport`: the immutable aggregate of one run

pub mod error;
pub mod requirement;
pub mod verdict;

// Re-export main types and errors
pub use error::{CheckmateError, ParseFailure, ParseFailureKind, Result};
pub use requirement::{parse_requirements, requirements_from_lines, Requirement, Strictness};
pub use verdict::{EvaluationReport, ReportSource, RequirementResult, VerdictStatus};
