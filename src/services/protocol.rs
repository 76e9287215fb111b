//! Interview protocol boundary.
//!
//! Maps session identifiers and payloads to engine calls and back. No retry,
//! caching or business logic lives behind this trait.

use async_trait::async_trait;

use crate::domain::{Case, Hypothesis, NextQuestion};
use crate::error::DiagnosisResult;

#[async_trait]
pub trait InterviewProtocol: Send + Sync {
    /// Next question, or [`NextQuestion::Finished`] when the engine has
    /// nothing more to ask. Completion is not an error.
    async fn next_question(&self, case_id: i64) -> DiagnosisResult<NextQuestion>;

    /// Record an answer. Empty values fail with `Validation`; a vanished case
    /// or question fails with `NotFound`.
    async fn submit_answer(&self, case_id: i64, question_id: i64, value: &str)
        -> DiagnosisResult<()>;

    /// Current hypothesis set. May be empty early in the interview.
    async fn hypotheses(&self, case_id: i64) -> DiagnosisResult<Vec<Hypothesis>>;

    /// Move the case to a terminal status. Calling it on an already
    /// finalized case returns the existing terminal state.
    async fn finalize(&self, case_id: i64) -> DiagnosisResult<Case>;
}
