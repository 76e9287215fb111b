//! Interview session state.
//!
//! One tagged variant per phase, each carrying only the data that is valid
//! in that phase.

use crate::domain::{Case, Question};
use crate::error::DiagnosisError;
use crate::presenter::{HypothesisRanking, RankedHypothesis};

/// A question on screen together with the context it was loaded with.
#[derive(Debug, Clone)]
pub struct InterviewStep {
    pub case: Case,
    pub question: Question,
    pub hypotheses: HypothesisRanking,
    /// Answer picked by the operator, not yet submitted.
    pub selected: Option<String>,
}

/// Where a session failed, with whatever a retry needs to resume.
#[derive(Debug, Clone)]
pub enum FailedPhase {
    LoadingCase,
    LoadingQuestion,
    /// The question and hypotheses stay on screen; retry resubmits `value`.
    Submitting { step: InterviewStep, value: String },
    Finalizing { case: Case },
}

impl FailedPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadingCase => "loading_case",
            Self::LoadingQuestion => "loading_question",
            Self::Submitting { .. } => "submitting",
            Self::Finalizing { .. } => "finalizing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionFailure {
    pub case_id: i64,
    pub phase: FailedPhase,
    pub error: DiagnosisError,
}

#[derive(Debug, Clone, Default)]
pub enum InterviewState {
    #[default]
    Idle,
    LoadingCase {
        case_id: i64,
    },
    LoadingQuestion {
        case: Case,
    },
    AwaitingAnswer(InterviewStep),
    Submitting {
        step: InterviewStep,
        value: String,
    },
    /// The engine explicitly reported there are no more questions. Waiting
    /// for the operator to ask for the final result.
    CompletionPending {
        case: Case,
    },
    Finalizing {
        case: Case,
    },
    Completed {
        case: Case,
    },
    Error(SessionFailure),
}

impl InterviewState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingCase { .. } => "loading_case",
            Self::LoadingQuestion { .. } => "loading_question",
            Self::AwaitingAnswer(_) => "awaiting_answer",
            Self::Submitting { .. } => "submitting",
            Self::CompletionPending { .. } => "completion_pending",
            Self::Finalizing { .. } => "finalizing",
            Self::Completed { .. } => "completed",
            Self::Error(_) => "error",
        }
    }

    /// True while a request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::LoadingCase { .. }
                | Self::LoadingQuestion { .. }
                | Self::Submitting { .. }
                | Self::Finalizing { .. }
        )
    }

    pub fn case(&self) -> Option<&Case> {
        match self {
            Self::LoadingQuestion { case }
            | Self::CompletionPending { case }
            | Self::Finalizing { case }
            | Self::Completed { case } => Some(case),
            Self::AwaitingAnswer(step) | Self::Submitting { step, .. } => Some(&step.case),
            Self::Error(SessionFailure {
                phase: FailedPhase::Submitting { step, .. },
                ..
            }) => Some(&step.case),
            Self::Error(SessionFailure {
                phase: FailedPhase::Finalizing { case },
                ..
            }) => Some(case),
            _ => None,
        }
    }

    /// The step on screen, including the one preserved by a failed submission.
    pub fn step(&self) -> Option<&InterviewStep> {
        match self {
            Self::AwaitingAnswer(step) | Self::Submitting { step, .. } => Some(step),
            Self::Error(SessionFailure {
                phase: FailedPhase::Submitting { step, .. },
                ..
            }) => Some(step),
            _ => None,
        }
    }

    pub fn question(&self) -> Option<&Question> {
        self.step().map(|step| &step.question)
    }

    pub fn hypotheses(&self) -> &[RankedHypothesis] {
        self.step()
            .map(|step| step.hypotheses.entries())
            .unwrap_or(&[])
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        match self {
            Self::Error(failure) => Some(failure),
            _ => None,
        }
    }
}
