//! Interview session orchestrator.
//!
//! Drives one case through the question/answer/hypothesis protocol. Requests
//! are issued one at a time and strictly in order: case, then question, then
//! the hypotheses for that question. The engine initialises hypothesis
//! tracking while serving the question, so the two are never parallelised.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::scope::{SessionScope, SessionSlot};
use super::state::{FailedPhase, InterviewState, InterviewStep, SessionFailure};
use crate::domain::{Case, CaseStatus, NextQuestion};
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::presenter::HypothesisRanking;
use crate::services::{CaseRecords, DiagnosisBackend, InterviewProtocol};

pub struct InterviewSession<B: ?Sized> {
    backend: Arc<B>,
    slot: SessionSlot,
    scope: Option<SessionScope>,
    state: InterviewState,
    updates: watch::Sender<InterviewState>,
}

impl<B> InterviewSession<B>
where
    B: DiagnosisBackend + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_slot(backend, SessionSlot::new())
    }

    /// Share a slot with other sessions of the same view; opening one
    /// cancels the others.
    pub fn with_slot(backend: Arc<B>, slot: SessionSlot) -> Self {
        let (updates, _) = watch::channel(InterviewState::Idle);
        Self {
            backend,
            slot,
            scope: None,
            state: InterviewState::Idle,
            updates,
        }
    }

    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    /// Every transition, including the in-flight ones, is published here.
    pub fn subscribe(&self) -> watch::Receiver<InterviewState> {
        self.updates.subscribe()
    }

    pub fn slot(&self) -> SessionSlot {
        self.slot.clone()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Start the interview for `case_id`.
    ///
    /// A second call for the case already open is a no-op; a different case
    /// replaces the current session.
    pub async fn open(&mut self, case_id: i64) -> DiagnosisResult<()> {
        if let Some(scope) = &self.scope {
            if scope.case_id() == case_id && self.slot.is_active(scope) {
                debug!(case_id, state = self.state.name(), "Session already open");
                return Ok(());
            }
        }

        self.close();
        let scope = self.slot.open(case_id);
        self.scope = Some(scope.clone());

        info!(case_id, "Opening interview session");
        self.load(scope).await
    }

    /// Pick an answer for the current question. Nothing is sent yet.
    pub fn select(&mut self, value: impl Into<String>) -> DiagnosisResult<()> {
        match &mut self.state {
            InterviewState::AwaitingAnswer(step) => {
                step.selected = Some(value.into());
            }
            other => {
                return Err(DiagnosisError::Validation(format!(
                    "No hay una pregunta esperando respuesta (estado: {})",
                    other.name()
                )))
            }
        }
        self.publish();
        Ok(())
    }

    /// Submit the selected answer and move on to the next question.
    ///
    /// An empty or unknown value is rejected locally: no request is made and
    /// the session stays in `AwaitingAnswer`.
    pub async fn submit(&mut self) -> DiagnosisResult<()> {
        let (step, value) = match &self.state {
            InterviewState::AwaitingAnswer(step) => {
                let candidate = step.selected.as_deref().unwrap_or_default();
                let value = step.question.validate_answer(candidate)?;
                (step.clone(), value)
            }
            other => {
                return Err(DiagnosisError::Validation(format!(
                    "No hay una respuesta para enviar (estado: {})",
                    other.name()
                )))
            }
        };

        let scope = self.active_scope()?;
        self.send_answer(scope, step, value).await
    }

    /// Re-run whatever failed. Loads restart from the case; a failed
    /// submission resends the same answer; a failed finalize is repeated.
    pub async fn retry(&mut self) -> DiagnosisResult<()> {
        let failure = match &self.state {
            InterviewState::Error(failure) => failure.clone(),
            other => {
                return Err(DiagnosisError::Validation(format!(
                    "No hay nada para reintentar (estado: {})",
                    other.name()
                )))
            }
        };

        let scope = match self.active_scope() {
            Ok(scope) => scope,
            Err(_) => {
                let scope = self.slot.open(failure.case_id);
                self.scope = Some(scope.clone());
                scope
            }
        };

        info!(
            case_id = failure.case_id,
            phase = failure.phase.name(),
            "Retrying interview step"
        );

        match failure.phase {
            FailedPhase::LoadingCase | FailedPhase::LoadingQuestion => self.load(scope).await,
            FailedPhase::Submitting { step, value } => self.send_answer(scope, step, value).await,
            FailedPhase::Finalizing { case } => self.run_finalize(scope, case).await.map(|_| ()),
        }
    }

    /// Commit the case to its terminal status.
    ///
    /// Only available once the engine has explicitly reported that there are
    /// no more questions.
    pub async fn finalize(&mut self) -> DiagnosisResult<Case> {
        let case = match &self.state {
            InterviewState::CompletionPending { case } => case.clone(),
            InterviewState::Completed { case } => return Ok(case.clone()),
            other => {
                return Err(DiagnosisError::Validation(format!(
                    "La entrevista todavía no terminó (estado: {})",
                    other.name()
                )))
            }
        };

        let scope = self.active_scope()?;
        self.run_finalize(scope, case).await
    }

    /// Tear the session down, cancelling any request still in flight.
    pub fn close(&mut self) {
        if let Some(scope) = self.scope.take() {
            debug!(case_id = scope.case_id(), "Closing interview session");
            self.slot.release(&scope);
        }
        if !matches!(self.state, InterviewState::Idle) {
            self.transition(InterviewState::Idle);
        }
    }

    // =========================================================================
    // Sequencing
    // =========================================================================

    async fn load(&mut self, scope: SessionScope) -> DiagnosisResult<()> {
        let case_id = scope.case_id();
        self.transition(InterviewState::LoadingCase { case_id });

        let backend = Arc::clone(&self.backend);
        let loaded = self.call(&scope, backend.get_case(case_id)).await;
        let case = match loaded {
            Ok(case) => case,
            Err(e) => return self.fail(case_id, FailedPhase::LoadingCase, e),
        };

        self.load_question(scope, case).await
    }

    async fn load_question(&mut self, scope: SessionScope, case: Case) -> DiagnosisResult<()> {
        let case_id = case.id;
        self.transition(InterviewState::LoadingQuestion { case: case.clone() });

        let backend = Arc::clone(&self.backend);
        let next = self.call(&scope, backend.next_question(case_id)).await;
        let question = match next {
            Ok(NextQuestion::Ready(question)) => question,
            Ok(NextQuestion::Finished) => {
                info!(case_id, "Engine has no more questions");
                self.transition(InterviewState::CompletionPending { case });
                return Ok(());
            }
            Err(e) => return self.fail(case_id, FailedPhase::LoadingQuestion, e),
        };

        // Only now that the question is known: its hypotheses.
        let fetched = self.call(&scope, backend.hypotheses(case_id)).await;
        let hypotheses = match fetched {
            Ok(hypotheses) => HypothesisRanking::derive(&hypotheses),
            Err(DiagnosisError::Cancelled) => return self.abandon(case_id),
            Err(e) => {
                warn!(case_id, error = %e, "Hypotheses unavailable, continuing without them");
                HypothesisRanking::empty()
            }
        };

        debug!(
            case_id,
            question_id = question.id,
            hypotheses = hypotheses.len(),
            "Question loaded"
        );

        self.transition(InterviewState::AwaitingAnswer(InterviewStep {
            case,
            question,
            hypotheses,
            selected: None,
        }));
        Ok(())
    }

    async fn send_answer(
        &mut self,
        scope: SessionScope,
        step: InterviewStep,
        value: String,
    ) -> DiagnosisResult<()> {
        let case_id = step.case.id;
        let question_id = step.question.id;

        self.transition(InterviewState::Submitting {
            step: step.clone(),
            value: value.clone(),
        });

        let backend = Arc::clone(&self.backend);
        let submitted = self
            .call(&scope, backend.submit_answer(case_id, question_id, &value))
            .await;

        match submitted {
            Ok(()) => {
                info!(case_id, question_id, "Answer recorded");
                self.load_question(scope, step.case).await
            }
            Err(e) => self.fail(case_id, FailedPhase::Submitting { step, value }, e),
        }
    }

    async fn run_finalize(&mut self, scope: SessionScope, case: Case) -> DiagnosisResult<Case> {
        let case_id = case.id;
        let previous = case.status;
        self.transition(InterviewState::Finalizing { case: case.clone() });

        let backend = Arc::clone(&self.backend);
        let finalized = match self.call(&scope, backend.finalize(case_id)).await {
            Ok(finalized) if finalized.status == CaseStatus::InProgress => {
                Err(DiagnosisError::InvalidResponse(format!(
                    "case {} is still in progress after finalize",
                    case_id
                )))
            }
            Ok(finalized) if !previous.can_advance_to(finalized.status) => {
                Err(DiagnosisError::InvalidResponse(format!(
                    "case {} cannot move from {:?} to {:?}",
                    case_id, previous, finalized.status
                )))
            }
            other => other,
        };

        match finalized {
            Ok(finalized) => {
                info!(case_id, status = ?finalized.status, "Interview finalized");
                self.transition(InterviewState::Completed {
                    case: finalized.clone(),
                });
                Ok(finalized)
            }
            Err(e) => self.fail(case_id, FailedPhase::Finalizing { case }, e),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run a request in `scope`. Responses for a session that has since been
    /// closed or replaced are dropped.
    async fn call<T, F>(&self, scope: &SessionScope, request: F) -> DiagnosisResult<T>
    where
        F: Future<Output = DiagnosisResult<T>>,
    {
        let result = scope.run(request).await;
        if !self.slot.is_active(scope) {
            debug!(case_id = scope.case_id(), "Dropping response for inactive session");
            return Err(DiagnosisError::Cancelled);
        }
        result
    }

    fn active_scope(&self) -> DiagnosisResult<SessionScope> {
        match &self.scope {
            Some(scope) if self.slot.is_active(scope) => Ok(scope.clone()),
            _ => Err(DiagnosisError::Cancelled),
        }
    }

    /// Record a failure. The session never moves forward on an error.
    fn fail<T>(&mut self, case_id: i64, phase: FailedPhase, error: DiagnosisError) -> DiagnosisResult<T> {
        if matches!(error, DiagnosisError::Cancelled) {
            return self.abandon(case_id);
        }

        warn!(
            case_id,
            phase = phase.name(),
            code = error.error_code(),
            error = %error,
            "Interview step failed"
        );

        self.transition(InterviewState::Error(SessionFailure {
            case_id,
            phase,
            error: error.clone(),
        }));
        Err(error)
    }

    /// The session was closed or replaced mid-request: discard everything.
    fn abandon<T>(&mut self, case_id: i64) -> DiagnosisResult<T> {
        debug!(case_id, "Interview session abandoned");
        if let Some(scope) = self.scope.take() {
            self.slot.release(&scope);
        }
        self.transition(InterviewState::Idle);
        Err(DiagnosisError::Cancelled)
    }

    fn transition(&mut self, next: InterviewState) {
        debug!(from = self.state.name(), to = next.name(), "Interview transition");
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }
}

impl<B: ?Sized> Drop for InterviewSession<B> {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            self.slot.release(&scope);
        }
    }
}
