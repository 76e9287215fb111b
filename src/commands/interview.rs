//! `interview` command: the interactive question loop.
//!
//! Renders whatever state the session publishes and turns operator input
//! into session operations. Ctrl-C cancels the view token, which cancels the
//! request in flight and ends the loop.

use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{cases, render};
use crate::domain::AnswerOption;
use crate::error::DiagnosisResult;
use crate::interview::{InterviewSession, InterviewState};
use crate::services::DiagnosisBackend;

/// Operator input, one trimmed line at a time, that gives up when the view
/// is cancelled.
struct Prompt {
    lines: mpsc::Receiver<String>,
    cancel: CancellationToken,
}

impl Prompt {
    fn new(lines: mpsc::Receiver<String>, cancel: CancellationToken) -> Self {
        Self { lines, cancel }
    }

    /// `None` at end of input or once the view is cancelled.
    async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{} ", label);
        std::io::stdout().flush()?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(None),
            line = self.lines.recv() => Ok(line.map(|l| l.trim().to_string())),
        }
    }
}

/// Read stdin on a detached thread. A read parked there never holds up
/// shutdown after an interrupt.
fn stdin_lines() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(1);

    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "Stopped reading operator input");
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}

pub async fn run<B>(backend: Arc<B>, case_id: i64) -> Result<()>
where
    B: DiagnosisBackend + ?Sized,
{
    let mut session = InterviewSession::new(Arc::clone(&backend));
    let view = session.slot().view_token();

    let interrupt = tokio::spawn({
        let view = view.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received, cancelling interview");
                view.cancel();
            }
        }
    });
    let progress = tokio::spawn(show_progress(session.subscribe()));

    let mut prompt = Prompt::new(stdin_lines()?, view);
    let outcome = drive(&mut session, &mut prompt, case_id).await;

    interrupt.abort();
    progress.abort();
    session.close();

    match outcome? {
        Some(case_id) => cases::show_result(backend.as_ref(), case_id).await,
        None => {
            println!("\nEntrevista interrumpida.");
            Ok(())
        }
    }
}

/// Status lines on stderr while a request is in flight.
async fn show_progress(mut updates: watch::Receiver<InterviewState>) {
    while updates.changed().await.is_ok() {
        let line = render::progress(&updates.borrow_and_update());
        if let Some(line) = line {
            eprintln!("{}", line);
        }
    }
}

/// Returns the case id once the interview is finalized, `None` when the
/// operator leaves first.
async fn drive<B>(
    session: &mut InterviewSession<B>,
    prompt: &mut Prompt,
    case_id: i64,
) -> Result<Option<i64>>
where
    B: DiagnosisBackend + ?Sized,
{
    note(session.open(case_id).await);

    loop {
        let state = session.state().clone();
        if state.is_busy() {
            return Err(anyhow!(
                "interview left in transient state '{}'",
                state.name()
            ));
        }

        match &state {
            InterviewState::Completed { case } => return Ok(Some(case.id)),
            InterviewState::Idle => return Ok(None),
            _ => print!("\n{}", render::screen(&state)),
        }

        if let Some(failure) = state.failure() {
            let label = if failure.error.is_retryable() {
                "¿Reintentar? [S/n]:"
            } else {
                "¿Reintentar? [s/N]:"
            };
            let Some(input) = prompt.ask(label).await? else {
                return Ok(None);
            };
            let retry = if input.is_empty() {
                failure.error.is_retryable()
            } else {
                is_yes(&input)
            };
            if !retry {
                return Ok(None);
            }
            note(session.retry().await);
        } else if let Some(question) = state.question() {
            let Some(input) = prompt.ask("Respuesta:").await? else {
                return Ok(None);
            };

            let options = question.answer_options();
            session.select(resolve_choice(&options, &input))?;

            if let Err(e) = session.submit().await {
                // Rejected locally; the question stays on screen.
                if matches!(session.state(), InterviewState::AwaitingAnswer(_)) {
                    println!("{}", e.user_message());
                }
            }
        } else {
            // Completion pending: the engine has no more questions.
            let Some(input) = prompt
                .ask("Enter para Ver Resultado Final, 'q' para salir:")
                .await?
            else {
                return Ok(None);
            };
            if input.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            note(session.finalize().await.map(|_| ()));
        }
    }
}

/// Failures are already reflected in the session state; keep a trace only.
fn note(result: DiagnosisResult<()>) {
    if let Err(e) = result {
        debug!(code = e.error_code(), error = %e, "Interview operation did not complete");
    }
}

/// A 1-based option number picks that option; anything else is sent as typed.
fn resolve_choice(options: &[AnswerOption], input: &str) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .map(|option| option.value.clone())
        .unwrap_or_else(|| input.to_string())
}

fn is_yes(input: &str) -> bool {
    matches!(
        input.to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use crate::domain::{
        Case, CaseStatus, Hypothesis, Metrics, NewCase, NextQuestion, Question, QuestionKind,
    };
    use crate::error::DiagnosisError;
    use crate::services::{CaseRecords, InterviewProtocol};

    /// One yes/no question, then done; finalizes to technician required.
    #[derive(Default)]
    struct OneQuestionEngine {
        answered: AtomicBool,
        finalized: AtomicBool,
    }

    fn case(id: i64, status: CaseStatus) -> Case {
        Case {
            id,
            client_name: Some("Ana".into()),
            client_phone: None,
            appliance: None,
            brand: None,
            model: None,
            age_years: None,
            symptom: None,
            status,
            created_at: None,
            answers: None,
            diagnosis: None,
        }
    }

    fn unsupported() -> DiagnosisError {
        DiagnosisError::Engine {
            status: 501,
            message: "not supported".into(),
        }
    }

    #[async_trait]
    impl CaseRecords for OneQuestionEngine {
        async fn get_case(&self, case_id: i64) -> DiagnosisResult<Case> {
            let status = if self.finalized.load(Ordering::SeqCst) {
                CaseStatus::RequiresTechnician
            } else {
                CaseStatus::InProgress
            };
            Ok(case(case_id, status))
        }

        async fn list_cases(&self) -> DiagnosisResult<Vec<Case>> {
            Err(unsupported())
        }

        async fn create_case(&self, _new_case: &NewCase) -> DiagnosisResult<Case> {
            Err(unsupported())
        }

        async fn metrics(&self) -> DiagnosisResult<Metrics> {
            Err(unsupported())
        }
    }

    #[async_trait]
    impl InterviewProtocol for OneQuestionEngine {
        async fn next_question(&self, _case_id: i64) -> DiagnosisResult<NextQuestion> {
            if self.answered.load(Ordering::SeqCst) {
                return Ok(NextQuestion::Finished);
            }
            Ok(NextQuestion::Ready(Question {
                id: 1,
                text: "¿El compresor funciona?".into(),
                kind: Some(QuestionKind::YesNo),
                help: None,
                options: None,
                critical: false,
                reference_image: None,
            }))
        }

        async fn submit_answer(
            &self,
            _case_id: i64,
            _question_id: i64,
            _value: &str,
        ) -> DiagnosisResult<()> {
            self.answered.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn hypotheses(&self, _case_id: i64) -> DiagnosisResult<Vec<Hypothesis>> {
            Ok(Vec::new())
        }

        async fn finalize(&self, case_id: i64) -> DiagnosisResult<Case> {
            self.finalized.store(true, Ordering::SeqCst);
            Ok(case(case_id, CaseStatus::RequiresTechnician))
        }
    }

    fn yes_no() -> Vec<AnswerOption> {
        vec![
            AnswerOption {
                value: "true".into(),
                label: "Sí".into(),
            },
            AnswerOption {
                value: "false".into(),
                label: "No".into(),
            },
        ]
    }

    #[test]
    fn option_number_resolves_to_value() {
        assert_eq!(resolve_choice(&yes_no(), "1"), "true");
        assert_eq!(resolve_choice(&yes_no(), "2"), "false");
    }

    #[test]
    fn out_of_range_or_text_is_sent_as_typed() {
        assert_eq!(resolve_choice(&yes_no(), "0"), "0");
        assert_eq!(resolve_choice(&yes_no(), "3"), "3");
        assert_eq!(resolve_choice(&yes_no(), "false"), "false");
        assert_eq!(resolve_choice(&[], "ruido fuerte"), "ruido fuerte");
    }

    #[test]
    fn retry_confirmation() {
        assert!(is_yes("S"));
        assert!(is_yes("sí"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }

    #[tokio::test]
    async fn prompt_reads_trimmed_lines_until_input_closes() {
        let (tx, rx) = mpsc::channel(4);
        tx.send("  1 ".to_string()).await.unwrap();
        tx.send("q".to_string()).await.unwrap();
        drop(tx);
        let mut prompt = Prompt::new(rx, CancellationToken::new());

        assert_eq!(prompt.ask(">").await.unwrap().as_deref(), Some("1"));
        assert_eq!(prompt.ask(">").await.unwrap().as_deref(), Some("q"));
        assert_eq!(prompt.ask(">").await.unwrap(), None);
    }

    #[tokio::test]
    async fn cancelled_prompt_stops_reading() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, rx) = mpsc::channel(1);
        tx.send("1".to_string()).await.unwrap();
        let mut prompt = Prompt::new(rx, cancel);

        assert_eq!(prompt.ask(">").await.unwrap(), None);
    }

    #[tokio::test]
    async fn interrupt_at_prompt_ends_interview_without_input() {
        let mut session = InterviewSession::new(Arc::new(OneQuestionEngine::default()));
        let view = session.slot().view_token();

        // The sender stays alive: the operator never types anything.
        let (_tx, rx) = mpsc::channel(1);
        let mut prompt = Prompt::new(rx, view.clone());

        let interrupted = tokio::time::timeout(Duration::from_secs(5), async {
            let (outcome, _) = tokio::join!(drive(&mut session, &mut prompt, 42), async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                view.cancel();
            });
            outcome
        })
        .await
        .expect("drive should return once the view is cancelled");

        assert_eq!(interrupted.unwrap(), None);
    }

    #[tokio::test]
    async fn answering_and_confirming_reaches_completion() {
        let mut session = InterviewSession::new(Arc::new(OneQuestionEngine::default()));
        let (tx, rx) = mpsc::channel(4);
        tx.send("1".to_string()).await.unwrap();
        tx.send(String::new()).await.unwrap();
        let mut prompt = Prompt::new(rx, CancellationToken::new());

        let finished = drive(&mut session, &mut prompt, 42).await.unwrap();

        assert_eq!(finished, Some(42));
        assert!(matches!(
            session.state(),
            InterviewState::Completed { case } if case.status == CaseStatus::RequiresTechnician
        ));
    }
}
