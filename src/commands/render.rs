//! Plain-text rendering of cases, interview steps and results.

use std::fmt::Write;

use crate::domain::{Case, Diagnosis, Metrics};
use crate::interview::{FailedPhase, InterviewState, SessionFailure};
use crate::presenter::{ResultPanel, ResultView};

const RULE: &str = "----------------------------------------";

pub fn case_list(cases: &[Case], metrics: &Metrics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Casos totales: {}", metrics.casos_totales);
    let _ = writeln!(out, "Resueltos DIY: {}", metrics.diy_exitosos);
    let _ = writeln!(out, "Enviados a técnico: {}", metrics.tecnico_enviados);
    let _ = writeln!(out, "Tiempo promedio: {:.1} min", metrics.tiempo_promedio);
    let _ = writeln!(out, "{RULE}");

    if cases.is_empty() {
        let _ = writeln!(out, "No hay casos registrados.");
        return out;
    }

    for case in cases {
        let created = case
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "#{:<5} {:<16} {:<24} {:<20} {}",
            case.id,
            created,
            case.appliance_label(),
            case.client_name.as_deref().unwrap_or("-"),
            case.status
        );
    }
    out
}

/// Client, appliance and symptom, shown above every question.
pub fn case_summary(case: &Case) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Caso #{}", case.id);
    let _ = writeln!(
        out,
        "Cliente: {}",
        case.client_name.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "Equipo: {}", case.appliance_label());
    if let Some(symptom) = case.symptom.as_deref() {
        let _ = writeln!(out, "Síntoma: {}", symptom);
    }
    out
}

/// Everything the operator sees for the current interview state.
///
/// A failed submission still shows its question and hypotheses above the
/// error, so the same answer can be retried in context.
pub fn screen(state: &InterviewState) -> String {
    let mut out = state.case().map(case_summary).unwrap_or_default();

    if let Some(question) = state.question() {
        let _ = writeln!(out, "{RULE}");
        let marker = if question.critical { " (crítica)" } else { "" };
        let _ = writeln!(out, "{}{}", question.text, marker);
        if let Some(help) = question.help.as_deref() {
            let _ = writeln!(out, "  {}", help);
        }
        if let Some(image) = question.reference_image.as_deref() {
            let _ = writeln!(out, "  Imagen de referencia: {}", image);
        }

        let selected = state.step().and_then(|step| step.selected.as_deref());
        for (i, option) in question.answer_options().iter().enumerate() {
            let mark = if selected == Some(option.value.as_str()) { ">" } else { " " };
            let _ = writeln!(out, "  {} {}. {}", mark, i + 1, option.label);
        }
    }

    let hypotheses = state.hypotheses();
    if !hypotheses.is_empty() {
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Hipótesis actuales:");
        for h in hypotheses {
            let _ = writeln!(
                out,
                "  [{:<5}] {:>3.0}%  {}",
                h.tier.label().to_uppercase(),
                h.probability,
                h.name
            );
        }
        if state.step().map_or(false, |step| step.hypotheses.suggests_technician()) {
            let _ = writeln!(out, "  Probable intervención técnica.");
        }
    }

    if matches!(state, InterviewState::CompletionPending { .. }) {
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "No hay más preguntas para este caso.");
    }

    if let Some(f) = state.failure() {
        let _ = writeln!(out, "{RULE}");
        out.push_str(&failure(f));
    }
    out
}

/// One-line status for states with a request in flight.
pub fn progress(state: &InterviewState) -> Option<String> {
    match state {
        InterviewState::LoadingCase { case_id } => Some(format!("Cargando caso #{}...", case_id)),
        InterviewState::LoadingQuestion { .. } => Some("Cargando siguiente pregunta...".to_string()),
        InterviewState::Submitting { value, .. } => {
            Some(format!("Enviando respuesta '{}'...", value))
        }
        InterviewState::Finalizing { .. } => Some("Finalizando diagnóstico...".to_string()),
        _ => None,
    }
}

pub fn failure(failure: &SessionFailure) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Error: {}", failure.error.user_message());
    let context = match &failure.phase {
        FailedPhase::LoadingCase => "al cargar el caso",
        FailedPhase::LoadingQuestion => "al cargar la siguiente pregunta",
        FailedPhase::Submitting { .. } => "al enviar la respuesta (se reenviará la misma)",
        FailedPhase::Finalizing { .. } => "al finalizar el diagnóstico",
    };
    let _ = writeln!(out, "Ocurrió {}.", context);
    if !failure.error.is_retryable() {
        let _ = writeln!(out, "Reintentar probablemente no cambie el resultado.");
    }
    out
}

pub fn result(view: &ResultView) -> String {
    let mut out = case_summary(&view.case);
    let _ = writeln!(out, "Estado: {}", view.case.status);
    let _ = writeln!(out, "{RULE}");

    match (view.panel.headline(), view.panel.guidance()) {
        (Some(headline), Some(guidance)) => {
            let marker = match view.panel {
                ResultPanel::TechnicianRequired => "[!]",
                _ => "[OK]",
            };
            let _ = writeln!(out, "{} {}", marker, headline);
            let _ = writeln!(out, "{}", guidance);
        }
        _ => {
            let _ = writeln!(out, "El caso se encuentra en estado {}.", view.case.status);
        }
    }

    if let Some(diagnosis) = view.case.diagnosis.as_ref() {
        let _ = writeln!(out, "{RULE}");
        out.push_str(&diagnosis_block(diagnosis));
    }
    out
}

fn diagnosis_block(d: &Diagnosis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Causa probable: {}", d.probable_cause);
    if let Some(component) = d.affected_component.as_deref() {
        let _ = writeln!(out, "Componente afectado: {}", component);
    }
    if let Some(certainty) = d.certainty {
        let _ = writeln!(out, "Certeza: {:.0}%", certainty);
    }
    if let Some(urgency) = d.urgency {
        let _ = writeln!(out, "Urgencia: {}", urgency.label());
    }
    if let Some(range) = d.cost_range() {
        let _ = writeln!(out, "Costo estimado: {}", range);
    }
    if let Some(minutes) = d.estimated_minutes {
        let _ = writeln!(out, "Tiempo estimado: {} min", minutes);
    }
    if let Some(p) = d.diy_success_probability {
        let _ = writeln!(out, "Probabilidad de éxito DIY: {:.0}%", p);
    }
    if let Some(script) = d.client_script.as_deref() {
        let _ = writeln!(out, "Guion para el cliente:\n{}", script);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplianceType, CaseStatus, Hypothesis, Question, QuestionKind};
    use crate::error::DiagnosisError;
    use crate::interview::InterviewStep;
    use crate::presenter::HypothesisRanking;

    fn case(status: CaseStatus) -> Case {
        Case {
            id: 42,
            client_name: Some("Juan Pérez".into()),
            client_phone: None,
            appliance: Some(ApplianceType::Refrigerator),
            brand: Some("Whirlpool".into()),
            model: None,
            age_years: Some(6),
            symptom: Some("no enfría".into()),
            status,
            created_at: None,
            answers: None,
            diagnosis: None,
        }
    }

    fn yes_no_step() -> InterviewStep {
        InterviewStep {
            case: case(CaseStatus::InProgress),
            question: Question {
                id: 1,
                text: "¿El compresor hace ruido?".into(),
                kind: Some(QuestionKind::YesNo),
                help: None,
                options: None,
                critical: false,
                reference_image: None,
            },
            hypotheses: HypothesisRanking::derive(&[
                Hypothesis::new("Termostato defectuoso", 65.0),
                Hypothesis::new("Compresor", 80.0),
            ]),
            selected: Some("true".into()),
        }
    }

    #[test]
    fn screen_lists_options_and_ranked_hypotheses() {
        let text = screen(&InterviewState::AwaitingAnswer(yes_no_step()));

        assert!(text.contains("Equipo: HELADERA Whirlpool"));
        assert!(text.contains("> 1. Sí"));
        assert!(text.contains("2. No"));
        assert!(text.contains("[ALTA ]  80%  Compresor"));

        let compresor = text.find("Compresor").unwrap();
        let termostato = text.find("Termostato defectuoso").unwrap();
        assert!(compresor < termostato);
        assert!(text.contains("Probable intervención técnica."));
    }

    #[test]
    fn failed_submission_keeps_question_on_screen() {
        let state = InterviewState::Error(SessionFailure {
            case_id: 42,
            phase: FailedPhase::Submitting {
                step: yes_no_step(),
                value: "true".into(),
            },
            error: DiagnosisError::Network("refused".into()),
        });
        let text = screen(&state);

        assert!(text.contains("¿El compresor hace ruido?"));
        assert!(text.contains("Termostato defectuoso"));
        assert!(text.contains("al enviar la respuesta"));
        assert!(!text.contains("Reintentar probablemente no cambie el resultado."));
    }

    #[test]
    fn completion_screen_has_no_question() {
        let text = screen(&InterviewState::CompletionPending {
            case: case(CaseStatus::InProgress),
        });
        assert!(text.contains("Caso #42"));
        assert!(text.contains("No hay más preguntas para este caso."));
        assert!(!text.contains("Hipótesis actuales:"));
    }

    #[test]
    fn progress_only_for_requests_in_flight() {
        assert_eq!(
            progress(&InterviewState::LoadingCase { case_id: 42 }).as_deref(),
            Some("Cargando caso #42...")
        );
        let submitting = InterviewState::Submitting {
            step: yes_no_step(),
            value: "true".into(),
        };
        assert_eq!(
            progress(&submitting).as_deref(),
            Some("Enviando respuesta 'true'...")
        );
        assert!(progress(&InterviewState::AwaitingAnswer(yes_no_step())).is_none());
        assert!(progress(&InterviewState::Idle).is_none());
    }

    #[test]
    fn result_shows_technician_panel() {
        let view = ResultView::from_case(case(CaseStatus::RequiresTechnician));
        let text = result(&view);
        assert!(text.contains("Se Requiere Atención Técnica Especializada"));
        assert!(!text.contains("Diagnóstico Resuelto Exitosamente"));
    }

    #[test]
    fn result_for_other_status_has_neutral_text() {
        let view = ResultView::from_case(case(CaseStatus::Closed));
        let text = result(&view);
        assert!(text.contains("El caso se encuentra en estado CERRADO."));
    }

    #[test]
    fn failure_mentions_phase_and_message() {
        let text = failure(&SessionFailure {
            case_id: 42,
            phase: FailedPhase::LoadingQuestion,
            error: DiagnosisError::Network("refused".into()),
        });
        assert!(text.contains("No se pudo contactar al motor de diagnóstico"));
        assert!(text.contains("al cargar la siguiente pregunta"));
        assert!(!text.contains("Reintentar probablemente"));
    }

    #[test]
    fn missing_case_warns_that_retry_will_not_help() {
        let text = failure(&SessionFailure {
            case_id: 7,
            phase: FailedPhase::LoadingCase,
            error: DiagnosisError::NotFound("Caso 7".into()),
        });
        assert!(text.contains("Reintentar probablemente no cambie el resultado."));
    }

    #[test]
    fn empty_case_list_still_shows_metrics() {
        let metrics = Metrics {
            casos_totales: 3,
            diy_exitosos: 1,
            tecnico_enviados: 2,
            tiempo_promedio: 12.5,
        };
        let text = case_list(&[], &metrics);
        assert!(text.contains("Casos totales: 3"));
        assert!(text.contains("No hay casos registrados."));
    }
}
