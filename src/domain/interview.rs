//! Interview protocol models: questions, answers and hypotheses as the
//! inference engine exchanges them.

use serde::{Deserialize, Serialize};

use crate::error::DiagnosisError;

/// Values submitted for a yes/no question without an explicit option set.
pub const YES_VALUE: &str = "true";
pub const NO_VALUE: &str = "false";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionKind {
    #[serde(rename = "SI_NO")]
    YesNo,
    #[serde(rename = "OPCION_MULTIPLE")]
    MultipleChoice,
    #[serde(rename = "TEXTO")]
    FreeText,
    #[serde(other)]
    Other,
}

/// One interview step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "tipo", default)]
    pub kind: Option<QuestionKind>,
    #[serde(rename = "ayuda", default)]
    pub help: Option<String>,
    #[serde(rename = "opciones", default)]
    pub options: Option<Vec<String>>,
    #[serde(rename = "critica", default)]
    pub critical: bool,
    #[serde(rename = "imagenReferencia", default)]
    pub reference_image: Option<String>,
}

/// A selectable answer: the value sent to the engine and its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub value: String,
    pub label: String,
}

impl Question {
    /// The options the operator picks from.
    ///
    /// An explicit option set wins. Yes/no questions without one get the fixed
    /// `true`/`false` pair. Anything else is answered with free text and
    /// yields no options.
    pub fn answer_options(&self) -> Vec<AnswerOption> {
        match self.options.as_deref() {
            Some(options) if !options.is_empty() => options
                .iter()
                .map(|value| AnswerOption {
                    value: value.clone(),
                    label: option_label(value),
                })
                .collect(),
            _ if self.kind == Some(QuestionKind::YesNo) => vec![
                AnswerOption {
                    value: YES_VALUE.to_string(),
                    label: "Sí".to_string(),
                },
                AnswerOption {
                    value: NO_VALUE.to_string(),
                    label: "No".to_string(),
                },
            ],
            _ => Vec::new(),
        }
    }

    /// Check a candidate answer locally and return the value to submit.
    pub fn validate_answer(&self, value: &str) -> Result<String, DiagnosisError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DiagnosisError::Validation(
                "Seleccione una respuesta antes de continuar".to_string(),
            ));
        }

        let options = self.answer_options();
        if !options.is_empty() && !options.iter().any(|o| o.value == value) {
            return Err(DiagnosisError::Validation(format!(
                "'{}' no es una opción válida para esta pregunta",
                value
            )));
        }

        Ok(value.to_string())
    }
}

/// `no_enfria` -> `No enfria`
fn option_label(value: &str) -> String {
    let spaced = value.replacen('_', " ", 1);
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result of asking the engine for the next question.
///
/// `Finished` is a successful answer: the engine has nothing more to ask.
#[derive(Debug, Clone, PartialEq)]
pub enum NextQuestion {
    Ready(Question),
    Finished,
}

/// Body of `POST /casos/{id}/responder`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub pregunta_id: i64,
    pub valor: String,
}

/// A candidate root cause at one point of the interview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hypothesis {
    #[serde(rename = "nombre", alias = "descripcion")]
    pub name: String,
    #[serde(rename = "probabilidad", default)]
    pub probability: f64,
    /// Tier label as computed by the engine, if it sends one.
    #[serde(rename = "nivel", default)]
    pub level: Option<String>,
}

#[cfg(test)]
impl Hypothesis {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            level: None,
        }
    }
}
