use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::diagnosis::Diagnosis;
use crate::error::DiagnosisError;

/// Oldest appliance the intake form accepts, in years.
pub const MAX_APPLIANCE_AGE_YEARS: u32 = 100;

/// Case status as reported by the engine.
///
/// Ordered by lifecycle: a case only ever moves forward from `InProgress`
/// into one of the terminal states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CaseStatus {
    #[serde(rename = "EN_DIAGNOSTICO")]
    InProgress,
    #[serde(rename = "RESUELTO_DIY")]
    ResolvedSelfService,
    #[serde(rename = "REQUIERE_TECNICO")]
    RequiresTechnician,
    #[serde(rename = "CERRADO")]
    Closed,
    /// Any engine-specific status this client does not know about.
    #[serde(other)]
    Unrecognized,
}

impl CaseStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Whether a case may move from `self` to `next`.
    pub fn can_advance_to(&self, next: CaseStatus) -> bool {
        match self {
            Self::InProgress => true,
            Self::Closed => next == Self::Closed,
            _ => next == *self || next == Self::Closed,
        }
    }

    /// Wire code, used for listing labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InProgress => "EN_DIAGNOSTICO",
            Self::ResolvedSelfService => "RESUELTO_DIY",
            Self::RequiresTechnician => "REQUIERE_TECNICO",
            Self::Closed => "CERRADO",
            Self::Unrecognized => "DESCONOCIDO",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code().replacen('_', " ", 1))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplianceType {
    #[serde(rename = "HELADERA")]
    Refrigerator,
    #[serde(rename = "LAVARROPAS")]
    Washer,
    #[serde(rename = "MICROONDAS")]
    Microwave,
}

impl ApplianceType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Refrigerator => "HELADERA",
            Self::Washer => "LAVARROPAS",
            Self::Microwave => "MICROONDAS",
        }
    }
}

impl fmt::Display for ApplianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ApplianceType {
    type Err = DiagnosisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heladera" | "refrigerator" | "fridge" => Ok(Self::Refrigerator),
            "lavarropas" | "washer" | "washing-machine" => Ok(Self::Washer),
            "microondas" | "microwave" => Ok(Self::Microwave),
            other => Err(DiagnosisError::Validation(format!(
                "Tipo de electrodoméstico no soportado: {}",
                other
            ))),
        }
    }
}

/// A recorded response to one interview question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default)]
    pub id: Option<i64>,
    pub pregunta_id: i64,
    pub valor: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// One diagnosis session for one appliance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: i64,
    #[serde(rename = "clienteNombre", default)]
    pub client_name: Option<String>,
    #[serde(rename = "clienteTelefono", default)]
    pub client_phone: Option<String>,
    #[serde(rename = "tipo", default)]
    pub appliance: Option<ApplianceType>,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default)]
    pub model: Option<String>,
    #[serde(rename = "antiguedad", default)]
    pub age_years: Option<u32>,
    #[serde(rename = "sintomaReportado", default)]
    pub symptom: Option<String>,
    #[serde(rename = "estado")]
    pub status: CaseStatus,
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(rename = "respuestas", default)]
    pub answers: Option<Vec<Answer>>,
    #[serde(rename = "diagnostico", default)]
    pub diagnosis: Option<Diagnosis>,
}

impl Case {
    /// "HELADERA Whirlpool" style label used by the interview summary.
    pub fn appliance_label(&self) -> String {
        let kind = self.appliance.map(|a| a.code()).unwrap_or("-");
        match self.brand.as_deref() {
            Some(brand) if !brand.is_empty() => format!("{} {}", kind, brand),
            _ => kind.to_string(),
        }
    }
}

/// Intake form payload for `POST /casos`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    pub cliente_nombre: String,
    pub cliente_telefono: String,
    pub tipo: ApplianceType,
    pub marca: String,
    pub modelo: String,
    pub antiguedad: u32,
    pub sintoma_reportado: String,
}

impl NewCase {
    /// Reject incomplete intake forms before any network call.
    pub fn validate(&self) -> Result<(), DiagnosisError> {
        let required = [
            ("nombre del cliente", &self.cliente_nombre),
            ("teléfono", &self.cliente_telefono),
            ("marca", &self.marca),
            ("síntoma reportado", &self.sintoma_reportado),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DiagnosisError::Validation(format!(
                    "El campo '{}' es obligatorio",
                    field
                )));
            }
        }

        if self.antiguedad > MAX_APPLIANCE_AGE_YEARS {
            return Err(DiagnosisError::Validation(format!(
                "La antigüedad no puede superar {} años",
                MAX_APPLIANCE_AGE_YEARS
            )));
        }

        Ok(())
    }
}

/// Aggregate counters for the dashboard. Read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default)]
    pub casos_totales: u64,
    #[serde(default)]
    pub diy_exitosos: u64,
    #[serde(default)]
    pub tecnico_enviados: u64,
    #[serde(default)]
    pub tiempo_promedio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn intake() -> NewCase {
        NewCase {
            cliente_nombre: "Juan Pérez".into(),
            cliente_telefono: "+54 11 1234-5678".into(),
            tipo: ApplianceType::Refrigerator,
            marca: "Whirlpool".into(),
            modelo: "WRM45".into(),
            antiguedad: 6,
            sintoma_reportado: "no enfría".into(),
        }
    }

    #[test]
    fn case_deserializes_engine_payload() {
        let case: Case = serde_json::from_value(json!({
            "id": 42,
            "descripcion": "no enfría",
            "clienteNombre": "Juan Pérez",
            "clienteTelefono": "1234",
            "tipo": "HELADERA",
            "tipoElectrodomestico": "HELADERA",
            "marca": "Whirlpool",
            "modelo": null,
            "antiguedad": 6,
            "sintomaReportado": "no enfría",
            "estado": "EN_DIAGNOSTICO",
            "fechaCreacion": "2024-05-01T10:15:30.123456",
            "respuestas": [
                {"id": 1, "preguntaId": 1, "valor": "true", "timestamp": "2024-05-01T10:16:00"}
            ]
        }))
        .unwrap();

        assert_eq!(case.id, 42);
        assert_eq!(case.appliance, Some(ApplianceType::Refrigerator));
        assert_eq!(case.status, CaseStatus::InProgress);
        assert!(case.model.is_none());
        assert!(case.created_at.is_some());
        let answers = case.answers.as_deref().unwrap_or_default();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].pregunta_id, 1);
        assert_eq!(answers[0].valor, "true");
        assert_eq!(case.appliance_label(), "HELADERA Whirlpool");
    }

    #[test]
    fn unknown_status_is_kept_as_unrecognized() {
        let status: CaseStatus = serde_json::from_value(json!("DIAGNOSTICADO")).unwrap();
        assert_eq!(status, CaseStatus::Unrecognized);
        assert!(status.is_terminal());
    }

    #[test]
    fn statuses_only_move_forward() {
        use CaseStatus::*;
        assert!(InProgress.can_advance_to(RequiresTechnician));
        assert!(RequiresTechnician.can_advance_to(RequiresTechnician));
        assert!(RequiresTechnician.can_advance_to(Closed));
        assert!(!RequiresTechnician.can_advance_to(InProgress));
        assert!(!ResolvedSelfService.can_advance_to(RequiresTechnician));
        assert!(!Closed.can_advance_to(InProgress));
    }

    #[test]
    fn status_label_replaces_first_underscore() {
        assert_eq!(CaseStatus::RequiresTechnician.to_string(), "REQUIERE TECNICO");
        assert_eq!(CaseStatus::InProgress.to_string(), "EN DIAGNOSTICO");
    }

    #[test]
    fn appliance_type_parses_both_locales() {
        assert_eq!("heladera".parse::<ApplianceType>().unwrap(), ApplianceType::Refrigerator);
        assert_eq!("Washer".parse::<ApplianceType>().unwrap(), ApplianceType::Washer);
        assert!("toaster".parse::<ApplianceType>().is_err());
    }

    #[test]
    fn intake_serializes_with_engine_field_names() {
        let body = serde_json::to_value(intake()).unwrap();
        assert_eq!(body["clienteNombre"], "Juan Pérez");
        assert_eq!(body["tipo"], "HELADERA");
        assert_eq!(body["sintomaReportado"], "no enfría");
    }

    #[test]
    fn intake_validation() {
        assert!(intake().validate().is_ok());

        let mut missing_phone = intake();
        missing_phone.cliente_telefono = "   ".into();
        assert!(matches!(missing_phone.validate(), Err(DiagnosisError::Validation(_))));

        let mut too_old = intake();
        too_old.antiguedad = 150;
        assert!(too_old.validate().is_err());
    }
}
