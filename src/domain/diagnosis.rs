use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Urgency {
    #[serde(rename = "BAJA")]
    Low,
    #[serde(rename = "MEDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
    #[serde(rename = "CRITICA")]
    Critical,
}

impl Urgency {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Baja",
            Self::Medium => "Media",
            Self::High => "Alta",
            Self::Critical => "Crítica",
        }
    }
}

/// Terminal output of a finalized case. Produced once by the engine and
/// never modified by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(rename = "causaProbable")]
    pub probable_cause: String,
    #[serde(rename = "componenteAfectado", default)]
    pub affected_component: Option<String>,
    #[serde(rename = "certeza", alias = "probabilidad", default)]
    pub certainty: Option<f64>,
    #[serde(rename = "requiereTecnico", default)]
    pub requires_technician: Option<bool>,
    #[serde(rename = "urgencia", default)]
    pub urgency: Option<Urgency>,
    #[serde(rename = "costoMinimo", alias = "costoEstimadoMin", default)]
    pub cost_min: Option<f64>,
    #[serde(rename = "costoMaximo", alias = "costoEstimadoMax", default)]
    pub cost_max: Option<f64>,
    /// Minutes.
    #[serde(rename = "tiempoEstimado", default)]
    pub estimated_minutes: Option<u32>,
    #[serde(rename = "probabilidadExitoDIY", default)]
    pub diy_success_probability: Option<f64>,
    #[serde(rename = "scriptCliente", default)]
    pub client_script: Option<String>,
}

impl Diagnosis {
    /// "$1200 - $3500", or whichever bound is known.
    pub fn cost_range(&self) -> Option<String> {
        match (self.cost_min, self.cost_max) {
            (Some(min), Some(max)) => Some(format!("${:.0} - ${:.0}", min, max)),
            (Some(min), None) => Some(format!("desde ${:.0}", min)),
            (None, Some(max)) => Some(format!("hasta ${:.0}", max)),
            (None, None) => None,
        }
    }
}
