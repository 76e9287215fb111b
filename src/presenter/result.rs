//! Result view shown once an interview has been finalized.
//!
//! The case is reloaded by id and its terminal status picks exactly one
//! guidance panel.

use crate::domain::{Case, CaseStatus};
use crate::error::DiagnosisResult;
use crate::services::CaseRecords;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPanel {
    /// Red/alert emphasis.
    TechnicianRequired,
    /// Green/success emphasis.
    ResolvedSelfService,
    /// Neutral emphasis for every other status.
    Other,
}

impl ResultPanel {
    pub fn for_status(status: CaseStatus) -> Self {
        match status {
            CaseStatus::RequiresTechnician => Self::TechnicianRequired,
            CaseStatus::ResolvedSelfService => Self::ResolvedSelfService,
            _ => Self::Other,
        }
    }

    pub fn headline(&self) -> Option<&'static str> {
        match self {
            Self::TechnicianRequired => Some("Se Requiere Atención Técnica Especializada"),
            Self::ResolvedSelfService => Some("Diagnóstico Resuelto Exitosamente"),
            Self::Other => None,
        }
    }

    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::TechnicianRequired => Some(
                "Este caso requiere la intervención de un técnico calificado para garantizar \
                 una reparación segura y efectiva del equipo.",
            ),
            Self::ResolvedSelfService => Some(
                "El problema ha sido identificado y puede ser solucionado siguiendo \
                 las recomendaciones proporcionadas.",
            ),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultView {
    pub case: Case,
    pub panel: ResultPanel,
}

impl ResultView {
    pub fn from_case(case: Case) -> Self {
        let panel = ResultPanel::for_status(case.status);
        Self { case, panel }
    }
}

/// Reload the case and build its result view.
pub async fn reconcile<R>(records: &R, case_id: i64) -> DiagnosisResult<ResultView>
where
    R: CaseRecords + ?Sized,
{
    let case = records.get_case(case_id).await?;
    tracing::debug!(case_id, status = ?case.status, "Result view loaded");
    Ok(ResultView::from_case(case))
}
