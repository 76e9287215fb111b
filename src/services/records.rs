//! Case record access: fetch, list and create cases, plus the metrics
//! snapshot shown next to the case list.

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::domain::{Case, Metrics, NewCase};
use crate::error::DiagnosisResult;

#[async_trait]
pub trait CaseRecords: Send + Sync {
    async fn get_case(&self, case_id: i64) -> DiagnosisResult<Case>;

    /// Cases in engine order, which is not guaranteed. See [`newest_first`].
    async fn list_cases(&self) -> DiagnosisResult<Vec<Case>>;

    async fn create_case(&self, new_case: &NewCase) -> DiagnosisResult<Case>;

    async fn metrics(&self) -> DiagnosisResult<Metrics>;
}

/// Sort by creation time, most recent first. Cases without a timestamp go last.
pub fn newest_first(cases: &mut [Case]) {
    cases.sort_by(|a, b| match (&a.created_at, &b.created_at) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Case list and metrics as the dashboard shows them.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub cases: Vec<Case>,
    pub metrics: Metrics,
}

pub async fn load_dashboard<R>(records: &R) -> DiagnosisResult<Dashboard>
where
    R: CaseRecords + ?Sized,
{
    let (mut cases, metrics) = tokio::try_join!(records.list_cases(), records.metrics())?;
    newest_first(&mut cases);

    tracing::debug!(cases = cases.len(), "Dashboard loaded");

    Ok(Dashboard { cases, metrics })
}

/// Validate the intake form locally, then create the case.
pub async fn create_validated<R>(records: &R, new_case: &NewCase) -> DiagnosisResult<Case>
where
    R: CaseRecords + ?Sized,
{
    new_case.validate()?;
    let case = records.create_case(new_case).await?;
    tracing::info!(case_id = case.id, appliance = %new_case.tipo, "Case created");
    Ok(case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CaseStatus;
    use chrono::NaiveDate;

    fn case(id: i64, hour: Option<u32>) -> Case {
        Case {
            id,
            client_name: None,
            client_phone: None,
            appliance: None,
            brand: None,
            model: None,
            age_years: None,
            symptom: None,
            status: CaseStatus::InProgress,
            created_at: hour.map(|h| {
                NaiveDate::from_ymd_opt(2024, 5, 1)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap()
            }),
            answers: None,
            diagnosis: None,
        }
    }

    #[test]
    fn later_case_renders_first_regardless_of_engine_order() {
        let mut cases = vec![case(1, Some(9)), case(2, Some(11))];
        newest_first(&mut cases);
        assert_eq!(cases.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);

        let mut cases = vec![case(2, Some(11)), case(1, Some(9))];
        newest_first(&mut cases);
        assert_eq!(cases.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn cases_without_timestamp_go_last() {
        let mut cases = vec![case(3, None), case(1, Some(8)), case(2, Some(10))];
        newest_first(&mut cases);
        assert_eq!(cases.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1, 3]);
    }
}
