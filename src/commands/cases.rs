//! `cases`, `new` and `result` commands.

use anyhow::{anyhow, Result};

use super::render;
use crate::domain::NewCase;
use crate::presenter::result::reconcile;
use crate::services::records::{create_validated, load_dashboard};
use crate::services::CaseRecords;

pub async fn list<R>(records: &R) -> Result<()>
where
    R: CaseRecords + ?Sized,
{
    let dashboard = load_dashboard(records)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    print!("{}", render::case_list(&dashboard.cases, &dashboard.metrics));
    Ok(())
}

/// Create the case and return its id.
pub async fn create<R>(records: &R, new_case: &NewCase) -> Result<i64>
where
    R: CaseRecords + ?Sized,
{
    let case = create_validated(records, new_case)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    println!("Caso #{} creado ({}).", case.id, case.status);
    Ok(case.id)
}

pub async fn show_result<R>(records: &R, case_id: i64) -> Result<()>
where
    R: CaseRecords + ?Sized,
{
    let view = reconcile(records, case_id)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    print!("{}", render::result(&view));
    Ok(())
}
