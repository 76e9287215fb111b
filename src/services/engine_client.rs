//! HTTP client for the remote inference engine.
//!
//! Provides type-safe methods for:
//! - Case records (fetch, list, create, metrics)
//! - The interview protocol (next question, answer, hypotheses, finalize)

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    AnswerSubmission, Case, Hypothesis, Metrics, NewCase, NextQuestion, Question,
};
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::services::{CaseRecords, InterviewProtocol};

/// Header carrying the per-call correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Client for the inference engine.
#[derive(Clone)]
pub struct EngineClient {
    client: Client,
    base_url: String,
}

/// Error body returned by the engine.
#[derive(Debug, Deserialize)]
struct EngineErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl EngineClient {
    /// Create a new engine client.
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        tracing::debug!(base_url = base_url, "Engine client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the correlation id and send.
    async fn send(&self, req: RequestBuilder) -> DiagnosisResult<Response> {
        let request_id = Uuid::new_v4().to_string();

        let response = req
            .header(X_REQUEST_ID, &request_id)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, request_id = %request_id, "Engine request failed");
                DiagnosisError::Network(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, request_id = %request_id, "Engine response");

        if status.is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    /// Map a non-success response to the error taxonomy.
    async fn error_from(response: Response) -> DiagnosisError {
        let status = response.status();

        let error_body = response.json::<EngineErrorResponse>().await.ok();

        let message = error_body
            .and_then(|e| e.message.or(e.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Engine error: {}", status));

        match status {
            StatusCode::NOT_FOUND => DiagnosisError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                DiagnosisError::Validation(message)
            }
            _ => {
                warn!(status = %status, message = %message, "Engine error");
                DiagnosisError::Engine {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    /// Make a GET request and decode the JSON body.
    async fn get<R: DeserializeOwned>(&self, path: &str) -> DiagnosisResult<R> {
        let url = self.url(path);
        debug!(url = %url, "Engine GET");

        let response = self.send(self.client.get(&url)).await?;
        response.json::<R>().await.map_err(|e| {
            error!(error = %e, "Failed to parse engine response");
            DiagnosisError::InvalidResponse(e.to_string())
        })
    }

    /// Make a POST request with an optional JSON body.
    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&T>,
    ) -> DiagnosisResult<Response> {
        let url = self.url(path);
        debug!(url = %url, "Engine POST");

        let mut req = self.client.post(&url);
        if let Some(body) = body {
            req = req.json(body);
        }

        self.send(req).await
    }

    async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&T>,
    ) -> DiagnosisResult<R> {
        self.post(path, body).await?.json::<R>().await.map_err(|e| {
            error!(error = %e, "Failed to parse engine response");
            DiagnosisError::InvalidResponse(e.to_string())
        })
    }

    /// Check that the engine answers at all.
    pub async fn health_check(&self) -> Result<()> {
        let url = self.url("/metricas");

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Engine health check failed")?
            .error_for_status()
            .context("Engine unhealthy")?;

        Ok(())
    }
}

// =========================================================================
// Case Records
// =========================================================================

#[async_trait]
impl CaseRecords for EngineClient {
    #[instrument(skip(self))]
    async fn get_case(&self, case_id: i64) -> DiagnosisResult<Case> {
        self.get(&format!("/casos/{}", case_id)).await
    }

    #[instrument(skip(self))]
    async fn list_cases(&self) -> DiagnosisResult<Vec<Case>> {
        self.get("/casos").await
    }

    #[instrument(skip(self, new_case))]
    async fn create_case(&self, new_case: &NewCase) -> DiagnosisResult<Case> {
        self.post_json("/casos", Some(new_case)).await
    }

    #[instrument(skip(self))]
    async fn metrics(&self) -> DiagnosisResult<Metrics> {
        self.get("/metricas").await
    }
}

// =========================================================================
// Interview Protocol
// =========================================================================

#[async_trait]
impl InterviewProtocol for EngineClient {
    #[instrument(skip(self))]
    async fn next_question(&self, case_id: i64) -> DiagnosisResult<NextQuestion> {
        let url = self.url(&format!("/casos/{}/siguiente-pregunta", case_id));
        let response = self.send(self.client.get(&url)).await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!(case_id, "Engine reports no further questions");
            return Ok(NextQuestion::Finished);
        }

        let body = response.bytes().await?;
        parse_next_question(&body)
    }

    #[instrument(skip(self, value))]
    async fn submit_answer(
        &self,
        case_id: i64,
        question_id: i64,
        value: &str,
    ) -> DiagnosisResult<()> {
        if value.trim().is_empty() {
            return Err(DiagnosisError::Validation(
                "La respuesta no puede estar vacía".to_string(),
            ));
        }

        let submission = AnswerSubmission {
            pregunta_id: question_id,
            valor: value.to_string(),
        };

        self.post(&format!("/casos/{}/responder", case_id), Some(&submission))
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn hypotheses(&self, case_id: i64) -> DiagnosisResult<Vec<Hypothesis>> {
        let hypotheses: Option<Vec<Hypothesis>> =
            self.get(&format!("/casos/{}/hipotesis", case_id)).await?;
        Ok(hypotheses.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn finalize(&self, case_id: i64) -> DiagnosisResult<Case> {
        let path = format!("/casos/{}/finalizar", case_id);

        match self.post_json::<(), Case>(&path, None).await {
            Ok(case) => Ok(case),
            // The engine may refuse to finalize twice; the stored terminal
            // state is the answer in that case.
            Err(err @ (DiagnosisError::Validation(_) | DiagnosisError::Engine { status: 409, .. })) => {
                let case = self.get_case(case_id).await?;
                if case.status.is_terminal() {
                    debug!(case_id, status = ?case.status, "Case already finalized");
                    Ok(case)
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// A 2xx with an empty or `null` body means the interview is finished.
fn parse_next_question(body: &[u8]) -> DiagnosisResult<NextQuestion> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DiagnosisError::InvalidResponse(e.to_string()))?
        .trim();

    if text.is_empty() || text == "null" {
        return Ok(NextQuestion::Finished);
    }

    serde_json::from_str::<Question>(text)
        .map(NextQuestion::Ready)
        .map_err(|e| {
            error!(error = %e, "Failed to parse question");
            DiagnosisError::InvalidResponse(e.to_string())
        })
}
