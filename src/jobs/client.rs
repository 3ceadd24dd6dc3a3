use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::error::JobClientError;
use super::types::{JobId, JobService, JobSpec, JobStatusResponse};

/// HTTP implementation of [`JobService`].
///
/// Submits jobs with `POST {base}/api/jobs` and polls them with
/// `GET {base}/api/jobs/{id}/status`.
pub struct HttpJobClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
}

impl HttpJobClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_api_key(base_url, None)
    }

    /// Create a client carrying an application key sent as `x-api-key`.
    pub fn with_api_key(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, JobClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(JobClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl JobService for HttpJobClient {
    async fn submit(&self, spec: &JobSpec) -> Result<JobId, JobClientError> {
        let url = format!("{}/api/jobs", self.base_url);
        let response = self.request(self.client.post(&url)).json(spec).send().await?;
        let response = Self::check(response).await?;

        let body = response
            .json::<SubmitResponse>()
            .await
            .map_err(|e| JobClientError::Parse(e.to_string()))?;
        tracing::debug!(target: "flowstat::jobs", job_id = %body.job_id, "job submitted");
        Ok(JobId(body.job_id))
    }

    async fn get_status(&self, id: &JobId) -> Result<JobStatusResponse, JobClientError> {
        let url = format!("{}/api/jobs/{}/status", self.base_url, id);
        let response = self.request(self.client.get(&url)).send().await?;
        let response = Self::check(response).await?;

        response
            .json::<JobStatusResponse>()
            .await
            .map_err(|e| JobClientError::Parse(e.to_string()))
    }
}
