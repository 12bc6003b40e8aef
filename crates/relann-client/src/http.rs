//! HTTP implementations of the service traits
//!
//! All three services speak JSON over HTTP. Transport failures, non-2xx
//! statuses and undecodable bodies all surface as
//! [`RelannError::ServiceUnavailable`]; nothing is retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use relann_core::{
    ExtractionResponse, PersistRequest, RelannError, Result, SentenceRequest, SentenceResponse,
    Service, ServiceConfig,
};

use crate::{ExtractionService, PersistenceService, SentenceQueue};

/// JSON-over-HTTP client for the extraction, persistence, and queue services
#[derive(Debug, Clone)]
pub struct HttpServices {
    client: Client,
    extraction_url: String,
    persistence_url: String,
    queue_url: String,
}

impl HttpServices {
    /// Create from config
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            extraction_url: config.extraction_url.clone(),
            persistence_url: config.persistence_url.clone(),
            queue_url: config.queue_url.clone(),
        })
    }

    async fn post<B>(&self, service: Service, url: &str, body: &B) -> Result<Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| RelannError::unavailable(service, format!("Request failed: {e}")))?;
        check_status(service, response).await
    }

    async fn get(&self, service: Service, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RelannError::unavailable(service, format!("Request failed: {e}")))?;
        check_status(service, response).await
    }
}

async fn check_status(service: Service, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    tracing::warn!(%service, %status, "service returned an error status");
    Err(RelannError::unavailable(
        service,
        format!("{status}: {error_text}"),
    ))
}

async fn decode<T: DeserializeOwned>(service: Service, response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| RelannError::unavailable(service, format!("Failed to parse response: {e}")))
}

/// Acknowledgements are opaque: keep JSON as-is, wrap anything else as a string
async fn acknowledgement(service: Service, response: Response) -> Result<serde_json::Value> {
    let body = response
        .text()
        .await
        .map_err(|e| RelannError::unavailable(service, format!("Failed to read response: {e}")))?;
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
}

#[async_trait]
impl ExtractionService for HttpServices {
    async fn predict(&self, sentence: &str) -> Result<ExtractionResponse> {
        tracing::debug!(sentence, url = %self.extraction_url, "requesting extraction");
        let response = self
            .post(
                Service::Extraction,
                &self.extraction_url,
                &SentenceRequest::new(sentence),
            )
            .await?;
        let predictions: ExtractionResponse = decode(Service::Extraction, response).await?;
        tracing::debug!(candidates = predictions.total(), "extraction received");
        Ok(predictions)
    }
}

#[async_trait]
impl PersistenceService for HttpServices {
    async fn persist(&self, request: &PersistRequest) -> Result<serde_json::Value> {
        tracing::debug!(
            sentence = %request.sentence,
            valid = request.valid_instances.len(),
            invalid = request.invalid_instances.len(),
            "persisting confirmation"
        );
        let response = self
            .post(Service::Persistence, &self.persistence_url, request)
            .await?;
        acknowledgement(Service::Persistence, response).await
    }
}

#[async_trait]
impl SentenceQueue for HttpServices {
    async fn next_sentence(&self) -> Result<String> {
        let response = self.get(Service::Queue, &self.queue_url).await?;
        let next: SentenceResponse = decode(Service::Queue, response).await?;
        Ok(next.sentence)
    }

    async fn skip(&self, sentence: &str) -> Result<()> {
        let response = self
            .post(Service::Queue, &self.queue_url, &SentenceRequest::new(sentence))
            .await?;
        acknowledgement(Service::Queue, response).await?;
        Ok(())
    }
}
