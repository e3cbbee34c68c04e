use crate::media::MediaFile;
use crate::prelude::{CompareError, CompareResult, SlotId};
use crate::service::payload::{
    interpret_response, ComparisonRequest, ComparisonResult, VerificationPolicy,
};
use crate::settings::ServiceConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// Seam between the workflow and whatever answers comparison requests.
#[async_trait]
pub trait CompareClient: Send + Sync {
    async fn compare(&self, request: ComparisonRequest) -> CompareResult<ComparisonResult>;
}

/// Multipart HTTP client for the external comparison service.
#[derive(Debug, Clone)]
pub struct HttpCompareClient {
    http: reqwest::Client,
    url: String,
    policy: VerificationPolicy,
}

impl HttpCompareClient {
    pub fn new(config: &ServiceConfig, policy: VerificationPolicy) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            policy,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_form(request: &ComparisonRequest) -> CompareResult<Form> {
        Ok(Form::new()
            .part(SlotId::First.field_name(), image_part(&request.first)?)
            .part(SlotId::Second.field_name(), image_part(&request.second)?)
            .text("model_name", request.model.as_str()))
    }
}

fn image_part(media: &MediaFile) -> CompareResult<Part> {
    let part = Part::bytes(media.bytes().to_vec()).file_name(media.file_name().to_string());
    match media.media_type() {
        Some(mime) => part
            .mime_str(mime)
            .map_err(|_| CompareError::InvalidMediaType {
                file_name: media.file_name().to_string(),
                media_type: Some(mime.to_string()),
            }),
        None => Ok(part),
    }
}

#[async_trait]
impl CompareClient for HttpCompareClient {
    async fn compare(&self, request: ComparisonRequest) -> CompareResult<ComparisonResult> {
        let form = Self::build_form(&request)?;
        log::info!(
            "POST {} ({} + {} bytes, model {})",
            self.url,
            request.first.len(),
            request.second.len(),
            request.model
        );

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::warn!("comparison request failed: {}", e);
                CompareError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            log::warn!("reading comparison response failed: {}", e);
            CompareError::Network(e.to_string())
        })?;
        log::debug!("comparison service answered {} ({} bytes)", status, body.len());

        interpret_response(status.as_u16(), &body, request.model, &self.policy)
    }
}
