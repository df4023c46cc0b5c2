//! Client for the external 360° / video hosting service.
//!
//! Flow: upload a file, ask the service to validate it, then request the
//! generated 360° model. The bearer token comes from configuration.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use dealerdash_core::error::CoreError;
use dealerdash_core::staging::StagedFile;

use crate::error::{ClientError, ClientResult, GENERIC_ERROR_MESSAGE};
use crate::response::ErrorBody;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub model_url: String,
}

#[derive(Clone)]
pub struct Media360Api {
    client: reqwest::Client,
    base_url: String,
    token: String,
    cancel: CancellationToken,
}

impl Media360Api {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `POST /upload` with a multipart `file`.
    pub async fn upload(&self, file: StagedFile) -> ClientResult<UploadResponse> {
        let file_name = file.file_name.clone();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime_type)?;
        let builder = self
            .client
            .post(format!("{}/upload", self.base_url))
            .bearer_auth(&self.token)
            .multipart(Form::new().part("file", part));
        let uploaded: UploadResponse = self.send(builder).await?;
        tracing::info!(file = %file_name, media_id = %uploaded.id, "Uploaded to 360 service");
        Ok(uploaded)
    }

    /// `GET /validate/{id}`.
    pub async fn validate(&self, id: &str) -> ClientResult<ValidationResponse> {
        let builder = self
            .client
            .get(format!("{}/validate/{id}", self.base_url))
            .bearer_auth(&self.token);
        self.send(builder).await
    }

    /// `POST /generate/{id}`.
    pub async fn generate(&self, id: &str) -> ClientResult<GenerateResponse> {
        let builder = self
            .client
            .post(format!("{}/generate/{id}", self.base_url))
            .bearer_auth(&self.token);
        self.send(builder).await
    }

    /// Upload, validate and generate in one go. A rejected file stops the
    /// flow with the service's reason.
    pub async fn process(&self, file: StagedFile) -> ClientResult<GenerateResponse> {
        let UploadResponse { id } = self.upload(file).await?;
        let validation = self.validate(&id).await?;
        if !validation.valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| "The file was rejected by the 360 service".into());
            tracing::warn!(media_id = %id, %reason, "360 validation failed");
            return Err(CoreError::Validation(reason).into());
        }
        let generated = self.generate(&id).await?;
        tracing::info!(media_id = %id, model_url = %generated.model_url, "360 model generated");
        Ok(generated)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> ClientResult<T> {
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
            result = builder.send() => result?,
        };
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
