use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::error::AppError;
use crate::media::{sniff, UploadedFile};

/// Stores an image somewhere public and returns its HTTPS URL.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, file: &UploadedFile) -> Result<String, AppError>;
}

/// Signed uploads to the Cloudinary REST API.
pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: CloudinaryConfig,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadFailure {
    error: UploadFailureMessage,
}

#[derive(Debug, Deserialize)]
struct UploadFailureMessage {
    message: String,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Self {
        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            config.cloud_name
        );
        Self {
            client: reqwest::Client::new(),
            config,
            endpoint,
        }
    }

    /// SHA-256 over the signed parameters followed by the API secret.
    fn sign(&self, timestamp: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("timestamp={}{}", timestamp, self.config.api_secret));
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, file: &UploadedFile) -> Result<String, AppError> {
        let timestamp = chrono::Utc::now().timestamp();
        let mime = sniff(&file.bytes)
            .map(|kind| kind.mime())
            .unwrap_or("application/octet-stream");
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone().unwrap_or_else(|| "upload".to_string()))
            .mime_str(mime)?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", self.sign(timestamp));

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<UploadFailure>()
                .await
                .map(|failure| failure.error.message)
                .unwrap_or_else(|e| e.to_string());
            return Err(AppError::InternalServerError(format!(
                "image host rejected upload ({}): {}",
                status, reason
            )));
        }

        let result: UploadResult = response.json().await?;
        log::debug!("uploaded image to {}", result.secure_url);
        Ok(result.secure_url)
    }
}
