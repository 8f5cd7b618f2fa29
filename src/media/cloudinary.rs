//! Signed REST client for a Cloudinary-compatible media host.

use core::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::{DestroyOutcome, MediaError, MediaStore, StorageClass, StoredObject, UploadRequest};
use crate::config::{MediaConfig, SignatureAlgorithm};

#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: Client,
    config: MediaConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    resource_type: String,
    #[serde(default)]
    bytes: u64,
    version: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    /// Creates a client with a request timeout suited to 10 MiB uploads.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: MediaConfig) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, class: StorageClass, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            class.as_str(),
            action
        )
    }

    /// Multipart form carrying the signed parameters plus `api_key`.
    fn signed_form(&self, params: &[(&str, String)]) -> Form {
        let timestamp = Utc::now().timestamp().to_string();
        let mut signed: Vec<(&str, String)> = params.to_vec();
        signed.push(("timestamp", timestamp));
        let algorithm = self.config.signature_algorithm;
        let signature = sign(&signed, &self.config.api_secret, algorithm);

        signed
            .into_iter()
            .fold(Form::new(), |form, (k, v)| form.text(k.to_string(), v))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", algorithm.as_str())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, MediaError> {
        tracing::info!(
            folder = %request.folder,
            public_id = %request.public_id,
            class = %request.class,
            bytes = request.data.len(),
            "Uploading to media host"
        );

        let part = Part::bytes(request.data)
            .file_name(request.file_name)
            .mime_str(&request.content_type)?;
        let form = self
            .signed_form(&[
                ("folder", request.folder),
                ("public_id", request.public_id),
            ])
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint(request.class, "upload"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = Self::check(response).await?.json().await?;

        Ok(StoredObject {
            secure_url: body.secure_url,
            public_id: body.public_id,
            class: StorageClass::parse(&body.resource_type).unwrap_or(request.class),
            bytes: body.bytes,
            version: body.version,
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        class: StorageClass,
    ) -> Result<DestroyOutcome, MediaError> {
        let form = self.signed_form(&[
            ("invalidate", "true".to_string()),
            ("public_id", public_id.to_string()),
        ]);
        let response = self
            .client
            .post(self.endpoint(class, "destroy"))
            .multipart(form)
            .send()
            .await?;
        let body: DestroyResponse = Self::check(response).await?.json().await?;

        match body.result.as_str() {
            "ok" => Ok(DestroyOutcome::Deleted),
            "not found" => Ok(DestroyOutcome::NotFound),
            other => Err(MediaError::Rejected {
                status: 200,
                body: format!("unexpected destroy result '{other}'"),
            }),
        }
    }
}

/// Request signature: sorted `key=value` pairs joined by `&`, then the secret,
/// hex-encoded under the configured digest.
pub fn sign(params: &[(&str, String)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, api_secret),
    }
}

fn hex_digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
