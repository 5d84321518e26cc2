use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const RESOURCE_RAW: &str = "raw";
pub const RESOURCE_IMAGE: &str = "image";

#[derive(Debug, Clone, Deserialize)]
pub struct StoredObject {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Thin client for the Cloudinary upload API. Uploads are primary-path
/// effects (a failed upload aborts the request that needed it); destroys are
/// best-effort and callers decide what to do with a `false` outcome.
#[derive(Clone)]
pub struct StorageService {
    client: Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

impl StorageService {
    pub fn new(
        client: Client,
        api_base: String,
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base,
            cloud_name,
            api_key,
            api_secret,
            folder,
        }
    }

    pub async fn upload(
        &self,
        data: Bytes,
        filename: &str,
        resource_type: &str,
    ) -> Result<StoredObject> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed_params: Vec<(String, String)> =
            vec![("timestamp".to_string(), timestamp.clone())];
        if let Some(folder) = &self.folder {
            signed_params.push(("folder".to_string(), folder.clone()));
        }
        let signature = sign_params(&signed_params, &self.api_secret);

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(data.to_vec()).file_name(filename.to_string()),
            )
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);
        if let Some(folder) = &self.folder {
            form = form.text("folder", folder.clone());
        }

        let url = format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base, self.cloud_name, resource_type
        );
        let response = self.client.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Upload failed with status {}: {}",
                status, body
            )));
        }

        let stored: StoredObject = response.json().await?;
        info!(public_id = %stored.public_id, "Uploaded file to storage");
        Ok(stored)
    }

    /// Removes a stored object. Returns `Ok(true)` only when the gateway
    /// confirms the deletion; a missing object or a gateway error is `Ok(false)`
    /// so callers can continue with their primary mutation.
    pub async fn destroy(&self, public_id: &str, resource_type: &str) -> Result<bool> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed_params = vec![
            ("invalidate".to_string(), "true".to_string()),
            ("public_id".to_string(), public_id.to_string()),
            ("timestamp".to_string(), timestamp.clone()),
        ];
        let signature = sign_params(&signed_params, &self.api_secret);

        let url = format!(
            "{}/v1_1/{}/{}/destroy",
            self.api_base, self.cloud_name, resource_type
        );
        let response = self
            .client
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("invalidate", "true"),
                ("api_key", &self.api_key),
                ("timestamp", &timestamp),
                ("signature_algorithm", "sha256"),
                ("signature", &signature),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(public_id, status = %response.status(), "Storage destroy returned error status");
            return Ok(false);
        }

        let body: DestroyResponse = response.json().await?;
        if body.result == "ok" {
            Ok(true)
        } else {
            warn!(public_id, result = %body.result, "Storage destroy did not remove the object");
            Ok(false)
        }
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as a
/// query string, secret appended, SHA-256 hashed and hex encoded.
fn sign_params(params: &[(String, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let to_sign: String = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_and_order_independent() {
        let a = vec![
            ("timestamp".to_string(), "100".to_string()),
            ("folder".to_string(), "job-board".to_string()),
        ];
        let b = vec![
            ("folder".to_string(), "job-board".to_string()),
            ("timestamp".to_string(), "100".to_string()),
        ];
        assert_eq!(sign_params(&a, "secret"), sign_params(&b, "secret"));
        assert_ne!(sign_params(&a, "secret"), sign_params(&a, "other"));
    }

    #[test]
    fn signature_is_hex_sha256() {
        let sig = sign_params(&[("timestamp".to_string(), "1".to_string())], "s");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
