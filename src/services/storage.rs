use reqwest::Client;

use crate::errors::AppError;

/// Client for the hosted object storage API. Only used for property images.
#[derive(Clone)]
pub struct StorageApiService {
    client: Client,
    storage_url: String,
    anon_key: String,
}

impl StorageApiService {
    pub fn new(client: Client, storage_url: String, anon_key: String) -> Self {
        Self {
            client,
            storage_url,
            anon_key,
        }
    }

    /// Upload an object and return its public URL.
    pub async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let url = format!("{}/object/{}/{}", self.storage_url, bucket, path);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Storage upload to {} failed: {} - {}", path, status, error_text);
            return Err(AppError::Backend(format!(
                "upload failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(self.public_url(bucket, path))
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.storage_url, bucket, path)
    }
}
