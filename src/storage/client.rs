use super::StorageService;
use crate::models::{ListObjectsRequest, SortBy, StorageObject};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;

/// The list endpoint pages its results; follow offsets until a short page.
const LIST_PAGE_SIZE: usize = 100;

pub struct StorageClient {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(base_url: String, api_key: String, bucket: String) -> Self {
        Self::new_with_client(base_url, api_key, bucket, Client::new())
    }

    /// Construct with a shared HTTP connection pool.
    pub fn new_with_client(
        base_url: String,
        api_key: String,
        bucket: String,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            bucket,
        }
    }

    async fn list_page(&self, prefix: &str, offset: usize) -> Result<Vec<StorageObject>> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let request = ListObjectsRequest {
            prefix: prefix.to_string(),
            limit: LIST_PAGE_SIZE,
            offset,
            sort_by: SortBy::name_ascending(),
        };

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send storage list request: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Storage API error (status {}): {}", status, error_text);
            return Err(Error::Storage(format!(
                "Storage API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse storage listing: {}\nBody: {}", e, body);
            Error::from(e)
        })
    }
}

#[async_trait]
impl StorageService for StorageClient {
    async fn list_folder(&self, prefix: &str) -> Result<Vec<StorageObject>> {
        let mut objects = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.list_page(prefix, offset).await?;
            let page_len = page.len();
            objects.extend(page);

            if page_len < LIST_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }

        Ok(objects)
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}
