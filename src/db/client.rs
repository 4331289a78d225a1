use super::EpisodeStore;
use crate::models::{Episode, NewEpisode, NewImage};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;

const EPISODE_COLUMNS: &str = "id,work_id,episode_number,title";

pub struct EpisodeStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EpisodeStoreClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self::new_with_client(base_url, api_key, Client::new())
    }

    /// Construct with a shared HTTP connection pool.
    pub fn new_with_client(base_url: String, api_key: String, client: Client) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(&self, response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("{} failed (status {}): {}", context, status, error_text);
            return Err(Error::Database(format!(
                "{} failed (status {}): {}",
                context, status, error_text
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl EpisodeStore for EpisodeStoreClient {
    async fn find_episode(&self, work_id: i64, episode_number: i64) -> Result<Option<Episode>> {
        let work_filter = format!("eq.{}", work_id);
        let episode_filter = format!("eq.{}", episode_number);
        let response = self
            .with_auth(self.client.get(self.table_url("episodes")))
            .query(&[
                ("select", EPISODE_COLUMNS),
                ("work_id", work_filter.as_str()),
                ("episode_number", episode_filter.as_str()),
            ])
            .send()
            .await?;

        let response = self.check(response, "Episode lookup").await?;
        let rows: Vec<Episode> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn create_episode(&self, episode: &NewEpisode) -> Result<Episode> {
        let response = self
            .with_auth(self.client.post(self.table_url("episodes")))
            .header("Prefer", "return=representation")
            .json(&[episode])
            .send()
            .await?;

        let response = self.check(response, "Episode insert").await?;
        let rows: Vec<Episode> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Database("Episode insert returned no row".to_string()))
    }

    async fn replace_images(&self, episode_id: i64, images: &[NewImage]) -> Result<()> {
        let response = self
            .with_auth(self.client.delete(self.table_url("images")))
            .query(&[("episode_id", &format!("eq.{}", episode_id))])
            .send()
            .await?;
        self.check(response, "Image delete").await?;

        if images.is_empty() {
            return Ok(());
        }

        let response = self
            .with_auth(self.client.post(self.table_url("images")))
            .header("Prefer", "return=minimal")
            .json(images)
            .send()
            .await?;
        self.check(response, "Image insert").await?;

        Ok(())
    }
}
