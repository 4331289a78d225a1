//! Data models and structures
//!
//! Defines the core data structures for storage objects, episode and image
//! rows, and API interactions with the Supabase Storage and PostgREST
//! services.

use serde::{Deserialize, Serialize};

/// File extensions treated as episode page images.
const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// One entry returned by the storage list endpoint.
///
/// Folder placeholders come back with a null `id`; only real objects carry
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageObject {
    pub name: String,
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl StorageObject {
    /// Build a plain file entry (test and mock helper).
    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: Some(format!("object-{}", name)),
            updated_at: None,
            created_at: None,
            metadata: None,
        }
    }

    /// Build a folder placeholder entry (test and mock helper).
    pub fn folder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: None,
            updated_at: None,
            created_at: None,
            metadata: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }

    /// True for real objects whose name ends in a known image extension.
    pub fn is_image(&self) -> bool {
        if self.is_folder() {
            return false;
        }
        let name = self.name.to_ascii_lowercase();
        IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    }
}

// Storage list API request models
#[derive(Debug, Serialize)]
pub struct ListObjectsRequest {
    pub prefix: String,
    pub limit: usize,
    pub offset: usize,
    #[serde(rename = "sortBy")]
    pub sort_by: SortBy,
}

#[derive(Debug, Serialize)]
pub struct SortBy {
    pub column: String,
    pub order: String,
}

impl SortBy {
    pub fn name_ascending() -> Self {
        Self {
            column: "name".to_string(),
            order: "asc".to_string(),
        }
    }
}

/// An `episodes` row as returned by PostgREST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub work_id: i64,
    pub episode_number: i64,
    pub title: Option<String>,
}

/// Payload for inserting a new `episodes` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEpisode {
    pub work_id: i64,
    pub episode_number: i64,
    pub title: String,
}

/// Payload for inserting one `images` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImage {
    pub episode_id: i64,
    pub sequence: i64,
    pub image_url: String,
}

/// One episode sync as requested on the command line.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub work_id: i64,
    pub episode_number: i64,
    pub title: String,
    pub folder: String,
}

/// Outcome of a completed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub episode_id: i64,
    pub image_count: usize,
    pub reused_episode: bool,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub service_key: String,
    pub bucket: String,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let supabase_url = std::env::var("SUPABASE_URL")
            .map_err(|_| crate::Error::Config("SUPABASE_URL not set".to_string()))?;
        let service_key = std::env::var("SUPABASE_SERVICE_KEY")
            .map_err(|_| crate::Error::Config("SUPABASE_SERVICE_KEY not set".to_string()))?;

        Ok(Self {
            supabase_url: normalize_base_url(&supabase_url),
            service_key,
            bucket: std::env::var("WEBTOON_BUCKET").unwrap_or_else(|_| "webtoons".to_string()),
            dry_run: std::env::var("DRY_RUN")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

/// Strip trailing slashes so URL joins never produce `//` paths.
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
