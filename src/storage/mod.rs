//! Supabase Storage integration
//!
//! Lists the objects under a bucket folder and computes the stable public
//! URL for each stored file.

pub mod client;
pub mod mock;

pub use client::StorageClient;
pub use mock::MockStorageClient;

use crate::models::StorageObject;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// List every entry directly under `prefix` (empty for the bucket root).
    async fn list_folder(&self, prefix: &str) -> Result<Vec<StorageObject>>;

    /// Public URL for an object path within the bucket.
    fn public_url(&self, path: &str) -> String;
}
