//! Episode and image persistence
//!
//! Reads and writes the `episodes` and `images` tables through the
//! PostgREST endpoint of the hosted database.

pub mod client;
pub mod mock;

pub use client::EpisodeStoreClient;
pub use mock::MockEpisodeStore;

use crate::models::{Episode, NewEpisode, NewImage};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Look up an episode by its work id and episode number.
    async fn find_episode(&self, work_id: i64, episode_number: i64) -> Result<Option<Episode>>;

    /// Insert a new episode row and return it with its assigned id.
    async fn create_episode(&self, episode: &NewEpisode) -> Result<Episode>;

    /// Drop every image row for the episode and insert `images` in order.
    async fn replace_images(&self, episode_id: i64, images: &[NewImage]) -> Result<()>;
}
