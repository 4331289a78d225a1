use super::EpisodeStore;
use crate::models::{Episode, NewEpisode, NewImage};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockEpisodeStore {
    episodes: Arc<Mutex<Vec<Episode>>>,
    images: Arc<Mutex<HashMap<i64, Vec<NewImage>>>>,
    next_id: Arc<Mutex<i64>>,
    replace_count: Arc<Mutex<usize>>,
}

impl MockEpisodeStore {
    pub fn new() -> Self {
        Self {
            episodes: Arc::new(Mutex::new(Vec::new())),
            images: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            replace_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_episode(self, episode: Episode) -> Self {
        {
            let mut next_id = self.next_id.lock().unwrap();
            if episode.id >= *next_id {
                *next_id = episode.id + 1;
            }
        }
        self.episodes.lock().unwrap().push(episode);
        self
    }

    pub fn with_images(self, episode_id: i64, images: Vec<NewImage>) -> Self {
        self.images.lock().unwrap().insert(episode_id, images);
        self
    }

    pub fn get_images(&self, episode_id: i64) -> Vec<NewImage> {
        self.images
            .lock()
            .unwrap()
            .get(&episode_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_episodes(&self) -> Vec<Episode> {
        self.episodes.lock().unwrap().clone()
    }

    pub fn get_replace_count(&self) -> usize {
        *self.replace_count.lock().unwrap()
    }
}

impl Default for MockEpisodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EpisodeStore for MockEpisodeStore {
    async fn find_episode(&self, work_id: i64, episode_number: i64) -> Result<Option<Episode>> {
        let episodes = self.episodes.lock().unwrap();
        Ok(episodes
            .iter()
            .find(|e| e.work_id == work_id && e.episode_number == episode_number)
            .cloned())
    }

    async fn create_episode(&self, episode: &NewEpisode) -> Result<Episode> {
        let mut next_id = self.next_id.lock().unwrap();
        let created = Episode {
            id: *next_id,
            work_id: episode.work_id,
            episode_number: episode.episode_number,
            title: Some(episode.title.clone()),
        };
        *next_id += 1;
        drop(next_id);

        self.episodes.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn replace_images(&self, episode_id: i64, images: &[NewImage]) -> Result<()> {
        let mut count = self.replace_count.lock().unwrap();
        *count += 1;
        drop(count);

        self.images
            .lock()
            .unwrap()
            .insert(episode_id, images.to_vec());
        Ok(())
    }
}
