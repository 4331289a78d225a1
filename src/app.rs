//! Application orchestration for syncing an episode's images.

use crate::db::{EpisodeStore, EpisodeStoreClient, MockEpisodeStore};
use crate::models::{Config, Episode, NewEpisode, NewImage, StorageObject, SyncReport, SyncRequest};
use crate::storage::{StorageClient, StorageService};
use crate::{Error, Result};
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{info, warn};

/// Coordinates the storage listing and the episode/image upsert for one run.
pub struct App {
    storage: Box<dyn StorageService>,
    store: Box<dyn EpisodeStore>,
    dry_run: bool,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub storage: Box<dyn StorageService>,
    pub store: Box<dyn EpisodeStore>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses
    /// that need to inject mocks.
    pub fn with_services(services: AppServices, dry_run: bool) -> Self {
        Self {
            storage: services.storage,
            store: services.store,
            dry_run,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        Ok(Self::from_config(&Config::from_env()?))
    }

    /// Construct an app from an explicit configuration.
    ///
    /// Storage is always listed for real; with `dry_run` set, database
    /// writes go to the in-memory store instead of PostgREST.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across both API clients.
        let http_client = reqwest::Client::new();

        let storage = Box::new(StorageClient::new_with_client(
            config.supabase_url.clone(),
            config.service_key.clone(),
            config.bucket.clone(),
            http_client.clone(),
        ));

        let store: Box<dyn EpisodeStore> = if config.dry_run {
            info!("DRY_RUN enabled — database writes will be skipped");
            Box::new(MockEpisodeStore::new())
        } else {
            Box::new(EpisodeStoreClient::new_with_client(
                config.supabase_url.clone(),
                config.service_key.clone(),
                http_client,
            ))
        };

        Self::with_services(AppServices { storage, store }, config.dry_run)
    }

    /// Sync one episode folder into the database.
    pub async fn run(&self, request: &SyncRequest) -> Result<SyncReport> {
        info!(
            "Syncing work {} episode {} from folder '{}'",
            request.work_id, request.episode_number, request.folder
        );

        let objects = self.list_folder_with_retry(&request.folder).await?;

        let mut image_files: Vec<StorageObject> =
            objects.into_iter().filter(StorageObject::is_image).collect();
        image_files.sort_by(|a, b| a.name.cmp(&b.name));

        if image_files.is_empty() {
            warn!("No image files found under '{}'", request.folder);
            self.diagnose_missing_folder(&request.folder).await;
            return Err(Error::EmptyFolder(request.folder.clone()));
        }

        info!(
            "Found {} image file(s) under '{}'",
            image_files.len(),
            request.folder
        );

        let (episode, reused_episode) = self.find_or_create_episode(request).await?;

        let rows: Vec<NewImage> = image_files
            .iter()
            .enumerate()
            .map(|(index, object)| NewImage {
                episode_id: episode.id,
                sequence: index as i64 + 1,
                image_url: self
                    .storage
                    .public_url(&format!("{}/{}", request.folder, object.name)),
            })
            .collect();

        self.store.replace_images(episode.id, &rows).await?;
        info!(
            "Registered {} image(s) for episode {}",
            rows.len(),
            episode.id
        );

        if self.dry_run {
            info!("Dry run — no database rows were written");
        }

        Ok(SyncReport {
            episode_id: episode.id,
            image_count: rows.len(),
            reused_episode,
        })
    }

    async fn find_or_create_episode(&self, request: &SyncRequest) -> Result<(Episode, bool)> {
        if let Some(existing) = self
            .store
            .find_episode(request.work_id, request.episode_number)
            .await?
        {
            info!(
                "Reusing episode {} for work {} episode {}",
                existing.id, request.work_id, request.episode_number
            );
            return Ok((existing, true));
        }

        let created = self
            .store
            .create_episode(&NewEpisode {
                work_id: request.work_id,
                episode_number: request.episode_number,
                title: request.title.clone(),
            })
            .await?;
        info!(
            "Created episode {} for work {} episode {}",
            created.id, request.work_id, request.episode_number
        );
        Ok((created, false))
    }

    async fn list_folder_with_retry(&self, folder: &str) -> Result<Vec<StorageObject>> {
        let retry_strategy = FixedInterval::from_millis(2000).take(3);

        Retry::spawn(retry_strategy, || async {
            match self.storage.list_folder(folder).await {
                Ok(objects) => Ok(objects),
                Err(e) => {
                    warn!("Storage listing failed: {}. Will retry...", e);
                    Err(e)
                }
            }
        })
        .await
    }

    /// Explore the bucket when a folder yields nothing, to show where the
    /// files actually are. Listing failures here are logged, not fatal.
    async fn diagnose_missing_folder(&self, folder: &str) {
        info!("Searching the bucket root to locate '{}'", folder);

        let root = match self.storage.list_folder("").await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not list bucket root: {}", e);
                return;
            }
        };

        let top_level: Vec<&str> = root
            .iter()
            .filter(|entry| entry.is_folder())
            .map(|entry| entry.name.as_str())
            .collect();
        info!("Top-level folders: {:?}", top_level);

        let first_segment = folder.split('/').next().unwrap_or(folder);
        if !top_level.contains(&first_segment) {
            warn!(
                "Folder '{}' does not exist at the bucket root",
                first_segment
            );
            return;
        }

        match self.storage.list_folder(first_segment).await {
            Ok(entries) => {
                let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
                info!("Contents of '{}': {:?}", first_segment, names);
            }
            Err(e) => warn!("Could not list folder '{}': {}", first_segment, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices};
    use crate::db::MockEpisodeStore;
    use crate::models::{Config, Episode, StorageObject, SyncRequest};
    use crate::storage::MockStorageClient;
    use crate::Error;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_PUBLIC_BASE: &str = "https://cdn.test";

    fn sync_request(folder: &str) -> SyncRequest {
        SyncRequest {
            work_id: 1,
            episode_number: 1,
            title: "1화 - 테스트 업로드".to_string(),
            folder: folder.to_string(),
        }
    }

    fn build_test_app(storage: MockStorageClient, store: MockEpisodeStore) -> App {
        App::with_services(
            AppServices {
                storage: Box::new(storage),
                store: Box::new(store),
            },
            false,
        )
    }

    #[tokio::test]
    async fn test_run_creates_episode_and_registers_sorted_images() {
        let storage = MockStorageClient::new()
            .with_public_base(TEST_PUBLIC_BASE.to_string())
            .with_folder(
                "AKS/001",
                vec![
                    StorageObject::file("003.jpg"),
                    StorageObject::file("001.jpg"),
                    StorageObject::file("002.png"),
                ],
            );
        let store = MockEpisodeStore::new();
        let store_probe = store.clone();

        let app = build_test_app(storage, store);
        let report = app.run(&sync_request("AKS/001")).await.unwrap();

        assert_eq!(report.image_count, 3);
        assert!(!report.reused_episode);

        let episodes = store_probe.get_episodes();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].work_id, 1);
        assert_eq!(episodes[0].title.as_deref(), Some("1화 - 테스트 업로드"));

        let images = store_probe.get_images(report.episode_id);
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].sequence, 1);
        assert_eq!(images[0].image_url, "https://cdn.test/AKS/001/001.jpg");
        assert_eq!(images[1].image_url, "https://cdn.test/AKS/001/002.png");
        assert_eq!(images[2].sequence, 3);
        assert_eq!(images[2].image_url, "https://cdn.test/AKS/001/003.jpg");
    }

    #[tokio::test]
    async fn test_run_reuses_existing_episode_and_replaces_images() {
        let storage = MockStorageClient::new()
            .with_public_base(TEST_PUBLIC_BASE.to_string())
            .with_folder("AKS/001", vec![StorageObject::file("001.jpg")]);
        let store = MockEpisodeStore::new()
            .with_episode(Episode {
                id: 42,
                work_id: 1,
                episode_number: 1,
                title: Some("old title".to_string()),
            })
            .with_images(
                42,
                vec![crate::models::NewImage {
                    episode_id: 42,
                    sequence: 1,
                    image_url: "https://cdn.test/stale.jpg".to_string(),
                }],
            );
        let store_probe = store.clone();

        let app = build_test_app(storage, store);
        let report = app.run(&sync_request("AKS/001")).await.unwrap();

        assert_eq!(report.episode_id, 42);
        assert!(report.reused_episode);

        // No second episode row was created.
        assert_eq!(store_probe.get_episodes().len(), 1);

        let images = store_probe.get_images(42);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image_url, "https://cdn.test/AKS/001/001.jpg");
    }

    #[tokio::test]
    async fn test_run_filters_non_image_entries() {
        let storage = MockStorageClient::new()
            .with_public_base(TEST_PUBLIC_BASE.to_string())
            .with_folder(
                "AKS/001",
                vec![
                    StorageObject::file("001.jpg"),
                    StorageObject::file("notes.txt"),
                    StorageObject::file(".emptyFolderPlaceholder"),
                    StorageObject::folder("thumbnails"),
                ],
            );
        let store = MockEpisodeStore::new();
        let store_probe = store.clone();

        let app = build_test_app(storage, store);
        let report = app.run(&sync_request("AKS/001")).await.unwrap();

        assert_eq!(report.image_count, 1);
        assert_eq!(store_probe.get_images(report.episode_id).len(), 1);
    }

    #[tokio::test]
    async fn test_run_empty_folder_fails_after_diagnostics() {
        let storage = MockStorageClient::new()
            .with_folder("", vec![StorageObject::folder("AKS")])
            .with_folder("AKS", vec![StorageObject::folder("001")]);
        let storage_probe = storage.clone();
        let store = MockEpisodeStore::new();
        let store_probe = store.clone();

        let app = build_test_app(storage, store);
        let err = app.run(&sync_request("AKS/002")).await.unwrap_err();

        assert!(matches!(err, Error::EmptyFolder(_)));
        // Target folder, bucket root, and the first segment were listed.
        assert_eq!(storage_probe.get_list_count(), 3);
        // Nothing was written.
        assert!(store_probe.get_episodes().is_empty());
        assert_eq!(store_probe.get_replace_count(), 0);
    }

    #[tokio::test]
    async fn test_run_missing_root_segment_skips_subfolder_listing() {
        let storage = MockStorageClient::new()
            .with_folder("", vec![StorageObject::folder("AKS")]);
        let storage_probe = storage.clone();

        let app = build_test_app(storage, MockEpisodeStore::new());
        let err = app.run(&sync_request("BNT/001")).await.unwrap_err();

        assert!(matches!(err, Error::EmptyFolder(_)));
        // Target folder and bucket root only; 'BNT' was never listed.
        assert_eq!(storage_probe.get_list_count(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_lists_storage_but_writes_no_database_rows() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/webtoons"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "001.jpg", "id": "aaa"},
                {"name": "002.jpg", "id": "bbb"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        // Any hit on the REST tables would be a real database write.
        Mock::given(path("/rest/v1/episodes"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(path("/rest/v1/images"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let app = App::from_config(&Config {
            supabase_url: server.uri(),
            service_key: "service-key".to_string(),
            bucket: "webtoons".to_string(),
            dry_run: true,
        });

        let report = app.run(&sync_request("AKS/001")).await.unwrap();
        assert_eq!(report.image_count, 2);
        assert!(!report.reused_episode);
    }

    #[tokio::test]
    async fn test_from_config_without_dry_run_targets_postgrest() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/webtoons"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "001.jpg", "id": "aaa"}
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/episodes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 5, "work_id": 1, "episode_number": 1, "title": "1화"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/images"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/images"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let app = App::from_config(&Config {
            supabase_url: server.uri(),
            service_key: "service-key".to_string(),
            bucket: "webtoons".to_string(),
            dry_run: false,
        });

        let report = app.run(&sync_request("AKS/001")).await.unwrap();
        assert_eq!(report.episode_id, 5);
        assert!(report.reused_episode);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_storage_failure_surfaces_after_retries() {
        let storage = MockStorageClient::new().with_failing_listing();
        let storage_probe = storage.clone();

        let app = build_test_app(storage, MockEpisodeStore::new());
        let err = app.run(&sync_request("AKS/001")).await.unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        // Initial attempt plus three retries.
        assert_eq!(storage_probe.get_list_count(), 4);
    }
}
