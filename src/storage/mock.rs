use super::StorageService;
use crate::models::StorageObject;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockStorageClient {
    folders: Arc<Mutex<HashMap<String, Vec<StorageObject>>>>,
    public_base: String,
    list_count: Arc<Mutex<usize>>,
    fail_listing: bool,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            folders: Arc::new(Mutex::new(HashMap::new())),
            public_base: "https://mock-storage.example.com".to_string(),
            list_count: Arc::new(Mutex::new(0)),
            fail_listing: false,
        }
    }

    pub fn with_public_base(mut self, public_base: String) -> Self {
        self.public_base = public_base;
        self
    }

    pub fn with_folder(self, prefix: &str, objects: Vec<StorageObject>) -> Self {
        self.folders
            .lock()
            .unwrap()
            .insert(prefix.to_string(), objects);
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn get_list_count(&self) -> usize {
        *self.list_count.lock().unwrap()
    }
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageClient {
    async fn list_folder(&self, prefix: &str) -> Result<Vec<StorageObject>> {
        let mut count = self.list_count.lock().unwrap();
        *count += 1;
        drop(count);

        if self.fail_listing {
            return Err(Error::Storage("mock listing failure".to_string()));
        }

        let folders = self.folders.lock().unwrap();
        Ok(folders.get(prefix).cloned().unwrap_or_default())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path)
    }
}
