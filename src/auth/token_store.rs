//! Bearer token storage in a local JSON file (token.json).

use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, io::ErrorKind, path::PathBuf};
use tokio::{
    fs,
    io::{AsyncWriteExt, BufWriter},
};

/// One stored credential.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

/// Stores one token per backend in a JSON map.
#[derive(Clone)]
pub struct FileTokenStorage {
    /// Location of the token cache on disk.
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stable key for a backend URL (trailing slash and case insensitive).
    fn entry_key(base_url: &str) -> String {
        let normalized = base_url.trim().trim_end_matches('/').to_ascii_lowercase();
        let hash = Sha256::digest(normalized.as_bytes());
        format!("bearer:{}", URL_SAFE_NO_PAD.encode(hash))
    }

    async fn load_map(&self) -> Result<HashMap<String, StoredToken>> {
        match fs::read(&self.path).await {
            Ok(data) => {
                if data.is_empty() {
                    return Ok(HashMap::new());
                }
                Ok(serde_json::from_slice(&data)?)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the map, creating parent directories if needed.
    async fn save_map(&self, map: &HashMap<String, StoredToken>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(map)?;
        let file = fs::File::create(&self.path).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Store or replace the token for a backend.
    pub async fn set(&self, base_url: &str, token: &str) -> Result<()> {
        let mut map = self.load_map().await?;
        map.insert(
            Self::entry_key(base_url),
            StoredToken {
                token: token.to_string(),
                saved_at: Utc::now(),
            },
        );
        self.save_map(&map).await
    }

    /// Token for a backend, if present and non-empty.
    pub async fn get(&self, base_url: &str) -> Result<Option<String>> {
        let mut map = self.load_map().await?;
        Ok(map
            .remove(&Self::entry_key(base_url))
            .map(|t| t.token)
            .filter(|t| !t.is_empty()))
    }

    pub async fn remove(&self, base_url: &str) -> Result<()> {
        let mut map = self.load_map().await?;
        if map.remove(&Self::entry_key(base_url)).is_some() {
            self.save_map(&map).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vanishly-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let path = temp_path("tokens");
        let store = FileTokenStorage::new(&path);
        assert!(store.get("http://localhost:8000").await.unwrap().is_none());

        store.set("http://localhost:8000/", "abc").await.unwrap();
        // Trailing slash and host case do not matter.
        assert_eq!(
            store.get("http://LOCALHOST:8000").await.unwrap().as_deref(),
            Some("abc")
        );
        assert!(store.get("https://api.example.com").await.unwrap().is_none());

        store.remove("http://localhost:8000").await.unwrap();
        assert!(store.get("http://localhost:8000").await.unwrap().is_none());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_map() {
        let path = temp_path("empty");
        std::fs::write(&path, b"").unwrap();
        let store = FileTokenStorage::new(&path);
        assert!(store.get("http://x").await.unwrap().is_none());
        let _ = std::fs::remove_file(path);
    }
}
