use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dialog::Context;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ContextCacheKey {
    pub conversation_hash: String,
}

/// On-disk store for conversation contexts, so an interactive session can be
/// resumed across process runs. A missing or unreadable entry means the
/// conversation starts fresh.
pub struct ContextCache {
    cache_dir: PathBuf,
}

impl ContextCache {
    pub async fn new() -> Result<Self> {
        let cache_dir = get_cache_directory()?;

        tokio::fs::create_dir_all(&cache_dir)
            .await
            .context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub async fn get(&self, key: &ContextCacheKey) -> Option<Context> {
        match cacache::read(&self.cache_dir, &key.conversation_hash).await {
            Ok(data) => serde_json::from_slice(&data).ok(),
            Err(_) => None,
        }
    }

    pub async fn insert(&self, key: &ContextCacheKey, value: &Context) {
        if let Ok(serialized) = serde_json::to_vec(value) {
            let _ = cacache::write(&self.cache_dir, &key.conversation_hash, serialized).await;
        }
    }
}

fn get_cache_directory() -> Result<PathBuf> {
    let cache_base = dirs::cache_dir().context("Failed to determine cache directory")?;
    Ok(cache_base.join(env!("CARGO_CRATE_NAME")))
}

pub fn compute_conversation_hash(conversation_id: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(conversation_id.as_bytes());
    format!("{:x}", hasher.finalize())
}
