//! Storage collaborators the external engine injects per workflow.
//!
//! All of these are plain request/response surfaces: a node issues one
//! call, inspects the reply, and never retries. Retry policy belongs to
//! the engine or the backing service.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::common::MemCache;

/// Reply shape shared by the object-storage operations.
#[derive(Debug, Clone, Default)]
pub struct StoreReply {
    pub success: bool,
    pub file_url: Option<String>,
    pub message: String,
}

impl StoreReply {
    pub fn ok(file_url: Option<String>) -> Self {
        Self {
            success: true,
            file_url,
            message: String::new(),
        }
    }

    pub fn failed<M: Into<String>>(message: M) -> Self {
        Self {
            success: false,
            file_url: None,
            message: message.into(),
        }
    }
}

/// Object-storage utility for generated media and other artifacts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` under `name` and return the public URL in the reply.
    async fn add_file(
        &self,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StoreReply;

    /// Fetch the raw bytes stored under `name`.
    async fn get_file(
        &self,
        name: &str,
    ) -> Option<Vec<u8>>;

    /// Resolve the public URL for `name` without fetching the bytes.
    async fn get_file_url(
        &self,
        name: &str,
    ) -> Option<String>;

    async fn delete_file(
        &self,
        name: &str,
    ) -> StoreReply;

    async fn rename_file(
        &self,
        from: &str,
        to: &str,
    ) -> StoreReply;

    /// List the file names owned by `user`.
    async fn list_files_by_user(
        &self,
        user: &str,
    ) -> Vec<String>;
}

/// Reply shape for the key-value operations.
#[derive(Debug, Clone, Default)]
pub struct KvReply {
    pub success: bool,
    pub message: String,
    pub value: Option<Value>,
}

/// Key-value utility scoped to the owning workflow session.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set_key(
        &self,
        key: &str,
        value: Value,
    ) -> KvReply;

    async fn get_key(
        &self,
        key: &str,
    ) -> KvReply;

    async fn delete_key(
        &self,
        key: &str,
    ) -> KvReply;
}

/// Persistence hook for refreshed OAuth tokens.
///
/// Fire-and-forget: nodes call it after a provider rotates a token and
/// move on regardless of the outcome.
#[async_trait]
pub trait TokenSink: Send + Sync {
    async fn persist_token(
        &self,
        provider: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    );
}

/// In-memory [`ObjectStore`] used by tests and local catalogs.
///
/// URLs are synthesized as `mem://<name>`.
#[derive(Default)]
pub struct MemObjectStore {
    files: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn url_for(name: &str) -> String {
        format!("mem://{name}")
    }
}

#[async_trait]
impl ObjectStore for MemObjectStore {
    async fn add_file(
        &self,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StoreReply {
        self.files.write().await.insert(name.to_string(), (data, content_type.to_string()));
        StoreReply::ok(Some(Self::url_for(name)))
    }

    async fn get_file(
        &self,
        name: &str,
    ) -> Option<Vec<u8>> {
        self.files.read().await.get(name).map(|(data, _)| data.clone())
    }

    async fn get_file_url(
        &self,
        name: &str,
    ) -> Option<String> {
        self.files.read().await.contains_key(name).then(|| Self::url_for(name))
    }

    async fn delete_file(
        &self,
        name: &str,
    ) -> StoreReply {
        match self.files.write().await.remove(name) {
            Some(_) => StoreReply::ok(None),
            None => StoreReply::failed(format!("no such file: {name}")),
        }
    }

    async fn rename_file(
        &self,
        from: &str,
        to: &str,
    ) -> StoreReply {
        let mut files = self.files.write().await;
        match files.remove(from) {
            Some(entry) => {
                files.insert(to.to_string(), entry);
                StoreReply::ok(Some(Self::url_for(to)))
            }
            None => StoreReply::failed(format!("no such file: {from}")),
        }
    }

    async fn list_files_by_user(
        &self,
        user: &str,
    ) -> Vec<String> {
        let prefix = format!("{user}/");
        self.files.read().await.keys().filter(|name| name.starts_with(&prefix)).cloned().collect()
    }
}

/// In-memory [`KvStore`] backed by [`MemCache`].
#[derive(Clone)]
pub struct MemKvStore {
    cache: MemCache<String, Value>,
}

impl MemKvStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: MemCache::new(capacity),
        }
    }
}

impl Default for MemKvStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl KvStore for MemKvStore {
    async fn set_key(
        &self,
        key: &str,
        value: Value,
    ) -> KvReply {
        self.cache.set(key.to_string(), value);
        KvReply {
            success: true,
            message: String::new(),
            value: None,
        }
    }

    async fn get_key(
        &self,
        key: &str,
    ) -> KvReply {
        match self.cache.get(&key.to_string()) {
            Some(value) => KvReply {
                success: true,
                message: String::new(),
                value: Some(value),
            },
            None => KvReply {
                success: false,
                message: format!("no such key: {key}"),
                value: None,
            },
        }
    }

    async fn delete_key(
        &self,
        key: &str,
    ) -> KvReply {
        self.cache.remove(&key.to_string());
        KvReply {
            success: true,
            message: String::new(),
            value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // ==================== object store tests ====================

    #[tokio::test]
    async fn test_mem_object_store_round_trip() {
        let store = MemObjectStore::new();

        let reply = store.add_file("u1/pic.png", vec![1, 2, 3], "image/png").await;
        assert!(reply.success);
        assert_eq!(reply.file_url.as_deref(), Some("mem://u1/pic.png"));

        assert_eq!(store.get_file("u1/pic.png").await, Some(vec![1, 2, 3]));
        assert_eq!(store.list_files_by_user("u1").await, vec!["u1/pic.png".to_string()]);

        let reply = store.rename_file("u1/pic.png", "u1/new.png").await;
        assert!(reply.success);
        assert!(store.get_file("u1/pic.png").await.is_none());

        let reply = store.delete_file("u1/new.png").await;
        assert!(reply.success);
    }

    #[tokio::test]
    async fn test_mem_object_store_missing_file() {
        let store = MemObjectStore::new();

        assert!(store.get_file_url("nope").await.is_none());
        let reply = store.delete_file("nope").await;
        assert!(!reply.success);
    }

    // ==================== token sink tests ====================

    #[derive(Default)]
    struct RecordingSink {
        tokens: RwLock<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TokenSink for RecordingSink {
        async fn persist_token(
            &self,
            provider: &str,
            access_token: &str,
            _refresh_token: Option<&str>,
        ) {
            self.tokens.write().await.push((provider.to_string(), access_token.to_string()));
        }
    }

    #[tokio::test]
    async fn test_token_sink_is_fire_and_forget() {
        let sink = RecordingSink::default();

        sink.persist_token("twitter", "rotated-token", None).await;

        let tokens = sink.tokens.read().await;
        assert_eq!(tokens.as_slice(), &[("twitter".to_string(), "rotated-token".to_string())]);
    }

    // ==================== kv store tests ====================

    #[tokio::test]
    async fn test_mem_kv_store_round_trip() {
        let store = MemKvStore::default();

        let reply = store.set_key("greeting", json!("hello")).await;
        assert!(reply.success);

        let reply = store.get_key("greeting").await;
        assert!(reply.success);
        assert_eq!(reply.value, Some(json!("hello")));

        store.delete_key("greeting").await;
        let reply = store.get_key("greeting").await;
        assert!(!reply.success);
        assert!(reply.value.is_none());
    }
}
