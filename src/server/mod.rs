//! Per-execution server context injected into every node run.
//!
//! The context carries everything a node may consult beyond its own
//! parameters: workflow identity, the per-workflow environment map, the
//! connected-account token map, the storage collaborators and an optional
//! trigger payload. Nodes treat every optional piece as absent until
//! proven otherwise, and read no process environment of their own.

mod storage;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::common::Vars;

pub use storage::{KvReply, KvStore, MemKvStore, MemObjectStore, ObjectStore, StoreReply, TokenSink};

/// One connected third-party account, keyed by provider name in
/// [`ServerContext::social_list`]. Presence of `access_token` is the sole
/// authorization signal a node may rely on.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SocialAccount {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Read-only execution context the external engine hands to `run`.
#[derive(Clone)]
pub struct ServerContext {
    workflow_id: String,
    session_id: String,
    env_list: HashMap<String, String>,
    social_list: HashMap<String, SocialAccount>,
    object_store: Option<Arc<dyn ObjectStore>>,
    kv_store: Option<Arc<dyn KvStore>>,
    token_sink: Option<Arc<dyn TokenSink>>,
    trigger: Option<Vars>,
    scratch_dir: PathBuf,
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServerContext {
    pub fn builder() -> ServerContextBuilder {
        ServerContextBuilder::default()
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Per-workflow environment variable, standing in for process env.
    pub fn env(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.env_list.get(name).map(String::as_str)
    }

    /// The connected account for `provider`, if the user linked one.
    pub fn social(
        &self,
        provider: &str,
    ) -> Option<&SocialAccount> {
        self.social_list.get(provider)
    }

    /// The OAuth access token for `provider`. Absence means the node
    /// must short-circuit with credit 0.
    pub fn access_token(
        &self,
        provider: &str,
    ) -> Option<&str> {
        self.social_list.get(provider).map(|account| account.access_token.as_str()).filter(|token| !token.is_empty())
    }

    pub fn object_store(&self) -> Option<Arc<dyn ObjectStore>> {
        self.object_store.clone()
    }

    pub fn kv_store(&self) -> Option<Arc<dyn KvStore>> {
        self.kv_store.clone()
    }

    pub fn token_sink(&self) -> Option<Arc<dyn TokenSink>> {
        self.token_sink.clone()
    }

    /// Trigger-specific payload (chat message, email headers, ...).
    pub fn trigger(&self) -> Option<&Vars> {
        self.trigger.as_ref()
    }

    /// Directory for call-scoped scratch files. Nodes create their
    /// scratch files here and remove them before `run` returns.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }
}

/// Builder for [`ServerContext`].
#[derive(Default)]
pub struct ServerContextBuilder {
    workflow_id: Option<String>,
    session_id: Option<String>,
    env_list: HashMap<String, String>,
    social_list: HashMap<String, SocialAccount>,
    object_store: Option<Arc<dyn ObjectStore>>,
    kv_store: Option<Arc<dyn KvStore>>,
    token_sink: Option<Arc<dyn TokenSink>>,
    trigger: Option<Vars>,
    scratch_dir: Option<PathBuf>,
}

impl ServerContextBuilder {
    pub fn workflow_id<S: Into<String>>(
        mut self,
        id: S,
    ) -> Self {
        self.workflow_id = Some(id.into());
        self
    }

    pub fn session_id<S: Into<String>>(
        mut self,
        id: S,
    ) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn env<K: Into<String>, V: Into<String>>(
        mut self,
        name: K,
        value: V,
    ) -> Self {
        self.env_list.insert(name.into(), value.into());
        self
    }

    pub fn social<P: Into<String>>(
        mut self,
        provider: P,
        account: SocialAccount,
    ) -> Self {
        self.social_list.insert(provider.into(), account);
        self
    }

    pub fn object_store(
        mut self,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        self.object_store = Some(store);
        self
    }

    pub fn kv_store(
        mut self,
        store: Arc<dyn KvStore>,
    ) -> Self {
        self.kv_store = Some(store);
        self
    }

    pub fn token_sink(
        mut self,
        sink: Arc<dyn TokenSink>,
    ) -> Self {
        self.token_sink = Some(sink);
        self
    }

    pub fn trigger(
        mut self,
        payload: Vars,
    ) -> Self {
        self.trigger = Some(payload);
        self
    }

    pub fn scratch_dir<P: Into<PathBuf>>(
        mut self,
        dir: P,
    ) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> ServerContext {
        ServerContext {
            workflow_id: self.workflow_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            session_id: self.session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            env_list: self.env_list,
            social_list: self.social_list,
            object_store: self.object_store,
            kv_store: self.kv_store,
            token_sink: self.token_sink,
            trigger: self.trigger,
            // Construction-time platform default; node code never reads
            // the process environment itself.
            scratch_dir: self.scratch_dir.unwrap_or_else(std::env::temp_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_lookup() {
        let server = ServerContext::builder().env("POSTGRES_URL", "postgresql://localhost/db").build();

        assert_eq!(server.env("POSTGRES_URL"), Some("postgresql://localhost/db"));
        assert_eq!(server.env("MISSING"), None);
    }

    #[test]
    fn test_access_token_requires_non_empty_value() {
        let server = ServerContext::builder()
            .social(
                "chat",
                SocialAccount {
                    access_token: "tok-123".to_string(),
                    ..Default::default()
                },
            )
            .social("empty", SocialAccount::default())
            .build();

        assert_eq!(server.access_token("chat"), Some("tok-123"));
        assert_eq!(server.access_token("empty"), None);
        assert_eq!(server.access_token("unlinked"), None);
    }

    #[test]
    fn test_builder_generates_ids() {
        let server = ServerContext::builder().build();

        assert!(!server.workflow_id().is_empty());
        assert!(!server.session_id().is_empty());
    }

    #[test]
    fn test_scratch_dir_default_and_override() {
        let server = ServerContext::builder().build();
        assert!(!server.scratch_dir().as_os_str().is_empty());

        let server = ServerContext::builder().scratch_dir("/var/flowkit/scratch").build();
        assert_eq!(server.scratch_dir(), Path::new("/var/flowkit/scratch"));
    }
}
