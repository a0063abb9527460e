use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

pub const DEFAULT_BRANCH: &str = "main";

/// Outcome of the last repository sync recorded by the config owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Never,
    Success,
    Failed,
    Pending,
}

/// A guild's opt-in record for custom prompt hosting.
///
/// Owned and mutated by the external configuration store; read-only here.
/// The access token arrives already decrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildPromptConfig {
    pub guild_id: String,
    pub repo_url: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sync_status: SyncStatus,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl GuildPromptConfig {
    pub fn new(guild_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            guild_id: guild_id.into(),
            repo_url: None,
            branch: default_branch(),
            enabled: false,
            auth_token: None,
            last_sync: None,
            last_sync_status: SyncStatus::Never,
            validation_errors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_repository(mut self, url: impl Into<String>, branch: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self.branch = branch.into();
        self.enabled = true;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Enabled and pointing at a non-blank repository URL.
    pub fn has_custom_prompts(&self) -> bool {
        self.enabled
            && self
                .repo_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
    }

    /// Configured branch, or `main` when left blank.
    pub fn effective_branch(&self) -> &str {
        let branch = self.branch.trim();
        if branch.is_empty() {
            DEFAULT_BRANCH
        } else {
            branch
        }
    }
}

/// Read interface onto the external per-guild configuration store.
#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    async fn get_config(&self, guild_id: &str) -> Result<Option<GuildPromptConfig>>;
}

/// Map-backed store used by the CLI and by tests.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<String, GuildPromptConfig>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: impl IntoIterator<Item = GuildPromptConfig>) -> Self {
        let store = Self::new();
        for config in configs {
            store.upsert(config);
        }
        store
    }

    pub fn upsert(&self, config: GuildPromptConfig) {
        self.configs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(config.guild_id.clone(), config);
    }

    pub fn len(&self) -> usize {
        self.configs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GuildConfigStore for InMemoryConfigStore {
    async fn get_config(&self, guild_id: &str) -> Result<Option<GuildPromptConfig>> {
        Ok(self
            .configs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(guild_id)
            .cloned())
    }
}
