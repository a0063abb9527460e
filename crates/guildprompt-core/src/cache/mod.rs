mod manager;

pub use manager::PromptCacheManager;

use crate::context::PromptContext;
use crate::prompt::{PromptSource, ResolvedPrompt, SchemaVersion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resolved template held by the [`PromptCacheManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPromptEntry {
    pub guild_id: String,
    /// Template text before placeholder substitution.
    pub content: String,
    pub source: PromptSource,
    pub version: SchemaVersion,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub repo_url: Option<String>,
    pub file_path: Option<String>,
    pub view_url: Option<String>,
    pub routing_pattern: Option<String>,
    #[serde(default)]
    pub routing_variables: BTreeMap<String, String>,
    /// Fingerprint of the context the entry was resolved for.
    pub context_hash: String,
}

impl CachedPromptEntry {
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_stale(&self) -> bool {
        !self.is_fresh()
    }

    /// Rebuild a result from this entry, attributed to `source`.
    pub fn to_resolved(&self, source: PromptSource, context: &PromptContext) -> ResolvedPrompt {
        let mut resolved = ResolvedPrompt::new(self.content.clone(), source, context);
        resolved.version = self.version;
        resolved.is_stale = self.is_stale();
        resolved.file_path = self.file_path.clone();
        resolved.repo_url = self.repo_url.clone();
        resolved.view_url = self.view_url.clone();
        resolved.routing_pattern = self.routing_pattern.clone();
        resolved.routing_variables = self.routing_variables.clone();
        resolved
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that found a fresh entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Lookups that found only an expired entry.
    pub stale_hits: u64,
    /// Entries removed by guild invalidation.
    pub invalidations: u64,
    pub size: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.stale_hits;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
