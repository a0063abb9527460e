use crate::context::PromptContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a resolved template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptSource {
    /// Fetched from the guild's own repository.
    Custom,
    /// Served from the resolution cache (fresh or stale).
    Cached,
    /// Built-in template selected for the context.
    Default,
    /// Last-resort built-in instruction.
    Fallback,
}

impl PromptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptSource::Custom => "CUSTOM",
            PromptSource::Cached => "CACHED",
            PromptSource::Default => "DEFAULT",
            PromptSource::Fallback => "FALLBACK",
        }
    }
}

impl fmt::Display for PromptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing-file schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V2,
}

impl SchemaVersion {
    /// Accepts `v1`, `V1`, `1`, `1.0` and the same for v2.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        let raw = raw.strip_prefix('v').unwrap_or(&raw);
        match raw {
            "1" | "1.0" => Some(SchemaVersion::V1),
            "2" | "2.0" => Some(SchemaVersion::V2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A template ready to hand to the summariser, with full provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPrompt {
    /// Final text after placeholder substitution. Never empty.
    pub content: String,
    pub source: PromptSource,
    pub version: SchemaVersion,
    /// Context variables available during resolution.
    pub variables: BTreeMap<String, String>,
    /// True when served from a cache entry past its TTL.
    pub is_stale: bool,
    pub resolved_at: DateTime<Utc>,
    /// Concrete file (repository path or built-in key) the content came from.
    pub file_path: Option<String>,
    /// Every path attempted, in order.
    pub tried_paths: Vec<String>,
    pub repo_url: Option<String>,
    /// Link a human can open to view the source file.
    pub view_url: Option<String>,
    /// Path template of the route that produced `file_path`.
    pub routing_pattern: Option<String>,
    /// Context values that drove route selection.
    pub routing_variables: BTreeMap<String, String>,
}

impl ResolvedPrompt {
    pub fn new(content: impl Into<String>, source: PromptSource, context: &PromptContext) -> Self {
        Self {
            content: content.into(),
            source,
            version: SchemaVersion::V1,
            variables: context.variables(),
            is_stale: false,
            resolved_at: Utc::now(),
            file_path: None,
            tried_paths: Vec::new(),
            repo_url: None,
            view_url: None,
            routing_pattern: None,
            routing_variables: BTreeMap::new(),
        }
    }

    pub fn provenance(&self) -> PromptProvenance {
        PromptProvenance {
            source: self.source,
            file_path: self.file_path.clone(),
            tried_paths: self.tried_paths.clone(),
            repo_url: self.repo_url.clone(),
            view_url: self.view_url.clone(),
            version: self.version,
            is_stale: self.is_stale,
            routing_pattern: self.routing_pattern.clone(),
            routing_variables: self.routing_variables.clone(),
            resolved_at: self.resolved_at,
        }
    }
}

/// Provenance projection of a [`ResolvedPrompt`] for API and debugging consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptProvenance {
    pub source: PromptSource,
    pub file_path: Option<String>,
    pub tried_paths: Vec<String>,
    pub repo_url: Option<String>,
    pub view_url: Option<String>,
    pub version: SchemaVersion,
    pub is_stale: bool,
    pub routing_pattern: Option<String>,
    pub routing_variables: BTreeMap<String, String>,
    pub resolved_at: DateTime<Utc>,
}
