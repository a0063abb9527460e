use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const DEFAULT_CATEGORY: &str = "discussion";
pub const DEFAULT_SUMMARY_TYPE: &str = "standard";

/// Per-request description of what is being summarised.
///
/// Serves both as the routing key evaluated against a guild's routing rules
/// and as the source of values for `{placeholder}` substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptContext {
    pub guild_id: String,
    pub channel_name: Option<String>,
    pub channel_id: Option<String>,
    /// e.g. "meeting", "discussion", "moderation"
    pub category: String,
    /// e.g. "standard", "incremental"
    pub summary_type: String,
    /// e.g. "brief", "detailed", "comprehensive"
    pub summary_length: Option<String>,
    /// e.g. "developer", "executive", "general"
    pub perspective: Option<String>,
    pub message_count: usize,
    pub user_id: Option<String>,
    /// Caller-defined values. Named fields win on key collisions.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl PromptContext {
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_name: None,
            channel_id: None,
            category: DEFAULT_CATEGORY.to_string(),
            summary_type: DEFAULT_SUMMARY_TYPE.to_string(),
            summary_length: None,
            perspective: None,
            message_count: 0,
            user_id: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self.channel_name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_summary_type(mut self, summary_type: impl Into<String>) -> Self {
        self.summary_type = summary_type.into();
        self
    }

    pub fn with_summary_length(mut self, length: impl Into<String>) -> Self {
        self.summary_length = Some(length.into());
        self
    }

    pub fn with_perspective(mut self, perspective: impl Into<String>) -> Self {
        self.perspective = Some(perspective.into());
        self
    }

    pub fn with_message_count(mut self, count: usize) -> Self {
        self.message_count = count;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Flattened variable dictionary: every named field that is set, plus `extra`.
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = self.extra.clone();

        vars.insert("guild_id".into(), self.guild_id.clone());
        vars.insert("category".into(), self.category.clone());
        vars.insert("summary_type".into(), self.summary_type.clone());
        vars.insert("message_count".into(), self.message_count.to_string());

        let optional = [
            ("channel_name", &self.channel_name),
            ("channel_id", &self.channel_id),
            ("summary_length", &self.summary_length),
            ("perspective", &self.perspective),
            ("user_id", &self.user_id),
        ];
        for (key, value) in optional {
            match value {
                Some(v) => {
                    vars.insert(key.to_string(), v.clone());
                }
                // An unset named field must not be shadowed by an extra.
                None => {
                    vars.remove(key);
                }
            }
        }

        vars
    }

    /// Stable hex SHA-256 over the variable set.
    ///
    /// Values are trimmed; keys are hashed exactly as given, since routing
    /// conditions and placeholders look them up case-sensitively. Every key
    /// and value is length-prefixed so no two distinct sets share an input.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in self.variables() {
            let value = value.trim();
            hasher.update((key.len() as u64).to_le_bytes());
            hasher.update(key.as_bytes());
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Names of the context fields always available to routing and substitution.
pub const CONTEXT_FIELDS: &[&str] = &[
    "guild_id",
    "channel_name",
    "channel_id",
    "category",
    "summary_type",
    "summary_length",
    "perspective",
    "message_count",
    "user_id",
];
