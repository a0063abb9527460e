use anyhow::{Context, Result};
use guildprompt_core::{
    DefaultPromptProvider, GuildPromptConfig, InMemoryConfigStore, ResolverConfig,
    ROUTING_FILE_NAME,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents of `guildprompt.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildpromptConfig {
    pub engine: EngineConfig,
    pub guilds: Vec<GuildEntry>,
}

/// `[engine]` table; mirrors [`ResolverConfig`] in file-friendly units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub fetch_timeout_secs: u64,
    pub raw_base_url: String,
    pub web_base_url: String,
    pub max_file_bytes: usize,
    pub routing_file: String,
    /// Directory of template overrides layered over the built-ins.
    pub defaults_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let base = ResolverConfig::default();
        Self {
            cache_ttl_secs: base.cache_ttl.as_secs(),
            cache_capacity: base.cache_capacity,
            fetch_timeout_secs: base.fetch_timeout.as_secs(),
            raw_base_url: base.raw_base_url,
            web_base_url: base.web_base_url,
            max_file_bytes: base.max_file_bytes,
            routing_file: ROUTING_FILE_NAME.to_string(),
            defaults_dir: None,
        }
    }
}

/// One `[[guilds]]` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildEntry {
    pub guild_id: String,
    pub repo_url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Name of the environment variable holding the access token.
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

fn default_true() -> bool {
    true
}

impl GuildEntry {
    pub fn to_prompt_config(&self) -> GuildPromptConfig {
        let mut config = GuildPromptConfig::new(&self.guild_id);
        if let Some(url) = &self.repo_url {
            config = config.with_repository(url, self.branch.clone().unwrap_or_default());
        }
        if let Some(token) = self
            .auth_token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.is_empty())
        {
            config = config.with_token(token);
        }
        if !self.enabled {
            config = config.disabled();
        }
        config
    }
}

impl GuildpromptConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Missing file means defaults; a file that exists but does not parse is
    /// still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("{} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        let e = &self.engine;
        let mut config = ResolverConfig::new()
            .with_cache_ttl(Duration::from_secs(e.cache_ttl_secs))
            .with_cache_capacity(e.cache_capacity)
            .with_fetch_timeout(Duration::from_secs(e.fetch_timeout_secs))
            .with_raw_base_url(&e.raw_base_url)
            .with_web_base_url(&e.web_base_url)
            .with_max_file_bytes(e.max_file_bytes);
        config.routing_file = e.routing_file.clone();
        config
    }

    pub fn config_store(&self) -> InMemoryConfigStore {
        InMemoryConfigStore::from_configs(self.guilds.iter().map(GuildEntry::to_prompt_config))
    }

    pub fn guild(&self, guild_id: &str) -> Option<&GuildEntry> {
        self.guilds.iter().find(|g| g.guild_id == guild_id)
    }

    pub fn default_provider(&self) -> Result<DefaultPromptProvider> {
        let mut provider = DefaultPromptProvider::builtin();
        if let Some(dir) = &self.engine.defaults_dir {
            provider
                .load_dir(dir)
                .with_context(|| format!("Failed to load templates from {}", dir.display()))?;
        }
        Ok(provider)
    }

    /// Every problem found; empty when the file is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = self.resolver_config().validate() {
            errors.push(e.to_string());
        }
        if let Some(dir) = &self.engine.defaults_dir {
            if !dir.is_dir() {
                errors.push(format!("engine.defaults_dir {} is not a directory", dir.display()));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for (i, guild) in self.guilds.iter().enumerate() {
            if guild.guild_id.trim().is_empty() {
                errors.push(format!("guilds[{i}]: guild_id is empty"));
            } else if !seen.insert(guild.guild_id.as_str()) {
                errors.push(format!("guilds[{i}]: duplicate guild_id '{}'", guild.guild_id));
            }
            if let Some(url) = &guild.repo_url {
                if let Err(e) = guildprompt_core::remote::parse_repository_url(url) {
                    errors.push(format!("guilds[{i}]: {e}"));
                }
            }
            if let Some(var) = &guild.auth_token_env {
                if std::env::var(var).is_err() {
                    errors.push(format!(
                        "guilds[{i}]: auth_token_env '{var}' is not set in the environment"
                    ));
                }
            }
        }

        errors
    }
}
