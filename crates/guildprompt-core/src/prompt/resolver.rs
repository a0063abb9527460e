use std::sync::Arc;

use crate::cache::{CacheStats, PromptCacheManager};
use crate::config::ResolverConfig;
use crate::context::PromptContext;
use crate::defaults::DefaultPromptProvider;
use crate::error::Result;
use crate::guild::{GuildConfigStore, GuildPromptConfig};
use crate::remote::{HttpRepositoryClient, RemoteRepository};
use crate::routing::RoutingFileParser;
use crate::schema::SchemaValidator;
use crate::template;

use super::custom::RepositoryPromptFetch;
use super::fallback::FallbackChain;
use super::model::{PromptSource, ResolvedPrompt};

/// Entry point: turns a guild + request context into a ready-to-use prompt.
///
/// Resolution never fails. Each request walks cache lookup, config lookup,
/// then either the guild's repository (through the [`FallbackChain`]) or the
/// built-in templates directly, and finishes with placeholder substitution.
pub struct PromptResolver {
    cache: Arc<PromptCacheManager>,
    defaults: Arc<DefaultPromptProvider>,
    remote: Arc<dyn RemoteRepository>,
    store: Arc<dyn GuildConfigStore>,
    chain: FallbackChain,
    parser: RoutingFileParser,
    validator: SchemaValidator,
    config: ResolverConfig,
}

// ── PromptResolver ────────────────────────────────────────────────────────────

impl PromptResolver {
    pub fn new(
        config: ResolverConfig,
        cache: Arc<PromptCacheManager>,
        defaults: Arc<DefaultPromptProvider>,
        remote: Arc<dyn RemoteRepository>,
        store: Arc<dyn GuildConfigStore>,
    ) -> Self {
        let validator = SchemaValidator::default();
        Self {
            chain: FallbackChain::new(cache.clone(), defaults.clone()),
            parser: RoutingFileParser::new(validator.clone()),
            validator,
            cache,
            defaults,
            remote,
            store,
            config,
        }
    }

    /// Resolver with built-in templates, a fresh cache and an HTTP client
    /// configured from `config`.
    pub fn from_config(config: ResolverConfig, store: Arc<dyn GuildConfigStore>) -> Result<Self> {
        config.validate()?;
        let remote = Arc::new(HttpRepositoryClient::new(&config)?);
        let cache = Arc::new(PromptCacheManager::from_config(&config));
        Ok(Self::new(
            config,
            cache,
            Arc::new(DefaultPromptProvider::builtin()),
            remote,
            store,
        ))
    }

    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.parser = RoutingFileParser::new(validator.clone());
        self.validator = validator;
        self
    }

    pub fn cache(&self) -> &Arc<PromptCacheManager> {
        &self.cache
    }

    pub fn defaults(&self) -> &Arc<DefaultPromptProvider> {
        &self.defaults
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the prompt for `guild_id`. A `config` supplied by the caller
    /// skips the store lookup.
    pub async fn resolve_prompt(
        &self,
        guild_id: &str,
        context: &PromptContext,
        config: Option<&GuildPromptConfig>,
    ) -> ResolvedPrompt {
        if let Some(entry) = self.cache.get_fresh(guild_id, context) {
            log::debug!("Cache hit for guild {} ({})", guild_id, entry.source);
            let resolved = entry.to_resolved(entry.source, context);
            return self.substitute(resolved, context);
        }

        let fetched;
        let config = match config {
            Some(c) => Some(c),
            None => {
                fetched = self.lookup_config(guild_id).await;
                fetched.as_ref()
            }
        };

        let resolved = match config.filter(|c| c.has_custom_prompts()) {
            Some(guild) => {
                let fetch = RepositoryPromptFetch::new(
                    self.remote.as_ref(),
                    &self.parser,
                    &self.validator,
                    guild,
                    &self.config.routing_file,
                );
                self.chain.execute(guild_id, context, &fetch).await
            }
            None => {
                log::debug!("Guild {} has no custom prompts configured", guild_id);
                self.chain.resolve_default(context, Vec::new())
            }
        };

        if !resolved.is_stale && matches!(resolved.source, PromptSource::Custom | PromptSource::Default) {
            self.cache.set(guild_id, context, &resolved);
        }

        log::info!(
            "Resolved prompt for guild {}: source={} file={}",
            guild_id,
            resolved.source,
            resolved.file_path.as_deref().unwrap_or("-")
        );
        self.substitute(resolved, context)
    }

    /// Drop every cached prompt for `guild_id`, forcing the next request to
    /// re-read the repository.
    pub fn invalidate_guild_cache(&self, guild_id: &str) -> usize {
        self.cache.invalidate_guild(guild_id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn lookup_config(&self, guild_id: &str) -> Option<GuildPromptConfig> {
        match self.store.get_config(guild_id).await {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Could not load prompt config for guild {}: {}", guild_id, e);
                None
            }
        }
    }

    fn substitute(&self, mut resolved: ResolvedPrompt, context: &PromptContext) -> ResolvedPrompt {
        let variables = context.variables();
        let substitution = template::substitute(&resolved.content, &variables);
        for name in &substitution.unresolved {
            log::warn!(
                "Placeholder {{{}}} has no value in {}, left as [{}]",
                name,
                resolved.file_path.as_deref().unwrap_or("template"),
                name
            );
        }
        resolved.content = substitution.text;
        resolved.variables = variables;
        resolved
    }
}
