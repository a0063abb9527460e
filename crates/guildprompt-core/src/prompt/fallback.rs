use super::{PromptSource, ResolvedPrompt, SchemaVersion};
use crate::cache::PromptCacheManager;
use crate::context::PromptContext;
use crate::defaults::DefaultPromptProvider;
use crate::error::PromptError;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of a custom-template attempt.
#[derive(Debug)]
pub enum CustomOutcome {
    Resolved(ResolvedPrompt),
    Failed {
        reason: PromptError,
        /// Candidate paths attempted before giving up.
        tried_paths: Vec<String>,
    },
}

/// Source of guild-authored templates consulted first by the [`FallbackChain`].
#[async_trait]
pub trait CustomFetch: Send + Sync {
    async fn fetch(&self, guild_id: &str, context: &PromptContext) -> CustomOutcome;
}

/// Ordered degradation: custom → stale cache → built-in default → hardcoded
/// fallback. Always yields an attributable result.
#[derive(Clone)]
pub struct FallbackChain {
    cache: Arc<PromptCacheManager>,
    defaults: Arc<DefaultPromptProvider>,
}

impl FallbackChain {
    pub fn new(cache: Arc<PromptCacheManager>, defaults: Arc<DefaultPromptProvider>) -> Self {
        Self { cache, defaults }
    }

    pub async fn execute(
        &self,
        guild_id: &str,
        context: &PromptContext,
        custom: &dyn CustomFetch,
    ) -> ResolvedPrompt {
        let tried_paths = match custom.fetch(guild_id, context).await {
            CustomOutcome::Resolved(resolved) => return resolved,
            CustomOutcome::Failed { reason, tried_paths } => {
                log::info!("Custom prompt unavailable for guild {}: {}", guild_id, reason);
                tried_paths
            }
        };

        if let Some(entry) = self.cache.peek(guild_id, context) {
            log::info!(
                "Serving cached prompt for guild {} (stale: {})",
                guild_id,
                entry.is_stale()
            );
            let mut resolved = entry.to_resolved(PromptSource::Cached, context);
            resolved.tried_paths = tried_paths;
            return resolved;
        }

        self.resolve_default(context, tried_paths)
    }

    /// Built-in template for `context`, or the hardcoded fallback when no
    /// built-in matches. `tried_paths` is extended with the keys consulted.
    pub fn resolve_default(&self, context: &PromptContext, mut tried_paths: Vec<String>) -> ResolvedPrompt {
        let lookup = self.defaults.get_prompt(context);
        tried_paths.extend(lookup.attempted);

        let (template, source) = match lookup.matched {
            Some(t) => (t, PromptSource::Default),
            None => {
                log::warn!(
                    "No built-in template for category '{}', using hardcoded fallback",
                    context.category
                );
                (self.defaults.get_fallback_prompt(), PromptSource::Fallback)
            }
        };

        let mut resolved = ResolvedPrompt::new(template.content, source, context);
        resolved.version = SchemaVersion::V1;
        resolved.file_path = Some(template.path);
        resolved.tried_paths = tried_paths;
        resolved
    }
}
