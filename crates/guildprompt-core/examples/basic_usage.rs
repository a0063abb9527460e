use async_trait::async_trait;
use guildprompt_core::{
    DefaultPromptProvider, GuildPromptConfig, InMemoryConfigStore, PromptCacheManager,
    PromptContext, PromptResolver, RemoteRepository, ResolverConfig,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Repository served from memory so the example runs offline.
struct StaticRepository {
    files: HashMap<&'static str, &'static str>,
}

#[async_trait]
impl RemoteRepository for StaticRepository {
    async fn fetch_file(&self, _repo: &str, path: &str, _branch: &str, _token: Option<&str>) -> Option<String> {
        self.files.get(path).map(|s| s.to_string())
    }

    fn view_url(&self, repo_url: &str, path: &str, branch: &str) -> Option<String> {
        Some(format!("{repo_url}/blob/{branch}/{path}"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== guildprompt Basic Usage Example ===\n");

    // 1. Wire the engine
    println!("1. Building resolver...");
    let config = ResolverConfig::new();
    config.validate()?;

    let remote = StaticRepository {
        files: HashMap::from([
            (
                "PATH",
                "version: v1\n\
                 routes:\n  \
                   by-category:\n    \
                     path_template: prompts/{category}.md\n\
                 fallback_chain: [by-category]\n",
            ),
            (
                "prompts/meeting.md",
                "Summarise the {message_count} messages from #{channel_name} as meeting minutes.",
            ),
        ]),
    };
    let store = InMemoryConfigStore::from_configs([GuildPromptConfig::new("1001")
        .with_repository("https://github.com/acme/prompts", "main")]);

    let resolver = PromptResolver::new(
        config.clone(),
        Arc::new(PromptCacheManager::from_config(&config)),
        Arc::new(DefaultPromptProvider::builtin()),
        Arc::new(remote),
        Arc::new(store),
    );
    println!("   ✓ Resolver ready\n");

    // 2. Custom template from the guild repository
    println!("2. Resolving for a configured guild...");
    let context = PromptContext::new("1001")
        .with_category("meeting")
        .with_channel("42", "weekly-sync")
        .with_message_count(58);
    let resolved = resolver.resolve_prompt("1001", &context, None).await;
    println!("   source: {}", resolved.source);
    println!("   file:   {:?}", resolved.file_path);
    println!("   text:   {}\n", resolved.content);

    // 3. Second call is served from cache
    println!("3. Resolving again...");
    let again = resolver.resolve_prompt("1001", &context, None).await;
    println!("   source: {} (cache hits: {})\n", again.source, resolver.cache_stats().hits);

    // 4. A guild without configuration gets the built-in template
    println!("4. Resolving for an unconfigured guild...");
    let context = PromptContext::new("2002")
        .with_category("moderation")
        .with_message_count(12);
    let resolved = resolver.resolve_prompt("2002", &context, None).await;
    println!("   source: {}", resolved.source);
    println!("   tried:  {:?}\n", resolved.tried_paths);

    // 5. Invalidate after the guild pushes new templates
    println!("5. Invalidating guild 1001...");
    let removed = resolver.invalidate_guild_cache("1001");
    println!("   ✓ {} cached prompt(s) dropped", removed);

    Ok(())
}
