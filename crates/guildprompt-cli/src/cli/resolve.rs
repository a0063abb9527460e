use super::ResolveArgs;
use crate::config::GuildpromptConfig;
use anyhow::{Context, Result};
use guildprompt_core::{
    GuildPromptConfig, HttpRepositoryClient, PromptCacheManager, PromptResolver, ResolvedPrompt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub async fn run(args: ResolveArgs, config: &GuildpromptConfig) -> Result<()> {
    let resolver_config = config.resolver_config();
    resolver_config
        .validate()
        .context("Invalid [engine] settings")?;

    let resolver = PromptResolver::new(
        resolver_config.clone(),
        Arc::new(PromptCacheManager::from_config(&resolver_config)),
        Arc::new(config.default_provider()?),
        Arc::new(HttpRepositoryClient::new(&resolver_config)?),
        Arc::new(config.config_store()),
    );

    let guild_id = args.context.guild.clone();
    let context = args.context.to_context();

    if args.repo.is_none() && args.branch.is_some() {
        warn!("--branch has no effect without --repo");
    }
    let override_config = args.repo.as_ref().map(|url| {
        let mut guild = GuildPromptConfig::new(&guild_id)
            .with_repository(url, args.branch.clone().unwrap_or_default());
        if let Some(token) = &args.token {
            guild = guild.with_token(token);
        }
        guild
    });

    let deadline = Duration::from_secs(args.deadline.max(1));
    let resolved = tokio::time::timeout(
        deadline,
        resolver.resolve_prompt(&guild_id, &context, override_config.as_ref()),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Resolution did not finish within {}s", deadline.as_secs()))?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&resolved)?),
        _ => print_text(&resolved),
    }
    Ok(())
}

fn print_text(resolved: &ResolvedPrompt) {
    println!("{}", resolved.content);
    println!();
    println!("{}", "─".repeat(60));
    println!(
        "Source:   {}{}",
        resolved.source,
        if resolved.is_stale { " (stale)" } else { "" }
    );
    println!("Version:  {}", resolved.version);
    println!("File:     {}", resolved.file_path.as_deref().unwrap_or("-"));
    if let Some(repo) = &resolved.repo_url {
        println!("Repo:     {}", repo);
    }
    if let Some(url) = &resolved.view_url {
        println!("View:     {}", url);
    }
    if let Some(pattern) = &resolved.routing_pattern {
        println!("Route:    {}", pattern);
    }
    if !resolved.tried_paths.is_empty() {
        println!("Tried:");
        for path in &resolved.tried_paths {
            println!("  {}", path);
        }
    }
    println!("{}", "─".repeat(60));
}
