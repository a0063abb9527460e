pub mod config_cmd;
pub mod defaults;
pub mod resolve;
pub mod routes;
pub mod validate;

use clap::{Args, Parser, Subcommand};
use guildprompt_core::PromptContext;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "guildprompt")]
#[command(version, about = "Resolve and validate per-guild prompt templates")]
pub struct Cli {
    /// Path to guildprompt.toml
    #[arg(
        long,
        global = true,
        env = "GUILDPROMPT_CONFIG",
        default_value = "guildprompt.toml"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the prompt a guild would receive for a context
    Resolve(ResolveArgs),
    /// Check routing files and templates offline
    #[command(subcommand)]
    Validate(ValidateCommands),
    /// Show which repository paths a routing file yields for a context
    Routes(RoutesArgs),
    /// List built-in templates
    Defaults(DefaultsArgs),
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ValidateCommands {
    /// Validate a routing (PATH) file
    Routing(ValidateFileArgs),
    /// Validate a prompt template
    Template(ValidateFileArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

#[derive(Args, Debug)]
pub struct ValidateFileArgs {
    pub file: PathBuf,
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Request context shared by `resolve` and `routes`.
#[derive(Args, Debug, Clone)]
pub struct ContextArgs {
    /// Guild (tenant) id
    #[arg(long)]
    pub guild: String,
    #[arg(long)]
    pub channel_id: Option<String>,
    #[arg(long)]
    pub channel_name: Option<String>,
    #[arg(long, default_value = guildprompt_core::context::DEFAULT_CATEGORY)]
    pub category: String,
    #[arg(long, default_value = guildprompt_core::context::DEFAULT_SUMMARY_TYPE)]
    pub summary_type: String,
    /// brief | detailed | comprehensive
    #[arg(long)]
    pub length: Option<String>,
    /// developer | marketing | executive | support | general
    #[arg(long)]
    pub perspective: Option<String>,
    #[arg(long, default_value = "0")]
    pub message_count: usize,
    #[arg(long)]
    pub user: Option<String>,
    /// Extra variable as key=value (repeatable)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,
}

impl ContextArgs {
    pub fn to_context(&self) -> PromptContext {
        let mut ctx = PromptContext::new(&self.guild)
            .with_category(&self.category)
            .with_summary_type(&self.summary_type)
            .with_message_count(self.message_count);
        ctx.channel_id = self.channel_id.clone();
        ctx.channel_name = self.channel_name.clone();
        if let Some(length) = &self.length {
            ctx = ctx.with_summary_length(length);
        }
        if let Some(perspective) = &self.perspective {
            ctx = ctx.with_perspective(perspective);
        }
        if let Some(user) = &self.user {
            ctx = ctx.with_user(user);
        }
        for (key, value) in &self.vars {
            ctx = ctx.with_extra(key, value);
        }
        ctx
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub context: ContextArgs,
    /// Repository to use instead of the guild's configured one
    #[arg(long)]
    pub repo: Option<String>,
    #[arg(long)]
    pub branch: Option<String>,
    /// Access token for --repo
    #[arg(long, env = "GUILDPROMPT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Seconds to wait before giving up and reporting a timeout
    #[arg(long, default_value = "30")]
    pub deadline: u64,
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Local routing file
    pub file: PathBuf,
    #[command(flatten)]
    pub context: ContextArgs,
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct DefaultsArgs {
    /// Print the template for this category or perspective/length key
    #[arg(long)]
    pub show: Option<String>,
    #[arg(long, default_value = "text")]
    pub format: String,
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
