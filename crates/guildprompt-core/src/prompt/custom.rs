use super::{CustomFetch, CustomOutcome, PromptSource, ResolvedPrompt};
use crate::context::PromptContext;
use crate::error::PromptError;
use crate::guild::GuildPromptConfig;
use crate::remote::{normalize_repo_url, RemoteRepository};
use crate::routing::RoutingFileParser;
use crate::schema::SchemaValidator;
use async_trait::async_trait;

/// Reads a guild's routing file from its repository and returns the first
/// candidate template that passes validation.
pub struct RepositoryPromptFetch<'a> {
    remote: &'a dyn RemoteRepository,
    parser: &'a RoutingFileParser,
    validator: &'a SchemaValidator,
    config: &'a GuildPromptConfig,
    routing_file: &'a str,
}

impl<'a> RepositoryPromptFetch<'a> {
    pub fn new(
        remote: &'a dyn RemoteRepository,
        parser: &'a RoutingFileParser,
        validator: &'a SchemaValidator,
        config: &'a GuildPromptConfig,
        routing_file: &'a str,
    ) -> Self {
        Self {
            remote,
            parser,
            validator,
            config,
            routing_file,
        }
    }

    fn failed(reason: PromptError, tried_paths: Vec<String>) -> CustomOutcome {
        CustomOutcome::Failed { reason, tried_paths }
    }
}

#[async_trait]
impl CustomFetch for RepositoryPromptFetch<'_> {
    async fn fetch(&self, guild_id: &str, context: &PromptContext) -> CustomOutcome {
        let Some(repo_url) = self.config.repo_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Self::failed(
                PromptError::InvalidConfig(format!("guild {guild_id} has no repository")),
                Vec::new(),
            );
        };
        let branch = self.config.effective_branch();
        let token = self.config.auth_token.as_deref();

        let Some(routing_text) = self
            .remote
            .fetch_file(repo_url, self.routing_file, branch, token)
            .await
        else {
            return Self::failed(
                PromptError::RoutingFileMissing {
                    repo_url: repo_url.to_string(),
                    branch: branch.to_string(),
                    path: self.routing_file.to_string(),
                },
                Vec::new(),
            );
        };

        let routing = match self.parser.parse(&routing_text) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Routing file for guild {} rejected: {}", guild_id, e);
                return Self::failed(e, Vec::new());
            }
        };

        let candidates = self.parser.resolve_routes(&routing, context);
        if candidates.is_empty() {
            return Self::failed(PromptError::NoMatchingRoute, Vec::new());
        }

        let mut tried = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            tried.push(candidate.path.clone());

            let Some(body) = self.remote.fetch_file(repo_url, &candidate.path, branch, token).await else {
                log::debug!("Candidate {} unavailable for guild {}", candidate.path, guild_id);
                continue;
            };

            let report = self.validator.validate_prompt(&body);
            if !report.is_valid {
                log::warn!(
                    "Skipping invalid template {} for guild {}: {}",
                    candidate.path,
                    guild_id,
                    report.errors.join("; ")
                );
                continue;
            }
            for warning in &report.warnings {
                log::debug!("Template {}: {}", candidate.path, warning);
            }

            log::info!(
                "Resolved custom prompt {} for guild {} via route '{}'",
                candidate.path,
                guild_id,
                candidate.route_name
            );
            let mut resolved = ResolvedPrompt::new(body, PromptSource::Custom, context);
            resolved.version = routing.version;
            resolved.view_url = self.remote.view_url(repo_url, &candidate.path, branch);
            resolved.repo_url = Some(normalize_repo_url(repo_url));
            resolved.file_path = Some(candidate.path);
            resolved.routing_pattern = Some(candidate.pattern);
            resolved.routing_variables = candidate.routing_variables;
            resolved.tried_paths = tried;
            return CustomOutcome::Resolved(resolved);
        }

        Self::failed(
            PromptError::NoValidCandidate { tried: tried.clone() },
            tried,
        )
    }
}
