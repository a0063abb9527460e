mod http;

pub use http::HttpRepositoryClient;

use crate::error::{PromptError, Result};
use async_trait::async_trait;

/// Read-only access to single files in a guild's repository.
///
/// Implementations never fail: timeouts, transport errors and non-success
/// responses all surface as `None`.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    async fn fetch_file(
        &self,
        repo_url: &str,
        path: &str,
        branch: &str,
        auth_token: Option<&str>,
    ) -> Option<String>;

    /// Link a human can open to view `path` on `branch`.
    fn view_url(&self, repo_url: &str, path: &str, branch: &str) -> Option<String>;
}

/// Owner and name parsed from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

/// Strip surrounding whitespace, trailing slashes and a `.git` suffix.
pub fn normalize_repo_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/');
    if let Some(stripped) = url.strip_suffix(".git") {
        url = stripped.trim_end_matches('/');
    }
    url.to_string()
}

/// `https://host/owner/repo[.git][/]` → owner + repo.
pub fn parse_repository_url(url: &str) -> Result<RepoCoordinates> {
    let normalized = normalize_repo_url(url);
    let without_scheme = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"))
        .ok_or_else(|| PromptError::InvalidRepositoryUrl(format!("'{url}' is not an http(s) URL")))?;

    let segments: Vec<&str> = without_scheme.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [_host, owner, repo] => Ok(RepoCoordinates {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }),
        _ => Err(PromptError::InvalidRepositoryUrl(format!(
            "'{url}' does not look like https://host/owner/repo"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_suffixes() {
        assert_eq!(normalize_repo_url("https://github.com/a/b.git"), "https://github.com/a/b");
        assert_eq!(normalize_repo_url("https://github.com/a/b/"), "https://github.com/a/b");
        assert_eq!(normalize_repo_url(" https://github.com/a/b.git/ "), "https://github.com/a/b");
        assert_eq!(normalize_repo_url("https://github.com/a/b"), "https://github.com/a/b");
    }

    #[test]
    fn parse_extracts_owner_and_repo() {
        let c = parse_repository_url("https://github.com/acme/prompts.git").unwrap();
        assert_eq!(c.owner, "acme");
        assert_eq!(c.repo, "prompts");
    }

    #[test]
    fn parse_rejects_unusable_urls() {
        assert!(parse_repository_url("git@github.com:acme/prompts.git").is_err());
        assert!(parse_repository_url("https://github.com/acme").is_err());
        assert!(parse_repository_url("https://github.com/acme/prompts/tree/main").is_err());
    }
}
