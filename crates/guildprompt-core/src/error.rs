use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Routing file syntax error: {0}")]
    RoutingSyntax(#[from] serde_yaml::Error),

    #[error("Routing file is invalid: {}", errors.join("; "))]
    RoutingInvalid { errors: Vec<String> },

    #[error("Routing file '{path}' not found in {repo_url}@{branch}")]
    RoutingFileMissing {
        repo_url: String,
        branch: String,
        path: String,
    },

    #[error("No route matched the request context")]
    NoMatchingRoute,

    #[error("No valid prompt among {} candidate path(s)", tried.len())]
    NoValidCandidate { tried: Vec<String> },

    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config store error: {0}")]
    ConfigStore(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
