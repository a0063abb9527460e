use super::{parse_repository_url, RemoteRepository};
use crate::config::ResolverConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};

const USER_AGENT: &str = concat!("guildprompt/", env!("CARGO_PKG_VERSION"));

/// Fetches raw files over HTTP using GitHub-style addressing:
/// `{raw_base}/{owner}/{repo}/{branch}/{path}`.
#[derive(Debug, Clone)]
pub struct HttpRepositoryClient {
    client: reqwest::Client,
    raw_base_url: String,
    web_base_url: String,
    max_file_bytes: usize,
}

impl HttpRepositoryClient {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
            web_base_url: config.web_base_url.trim_end_matches('/').to_string(),
            max_file_bytes: config.max_file_bytes,
        })
    }

    fn raw_url(&self, repo_url: &str, path: &str, branch: &str) -> Option<String> {
        match parse_repository_url(repo_url) {
            Ok(c) => join_segments(&self.raw_base_url, &[c.owner.as_str(), c.repo.as_str(), branch], path),
            Err(e) => {
                log::warn!("Cannot fetch from repository: {}", e);
                None
            }
        }
    }
}

/// Append `head`, then each `/`-separated part of `path`, to `base` as
/// percent-encoded path segments. A context value holding `#`, `?` or `%`
/// stays inside its segment instead of becoming a fragment or query.
fn join_segments(base: &str, head: &[&str], path: &str) -> Option<String> {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Invalid base URL {}: {}", base, e);
            return None;
        }
    };
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        let parts = head
            .iter()
            .copied()
            .flat_map(|part| part.split('/'))
            .chain(path.split('/'))
            .filter(|part| !part.is_empty());
        segments.extend(parts);
    }
    Some(url.to_string())
}

#[async_trait]
impl RemoteRepository for HttpRepositoryClient {
    async fn fetch_file(
        &self,
        repo_url: &str,
        path: &str,
        branch: &str,
        auth_token: Option<&str>,
    ) -> Option<String> {
        let url = self.raw_url(repo_url, path, branch)?;

        let mut request = self.client.get(&url);
        if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let mut response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                log::info!("Timed out fetching {}", url);
                return None;
            }
            Err(e) => {
                log::info!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            match status {
                StatusCode::NOT_FOUND => log::debug!("{} not found", url),
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                    let remaining = response
                        .headers()
                        .get("x-ratelimit-remaining")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    log::warn!(
                        "Fetching {} refused with {} (rate limit remaining: {})",
                        url,
                        status,
                        remaining
                    );
                }
                _ => log::info!("Fetching {} returned {}", url, status),
            }
            return None;
        }

        if response
            .content_length()
            .is_some_and(|len| len as usize > self.max_file_bytes)
        {
            log::warn!("{} exceeds {} bytes, ignoring", url, self.max_file_bytes);
            return None;
        }

        // Chunked replies carry no length up front, so the cap is enforced
        // while reading.
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > self.max_file_bytes {
                        log::warn!("{} exceeds {} bytes, ignoring", url, self.max_file_bytes);
                        return None;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    log::info!("Failed to read body of {}: {}", url, e);
                    return None;
                }
            }
        }

        match String::from_utf8(body) {
            Ok(text) => {
                log::debug!("Fetched {} ({} bytes)", url, text.len());
                Some(text)
            }
            Err(_) => {
                log::warn!("{} is not valid UTF-8, ignoring", url);
                None
            }
        }
    }

    fn view_url(&self, repo_url: &str, path: &str, branch: &str) -> Option<String> {
        let c = parse_repository_url(repo_url).ok()?;
        join_segments(&self.web_base_url, &[c.owner.as_str(), c.repo.as_str(), "blob", branch], path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const REPO: &str = "https://github.com/acme/prompts.git/";

    fn client_for(base: &str) -> HttpRepositoryClient {
        let config = ResolverConfig::new()
            .with_raw_base_url(base)
            .with_fetch_timeout(Duration::from_secs(2))
            .with_max_file_bytes(64);
        HttpRepositoryClient::new(&config).unwrap()
    }

    // ── fetching ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn fetches_raw_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/acme/prompts/main/prompts/meeting.md")
            .with_status(200)
            .with_body("Meeting {message_count}")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let body = client.fetch_file(REPO, "prompts/meeting.md", "main", None).await;

        assert_eq!(body.as_deref(), Some("Meeting {message_count}"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/acme/prompts/dev/PATH")
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_body("version: v1")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let body = client.fetch_file(REPO, "/PATH", "dev", Some("s3cret")).await;

        assert!(body.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_is_absent() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for (path, status) in [("/acme/prompts/main/missing.md", 404), ("/acme/prompts/main/limited.md", 429)] {
            let mock = server
                .mock("GET", path)
                .with_status(status)
                .with_header("x-ratelimit-remaining", "0")
                .create_async()
                .await;
            mocks.push(mock);
        }

        let client = client_for(&server.url());
        assert!(client.fetch_file(REPO, "missing.md", "main", None).await.is_none());
        assert!(client.fetch_file(REPO, "limited.md", "main", None).await.is_none());
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn oversized_and_binary_bodies_are_absent() {
        let mut server = mockito::Server::new_async().await;
        let big = server
            .mock("GET", "/acme/prompts/main/big.md")
            .with_status(200)
            .with_body("x".repeat(65))
            .create_async()
            .await;
        let binary = server
            .mock("GET", "/acme/prompts/main/binary.md")
            .with_status(200)
            .with_body(vec![0xff, 0xfe, 0xfd])
            .create_async()
            .await;

        let client = client_for(&server.url());
        assert!(client.fetch_file(REPO, "big.md", "main", None).await.is_none());
        assert!(client.fetch_file(REPO, "binary.md", "main", None).await.is_none());
        big.assert_async().await;
        binary.assert_async().await;
    }

    #[tokio::test]
    async fn chunked_bodies_are_capped_while_reading() {
        let mut server = mockito::Server::new_async().await;
        let endless = server
            .mock("GET", "/acme/prompts/main/endless.md")
            .with_status(200)
            .with_chunked_body(|w| {
                for _ in 0..10_000 {
                    w.write_all(&[b'x'; 1024])?;
                }
                Ok(())
            })
            .create_async()
            .await;
        let small = server
            .mock("GET", "/acme/prompts/main/small.md")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"Summarise ")?;
                w.write_all(b"{channel_name}")
            })
            .create_async()
            .await;

        let client = client_for(&server.url());
        assert!(client.fetch_file(REPO, "endless.md", "main", None).await.is_none());
        assert_eq!(
            client.fetch_file(REPO, "small.md", "main", None).await.as_deref(),
            Some("Summarise {channel_name}")
        );
        endless.assert_async().await;
        small.assert_async().await;
    }

    // ── addressing ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn reserved_characters_stay_in_their_segment() {
        let mut server = mockito::Server::new_async().await;
        let directory = server
            .mock("GET", "/acme/prompts/main/channels/")
            .with_status(200)
            .with_body("directory listing")
            .expect(0)
            .create_async()
            .await;
        let hashed = server
            .mock("GET", "/acme/prompts/main/channels/%23general.md")
            .with_status(200)
            .with_body("general channel")
            .create_async()
            .await;
        let questioned = server
            .mock("GET", "/acme/prompts/main/channels/why%3F.md")
            .with_status(200)
            .with_body("why channel")
            .create_async()
            .await;

        let client = client_for(&server.url());
        assert_eq!(
            client.fetch_file(REPO, "channels/#general.md", "main", None).await.as_deref(),
            Some("general channel")
        );
        assert_eq!(
            client.fetch_file(REPO, "channels/why?.md", "main", None).await.as_deref(),
            Some("why channel")
        );
        directory.assert_async().await;
        hashed.assert_async().await;
        questioned.assert_async().await;
    }

    #[test]
    fn view_url_points_at_blob() {
        let client = client_for("http://127.0.0.1:9");
        assert_eq!(
            client.view_url(REPO, "prompts/meeting.md", "main").as_deref(),
            Some("https://github.com/acme/prompts/blob/main/prompts/meeting.md")
        );
        assert!(client.view_url("ftp://x/y/z", "a", "main").is_none());
        assert_eq!(
            client.view_url(REPO, "channels/#general.md", "main").as_deref(),
            Some("https://github.com/acme/prompts/blob/main/channels/%23general.md")
        );
    }

    // ── failures ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and hold them open without ever replying.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = ResolverConfig::new()
            .with_raw_base_url(format!("http://{addr}"))
            .with_fetch_timeout(Duration::from_millis(200));
        let client = HttpRepositoryClient::new(&config).unwrap();

        let started = std::time::Instant::now();
        assert!(client.fetch_file(REPO, "PATH", "main", None).await.is_none());
        assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
        server.abort();
    }

    #[tokio::test]
    async fn unreachable_host_is_absent() {
        // Port 9 (discard) is closed on test machines; connection is refused.
        let client = client_for("http://127.0.0.1:9");
        assert!(client.fetch_file(REPO, "PATH", "main", None).await.is_none());
    }

    #[tokio::test]
    async fn bad_repository_url_is_absent() {
        let client = client_for("http://127.0.0.1:9");
        assert!(client.fetch_file("not a url", "PATH", "main", None).await.is_none());
    }
}
