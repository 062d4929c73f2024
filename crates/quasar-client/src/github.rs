use std::time::Duration;

use quasar_core::error::AppError;
use quasar_core::oauth::{GitHubEmail, GitHubUser};
use quasar_core::traits::GitHubApi;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{DEFAULT_SCOPE, GitHubConfig};

const USER_AGENT: &str = "Quasar/0.3 (GitHub login)";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// GitHub OAuth2 and REST client.
///
/// Covers the three calls the login flow needs: code exchange, the
/// authenticated user's profile and their email addresses.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    timeout_secs: u64,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, AppError> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: GitHubConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Where to send the browser to start the login, carrying `state`.
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid GitHub authorize URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", DEFAULT_SCOPE)
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Trade an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let request = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            code,
            redirect_uri: &self.config.redirect_uri,
        };
        let response = self
            .send(
                self.client
                    .post(&self.config.token_url)
                    .header("Accept", "application/json")
                    .json(&request),
            )
            .await?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse token response: {e}")))?;

        match body {
            TokenResponse {
                access_token: Some(token),
                ..
            } if !token.is_empty() => Ok(token),
            TokenResponse {
                error_description: Some(description),
                ..
            } => Err(AppError::BadRequest(description)),
            TokenResponse { error, .. } => Err(AppError::BadRequest(format!(
                "GitHub did not return an access token ({})",
                error.as_deref().unwrap_or("unknown error")
            ))),
        }
    }

    fn api_get(&self, path: &str, access_token: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{path}", self.config.api_base_url))
            .header("Accept", GITHUB_ACCEPT)
            .bearer_auth(access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));

            return Err(match status_code {
                401 => AppError::Unauthorized(format!("GitHub rejected the token: {message}")),
                429 => AppError::RateLimitExceeded,
                _ => AppError::HttpError(format!("GitHub API error: {message}")),
            });
        }
        Ok(response)
    }
}

// ---- GitHub API types ----

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GitHubApi for GitHubClient {
    async fn fetch_user(&self, access_token: &str) -> Result<GitHubUser, AppError> {
        let response = self.send(self.api_get("/user", access_token)).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse GitHub user: {e}")))
    }

    async fn fetch_emails(&self, access_token: &str) -> Result<Vec<GitHubEmail>, AppError> {
        let response = self.send(self.api_get("/user/emails", access_token)).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse GitHub emails: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    fn client_for(base: &str) -> GitHubClient {
        let config = GitHubConfig::new("client-id", "client-secret", "http://localhost/cb")
            .with_base_urls(&format!("{base}/login/oauth/access_token"), base);
        GitHubClient::new(config).unwrap()
    }

    #[test]
    fn test_authorize_url_carries_state_and_scope() {
        let client = client_for("http://127.0.0.1:9");
        let url = Url::parse(&client.authorize_url("abc123").unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("github.com"));
        assert!(pairs.contains(&("client_id".into(), "client-id".into())));
        assert!(pairs.contains(&("scope".into(), "read:user user:email".into())));
        assert!(pairs.contains(&("state".into(), "abc123".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost/cb".into())));
    }

    #[tokio::test]
    async fn test_fetch_user_sends_bearer_token() {
        let (base, handle) = serve_once(
            "200 OK",
            r#"{"id":42,"login":"octo","name":"Octo Cat","email":null,"avatar_url":"https://a/x.png"}"#,
        )
        .await;

        let user = client_for(&base).fetch_user("tok-1").await.unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.login, "octo");
        assert!(user.email.is_none());

        let request = handle.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /user "));
        assert!(request.contains("authorization: bearer tok-1"));
    }

    #[tokio::test]
    async fn test_fetch_emails_parses_flags() {
        let (base, _handle) = serve_once(
            "200 OK",
            r#"[{"email":"a@x.dev","primary":false,"verified":true},{"email":"b@x.dev","primary":true,"verified":true}]"#,
        )
        .await;

        let emails = client_for(&base).fetch_emails("tok").await.unwrap();
        assert_eq!(emails.len(), 2);
        assert!(emails[1].primary);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_unauthorized() {
        let (base, _handle) =
            serve_once("401 Unauthorized", r#"{"message":"Bad credentials"}"#).await;

        let err = client_for(&base).fetch_user("expired").await.unwrap_err();
        match err {
            AppError::Unauthorized(message) => assert!(message.contains("Bad credentials")),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_returns_token() {
        let (base, handle) = serve_once(
            "200 OK",
            r#"{"access_token":"gho_abc","token_type":"bearer","scope":"read:user"}"#,
        )
        .await;

        let token = client_for(&base).exchange_code("code-1").await.unwrap();
        assert_eq!(token, "gho_abc");
        let request = handle.await.unwrap();
        assert!(request.contains("\"code\":\"code-1\""));
    }

    #[tokio::test]
    async fn test_exchange_code_error_is_bad_request() {
        let (base, _handle) = serve_once(
            "200 OK",
            r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#,
        )
        .await;

        let err = client_for(&base).exchange_code("stale").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("incorrect or expired")));
    }
}
