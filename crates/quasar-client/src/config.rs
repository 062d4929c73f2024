use quasar_core::error::AppError;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_SCOPE: &str = "read:user user:email";

/// GitHub OAuth app credentials and endpoints.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl GitHubConfig {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Point the token and API endpoints at another host.
    pub fn with_base_urls(mut self, token_url: &str, api_base_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self.api_base_url = api_base_url.trim_end_matches('/').to_string();
        self
    }

    /// Read `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET` and
    /// `GITHUB_REDIRECT_URI`. Returns `Ok(None)` when GitHub login is not
    /// configured at all.
    pub fn from_env() -> Result<Option<Self>, AppError> {
        Self::from_values(
            std::env::var("GITHUB_CLIENT_ID").ok(),
            std::env::var("GITHUB_CLIENT_SECRET").ok(),
            std::env::var("GITHUB_REDIRECT_URI").ok(),
        )
    }

    fn from_values(
        client_id: Option<String>,
        client_secret: Option<String>,
        redirect_uri: Option<String>,
    ) -> Result<Option<Self>, AppError> {
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (
            blank_to_none(client_id),
            blank_to_none(client_secret),
            blank_to_none(redirect_uri),
        ) {
            (None, None, None) => Ok(None),
            (Some(id), Some(secret), Some(redirect)) => {
                url::Url::parse(&redirect).map_err(|e| {
                    AppError::ConfigError(format!("GITHUB_REDIRECT_URI is not a valid URL: {e}"))
                })?;
                Ok(Some(Self::new(&id, &secret, &redirect)))
            }
            _ => Err(AppError::ConfigError(
                "GITHUB_CLIENT_ID, GITHUB_CLIENT_SECRET and GITHUB_REDIRECT_URI must be set together"
                    .into(),
            )),
        }
    }
}
