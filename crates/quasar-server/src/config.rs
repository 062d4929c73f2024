use std::time::Duration;

use chrono::TimeDelta;

use quasar_core::error::AppError;
use quasar_core::maintenance::MaintenanceConfig;
use quasar_core::services::DEFAULT_INVITATION_TTL_DAYS;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 86_400;
pub const MIN_JWT_SECRET_BYTES: usize = 32;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_AUTH_BURST: u32 = 10;
pub const DEFAULT_AUTH_REPLENISH_SECS: u64 = 6;

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    /// CORS origins. The first one is where OAuth2 logins land.
    pub allowed_origins: Vec<String>,
    pub invitation_ttl: TimeDelta,
    pub maintenance: MaintenanceConfig,
    pub auth_rate_limit: RateLimit,
    /// Key the rate limiter on `X-Forwarded-For` and friends instead of the
    /// socket peer. Only safe behind a proxy that overwrites those headers.
    pub trusted_proxy: bool,
}

/// Token bucket applied per client IP to register and login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub burst: u32,
    /// One request is refunded every `replenish_secs`.
    pub replenish_secs: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            burst: DEFAULT_AUTH_BURST,
            replenish_secs: DEFAULT_AUTH_REPLENISH_SECS,
        }
    }
}

impl ServerConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: jwt_secret.into(),
            jwt_expiration_secs: DEFAULT_JWT_EXPIRATION_SECS,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            invitation_ttl: TimeDelta::days(DEFAULT_INVITATION_TTL_DAYS),
            maintenance: MaintenanceConfig::default(),
            auth_rate_limit: RateLimit::default(),
            trusted_proxy: false,
        }
    }

    /// Read configuration from environment variables.
    ///
    /// - `QUASAR_JWT_SECRET` (required, at least 32 bytes)
    /// - `QUASAR_PORT` (default 8080)
    /// - `QUASAR_JWT_EXPIRATION_SECS` (default 86400)
    /// - `QUASAR_ALLOWED_ORIGINS` (comma separated, default `http://localhost:3000`)
    /// - `QUASAR_INVITATION_TTL_DAYS` (default 7)
    /// - `QUASAR_NOTIFICATION_RETENTION_DAYS` (default 30)
    /// - `QUASAR_MAINTENANCE_INTERVAL_SECS` (default 3600)
    /// - `QUASAR_AUTH_RATE_LIMIT_BURST` / `QUASAR_AUTH_RATE_LIMIT_REPLENISH_SECS`
    /// - `QUASAR_TRUSTED_PROXY` (default false)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("QUASAR_JWT_SECRET").ok_or_else(|| {
            AppError::ConfigError("QUASAR_JWT_SECRET not set. Required to sign tokens.".into())
        })?;
        if secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(AppError::ConfigError(format!(
                "QUASAR_JWT_SECRET must be at least {MIN_JWT_SECRET_BYTES} bytes"
            )));
        }

        let mut config = Self::new(secret);

        if let Some(raw) = get("QUASAR_PORT") {
            config.port = parse_positive("QUASAR_PORT", &raw)?;
        }
        if let Some(raw) = get("QUASAR_JWT_EXPIRATION_SECS") {
            config.jwt_expiration_secs = parse_positive("QUASAR_JWT_EXPIRATION_SECS", &raw)?;
        }
        if let Some(raw) = get("QUASAR_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&raw)?;
        }
        if let Some(raw) = get("QUASAR_INVITATION_TTL_DAYS") {
            config.invitation_ttl = parse_days("QUASAR_INVITATION_TTL_DAYS", &raw)?;
        }
        if let Some(raw) = get("QUASAR_NOTIFICATION_RETENTION_DAYS") {
            config.maintenance.notification_retention =
                parse_days("QUASAR_NOTIFICATION_RETENTION_DAYS", &raw)?;
        }
        if let Some(raw) = get("QUASAR_MAINTENANCE_INTERVAL_SECS") {
            config.maintenance.interval =
                Duration::from_secs(parse_positive("QUASAR_MAINTENANCE_INTERVAL_SECS", &raw)?);
        }
        if let Some(raw) = get("QUASAR_AUTH_RATE_LIMIT_BURST") {
            config.auth_rate_limit.burst = parse_positive("QUASAR_AUTH_RATE_LIMIT_BURST", &raw)?;
        }
        if let Some(raw) = get("QUASAR_AUTH_RATE_LIMIT_REPLENISH_SECS") {
            config.auth_rate_limit.replenish_secs =
                parse_positive("QUASAR_AUTH_RATE_LIMIT_REPLENISH_SECS", &raw)?;
        }
        if let Some(raw) = get("QUASAR_TRUSTED_PROXY") {
            config.trusted_proxy = parse_flag("QUASAR_TRUSTED_PROXY", &raw)?;
        }

        Ok(config)
    }

    /// Where OAuth2 logins are sent back to.
    pub fn frontend_url(&self) -> &str {
        self.allowed_origins
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ALLOWED_ORIGIN)
            .trim_end_matches('/')
    }

    pub fn with_maintenance(mut self, maintenance: MaintenanceConfig) -> Self {
        self.maintenance = maintenance;
        self
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a positive integer"
        ))),
    }
}

fn parse_days(key: &str, raw: &str) -> Result<TimeDelta, AppError> {
    let days: i64 = parse_positive(key, raw)?;
    TimeDelta::try_days(days)
        .ok_or_else(|| AppError::ConfigError(format!("{key} is out of range: {raw}")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::ConfigError(format!(
            "Invalid {key} '{raw}': expected true or false"
        ))),
    }
}

fn parse_origins(raw: &str) -> Result<Vec<String>, AppError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();
    for origin in &origins {
        url::Url::parse(origin).map_err(|e| {
            AppError::ConfigError(format!("Invalid origin '{origin}' in QUASAR_ALLOWED_ORIGINS: {e}"))
        })?;
    }
    if origins.is_empty() {
        return Err(AppError::ConfigError(
            "QUASAR_ALLOWED_ORIGINS must list at least one origin".into(),
        ));
    }
    Ok(origins)
}
