use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quasar_core::error::AppError;
use quasar_core::traits::PasswordHasher;
use quasar_core::user::User;

use crate::error::ApiError;
use crate::state::AppState;

const MISSING_TOKEN: &str = "Full authentication is required to access this resource";
const INVALID_TOKEN: &str = "Invalid or expired token";

/// JWT claims issued at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized(INVALID_TOKEN.into()))
    }
}

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiration_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiration_secs,
        }
    }

    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            iat: now,
            exp: now + self.expiration_secs,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Generic(format!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                AppError::Unauthorized(INVALID_TOKEN.into())
            })
    }
}

/// Argon2id password hashing with a random salt per hash.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Generic(format!("Failed to hash password: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                self.argon2
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Token from an `Authorization: Bearer <jwt>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve a token to a live account. Tokens of deleted users are rejected.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<User, AppError> {
    let claims = state.tokens.verify(token)?;
    let user_id = claims.user_id()?;
    state
        .accounts
        .authenticate(user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) | AppError::Unauthorized(_) => {
                AppError::Unauthorized(INVALID_TOKEN.into())
            }
            other => other,
        })
}

/// The caller, resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let token =
            bearer_token(&parts.headers).ok_or_else(|| AppError::Unauthorized(MISSING_TOKEN.into()))?;
        let user = authenticate_token(state, token).await?;
        let auth = AuthUser(user);
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use quasar_core::testutil::{InMemoryStore, sample_new_user};

    use super::*;

    fn sample_user() -> User {
        InMemoryStore::new().insert_user(sample_new_user("ada@college.edu"))
    }

    const SECRET: &str = "test-secret-test-secret-test-secret";

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let tokens = TokenService::new(SECRET, 3600);
        let user = sample_user();
        let token = tokens.issue(&user).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.first_name, user.first_name);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new(SECRET, 3600)
            .issue(&sample_user())
            .unwrap();
        let other = TokenService::new("another-secret-another-secret-xx", 3600);
        assert!(matches!(
            other.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new(SECRET, -10);
        let token = tokens.issue(&sample_user()).unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = TokenService::new(SECRET, 3600);
        assert!(tokens.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_argon2_hash_and_verify() {
        let hasher = Argon2Hasher::default();
        let hash = hasher.hash("Secret123!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Secret123!", &hash));
        assert!(!hasher.verify("secret123!", &hash));
        assert!(!hasher.verify("Secret123!", "not-a-phc-string"));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
