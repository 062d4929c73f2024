use uuid::Uuid;

use crate::constants::messages;
use crate::error::AppError;
use crate::traits::{PasswordHasher, UserStore};
use crate::user::{LoginCredentials, Registration, User, UserRole};

/// Email/password sign-up and sign-in.
#[derive(Clone)]
pub struct AccountService<U, H>
where
    U: UserStore,
    H: PasswordHasher,
{
    users: U,
    hasher: H,
}

impl<U, H> AccountService<U, H>
where
    U: UserStore,
    H: PasswordHasher,
{
    pub fn new(users: U, hasher: H) -> Self {
        Self { users, hasher }
    }

    pub async fn register(&self, registration: Registration) -> Result<User, AppError> {
        self.create(registration, UserRole::Student).await
    }

    /// Create a verified ADMIN account.
    pub async fn create_admin(&self, registration: Registration) -> Result<User, AppError> {
        self.create(registration, UserRole::Admin).await
    }

    async fn create(&self, registration: Registration, role: UserRole) -> Result<User, AppError> {
        registration.validate()?;
        let email = registration.email.trim().to_lowercase();
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(messages::EMAIL_ALREADY_EXISTS.into()));
        }

        let hash = self.hasher.hash(&registration.password)?;
        let mut new_user = registration.into_new_user(hash);
        if role == UserRole::Admin {
            new_user.role = role;
            new_user.is_verified = true;
        }
        let user = self.users.create_user(&new_user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "Registered user");
        Ok(user)
    }

    /// Unknown email, wrong password and password-less accounts all fail the
    /// same way.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<User, AppError> {
        credentials.validate()?;
        let invalid = || AppError::Unauthorized(messages::INVALID_CREDENTIALS.into());

        let user = self
            .users
            .find_user_by_email(&credentials.email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;
        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !self.hasher.verify(&credentials.password, hash) {
            tracing::debug!(user_id = %user.id, "Rejected login");
            return Err(invalid());
        }
        Ok(user)
    }

    /// Resolve the subject of an access token.
    pub async fn authenticate(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{InMemoryStore, MockHasher};

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            password: "Secret123".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            branch: "Computer Science".into(),
            graduation_year: Some(2026),
            bio: None,
        }
    }

    fn service() -> AccountService<InMemoryStore, MockHasher> {
        AccountService::new(InMemoryStore::new(), MockHasher)
    }

    #[tokio::test]
    async fn register_creates_unverified_student() {
        let svc = service();
        let user = svc.register(registration("Ada@College.edu")).await.unwrap();
        assert_eq!(user.email, "ada@college.edu");
        assert_eq!(user.role, UserRole::Student);
        assert!(!user.is_verified);
        assert_eq!(user.password_hash.as_deref(), Some("hashed:Secret123"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_case_insensitively() {
        let svc = service();
        svc.register(registration("ada@college.edu")).await.unwrap();
        let err = svc
            .register(registration("ADA@college.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == messages::EMAIL_ALREADY_EXISTS));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let mut input = registration("not-an-email");
        input.password = "weak".into();
        match service().register(input).await {
            Err(AppError::Validation(errors)) => {
                assert!(errors.get("email").is_some());
                assert!(errors.get("password").is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_checks_password() {
        let svc = service();
        svc.register(registration("ada@college.edu")).await.unwrap();

        let ok = svc
            .login(LoginCredentials {
                email: "Ada@College.edu".into(),
                password: "Secret123".into(),
            })
            .await;
        assert!(ok.is_ok());

        let wrong = svc
            .login(LoginCredentials {
                email: "ada@college.edu".into(),
                password: "Secret124".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::Unauthorized(ref m) if m == messages::INVALID_CREDENTIALS));

        let unknown = svc
            .login(LoginCredentials {
                email: "nobody@college.edu".into(),
                password: "Secret123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn create_admin_is_verified() {
        let user = service()
            .create_admin(registration("root@college.edu"))
            .await
            .unwrap();
        assert!(user.is_admin());
        assert!(user.is_verified);
    }

    #[tokio::test]
    async fn authenticate_unknown_user_is_unauthorized() {
        let err = service().authenticate(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
