use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::constants::{
    BIO_MAX_LENGTH, MAX_GRADUATION_YEAR, MIN_GRADUATION_YEAR, NAME_MAX_LENGTH, NAME_MIN_LENGTH,
};
use crate::error::AppError;
use crate::validation::{self, FieldErrors, normalize_optional};

string_enum! {
    /// Platform-wide role of an account.
    pub enum UserRole {
        Student => "STUDENT",
        Admin => "ADMIN",
    }
}

string_enum! {
    /// Whether a user is open to joining projects.
    pub enum AvailabilityStatus {
        Available => "AVAILABLE",
        Busy => "BUSY",
        NotAvailable => "NOT_AVAILABLE",
    }
}

impl AvailabilityStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, AvailabilityStatus::Available)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string. `None` for accounts created through GitHub login.
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub bio: Option<String>,
    pub availability_status: AvailabilityStatus,
    pub profile_picture_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub github_id: Option<String>,
    pub github_username: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Row to insert for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub bio: Option<String>,
    pub availability_status: AvailabilityStatus,
    pub profile_picture_url: Option<String>,
    pub github_url: Option<String>,
    pub github_id: Option<String>,
    pub github_username: Option<String>,
    pub is_verified: bool,
}

/// Self-service sign-up input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub branch: String,
    pub graduation_year: Option<i32>,
    pub bio: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();

        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !validation::is_valid_email(&self.email) {
            errors.add("email", "Invalid email format");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if !validation::is_valid_password(&self.password) {
            errors.add(
                "password",
                "Password must be 8-100 characters with at least one uppercase letter, one lowercase letter and one digit",
            );
        }

        errors.require_length(
            "firstName",
            &self.first_name,
            NAME_MIN_LENGTH,
            NAME_MAX_LENGTH,
            "First name",
        );
        errors.require_length(
            "lastName",
            &self.last_name,
            NAME_MIN_LENGTH,
            NAME_MAX_LENGTH,
            "Last name",
        );

        if self.branch.trim().is_empty() {
            errors.add("branch", "Branch is required");
        } else if !validation::is_valid_branch(&self.branch) {
            errors.add("branch", "Invalid branch");
        }

        match self.graduation_year {
            None => errors.add("graduationYear", "Graduation year is required"),
            Some(year) => errors.range_i32(
                "graduationYear",
                year,
                MIN_GRADUATION_YEAR,
                MAX_GRADUATION_YEAR,
                "Graduation year",
            ),
        }

        errors.optional_length("bio", self.bio.as_deref(), 0, BIO_MAX_LENGTH, "Bio");

        errors.into_result()
    }

    /// Convert into an insertable row once the password has been hashed.
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            email: self.email.trim().to_lowercase(),
            password_hash: Some(password_hash),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role: UserRole::Student,
            branch: Some(self.branch.trim().to_string()),
            graduation_year: self.graduation_year,
            bio: normalize_optional(self.bio),
            availability_status: AvailabilityStatus::Available,
            profile_picture_url: None,
            github_url: None,
            github_id: None,
            github_username: None,
            is_verified: false,
        }
    }
}

/// Email/password login input.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !validation::is_valid_email(&self.email) {
            errors.add("email", "Invalid email format");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

/// Partial profile update. `None` leaves a field untouched; a blank string
/// clears an optional text field.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub availability_status: Option<AvailabilityStatus>,
    pub profile_picture_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.optional_length(
            "firstName",
            self.first_name.as_deref(),
            NAME_MIN_LENGTH,
            NAME_MAX_LENGTH,
            "First name",
        );
        errors.optional_length(
            "lastName",
            self.last_name.as_deref(),
            NAME_MIN_LENGTH,
            NAME_MAX_LENGTH,
            "Last name",
        );
        errors.optional_length("bio", self.bio.as_deref(), 0, BIO_MAX_LENGTH, "Bio");
        if let Some(branch) = &self.branch
            && !validation::is_valid_branch(branch)
        {
            errors.add("branch", "Invalid branch");
        }
        if let Some(year) = self.graduation_year {
            errors.range_i32(
                "graduationYear",
                year,
                MIN_GRADUATION_YEAR,
                MAX_GRADUATION_YEAR,
                "Graduation year",
            );
        }
        errors.optional_url(
            "profilePictureUrl",
            self.profile_picture_url.as_deref(),
            "Profile picture URL",
        );
        errors.optional_url("githubUrl", self.github_url.as_deref(), "GitHub URL");
        errors.optional_url("linkedinUrl", self.linkedin_url.as_deref(), "LinkedIn URL");
        errors.optional_url("portfolioUrl", self.portfolio_url.as_deref(), "Portfolio URL");
        errors.into_result()
    }

    pub fn apply_to(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(bio) = self.bio {
            user.bio = normalize_optional(Some(bio));
        }
        if let Some(branch) = self.branch {
            user.branch = Some(branch.trim().to_string());
        }
        if let Some(year) = self.graduation_year {
            user.graduation_year = Some(year);
        }
        if let Some(status) = self.availability_status {
            user.availability_status = status;
        }
        if let Some(url) = self.profile_picture_url {
            user.profile_picture_url = normalize_optional(Some(url));
        }
        if let Some(url) = self.github_url {
            user.github_url = normalize_optional(Some(url));
        }
        if let Some(url) = self.linkedin_url {
            user.linkedin_url = normalize_optional(Some(url));
        }
        if let Some(url) = self.portfolio_url {
            user.portfolio_url = normalize_optional(Some(url));
        }
    }
}

/// Filters for the people directory.
#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    /// Matches first name, last name or email, case-insensitively.
    pub query: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub availability: Option<AvailabilityStatus>,
    /// Users holding a skill with this name.
    pub skill: Option<String>,
    pub exclude_user: Option<Uuid>,
}
