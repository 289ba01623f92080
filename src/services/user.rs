//! User service
//!
//! Implements business logic for accounts and authentication:
//! - Registration with username/email/password validation
//! - Login, issuing an access/refresh token pair
//! - Refreshing an access token
//! - Resolving a bearer access token to its user
//! - Account deletion
//! - Creating the bootstrap account at startup

use crate::config::BootstrapConfig;
use crate::db::repositories::{is_unique_violation, UserRepository};
use crate::models::{messages, CreateUserInput, FieldErrors, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{TokenKind, TokenPair, TokenService};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Maximum username length
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Maximum email length
pub const EMAIL_MAX_LENGTH: usize = 254;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

/// Stands in for the stored hash when the username is unknown, so a failed
/// login always costs one Argon2 verification.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("fitlog-unknown-user-password").ok());

const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid registration input
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// Username already taken
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or token. Deliberately says nothing about which.
    #[error("No active account found with the given credentials")]
    AuthenticationError,

    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and tokens
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Lazy::force(&DUMMY_HASH);
        Self { user_repo, tokens }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing or malformed fields, all collected at once
    /// - `Conflict` if the username is taken; no row is created
    /// - `InternalError` for database errors
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let (username, email, password) =
            validate_register_input(&input).map_err(UserServiceError::Validation)?;

        if self
            .user_repo
            .get_by_username(&username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let password_hash = hash_password(&password).context("Failed to hash password")?;
        let user = User::new(username, email, password_hash);

        match self.user_repo.create(&user).await {
            Ok(created) => {
                tracing::info!("Registered user {} ({})", created.username, created.id);
                Ok(created)
            }
            // Lost a race with a concurrent registration
            Err(e) if is_unique_violation(&e) => {
                Err(UserServiceError::Conflict(USERNAME_TAKEN.to_string()))
            }
            Err(e) => Err(UserServiceError::InternalError(e.context("Failed to create user"))),
        }
    }

    /// Verify credentials and issue an access/refresh pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to look up user")?;

        let password_valid =
            credentials_match(user.as_ref(), password).context("Failed to verify password")?;
        let user = match user {
            Some(user) if password_valid => user,
            Some(user) => {
                tracing::debug!("Login failed for user {}: wrong password", user.id);
                return Err(UserServiceError::AuthenticationError);
            }
            None => {
                tracing::debug!("Login failed: unknown user");
                return Err(UserServiceError::AuthenticationError);
            }
        };

        self.tokens
            .issue_pair(&user)
            .map_err(|e| UserServiceError::InternalError(anyhow::anyhow!(e)))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The user must still exist.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, UserServiceError> {
        let user = self.user_for_token(refresh_token, TokenKind::Refresh).await?;

        self.tokens
            .issue(user.id, &user.username, TokenKind::Access)
            .map_err(|e| UserServiceError::InternalError(anyhow::anyhow!(e)))
    }

    /// Resolve a bearer access token to its user.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, UserServiceError> {
        self.user_for_token(access_token, TokenKind::Access).await
    }

    async fn user_for_token(&self, token: &str, kind: TokenKind) -> Result<User, UserServiceError> {
        let claims = self.tokens.verify(token, kind).map_err(|e| {
            tracing::debug!("Rejected {} token: {}", kind, e);
            UserServiceError::AuthenticationError
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| UserServiceError::AuthenticationError)?;

        self.user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to load token user")?
            .ok_or_else(|| {
                tracing::debug!("Rejected {} token for deleted user {}", kind, user_id);
                UserServiceError::AuthenticationError
            })
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// Delete an account along with all of its workouts and entries.
    pub async fn delete_account(&self, id: i64) -> Result<(), UserServiceError> {
        let deleted = self
            .user_repo
            .delete(id)
            .await
            .context("Failed to delete user")?;

        if !deleted {
            return Err(UserServiceError::NotFound);
        }

        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Create the configured bootstrap account if it does not exist yet.
    ///
    /// Returns the created user, or `None` when nothing was configured or
    /// the username is already taken.
    pub async fn ensure_bootstrap_user(
        &self,
        config: &BootstrapConfig,
    ) -> Result<Option<User>, UserServiceError> {
        let Some((username, email, password)) = config.credentials() else {
            tracing::debug!("No bootstrap account configured");
            return Ok(None);
        };

        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check bootstrap username")?
            .is_some()
        {
            tracing::info!("Bootstrap account '{}' already exists, skipping", username);
            return Ok(None);
        }

        let user = self
            .register(CreateUserInput::new(username, email, password))
            .await?;
        tracing::info!("Created bootstrap account '{}'", user.username);
        Ok(Some(user))
    }
}

/// Runs exactly one Argon2 verification whether or not the user exists.
fn credentials_match(user: Option<&User>, password: &str) -> anyhow::Result<bool> {
    match user {
        Some(user) => verify_password(password, &user.password_hash),
        None => {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                verify_password(password, hash)?;
            }
            Ok(false)
        }
    }
}

/// Validate registration input, returning trimmed username, email and the raw password.
fn validate_register_input(input: &CreateUserInput) -> Result<(String, String, String), FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = match input.username.as_deref().map(str::trim) {
        None => {
            errors.add("username", messages::REQUIRED);
            String::new()
        }
        Some("") => {
            errors.add("username", messages::BLANK);
            String::new()
        }
        Some(username) => {
            if username.chars().count() > USERNAME_MAX_LENGTH {
                errors.add("username", messages::max_length(USERNAME_MAX_LENGTH));
            }
            if !USERNAME_RE.is_match(username) {
                errors.add("username", INVALID_USERNAME);
            }
            username.to_string()
        }
    };

    let email = input.email.as_deref().map(str::trim).unwrap_or("").to_string();
    if !email.is_empty() {
        if email.chars().count() > EMAIL_MAX_LENGTH {
            errors.add("email", messages::max_length(EMAIL_MAX_LENGTH));
        }
        if !EMAIL_RE.is_match(&email) {
            errors.add("email", INVALID_EMAIL);
        }
    }

    let password = match input.password.as_deref() {
        None => {
            errors.add("password", messages::REQUIRED);
            String::new()
        }
        Some(p) if p.trim().is_empty() => {
            errors.add("password", messages::BLANK);
            String::new()
        }
        Some(p) => p.to_string(),
    };

    errors.into_result()?;
    Ok((username, email, password))
}
