use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::encode;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::entities::user;
use crate::store::StorageError;

pub mod api;
pub mod store;

pub use store::{SeaOrmUserStore, UserStore};

/// A registered account as exposed to the rest of the crate. The stored
/// password hash never leaves this module.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct User {
    id: i32,
    username: String,
}

impl User {
    pub fn new(id: i32, username: String) -> Self {
        Self { id, username }
    }

    /// Returns the ID of the user.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        User::new(model.id, model.username)
    }
}

/// Represents the currently authenticated user, carried as a request
/// extension by the API middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(id: i32, username: String) -> Self {
        Self { id, username }
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Authentication state containing the JWT signing secret, token lifetime,
/// and the database handle used to resolve token subjects.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub db: Arc<DatabaseConnection>,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config, db: Arc<DatabaseConnection>) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: chrono::Duration::hours(config.token_ttl_hours),
            db,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,       // Expiry time of the token
    pub iat: usize,       // Issued at time of the token
    pub username: String, // Username of the authenticated user
}

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The username is already taken by another account.
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    /// Login failed. Covers both an unknown username and a wrong password;
    /// the two cases are deliberately indistinguishable to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The token was malformed, expired, signed with an unrecognized key, or
    /// its subject no longer resolves to a user.
    #[error("invalid or expired token")]
    InvalidToken,
    /// Represents an error during password hashing or verification.
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    /// Represents an error during JWT operations.
    #[error("JWT operation failed")]
    JwtError,
    /// Represents a storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Hashes a password with Argon2id and a fresh random salt. The salt is
/// embedded in the returned PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(AuthError::Hash)
}

/// Re-derives the hash from the candidate password and compares it against
/// the stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(AuthError::Hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issues and verifies identities backed by a [`UserStore`].
pub struct AuthService<S> {
    store: S,
    jwt_secret: String,
    token_ttl: chrono::Duration,
}

impl<S: UserStore> AuthService<S> {
    pub fn new(store: S, jwt_secret: String, token_ttl: chrono::Duration) -> Self {
        Self {
            store,
            jwt_secret,
            token_ttl,
        }
    }

    /// Registers a new account under `username`.
    ///
    /// # Returns
    ///
    /// The created `User`, or `UsernameTaken` when the store already holds
    /// an account with that username.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let password_hash = hash_password(password)?;
        let created = self
            .store
            .insert_user(username.to_owned(), password_hash)
            .await
            .map_err(|err| match err {
                StorageError::DuplicateKey => AuthError::UsernameTaken(username.to_owned()),
                other => AuthError::Storage(other),
            })?;
        Ok(User::from(created))
    }

    /// Checks the submitted credentials and issues a signed, time-bound
    /// token. An unknown username and a wrong password fail identically.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = encode_jwt(user.username, &self.jwt_secret, self.token_ttl)
            .await
            .map_err(|_| AuthError::JwtError)?;
        tracing::debug!("issued access token for user \"{}\"", username);
        Ok(token)
    }

    /// Resolves a token back to the user it was issued for. Fails when the
    /// token is malformed, expired, signed with an unrecognized key, or when
    /// its subject no longer resolves to an account.
    #[tracing::instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &str) -> Result<User, AuthError> {
        let claims = decode_jwt(token, &self.jwt_secret)
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let user = self
            .store
            .find_by_username(&claims.username)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        Ok(User::from(user))
    }
}

pub async fn encode_jwt(
    username: String,
    jwt_secret: &str,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let exp = (now + ttl).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims { exp, iat, username };
    let jwt = encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub async fn decode_jwt(token: &str, jwt_secret: &str) -> anyhow::Result<Claims> {
    let token_data = jsonwebtoken::decode(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )?;
    Ok(token_data.claims)
}
