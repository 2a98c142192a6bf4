//! Supabase Auth (GoTrue) client for the storefront
//!
//! Covers what the storefront needs from the identity provider: account
//! sign-up, password sign-in, sign-out, the current user, and the session
//! that later requests are authorized with.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing session")]
    MissingSession,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Sign-up form rejected before anything was sent
    #[error("Invalid credentials: {0}")]
    Validation(String),
}

/// User as returned by `/auth/v1/user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: User,
}

/// Claims carried by a Supabase access token
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Read the claims of an access token without checking its signature.
///
/// The token came from our own session store; the backend verifies it on
/// every request, so this is only used to learn who is signed in.
pub fn decode_access_token(token: &str) -> Result<AccessTokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

const EMAIL_MAX: usize = 255;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 100;
const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Check a sign-up form. Email and name are compared after trimming;
/// lengths count characters.
pub fn validate_sign_up(email: &str, password: &str, name: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if !looks_like_email(email) {
        return Err(AuthError::Validation("invalid email".to_string()));
    }
    if email.chars().count() > EMAIL_MAX {
        return Err(AuthError::Validation("email is too long".to_string()));
    }

    let password_len = password.chars().count();
    if password_len < PASSWORD_MIN {
        return Err(AuthError::Validation(format!(
            "password must have at least {} characters",
            PASSWORD_MIN
        )));
    }
    if password_len > PASSWORD_MAX {
        return Err(AuthError::Validation(format!(
            "password cannot have more than {} characters",
            PASSWORD_MAX
        )));
    }

    let name_len = name.trim().chars().count();
    if name_len < NAME_MIN {
        return Err(AuthError::Validation(format!(
            "name must have at least {} characters",
            NAME_MIN
        )));
    }
    if name_len > NAME_MAX {
        return Err(AuthError::Validation("name is too long".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Keep the session returned by sign-in for later calls
    pub persist_session: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
}

impl AuthClient {
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Create an account. The display name goes into the user metadata as
    /// `nome`, where the profile trigger picks it up.
    ///
    /// Returns `None` when the project requires email confirmation and no
    /// session was issued yet.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Option<Session>, AuthError> {
        validate_sign_up(email, password, name)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "data": { "nome": name.trim() },
        });

        let response = self
            .http_client
            .post(self.endpoint("/signup"))
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let body: serde_json::Value = ensure_success(response).await?.json().await?;
        if body.get("access_token").is_none() {
            debug!("signed up, waiting for email confirmation");
            return Ok(None);
        }

        let session: Session = serde_json::from_value(body)?;
        debug!(user_id = %session.user.id, "signed up");

        if self.options.persist_session {
            self.set_session(session.clone());
        }

        Ok(Some(session))
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(self.endpoint("/token?grant_type=password"))
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let session: Session = ensure_success(response).await?.json().await?;
        debug!(user_id = %session.user.id, "signed in");

        if self.options.persist_session {
            self.set_session(session.clone());
        }

        Ok(session)
    }

    /// Sign out. The local session is dropped even when the server call
    /// fails, so the storefront never keeps showing a signed-in user.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;
        self.clear_session();

        let response = self
            .http_client
            .post(self.endpoint("/logout"))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    /// Fetch the signed-in user from the server
    pub async fn get_user(&self) -> Result<User, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let response = self
            .http_client
            .get(self.endpoint("/user"))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        let user: User = ensure_success(response).await?.json().await?;
        Ok(user)
    }

    pub fn get_session(&self) -> Option<Session> {
        match self.current_session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_session(&self, session: Session) {
        let mut guard = self
            .current_session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(session);
    }

    pub fn clear_session(&self) {
        let mut guard = self
            .current_session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }

    /// Access token of the current session, if any
    pub fn access_token(&self) -> Option<String> {
        self.get_session().map(|s| s.access_token)
    }

    /// Id of the signed-in user, taken from the token's `sub` claim
    pub fn current_user_id(&self) -> Option<String> {
        let session = self.get_session()?;
        match decode_access_token(&session.access_token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                warn!("could not decode access token, using session user: {}", e);
                Some(session.user.id)
            }
        }
    }
}

async fn ensure_success(response: Response) -> Result<Response, AuthError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await?;
    Err(AuthError::ApiError(format!("{}: {}", status, error_text)))
}
