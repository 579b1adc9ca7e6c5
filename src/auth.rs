//! Mock authentication.
//!
//! Any known email with a non-empty password logs in. The token is an opaque
//! base64 blob, not a signed credential.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::user::User;

/// Persisted login state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

impl AuthState {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn logged_in(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
        }
    }

    /// The authenticated user, if the state is consistent
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref().filter(|_| self.is_authenticated)
    }

    /// Like [`AuthState::current_user`] but fails with `NotAuthenticated`
    pub fn require_user(&self) -> Result<&User> {
        self.current_user().ok_or(Error::NotAuthenticated)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenClaims<'a> {
    user_id: &'a str,
    email: &'a str,
}

/// Check credentials against the user directory.
pub fn authenticate(users: &[User], email: &str, password: &str) -> Result<User> {
    let email = email.trim();
    let user = users
        .iter()
        .find(|user| user.email.eq_ignore_ascii_case(email))
        .filter(|_| !password.is_empty());

    match user {
        Some(user) => Ok(user.clone()),
        None => {
            tracing::debug!(email, "authentication rejected");
            Err(Error::AuthenticationFailed(email.to_string()))
        }
    }
}

/// Encode the mock session token for `user`.
pub fn generate_token(user: &User) -> Result<String> {
    let claims = serde_json::to_vec(&TokenClaims {
        user_id: &user.id,
        email: &user.email,
    })?;
    Ok(STANDARD.encode(claims))
}

/// Authenticate and build the resulting logged-in state.
pub fn login(users: &[User], email: &str, password: &str) -> Result<AuthState> {
    let user = authenticate(users, email, password)?;
    let token = generate_token(&user)?;
    tracing::info!(user = %user.id, "logged in");
    Ok(AuthState::logged_in(user, token))
}
