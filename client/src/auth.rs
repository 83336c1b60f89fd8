//! Credential state for a server session
//!
//! A session authenticates with exactly one credential at a time. It starts
//! with a password unless a token was supplied, and switches to token auth
//! once a token has been negotiated. There is no way back: the password is
//! dropped on the switch.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::headers;

#[derive(Clone, PartialEq, Eq)]
pub enum AuthCredential {
    Token(String),
    Password { username: String, password: String },
}

impl AuthCredential {
    pub fn token(token: impl Into<String>) -> Self {
        AuthCredential::Token(token.into())
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthCredential::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self, AuthCredential::Token(_))
    }

    /// Replace the active credential with a freshly negotiated token
    pub fn switch_to_token(&mut self, token: impl Into<String>) {
        *self = AuthCredential::Token(token.into());
    }

    /// The single authentication header for this credential
    pub fn header(&self) -> (&'static str, String) {
        match self {
            AuthCredential::Token(token) => (headers::AUTH_TOKEN, token.clone()),
            AuthCredential::Password { username, password } => {
                let encoded = STANDARD.encode(format!("{}:{}", username, password));
                (headers::AUTHORIZATION, format!("Basic {}", encoded))
            }
        }
    }
}

// Secrets never end up in logs
impl std::fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthCredential::Token(_) => f.write_str("Token(***)"),
            AuthCredential::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}
