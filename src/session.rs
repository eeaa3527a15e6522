//! Explicit seller session.
//!
//! Holds the login id and the token pair that every authenticated request
//! carries. A session is created by the caller (usually from the keyring via
//! [`crate::storage::load_session`]) and handed to the API client, which
//! swaps the access token in place after a refresh.

use std::sync::RwLock;
use zeroize::Zeroize;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const REFRESH_TOKEN_HEADER: &str = "REFRESH_TOKEN";
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

#[derive(Clone, Default)]
struct Tokens {
    token_type: String,
    access_token: String,
    refresh_token: String,
}

impl Zeroize for Tokens {
    fn zeroize(&mut self) {
        self.token_type.zeroize();
        self.access_token.zeroize();
        self.refresh_token.zeroize();
    }
}

pub struct Session {
    login_id: String,
    tokens: RwLock<Tokens>,
}

impl Session {
    pub fn new(
        login_id: impl Into<String>,
        token_type: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        let mut token_type = token_type.into().trim().to_string();
        if token_type.is_empty() {
            token_type = DEFAULT_TOKEN_TYPE.to_string();
        }
        Self {
            login_id: login_id.into(),
            tokens: RwLock::new(Tokens {
                token_type,
                access_token: access_token.into(),
                refresh_token: refresh_token.into(),
            }),
        }
    }

    /// Session with no tokens, for the unauthenticated sign-up and password
    /// reset calls.
    pub fn anonymous() -> Self {
        Self {
            login_id: String::new(),
            tokens: RwLock::new(Tokens::default()),
        }
    }

    pub fn login_id(&self) -> &str {
        &self.login_id
    }

    pub fn is_logged_in(&self) -> bool {
        self.tokens
            .read()
            .map(|t| !t.access_token.trim().is_empty())
            .unwrap_or(false)
    }

    /// `(Authorization, REFRESH_TOKEN)` header values.
    pub fn auth_headers(&self) -> Option<(String, String)> {
        let tokens = self.tokens.read().ok()?;
        if tokens.access_token.trim().is_empty() {
            return None;
        }
        Some((
            format!("{} {}", tokens.token_type, tokens.access_token),
            tokens.refresh_token.clone(),
        ))
    }

    pub fn token_type(&self) -> String {
        self.tokens
            .read()
            .map(|t| t.token_type.clone())
            .unwrap_or_default()
    }

    pub fn access_token(&self) -> String {
        self.tokens
            .read()
            .map(|t| t.access_token.clone())
            .unwrap_or_default()
    }

    pub fn refresh_token(&self) -> String {
        self.tokens
            .read()
            .map(|t| t.refresh_token.clone())
            .unwrap_or_default()
    }

    pub fn set_access_token(&self, access_token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.access_token.zeroize();
            tokens.access_token = access_token.trim().to_string();
        }
    }

    /// Wipe every token. The login id is kept for log context.
    pub fn clear(&self) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.zeroize();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(tokens) = self.tokens.get_mut() {
            tokens.zeroize();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("login_id", &self.login_id)
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}
