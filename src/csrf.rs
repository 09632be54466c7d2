//! Session-scoped pseudo-CSRF token.
//!
//! No server ever checks this token. It only reserves the hidden form field and
//! session key for a future backend and gives no forgery protection today.

use std::collections::HashMap;

use crate::error::CsrfError;

/// Session storage key holding the current token.
pub const TOKEN_KEY: &str = "csrf_token";

const TOKEN_BYTES: usize = 32;

/// Per-tab key/value storage (`window.sessionStorage` in a browser)
pub trait SessionStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
}

/// In-process stand-in for session storage
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    items: HashMap<String, String>,
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }
}

/// 32 random bytes, lowercase hex
pub fn generate_token() -> Result<String, CsrfError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Issues tokens into a [`SessionStore`] and compares candidates against it
#[derive(Debug)]
pub struct CsrfGuard<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> CsrfGuard<S> {
    pub fn new(store: S) -> Self {
        CsrfGuard { store }
    }

    /// Generate and store a fresh token, returning it for the hidden field
    pub fn rotate(&mut self) -> Result<String, CsrfError> {
        let token = generate_token()?;
        self.store.set_item(TOKEN_KEY, &token);
        Ok(token)
    }

    pub fn current(&self) -> Option<String> {
        self.store.get_item(TOKEN_KEY)
    }

    pub fn validate_token(&self, candidate: &str) -> bool {
        match self.current() {
            Some(stored) => !candidate.is_empty() && !stored.is_empty() && candidate == stored,
            None => false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
