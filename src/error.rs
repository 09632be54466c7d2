use thiserror::Error;

/// Errors raised while loading a [`SiteConfig`](crate::config::SiteConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors raised while parsing a product table.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Malformed product table: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors raised while issuing a pseudo-CSRF token.
#[derive(Error, Debug)]
pub enum CsrfError {
    #[error("Entropy source unavailable: {0}")]
    Entropy(#[from] getrandom::Error),
}
