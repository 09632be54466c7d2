use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable limits and endpoints for the storefront.
///
/// Every field has a default matching the production site, so a config
/// document only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Sliding window for general requests (card renders)
    pub rate_limit_window_ms: u64,

    /// Ceiling of general requests inside one window
    pub max_requests_per_window: usize,

    /// Ceiling of accepted form submissions inside the form window
    pub max_form_submissions: usize,

    /// Form window length as a multiple of `rate_limit_window_ms`
    pub form_window_multiplier: u64,

    /// Minimum gap between two accepted form submissions
    pub form_cooldown_ms: u64,

    /// Submissions faster than this after page load look automated
    pub min_time_on_page_ms: u64,

    /// Generic interactions needed when no mouse or key activity was seen
    pub min_interactions: u32,

    pub whatsapp_base_url: String,
    pub whatsapp_recipient: String,

    /// Delay before the form is reset after a hand-off
    pub reset_delay_ms: u64,

    pub max_input_chars: usize,
    pub max_phone_digits: usize,

    /// Scroll offset at which the header gets its raised shadow
    pub header_shadow_threshold: f64,

    /// Offset added to the scroll position when picking the active section
    pub nav_scroll_offset: f64,

    /// Last-resort image when a local asset fails to load
    pub generic_placeholder: String,

    /// Host the page is served from, trusted as an image origin
    pub page_host: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            rate_limit_window_ms: 60_000,
            max_requests_per_window: 30,
            max_form_submissions: 3,
            form_window_multiplier: 5,
            form_cooldown_ms: 60_000,
            min_time_on_page_ms: 3_000,
            min_interactions: 2,
            whatsapp_base_url: "https://wa.me".to_string(),
            whatsapp_recipient: "919321045468".to_string(),
            reset_delay_ms: 1_000,
            max_input_chars: 10_000,
            max_phone_digits: 10,
            header_shadow_threshold: 50.0,
            nav_scroll_offset: 100.0,
            generic_placeholder:
                "https://via.placeholder.com/400x300/1a5f4a/ffffff?text=Riddhi+Siddhi+Art"
                    .to_string(),
            page_host: "localhost".to_string(),
        }
    }
}

impl SiteConfig {
    /// Parse a JSON config document and check it
    ///
    /// # Errors
    /// * `ConfigError::Malformed` if the document is not valid JSON for this shape
    /// * `ConfigError::Invalid` if a window, ceiling or endpoint is empty
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Length of the secondary form-submission window
    pub fn form_window_ms(&self) -> u64 {
        self.rate_limit_window_ms
            .saturating_mul(self.form_window_multiplier)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_window_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit_window_ms",
                reason: "must be greater than zero",
            });
        }
        if self.max_requests_per_window == 0 {
            return Err(ConfigError::Invalid {
                field: "max_requests_per_window",
                reason: "must be greater than zero",
            });
        }
        if self.max_form_submissions == 0 {
            return Err(ConfigError::Invalid {
                field: "max_form_submissions",
                reason: "must be greater than zero",
            });
        }
        if self.form_window_multiplier == 0 {
            return Err(ConfigError::Invalid {
                field: "form_window_multiplier",
                reason: "must be greater than zero",
            });
        }
        if self.whatsapp_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "whatsapp_base_url",
                reason: "must not be empty",
            });
        }
        if self.whatsapp_recipient.is_empty()
            || !self.whatsapp_recipient.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::Invalid {
                field: "whatsapp_recipient",
                reason: "must be a non-empty digit string",
            });
        }
        Ok(())
    }
}
