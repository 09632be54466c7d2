//! Contact-form screening and the WhatsApp hand-off message.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bot_detector::{BotDetector, BotReason, BotVerdict, HoneypotFields};
use crate::config::SiteConfig;
use crate::rate_limiter::{FormLimit, RateLimiter};
use crate::sanitizer::{contains_malicious_content, sanitize_input_with_limit, sanitize_phone_with_limit};
use crate::validator::{Field, Validation, validate_field};

pub const NOT_PROVIDED: &str = "Not provided";

const BOT_ALERT: &str = "Please interact with the page before submitting.";
const MALICIOUS_ALERT: &str = "Invalid input detected. Please check your entries.";

/// Raw field values as captured at submit time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InquiryForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
}

impl InquiryForm {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
            Field::Message => &self.message,
        }
    }

    /// Run every field rule, even after the first failure
    pub fn validate(&self) -> FieldReport {
        FieldReport {
            results: Field::ALL.map(|field| (field, validate_field(field, self.value(field)))),
        }
    }

    pub fn sanitize(&self, config: &SiteConfig) -> SanitizedInquiry {
        SanitizedInquiry {
            name: sanitize_input_with_limit(&self.name, config.max_input_chars),
            phone: sanitize_phone_with_limit(&self.phone, config.max_phone_digits),
            email: sanitize_input_with_limit(&self.email, config.max_input_chars),
            message: sanitize_input_with_limit(&self.message, config.max_input_chars),
        }
    }
}

/// Per-field validation results, in form order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    results: [(Field, Validation); 4],
}

impl FieldReport {
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|(_, v)| v.is_valid())
    }

    pub fn results(&self) -> &[(Field, Validation)] {
        &self.results
    }

    pub fn errors(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.results
            .iter()
            .filter_map(|(field, v)| v.message().map(|m| (*field, m)))
    }
}

/// Field values after escaping; safe to embed in the outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedInquiry {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
}

impl SanitizedInquiry {
    /// Phone is digits only after sanitizing, so it is not screened
    pub fn is_malicious(&self) -> bool {
        contains_malicious_content(&self.name)
            || contains_malicious_content(&self.message)
            || contains_malicious_content(&self.email)
    }

    pub fn compose_message(&self) -> String {
        let email = if self.email.is_empty() {
            NOT_PROVIDED
        } else {
            &self.email
        };
        format!(
            "*New Inquiry from Website*\n\
             ------------------------\n\
             *Name:* {}\n\
             *Phone:* {}\n\
             *Email:* {}\n\
             *Message:* {}",
            self.name, self.phone, email, self.message
        )
    }
}

/// `https://wa.me/<recipient>?text=<encoded>`
pub fn whatsapp_url(config: &SiteConfig, message: &str) -> String {
    format!(
        "{}/{}?text={}",
        config.whatsapp_base_url.trim_end_matches('/'),
        config.whatsapp_recipient,
        urlencoding::encode(message)
    )
}

/// A submission stopped before hand-off. Every variant is recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Honeypot field filled")]
    Honeypot,

    #[error("Bot detected: {0}")]
    Bot(BotReason),

    #[error("{0}")]
    RateLimited(FormLimit),

    #[error("Form has invalid fields")]
    InvalidFields(FieldReport),

    #[error("Malicious content detected")]
    MaliciousContent,
}

impl Rejection {
    /// Blocking alert text; `None` means the rejection is silent or inline
    pub fn alert_text(&self) -> Option<String> {
        match self {
            Rejection::Honeypot | Rejection::InvalidFields(_) => None,
            Rejection::Bot(_) => Some(BOT_ALERT.to_string()),
            Rejection::RateLimited(limit) => Some(limit.to_string()),
            Rejection::MaliciousContent => Some(MALICIOUS_ALERT.to_string()),
        }
    }
}

/// Run the submit checks in order, stopping at the first failure.
///
/// Only passes the rate limiter once the honeypot and bot checks are clear,
/// so automated attempts do not use up a visitor's budget.
pub fn screen_submission(
    form: &InquiryForm,
    honeypot: &HoneypotFields,
    bot: &BotDetector,
    limiter: &mut RateLimiter,
    config: &SiteConfig,
    now: u64,
) -> Result<SanitizedInquiry, Rejection> {
    if BotDetector::check_honeypot(honeypot) {
        warn!("Bot detected via honeypot");
        return Err(Rejection::Honeypot);
    }

    if let BotVerdict::Bot(reason) = bot.is_likely_bot(now) {
        warn!("Bot detected: {}", reason);
        return Err(Rejection::Bot(reason));
    }

    limiter
        .check_form_limit(now)
        .map_err(Rejection::RateLimited)?;

    let report = form.validate();
    if !report.is_valid() {
        return Err(Rejection::InvalidFields(report));
    }

    let sanitized = form.sanitize(config);
    if sanitized.is_malicious() {
        return Err(Rejection::MaliciousContent);
    }

    Ok(sanitized)
}
