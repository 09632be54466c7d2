//! Input escaping and heuristic content screening.
//!
//! Everything here runs in the visitor's browser and can be bypassed, so these
//! helpers keep honest input tidy rather than stop a determined attacker.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Longest sanitized free-text value, in characters.
pub const MAX_INPUT_CHARS: usize = 10_000;

/// Digits kept from a phone number.
pub const MAX_PHONE_DIGITS: usize = 10;

pub const MAX_EMAIL_LEN: usize = 254;

/// Used when an image source fails the origin policy.
pub const BLOCKED_IMAGE_SRC: &str = "images/placeholder.jpg";

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?\^_`{|}~\-]+@[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .unwrap();

    /// Script, handler and protocol injection patterns
    static ref SUSPICIOUS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?is)<script\b.*?</script>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on[0-9A-Za-z_]+\s*=").unwrap(),
        Regex::new(r"(?i)data:").unwrap(),
        Regex::new(r"(?i)<iframe").unwrap(),
        Regex::new(r"(?i)<object").unwrap(),
        Regex::new(r"(?i)<embed").unwrap(),
        Regex::new(r"(?i)eval\s*\(").unwrap(),
        Regex::new(r"(?i)expression\s*\(").unwrap(),
        Regex::new(r"(?i)url\s*\(").unwrap(),
    ];

    /// SQL meta-character patterns
    static ref SQL_INJECTION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)%27|'|--|%23|#").unwrap(),
        Regex::new(r"(?i)(%3D|=)[^\n]*(%27|'|--|%3B|;)").unwrap(),
        Regex::new(r"(?i)[0-9A-Za-z_]*(%27|')(%6F|o|%4F)(%72|r|%52)").unwrap(),
        Regex::new(r"(?i)(%27|')union").unwrap(),
    ];
}

/// Which blocklist a value tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threat {
    Suspicious,
    SqlInjection,
}

/// Replace HTML/JS-significant characters with entities
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}

/// [`escape_html`] for dynamically typed host values; anything but a string
/// escapes to `""`.
pub fn escape_html_value(value: &Value) -> String {
    match value {
        Value::String(s) => escape_html(s),
        _ => String::new(),
    }
}

/// Strip NULs, escape, trim and cap the length
pub fn sanitize_input(input: &str) -> String {
    sanitize_input_with_limit(input, MAX_INPUT_CHARS)
}

pub fn sanitize_input_with_limit(input: &str, max_chars: usize) -> String {
    let without_nul: String = input.chars().filter(|&c| c != '\0').collect();
    escape_html(&without_nul)
        .trim()
        .chars()
        .take(max_chars)
        .collect()
}

pub fn sanitize_input_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize_input(s),
        _ => String::new(),
    }
}

/// Keep only ASCII digits, at most ten of them
pub fn sanitize_phone(input: &str) -> String {
    sanitize_phone_with_limit(input, MAX_PHONE_DIGITS)
}

pub fn sanitize_phone_with_limit(input: &str, max_digits: usize) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(max_digits)
        .collect()
}

/// Email is optional, so an empty value passes
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() {
        return true;
    }
    email.chars().count() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(email)
}

/// First blocklist entry matched by `input`, if any
pub fn detect_threat(input: &str) -> Option<Threat> {
    if SUSPICIOUS_PATTERNS.iter().any(|p| p.is_match(input)) {
        warn!("Suspicious pattern detected");
        return Some(Threat::Suspicious);
    }
    if SQL_INJECTION_PATTERNS.iter().any(|p| p.is_match(input)) {
        warn!("SQL injection pattern detected");
        return Some(Threat::SqlInjection);
    }
    None
}

/// Heuristic blocklist check. Expect both misses and false alarms.
pub fn contains_malicious_content(input: &str) -> bool {
    detect_threat(input).is_some()
}

/// An image `src`/`alt` pair that passed the origin policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSource {
    pub src: String,
    pub alt: String,
}

/// Apply the image origin policy.
///
/// Relative paths always pass. Absolute URLs pass when they use `https:`,
/// `data:` or `blob:` and their host contains a trusted domain. Everything else
/// is swapped for the local placeholder.
pub fn checked_image_source(src: &str, alt: &str, page_host: &str) -> ImageSource {
    let is_relative = src.starts_with('/') || src.starts_with("./") || !src.contains("://");
    if is_relative || is_trusted_remote(src, page_host) {
        return ImageSource {
            src: src.to_string(),
            alt: escape_html(alt),
        };
    }

    warn!("Blocked image from untrusted source: {}", src);
    ImageSource {
        src: BLOCKED_IMAGE_SRC.to_string(),
        alt: "Image unavailable".to_string(),
    }
}

fn is_trusted_remote(src: &str, page_host: &str) -> bool {
    let base = Url::parse(&format!("https://{}/", page_host)).ok();
    let url = match Url::options().base_url(base.as_ref()).parse(src) {
        Ok(url) => url,
        // unparseable sources are treated as relative paths
        Err(_) => return true,
    };

    match url.scheme() {
        "data" => true,
        "https" | "blob" => {
            let host = url.host_str().unwrap_or_default();
            ["localhost", page_host, "images.unsplash.com", "via.placeholder.com"]
                .iter()
                .filter(|domain| !domain.is_empty())
                .any(|domain| host.contains(&domain.to_ascii_lowercase()))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_script_tag() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(
            escape_html(r#"a&b "c" 'd' /e `f` =g"#),
            "a&amp;b &quot;c&quot; &#x27;d&#x27; &#x2F;e &#x60;f&#x60; &#x3D;g"
        );
    }

    #[test]
    fn escaping_twice_double_escapes() {
        assert_eq!(escape_html(&escape_html("<")), "&amp;lt;");
    }

    #[test]
    fn non_string_values_escape_to_empty() {
        assert_eq!(escape_html_value(&json!(42)), "");
        assert_eq!(escape_html_value(&json!(null)), "");
        assert_eq!(escape_html_value(&json!({"a": 1})), "");
        assert_eq!(escape_html_value(&json!("<b>")), "&lt;b&gt;");
        assert_eq!(sanitize_input_value(&json!(["x"])), "");
    }

    #[test]
    fn sanitize_input_strips_trims_and_caps() {
        assert_eq!(sanitize_input("  Ra\0m  "), "Ram");
        let long = "a".repeat(MAX_INPUT_CHARS + 50);
        assert_eq!(sanitize_input(&long).chars().count(), MAX_INPUT_CHARS);
        assert_eq!(sanitize_input("राम"), "राम");
    }

    #[test]
    fn sanitize_phone_keeps_ten_digits() {
        assert_eq!(sanitize_phone("+91 98765-43210"), "9198765432");
        assert_eq!(sanitize_phone("98765 43210"), "9876543210");
        assert_eq!(sanitize_phone("987-654"), "987654");
        assert_eq!(sanitize_phone("no digits"), "");
        assert_eq!(sanitize_phone("12345678901").len(), 10);
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email(""));
        assert!(is_valid_email("devotee@example.co.in"));
        assert!(is_valid_email("o'neil+murti@mail.example"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@-bad.com"));
        assert!(!is_valid_email("a b@example.com"));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&long));
    }

    #[test]
    fn flags_script_and_handler_injection() {
        assert_eq!(
            detect_threat("<SCRIPT>alert(1)</script>"),
            Some(Threat::Suspicious)
        );
        assert!(contains_malicious_content("javascript:void(0)"));
        assert!(contains_malicious_content("<img onerror =x>"));
        assert!(contains_malicious_content("EVAL (x)"));
        assert!(contains_malicious_content("background: url(x)"));
        assert!(contains_malicious_content("<iframe src"));
    }

    #[test]
    fn flags_sql_metacharacters() {
        assert_eq!(detect_threat("1 -- drop"), Some(Threat::SqlInjection));
        assert!(contains_malicious_content("admin'or 1"));
        assert!(contains_malicious_content("x';union select"));
        assert!(contains_malicious_content("price #1"));
    }

    #[test]
    fn plain_text_passes() {
        assert!(!contains_malicious_content(
            "I would like a Ganesh murti for my home temple"
        ));
        assert!(!contains_malicious_content("राधा कृष्ण मूर्ति चाहिए"));
    }

    #[test]
    fn sanitized_apostrophe_trips_the_hash_pattern() {
        // Escaping turns ' into &#x27;, and '#' is on the SQL list.
        let sanitized = sanitize_input("I'd like one");
        assert_eq!(sanitized, "I&#x27;d like one");
        assert!(contains_malicious_content(&sanitized));
    }

    #[test]
    fn image_policy() {
        let local = checked_image_source("images/products/a.jpeg", "A \"quote\"", "shop.example");
        assert_eq!(local.src, "images/products/a.jpeg");
        assert_eq!(local.alt, "A &quot;quote&quot;");

        let unsplash = checked_image_source(
            "https://images.unsplash.com/photo-1?w=600",
            "alt",
            "shop.example",
        );
        assert_eq!(unsplash.src, "https://images.unsplash.com/photo-1?w=600");

        let same_host = checked_image_source("https://shop.example/x.png", "x", "shop.example");
        assert_eq!(same_host.src, "https://shop.example/x.png");

        let plain_http = checked_image_source("http://images.unsplash.com/a", "x", "shop.example");
        assert_eq!(plain_http.src, BLOCKED_IMAGE_SRC);

        let foreign = checked_image_source("https://evil.example/a.png", "x", "shop.example");
        assert_eq!(foreign.src, BLOCKED_IMAGE_SRC);
        assert_eq!(foreign.alt, "Image unavailable");
    }

    #[test]
    fn image_policy_reads_host_like_a_browser() {
        // a backslash ends the authority, so the host is evil.example
        let backslash = checked_image_source(
            "https://evil.example\\@images.unsplash.com/a.png",
            "x",
            "shop.example",
        );
        assert_eq!(backslash.src, BLOCKED_IMAGE_SRC);

        let userinfo = checked_image_source(
            "https://images.unsplash.com@evil.example/a.png",
            "x",
            "shop.example",
        );
        assert_eq!(userinfo.src, BLOCKED_IMAGE_SRC);
    }

    #[test]
    fn data_urls_pass_whatever_their_payload() {
        let src = "data:text/plain,see https://x";
        assert_eq!(checked_image_source(src, "x", "shop.example").src, src);

        let png = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(checked_image_source(png, "x", "shop.example").src, png);
    }
}
