use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sanitizer::is_valid_email;

lazy_static! {
    // Latin letters, whitespace and the Devanagari block
    static ref NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z\s\x{0900}-\x{097F}]+$").unwrap();
    // Indian mobile numbering
    static ref PHONE_REGEX: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
}

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 1000;

/// Inquiry form inputs, keyed the way the markup names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Phone,
    Email,
    Message,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Phone, Field::Email, Field::Message];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(&'static str),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// Inline error text, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(message) => Some(*message),
        }
    }
}

pub fn validate_name(name: &str) -> Validation {
    let len = name.chars().count();
    if len < NAME_MIN_CHARS {
        return Validation::Invalid("Name must be at least 2 characters");
    }
    if len > NAME_MAX_CHARS {
        return Validation::Invalid("Name is too long");
    }
    if !NAME_REGEX.is_match(name) {
        return Validation::Invalid("Name contains invalid characters");
    }
    Validation::Valid
}

pub fn validate_phone(phone: &str) -> Validation {
    if phone.is_empty() {
        return Validation::Invalid("Phone number is required");
    }
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if !PHONE_REGEX.is_match(&digits) {
        return Validation::Invalid("Enter valid 10-digit mobile number");
    }
    Validation::Valid
}

pub fn validate_email(email: &str) -> Validation {
    if is_valid_email(email) {
        Validation::Valid
    } else {
        Validation::Invalid("Enter a valid email address")
    }
}

pub fn validate_message(message: &str) -> Validation {
    let len = message.chars().count();
    if len < MESSAGE_MIN_CHARS {
        return Validation::Invalid("Message must be at least 10 characters");
    }
    if len > MESSAGE_MAX_CHARS {
        return Validation::Invalid("Message is too long (max 1000 characters)");
    }
    Validation::Valid
}

pub fn validate_field(field: Field, value: &str) -> Validation {
    match field {
        Field::Name => validate_name(value),
        Field::Phone => validate_phone(value),
        Field::Email => validate_email(value),
        Field::Message => validate_message(value),
    }
}
