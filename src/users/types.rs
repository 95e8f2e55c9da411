use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

pub const MAX_NAME_LENGTH: usize = 100;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

static EMAIL_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store; 0 until saved.
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, email: &str, now: DateTime<Utc>) -> Result<Self, ApiError> {
        let name = normalize_name(name);
        let email = normalize_email(email);

        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(ApiError::invalid_parameter("invalid name"));
        }
        if !is_valid_email(&email) {
            return Err(ApiError::invalid_parameter("invalid email format"));
        }

        Ok(Self {
            id: 0,
            name,
            email,
            created_at: now,
        })
    }
}

/// Trims and collapses internal whitespace runs to a single space.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    match EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN)) {
        Ok(regex) => regex.is_match(email),
        Err(_) => false,
    }
}

/// One page of users plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}
