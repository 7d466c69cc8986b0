use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::domain::{NewEntry, Registration};

static EMAIL_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)+$",
    )
    .expect("valid email regex")
});

/// Registration rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("Use your @{domain} email")]
    ForbiddenDomain { domain: String },
}

/// Normalizes registration forms and enforces the institutional email rule.
#[derive(Debug, Clone)]
pub(crate) struct RegistrationPolicy {
    domain: String,
    suffix: String,
}

impl RegistrationPolicy {
    /// `domain` is expected lower-case without the `@`, as produced by `ContestConfig`.
    pub(crate) fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            suffix: format!("@{domain}"),
        }
    }

    pub(crate) fn domain(&self) -> &str {
        &self.domain
    }

    pub(crate) fn admit(
        &self,
        registration: Registration,
        created_at: DateTime<Utc>,
    ) -> Result<NewEntry, PolicyViolation> {
        let email = normalize_email(&registration.email);

        if !EMAIL_SHAPE_RE.is_match(&email) {
            return Err(PolicyViolation::InvalidEmail(registration.email));
        }
        if !email.ends_with(&self.suffix) {
            return Err(PolicyViolation::ForbiddenDomain {
                domain: self.domain.clone(),
            });
        }

        let username = registration
            .username
            .map(|username| username.trim().to_string())
            .filter(|username| !username.is_empty());

        Ok(NewEntry {
            name: registration.name.trim().to_string(),
            email,
            username,
            created_at,
        })
    }
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
