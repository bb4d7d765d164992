//! Field-scoped validation helpers.
//!
//! Services collect every problem with an input into [`FieldErrors`] and
//! fail once with [`AppError::Validation`], so all messages can be shown next
//! to their fields at the same time.

use std::borrow::Cow;
use std::sync::LazyLock;

use ratemymodule_common::config::RegistrationConfig;
use ratemymodule_common::{domain_name, split_email, AppError, AppResult};
use regex::Regex;
use unicode_security::{skeleton, MixedScript};
use validator::{Validate, ValidationError, ValidationErrors};

/// Maximum length of an email address.
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Maximum length of a domain name.
pub const MAX_DOMAIN_LENGTH: usize = 253;

/// WHATWG HTML5 `input[type=email]` rule, widened to Unicode letters and
/// digits so internationalised addresses reach the look-alike check.
static HTML5_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[\p{L}\p{N}.!#$%&'*+/=?^_`{|}~-]+@",
        r"[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?",
        r"(?:\.[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?)*$",
    ))
    .expect("valid email pattern")
});

/// Dot-separated host labels, at least two of them.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
        r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    ))
    .expect("valid domain pattern")
});

/// Temporary and free mail providers that cannot be used to register.
pub const FREE_EMAIL_DOMAINS: &[&str] = &[
    "decabg.eu",
    "gufum.com",
    "ema-sofia.eu",
    "dropsin.net",
    "finews.biz",
    "triots.com",
    "rungel.net",
    "jollyfree.com",
    "gotgel.org",
    "prolug.com",
    "tmail1.com",
    "tmail.com",
    "tempmail.com",
    "tmail2.com",
    "tmail3.com",
    "tmail4.com",
    "tmail5.com",
    "tmail6.com",
    "tmail7.com",
    "tmail8.com",
    "tmail9.com",
    "lyricspad.net",
    "lyft.live",
    "dewareff.com",
    "kaftee.com",
    "letpays.com",
];

/// Accumulates field errors for one input.
#[derive(Debug)]
pub struct FieldErrors {
    errors: ValidationErrors,
}

impl Default for FieldErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldErrors {
    /// Start with no errors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            errors: ValidationErrors::new(),
        }
    }

    /// Start from the declarative rules of `input`.
    #[must_use]
    pub fn from_validate<T: Validate>(input: &T) -> Self {
        Self {
            errors: input.validate().err().unwrap_or_else(ValidationErrors::new),
        }
    }

    /// Record an error against `field`.
    pub fn add(
        &mut self,
        field: &'static str,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) {
        self.errors
            .add(field, ValidationError::new(code).with_message(message.into()));
    }

    /// Whether `field` already has an error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.field_errors().contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` if nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Whether `value` is an address the HTML5 email input would accept.
#[must_use]
pub fn is_html5_email(value: &str) -> bool {
    HTML5_EMAIL_RE.is_match(value)
}

/// Whether `value` is a syntactically valid domain name.
#[must_use]
pub fn is_valid_domain(value: &str) -> bool {
    value.len() <= MAX_DOMAIN_LENGTH && DOMAIN_RE.is_match(value)
}

/// Whether `domain` belongs to a free or temporary mail provider.
#[must_use]
pub fn is_free_email_domain(domain: &str, extra: &[String]) -> bool {
    let domain = domain.to_lowercase();
    FREE_EMAIL_DOMAINS.contains(&domain.as_str())
        || extra.iter().any(|d| d.eq_ignore_ascii_case(&domain))
}

/// Whether the label in front of the public suffix of `domain` is an
/// example label.
///
/// `mail.example.co.uk` and `test.com` match with the default labels,
/// `test.bham.ac.uk` does not.
#[must_use]
pub fn is_example_domain(domain: &str, labels: &[String]) -> bool {
    let name = domain_name(domain);
    labels.iter().any(|l| l.eq_ignore_ascii_case(&name))
}

/// Whether `value` mixes scripts and contains a character confusable with
/// one from another script.
#[must_use]
pub fn is_confusable(value: &str) -> bool {
    !value.is_single_script() && skeleton(value).ne(value.chars())
}

/// Check an email address on its own, recording every problem under `email`.
///
/// The duplicate-address rule needs the database and is checked by the
/// user service.
pub fn check_email(value: &str, rules: &RegistrationConfig, errors: &mut FieldErrors) {
    if value.is_empty() {
        errors.add("email", "required", "Email Address is a required field.");
        return;
    }
    if value.chars().count() > MAX_EMAIL_LENGTH {
        errors.add(
            "email",
            "max_length",
            "The Email Address must be at most 255 digits.",
        );
    }
    if !is_html5_email(value) {
        errors.add("email", "invalid", "Enter a valid email address.");
    }

    let Some((local, domain)) = split_email(value) else {
        return;
    };

    if is_free_email_domain(domain, &rules.extra_free_email_domains) {
        errors.add(
            "email",
            "invalid",
            "Registration using free email addresses is prohibited. \
             Please supply a different email address.",
        );
    }
    if is_confusable(local) || is_confusable(domain) {
        errors.add(
            "email",
            "invalid",
            "This email address cannot be registered. \
             Please supply a different email address.",
        );
    }
    if is_example_domain(domain, &rules.example_email_domains) {
        errors.add(
            "email",
            "invalid",
            "Registration using unresolvable example email addresses is prohibited. \
             Please supply a different email address.",
        );
    }
}
