use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_email(email: &str) -> Result<(), Error> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(Error::Validation {
            field: "email",
            rule: "must be a valid email address",
        })
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), Error> {
    let len = name.chars().count();
    if len < 2 {
        return Err(Error::Validation {
            field: "name",
            rule: "must be at least 2 characters long",
        });
    }
    if len > 100 {
        return Err(Error::Validation {
            field: "name",
            rule: "must not exceed 100 characters",
        });
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), Error> {
    if password.chars().count() < 8 {
        return Err(Error::Validation {
            field: "password",
            rule: "must be at least 8 characters long",
        });
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(Error::Validation {
            field: "password",
            rule: "must contain both letters and numbers",
        });
    }
    Ok(())
}

/// Optional field; absence is always valid.
pub(crate) fn validate_phone(phone: Option<&str>) -> Result<(), Error> {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(
            r"^(\+7|8)?[\s\-]?\(?[489][0-9]{2}\)?[\s\-]?[0-9]{3}[\s\-]?[0-9]{2}[\s\-]?[0-9]{2}$"
        )
        .unwrap();
    }
    match phone {
        Some(p) if !PHONE_RE.is_match(p) => Err(Error::Validation {
            field: "phone",
            rule: "invalid phone number format",
        }),
        _ => Ok(()),
    }
}

/// The two copies of a new password must be byte-identical.
pub(crate) fn validate_password_repeat(password: &str, repeat: &str) -> Result<(), Error> {
    if password != repeat {
        return Err(Error::PasswordMismatch);
    }
    Ok(())
}
