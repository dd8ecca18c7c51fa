//! Input validation for contact fields, so malformed leads are rejected
//! before they reach the backend.

use regex::Regex;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9+]{6,20}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Keep digits and a leading `+`; reject what is left when it cannot be a
/// phone number.
pub fn sanitize_phone(phone: &str) -> Option<String> {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if PHONE_RE.is_match(&digits) {
        Some(digits)
    } else {
        None
    }
}

pub fn ensure_max_len(value: &str, max: usize) -> bool {
    value.len() <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_validate() {
        assert!(is_valid_email("ana@inmo.es"));
        assert!(!is_valid_email("ana@inmo"));
        assert!(!is_valid_email("not-an-email"));
    }

    #[test]
    fn phones_are_sanitized_or_rejected() {
        assert_eq!(
            sanitize_phone("+34 600 11 22 33").as_deref(),
            Some("+34600112233")
        );
        assert_eq!(sanitize_phone("call me"), None);
    }
}
