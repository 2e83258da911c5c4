use std::sync::OnceLock;

use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 5;
pub const MAX_PASSWORD_LEN: usize = 12;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_email(email: &str) -> bool {
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
    });
    re.is_match(email)
}

/// Generic international phone grammar: optional leading +, then digits with
/// common separators, 7 to 17 characters of number body.
pub fn is_valid_phone(phone: &str) -> bool {
    let re = PHONE_RE.get_or_init(|| {
        Regex::new(r"^\+?[0-9(][0-9 ().\-]{5,16}[0-9]$").unwrap()
    });
    re.is_match(phone)
}

pub fn is_valid_password(password: &str) -> bool {
    (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        let cases = [
            ("dilaragorum@gmail.com", true),
            ("user.name+tag@example.co", true),
            ("dilaragorum", false),
            ("missing@tld", false),
            ("@example.com", false),
            ("", false),
        ];
        for (email, expected) in cases {
            assert_eq!(is_valid_email(email), expected, "email: {:?}", email);
        }
    }

    #[test]
    fn test_phone_validation() {
        let cases = [
            ("+905551234567", true),
            ("0555 123 45 67", true),
            ("(212) 555-0199", true),
            ("12345", false),
            ("phone", false),
            ("", false),
        ];
        for (phone, expected) in cases {
            assert_eq!(is_valid_phone(phone), expected, "phone: {:?}", phone);
        }
    }

    #[test]
    fn test_password_length() {
        assert!(!is_valid_password("1234"));
        assert!(is_valid_password("12345"));
        assert!(is_valid_password("123456789012"));
        assert!(!is_valid_password("1234567890123"));
    }
}
