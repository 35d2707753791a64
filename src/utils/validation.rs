use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    re.is_match(email)
}

pub fn validate_rating_value(value: i32) -> bool {
    (1..=5).contains(&value)
}

/// Titles and offering descriptions must carry at least one visible character.
pub fn validate_nonempty(text: &str) -> bool {
    !text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(validate_email("worker@example.com"));
        assert!(validate_email("a.b+tag@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
        assert!(!validate_email("@nouser.com"));
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating_value(1));
        assert!(validate_rating_value(5));
        assert!(!validate_rating_value(0));
        assert!(!validate_rating_value(6));
    }

    #[test]
    fn nonempty_rejects_whitespace() {
        assert!(validate_nonempty("Fix my fence"));
        assert!(!validate_nonempty("   "));
        assert!(!validate_nonempty(""));
    }
}
