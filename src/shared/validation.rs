use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating phone fields on pickup requests
    /// Digits with optional leading +, spaces, parentheses and hyphens
    /// - Valid: "+55 11 98765-4321", "(11) 3456-7890", "11987654321"
    /// - Invalid: "phone", "123-abc", ""
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9(][0-9 ()\-]{6,19}$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_regex_valid() {
        assert!(PHONE_REGEX.is_match("+55 11 98765-4321"));
        assert!(PHONE_REGEX.is_match("(11) 3456-7890"));
        assert!(PHONE_REGEX.is_match("11987654321"));
        assert!(PHONE_REGEX.is_match("1234567"));
    }

    #[test]
    fn test_phone_regex_invalid() {
        assert!(!PHONE_REGEX.is_match("phone")); // letters
        assert!(!PHONE_REGEX.is_match("123-abc")); // letters
        assert!(!PHONE_REGEX.is_match("")); // empty
        assert!(!PHONE_REGEX.is_match("123")); // too short
    }
}
