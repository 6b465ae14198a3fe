//! Decides whether an extracted token is a mailbox worth contacting.

use super::extract::ADDRESS_PATTERN;
use once_cell::sync::Lazy;
use regex::Regex;

static STRICT_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}$", ADDRESS_PATTERN)).expect("anchored address pattern is valid")
});

/// Always rejected, whatever the configured suffix list says.
const MANDATORY_SUFFIX: &str = ".png";

/// True when the entire string matches the address grammar.
pub fn is_valid_email(candidate: &str) -> bool {
    STRICT_ADDRESS_RE.is_match(candidate)
}

/// True when the lowercased address ends with an asset-file suffix.
pub fn has_excluded_suffix<S: AsRef<str>>(candidate: &str, suffixes: &[S]) -> bool {
    let lower = candidate.to_lowercase();
    lower.ends_with(MANDATORY_SUFFIX)
        || suffixes
            .iter()
            .any(|s| !s.as_ref().is_empty() && lower.ends_with(&s.as_ref().to_lowercase()))
}

/// Accepts a candidate only if it passes both the strict grammar and the suffix exclusion.
pub fn accept_address<S: AsRef<str>>(candidate: &str, suffixes: &[S]) -> bool {
    is_valid_email(candidate) && !has_excluded_suffix(candidate, suffixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_EXCLUDED_SUFFIXES;

    #[test]
    fn test_strict_match_is_anchored() {
        assert!(is_valid_email("a.b@example.com"));
        assert!(is_valid_email("first_last%tag+x-y@sub.example-co.org"));
        assert!(!is_valid_email(" a.b@example.com"));
        assert!(!is_valid_email("mailto:a.b@example.com"));
        assert!(!is_valid_email("a@b.com and more"));
        assert!(!is_valid_email("junk@@nodomain"));
        assert!(!is_valid_email("user@host.c"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_png_rejected_case_insensitively() {
        let none: [&str; 0] = [];
        assert!(!accept_address("foo@2x.png", &none));
        assert!(!accept_address("FOO@2X.PNG", &none));
        assert!(has_excluded_suffix("foo.png", &none));
        assert!(has_excluded_suffix("FOO.PNG", &none));
        assert!(accept_address("a.b@example.com", &none));
    }

    #[test]
    fn test_configured_suffixes() {
        assert!(!accept_address("icon@site.svg", DEFAULT_EXCLUDED_SUFFIXES));
        assert!(!accept_address("banner@hero.JPEG", DEFAULT_EXCLUDED_SUFFIXES));
        assert!(accept_address("hr@company.com", DEFAULT_EXCLUDED_SUFFIXES));
        assert!(accept_address("icon@site.svg", &[".gif"]));
    }
}
