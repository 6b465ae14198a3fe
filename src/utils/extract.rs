//! Pulls email-like tokens out of raw page text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Unanchored address grammar: `local@domain.tld`.
pub(crate) const ADDRESS_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(ADDRESS_PATTERN).expect("address pattern is a valid regex"));

/// Returns every candidate address in `text`, in order of appearance.
///
/// Duplicates are kept; the harvester deduplicates across pages.
pub fn extract_emails(text: &str) -> Vec<String> {
    let found: Vec<String> = ADDRESS_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    tracing::trace!("Extracted {} candidate tokens from {} bytes of text", found.len(), text.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_well_formed_and_skips_malformed() {
        let found = extract_emails("contact: a@b.com and junk@@nodomain");
        assert_eq!(found, vec!["a@b.com".to_string()]);
    }

    #[test]
    fn test_keeps_order_and_duplicates() {
        let text = "<a href=\"mailto:hr@acme.io\">hr@acme.io</a> or jobs+dev@acme.co.uk";
        assert_eq!(
            extract_emails(text),
            vec!["hr@acme.io", "hr@acme.io", "jobs+dev@acme.co.uk"]
        );
    }

    #[test]
    fn test_asset_filenames_are_still_extracted() {
        // Filtering those is the validator's job.
        let found = extract_emails(r#"<img src="logo@2x.png">"#);
        assert_eq!(found, vec!["logo@2x.png"]);
    }

    #[test]
    fn test_empty_and_plain_text() {
        assert!(extract_emails("").is_empty());
        assert!(extract_emails("no addresses here, just @ signs and dots.").is_empty());
        assert!(extract_emails("user@host.c").is_empty());
    }
}
