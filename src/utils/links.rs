//! Utility functions for turning search-result anchors into fetchable URLs.

use url::Url;

/// Resolves an `href` found on a search results page into an absolute http(s) URL.
///
/// Handles common variations:
/// - Absolute `http://` / `https://` links are used as-is.
/// - Redirect wrappers of the form `/url?q=<target>&...` are unwrapped.
/// - Relative links without a redirect target, `javascript:`, `mailto:` and
///   fragment-only links are dropped.
///
/// The fragment is stripped so the same page reached through two anchors
/// dedups to one URL.
pub(crate) fn normalize_link(href: &str, base: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let resolved = match base.join(trimmed) {
        Ok(u) => u,
        Err(e) => {
            tracing::trace!("Ignoring unparsable link '{}': {}", trimmed, e);
            return None;
        }
    };

    let target = if resolved.path() == "/url" {
        let inner = resolved
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?;
        Url::parse(&inner).ok()?
    } else if !trimmed.contains("http") {
        // The results page links to itself through relative paths; those are not results.
        return None;
    } else {
        resolved
    };

    if !matches!(target.scheme(), "http" | "https") || target.host_str().is_none() {
        return None;
    }

    let mut target = target;
    target.set_fragment(None);
    Some(target)
}

/// True when `url` points at the same host as `base` (ignoring a `www.` prefix).
pub(crate) fn same_site(url: &Url, base: &Url) -> bool {
    fn bare(host: Option<&str>) -> Option<String> {
        host.map(|h| h.strip_prefix("www.").unwrap_or(h).to_lowercase())
    }
    match (bare(url.host_str()), bare(base.host_str())) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
