use tracing::debug;
use url::Url;

/// Resolve an `href` found on a front page into an absolute article URL.
///
/// Returns `None` for empty hrefs, in-page anchors, non-http(s) schemes,
/// hosts outside `allowed_hosts`, and bare site roots. Query string and
/// fragment are dropped so the same story always maps to the same key.
pub fn resolve_url(base_url: &str, allowed_hosts: &[&str], href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let mut resolved = match base.join(href) {
        Ok(url) => url,
        Err(e) => {
            debug!(href, error = %e, "Rejected unparseable href");
            return None;
        }
    };

    if !matches!(resolved.scheme(), "http" | "https") {
        debug!(href, scheme = resolved.scheme(), "Rejected non-http href");
        return None;
    }

    let host = resolved.host_str()?;
    if !allowed_hosts.iter().any(|allowed| *allowed == host) {
        debug!(href, host, "Rejected external href");
        return None;
    }

    if resolved.path().is_empty() || resolved.path() == "/" {
        return None;
    }

    resolved.set_query(None);
    resolved.set_fragment(None);
    Some(resolved.into())
}
