//! Backend base URL resolution.

use log::warn;
use reqwest::Url;

/// Same-origin path used when no usable override is configured.
pub const DEFAULT_API_BASE_URL: &str = "/api/v1";

/// Hosts an absolute override may point at.
pub const ALLOWED_BACKEND_HOSTS: &[&str] =
    &["personal-wallet-backend.vercel.app", "localhost", "127.0.0.1"];

/// Resolves the configured base URL override.
///
/// Relative overrides are trusted as-is (minus a trailing slash). Absolute
/// overrides are accepted only for an allow-listed host; anything else falls
/// back to [`DEFAULT_API_BASE_URL`].
pub fn resolve_base_url(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return DEFAULT_API_BASE_URL.to_string(),
    };

    if raw.starts_with('/') {
        let trimmed = raw.strip_suffix('/').unwrap_or(raw);
        if trimmed.is_empty() {
            return DEFAULT_API_BASE_URL.to_string();
        }
        return trimmed.to_string();
    }

    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            warn!(
                "Invalid API base URL {:?} ({}), falling back to {}",
                raw, e, DEFAULT_API_BASE_URL
            );
            return DEFAULT_API_BASE_URL.to_string();
        }
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        warn!(
            "API base URL scheme {:?} is not supported, falling back to {}",
            parsed.scheme(),
            DEFAULT_API_BASE_URL
        );
        return DEFAULT_API_BASE_URL.to_string();
    }

    match parsed.host_str() {
        Some(host) if ALLOWED_BACKEND_HOSTS.contains(&host) => {
            let path = parsed.path();
            let path = if path != "/" {
                path.strip_suffix('/').unwrap_or(path)
            } else {
                path
            };
            format!("{}{}", parsed.origin().ascii_serialization(), path)
        }
        host => {
            warn!(
                "API base URL host {:?} is not allowed, falling back to {}",
                host.unwrap_or_default(),
                DEFAULT_API_BASE_URL
            );
            DEFAULT_API_BASE_URL.to_string()
        }
    }
}

/// Joins `path` onto `base`, keeping exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Builds `prefix/segment` with `segment` percent-encoded as one path
/// segment, so ids containing `/`, `?` or `#` cannot change the route.
pub fn path_with_segment(prefix: &str, segment: &str) -> String {
    let mut url = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return format!("{}/{}", prefix.trim_end_matches('/'), segment),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(prefix.split('/').filter(|s| !s.is_empty()))
            .push(segment);
    }
    url.path().to_string()
}
