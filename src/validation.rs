use crate::errors::ApiError;
use url::Url;

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Check that `raw` is an absolute http(s)/ftp URL with a host and return it
/// trimmed. The registry trusts whatever this lets through, and the redirect
/// hands it back verbatim as a `Location` header.
pub fn validate_url(raw: &str) -> Result<String, ApiError> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return Err(ApiError::InvalidUrl("url must not be empty".into()));
    }

    // `Url::parse` silently strips tabs and newlines; the stored string must not carry them.
    if candidate.chars().any(char::is_control) {
        return Err(ApiError::InvalidUrl(
            "url must not contain control characters".into(),
        ));
    }

    let parsed = Url::parse(candidate)
        .map_err(|e| ApiError::InvalidUrl(format!("url must be a valid URL address: {e}")))?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ApiError::InvalidUrl(
            "url must start with http://, https:// or ftp://".into(),
        ));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(candidate.to_owned()),
        _ => Err(ApiError::InvalidUrl("url must include a host".into())),
    }
}
