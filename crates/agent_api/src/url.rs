use crate::error::AgentApiError;

/// Candidate endpoints used when no explicit list is configured.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "http://127.0.0.1:8000/api/agent/stream",
    "http://localhost:8000/api/agent/stream",
];

/// Normalize one candidate endpoint URL.
///
/// Normalization rules:
/// 1) surrounding whitespace is removed
/// 2) the URL must parse and use the `http` or `https` scheme
/// 3) trailing slashes are removed from non-root paths
pub fn normalize_endpoint_url(input: &str) -> Result<String, AgentApiError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AgentApiError::InvalidEndpoint(
            "endpoint URL is empty".to_owned(),
        ));
    }

    let parsed = ::url::Url::parse(trimmed)
        .map_err(|error| AgentApiError::InvalidEndpoint(format!("{trimmed}: {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AgentApiError::InvalidEndpoint(format!(
            "{trimmed}: unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    let rendered = parsed.to_string();
    if parsed.path() != "/" {
        return Ok(rendered.trim_end_matches('/').to_owned());
    }
    Ok(rendered)
}
