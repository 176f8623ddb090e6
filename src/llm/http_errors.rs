//! Mapping of transport failures to readable provider errors.

use std::error::Error as StdError;
use std::io::ErrorKind;

use reqwest::Response;

use crate::error::ThinkError;

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
            if io_err.kind() == ErrorKind::ConnectionRefused {
                return true;
            }
        }
        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("connection refused")
        {
            return true;
        }
        current = source.source();
    }
    false
}

/// Wrap a `reqwest` failure in a `ThinkError::Provider` for `provider`.
pub(crate) fn request_error(provider: &str, err: reqwest::Error, url: &str) -> ThinkError {
    let message = if err.is_timeout() {
        format!("Request to '{}' timed out. Try a larger --timeout.", url)
    } else if err.is_connect() && error_chain_has_connection_refused(&err) {
        format!(
            "Connection refused by '{}'. Check the provider's apiBase setting.",
            url
        )
    } else if err.is_connect() {
        format!(
            "Failed to connect to '{}'. Check network connectivity.",
            url
        )
    } else if err.is_decode() {
        format!("Failed to parse response from '{}': {}", url, err)
    } else {
        format!("Request to '{}' failed: {}", url, err)
    };
    ThinkError::provider(provider, message)
}

/// Turn a non-success response into a provider error carrying the body.
pub(crate) async fn status_error(provider: &str, response: Response) -> ThinkError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read response body>".to_string());
    ThinkError::provider(provider, format!("API error ({}): {}", status, body))
}
