//! Response classification
//!
//! Turns a raw [`Response`] into what the client should do next: hand it
//! back, run the refresh protocol, or fail with a classified [`Error`].

use super::request::RequestDescriptor;
use super::transport::Response;
use crate::auth::{extract_jsonpath, AccountState, AccountStateClassifier};
use crate::error::Error;
use serde_json::Value;

/// Body fields that may carry the server's error message, in priority order
const MESSAGE_FIELDS: &[&str] = &["message", "error", "detail"];

/// What to do with a response
#[derive(Debug)]
pub(crate) enum Disposition {
    /// 2xx, returned unchanged
    Success(Response),
    /// Eligible 401; the refresh protocol takes over
    RefreshRequired,
    /// Terminal for this request
    Failed(Error),
}

/// Decide what a response means for the request that produced it
pub(crate) fn classify(
    response: Response,
    request: &RequestDescriptor,
    exclusions: &[String],
    classifier: &dyn AccountStateClassifier,
) -> Disposition {
    let status = response.status();
    if response.is_success() {
        return Disposition::Success(response);
    }

    let message = server_message(&response);
    let error = match status {
        401 => {
            let state = classifier.classify(&message);
            if state.blocks_refresh() || is_excluded(&request.url, exclusions) {
                Error::account_state(state, message)
            } else if request.is_retry() {
                Error::RefreshExhausted { message }
            } else {
                return Disposition::RefreshRequired;
            }
        }
        403 => Error::Forbidden { message },
        404 => Error::NotFound { message },
        409 => Error::Conflict { message },
        500..=599 => Error::ServerError { status, message },
        _ => Error::HttpStatus { status, message },
    };

    Disposition::Failed(error)
}

/// Whether a URL matches the refresh exclusion list
///
/// Paths resolve the same with or without a leading slash, so both sides
/// are compared without it.
pub(crate) fn is_excluded(url: &str, exclusions: &[String]) -> bool {
    exclusions.iter().any(|pattern| {
        let pattern = pattern.trim_start_matches('/');
        !pattern.is_empty() && url.contains(pattern)
    })
}

/// The human-readable message the server attached to an error response
pub fn server_message(response: &Response) -> String {
    let body = response.text().trim();

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = MESSAGE_FIELDS
            .iter()
            .find_map(|field| extract_jsonpath(&json, field))
        {
            return message;
        }
    }

    if body.is_empty() || body.starts_with('{') || body.starts_with('<') {
        default_message(response.status())
    } else {
        body.to_string()
    }
}

fn default_message(status: u16) -> String {
    let reason = match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return format!("HTTP {status}"),
    };
    reason.to_string()
}

/// Whether an account state also drops the stored credential
pub(crate) fn clears_credential(error: &Error) -> Option<AccountState> {
    match error {
        Error::AccountState { state, .. } if state.clears_credential() => Some(*state),
        _ => None,
    }
}

#[cfg(test)]
mod classify_tests {
    use super::*;

    fn exclusions() -> Vec<String> {
        vec![
            "/public/auth/login".to_string(),
            "/public/auth/refresh-token".to_string(),
        ]
    }

    #[test]
    fn test_exclusion_ignores_leading_slash() {
        assert!(is_excluded("/public/auth/login", &exclusions()));
        assert!(is_excluded("public/auth/login", &exclusions()));
        assert!(is_excluded(
            "https://lms.test/api/public/auth/refresh-token",
            &exclusions()
        ));
        assert!(!is_excluded("/assignments/3", &exclusions()));
    }

    #[test]
    fn test_empty_exclusion_matches_nothing() {
        assert!(!is_excluded("/a", &["/".to_string(), String::new()]));
    }
}
