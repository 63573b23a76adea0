// Client Error Types
use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;

use crate::config::ServiceName;
use crate::session::store::StoreError;

/// Everything a Gateway, the session controller or a resource client can fail with
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect refused, DNS, timeout)
    #[error("{service} service unreachable: {message}")]
    Transport { service: ServiceName, message: String },

    /// The backend answered with a non-2xx status. `headers` and `body` are what it sent, untouched.
    #[error("{service} service returned {status}{}", render_detail(.body))]
    Http {
        service: ServiceName,
        status: u16,
        headers: HeaderMap,
        body: Value,
    },

    #[error("session expired, log in again")]
    SessionExpired { service: ServiceName },

    #[error("login response did not contain a token")]
    MissingToken,

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

fn render_detail(body: &Value) -> String {
    match error_detail(body) {
        Some(detail) => format!(": {}", detail),
        None => String::new(),
    }
}

impl ClientError {
    /// HTTP status, when the backend answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::SessionExpired { .. } => Some(401),
            _ => None,
        }
    }

    /// Get error code for caller handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "TRANSPORT_ERROR",
            ClientError::Http { status, .. } => match status {
                400 => "BAD_REQUEST",
                401 => "UNAUTHORIZED",
                403 => "FORBIDDEN",
                404 => "NOT_FOUND",
                409 => "CONFLICT",
                422 => "UNPROCESSABLE_ENTITY",
                429 => "TOO_MANY_REQUESTS",
                500..=599 => "SERVER_ERROR",
                _ => "HTTP_ERROR",
            },
            ClientError::SessionExpired { .. } => "SESSION_EXPIRED",
            ClientError::MissingToken => "MISSING_TOKEN",
            ClientError::Storage(_) => "STORAGE_ERROR",
            ClientError::Config(_) => "CONFIG_ERROR",
            ClientError::InvalidPayload(_) => "INVALID_PAYLOAD",
        }
    }

    /// True for 401 responses and for sessions the Gateway already expired
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ClientError::Http { status: 401, .. } | ClientError::SessionExpired { .. }
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    /// Response headers of a non-2xx answer (`WWW-Authenticate`, `Retry-After`, ...)
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            ClientError::Http { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Human-readable message taken from the backend error body
    pub fn detail(&self) -> Option<String> {
        match self {
            ClientError::Http { body, .. } => error_detail(body),
            _ => None,
        }
    }
}

/// Render a backend error body for humans.
///
/// A string body is used as-is, an object's `detail` wins when present, and
/// otherwise every field's messages are flattened and joined with a space
/// (`{"email": ["already taken"], "phone": "invalid"}` -> `already taken invalid`).
pub fn error_detail(body: &Value) -> Option<String> {
    match body {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            if let Some(detail) = map.get("detail") {
                if let Some(text) = error_detail(detail) {
                    return Some(text);
                }
            }
            let parts: Vec<String> = map.values().flat_map(flatten_messages).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        Value::Array(_) => {
            let parts = flatten_messages(body);
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        other => Some(other.to_string()),
    }
}

fn flatten_messages(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(flatten_messages).collect(),
        Value::Object(map) => map.values().flat_map(flatten_messages).collect(),
        other => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_prefers_detail_field() {
        let body = json!({"detail": "Invalid token.", "code": "token_not_valid"});
        assert_eq!(error_detail(&body).as_deref(), Some("Invalid token."));
    }

    #[test]
    fn test_detail_flattens_field_errors() {
        let body = json!({"non_field_errors": ["Unable to log in with provided credentials."]});
        assert_eq!(
            error_detail(&body).as_deref(),
            Some("Unable to log in with provided credentials.")
        );

        let body = json!({"email": ["user with this email already exists."]});
        assert_eq!(
            error_detail(&body).as_deref(),
            Some("user with this email already exists.")
        );
    }

    #[test]
    fn test_detail_plain_string_and_empty() {
        assert_eq!(error_detail(&json!("Bad Gateway")).as_deref(), Some("Bad Gateway"));
        assert_eq!(error_detail(&Value::Null), None);
        assert_eq!(error_detail(&json!({})), None);
    }

    #[test]
    fn test_unauthorized_classification() {
        let err = ClientError::Http {
            service: ServiceName::User,
            status: 401,
            headers: HeaderMap::new(),
            body: json!({"detail": "Authentication credentials were not provided."}),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.error_code(), "UNAUTHORIZED");
        assert_eq!(
            err.to_string(),
            "user service returned 401: Authentication credentials were not provided."
        );

        let err = ClientError::Transport {
            service: ServiceName::Product,
            message: "connection refused".into(),
        };
        assert!(err.is_transport());
        assert!(!err.is_unauthorized());
        assert_eq!(err.status_code(), None);
    }
}
