use thiserror::Error;

/// Errors raised while talking to the Octopus Deploy REST API.
///
/// SECURITY: Error messages must NEVER contain API keys, access tokens or
/// sensitive variable values.
#[derive(Debug, Error)]
pub enum OctopusError {
    /// Credential rejected (401/403)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The requested document does not exist (404)
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection refused, timeout, TLS, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode response from {resource}: {message}")]
    Decode { resource: String, message: String },

    #[error("invalid Octopus server address '{address}': {message}")]
    InvalidAddress { address: String, message: String },
}

impl OctopusError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OctopusError::NotFound { .. })
    }

    /// Builds the error for a failed response from its status and body.
    pub(crate) fn from_response(status: u16, resource: &str, body: &str) -> Self {
        match status {
            401 | 403 => OctopusError::Auth {
                message: error_message(body).unwrap_or_else(|| format!("HTTP {status}")),
            },
            404 => OctopusError::NotFound {
                resource: resource.to_string(),
            },
            _ => OctopusError::Api {
                status,
                message: error_message(body).unwrap_or_else(|| body.trim().to_string()),
            },
        }
    }
}

// NOTE: Octopus reports failures as {"ErrorMessage": "...", "Errors": ["..."]}
fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let summary = json.get("ErrorMessage").and_then(|m| m.as_str())?;
    let details: Vec<&str> = json
        .get("Errors")
        .and_then(|e| e.as_array())
        .map(|errors| errors.iter().filter_map(|e| e.as_str()).collect())
        .unwrap_or_default();

    if details.is_empty() {
        Some(summary.to_string())
    } else {
        Some(format!("{}: {}", summary, details.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = OctopusError::Auth {
            message: "Invalid API key".to_string(),
        };
        assert_eq!(err.to_string(), "authentication failed: Invalid API key");
    }

    #[test]
    fn test_api_error_display() {
        let err = OctopusError::Api {
            status: 400,
            message: "There was a problem with your request.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (400): There was a problem with your request."
        );
    }

    #[test]
    fn test_from_response_collects_errors() {
        let body = r#"{"ErrorMessage":"There was a problem with your request.","Errors":["Name must be unique","Slug is required"]}"#;
        let err = OctopusError::from_response(400, "environments", body);
        match err {
            OctopusError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(
                    message,
                    "There was a problem with your request.: Name must be unique; Slug is required"
                );
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_response_not_found() {
        let err = OctopusError::from_response(404, "environments/Environments-9", "");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: environments/Environments-9");
    }

    #[test]
    fn test_from_response_auth() {
        let body = r#"{"ErrorMessage":"You must be logged in to perform this action."}"#;
        let err = OctopusError::from_response(401, "spaces", body);
        assert!(matches!(err, OctopusError::Auth { .. }));
        assert!(err.to_string().contains("must be logged in"));
    }

    #[test]
    fn test_from_response_plain_body() {
        let err = OctopusError::from_response(502, "projects", "Bad Gateway\n");
        assert_eq!(err.to_string(), "API error (502): Bad Gateway");
    }
}
