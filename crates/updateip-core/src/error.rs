//! Error types for the updateip pipeline
//!
//! Resolver and sink failures are reported here and logged where they occur.
//! None of them stop the poll loop; the next cycle is the retry.

use thiserror::Error;

/// Result type alias for updateip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the updateip pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// The address-reporting service could not be reached
    #[error("No response from {endpoint}: {reason}")]
    UnreachableService {
        /// Address-reporting endpoint
        endpoint: String,
        /// Underlying transport failure
        reason: String,
    },

    /// The address-reporting service answered without an IPv4-shaped literal
    #[error("No IP found in response from {endpoint}")]
    NoAddressFound {
        /// Address-reporting endpoint
        endpoint: String,
        /// Raw response body, kept for diagnostics
        body: String,
    },

    /// The update request could not be built
    #[error("Could not initialize request: {0}")]
    RequestConstructionFailed(String),

    /// No response was received from the provider
    #[error("Error getting response: {0}")]
    Transport(String),

    /// The provider answered with a status outside [200, 300)
    #[error("Response not OK: HTTP status {status}")]
    HttpStatusNotOk {
        /// Returned status code
        status: u16,
    },

    /// A response arrived but its body could not be read
    #[error("Could not read response from {context}: {reason}")]
    BodyRead {
        /// Which endpoint the body came from
        context: String,
        /// Underlying read failure
        reason: String,
    },

    /// HTTP succeeded but the body is outside the provider's success vocabulary
    #[error("Provider rejected update: {body}")]
    ProviderRejected {
        /// Provider response body
        body: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an unreachable-service error
    pub fn unreachable(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::UnreachableService {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a no-address-found error carrying the raw body
    pub fn no_address(endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        Self::NoAddressFound {
            endpoint: endpoint.into(),
            body: body.into(),
        }
    }

    /// Create a request construction error
    pub fn request_construction(msg: impl ToString) -> Self {
        Self::RequestConstructionFailed(msg.to_string())
    }

    /// Create a transport error
    pub fn transport(msg: impl ToString) -> Self {
        Self::Transport(msg.to_string())
    }

    /// Create a body read error
    pub fn body_read(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::BodyRead {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a provider rejection error
    pub fn rejected(body: impl Into<String>) -> Self {
        Self::ProviderRejected { body: body.into() }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_endpoint() {
        let err = Error::unreachable("http://ipecho.net/plain", "connection refused");
        assert_eq!(
            err.to_string(),
            "No response from http://ipecho.net/plain: connection refused"
        );

        let err = Error::no_address("http://ipecho.net/plain", "error: no data");
        assert_eq!(
            err.to_string(),
            "No IP found in response from http://ipecho.net/plain"
        );
    }

    #[test]
    fn test_no_address_keeps_body() {
        match Error::no_address("svc", "error: no data") {
            Error::NoAddressFound { body, .. } => assert_eq!(body, "error: no data"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_display() {
        let err = Error::HttpStatusNotOk { status: 503 };
        assert_eq!(err.to_string(), "Response not OK: HTTP status 503");
    }
}
