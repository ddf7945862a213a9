//! Error types for endpoint discovery and dispatch.

use http::StatusCode;
use thiserror::Error;

use crate::param::{SourceKind, TargetType};

/// Errors raised while discovering, binding or dispatching endpoints.
///
/// Configuration errors ([`is_configuration`](Self::is_configuration)) are
/// detected at startup and abort it. The rest happen per request and are
/// turned into a response by [`status`](Self::status).
#[derive(Debug, Error)]
pub enum EndpointError {
    /// A raw request value was missing or could not be converted.
    #[error("Could not parse '{name}' to '{expected}'")]
    ParameterConversion {
        /// Declared parameter name.
        name: String,
        /// Type the handler expects.
        expected: TargetType,
    },

    /// No conversion exists for the declared (source, target) pair.
    #[error("No conversion from {kind} to '{target}' for parameter '{name}'")]
    MissingStrategy {
        /// Declared parameter name.
        name: String,
        /// Where the raw value would have been read from.
        kind: SourceKind,
        /// Type the handler expects.
        target: TargetType,
    },

    /// A symbolic access role has no entry in the role registry.
    #[error("No role matching '{0}'")]
    RoleNotFound(String),

    /// The declaring type could not be constructed.
    #[error("Could not instantiate '{type_name}': {reason}")]
    HandlerInstantiation {
        /// Name of the declaring type.
        type_name: String,
        /// Panic message or other cause.
        reason: String,
    },

    /// The handler takes a different number of arguments than were declared.
    #[error("Endpoint '{path}' declares {expected} parameter(s) but its handler takes {actual}")]
    ArityMismatch {
        /// Route path of the endpoint.
        path: String,
        /// Number of declared parameters.
        expected: usize,
        /// Number of arguments the handler accepts.
        actual: usize,
    },

    /// The handler ran and failed.
    #[error("Handler for '{path}' failed: {message}")]
    Invocation {
        /// Route path of the endpoint.
        path: String,
        /// Failure description.
        message: String,
    },

    /// A handler result could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EndpointError {
    /// Creates a [`ParameterConversion`](Self::ParameterConversion) error.
    pub fn conversion(name: impl Into<String>, expected: TargetType) -> Self {
        Self::ParameterConversion {
            name: name.into(),
            expected,
        }
    }

    /// Creates an [`Invocation`](Self::Invocation) error from any displayable failure.
    pub fn invocation(path: impl Into<String>, failure: impl core::fmt::Display) -> Self {
        Self::Invocation {
            path: path.into(),
            message: failure.to_string(),
        }
    }

    /// Returns `true` for errors that indicate broken endpoint metadata or
    /// role setup rather than a bad request.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingStrategy { .. }
                | Self::RoleNotFound(_)
                | Self::HandlerInstantiation { .. }
                | Self::ArityMismatch { .. }
        )
    }

    /// HTTP status a request failing with this error is answered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ParameterConversion { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_message_names_parameter_and_type() {
        let err = EndpointError::conversion("routeParam", TargetType::Date);
        assert_eq!(err.to_string(), "Could not parse 'routeParam' to 'Date'");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(!err.is_configuration());
    }

    #[test]
    fn role_not_found_message() {
        let err = EndpointError::RoleNotFound("ADMIN".into());
        assert_eq!(err.to_string(), "No role matching 'ADMIN'");
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_strategy_is_configuration() {
        let err = EndpointError::MissingStrategy {
            name: "token".into(),
            kind: SourceKind::Cookie,
            target: TargetType::Integer,
        };
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "No conversion from cookie to 'Integer' for parameter 'token'"
        );
    }

    #[test]
    fn invocation_maps_to_server_error() {
        let err = EndpointError::invocation("/api/fail", "disk full");
        assert_eq!(err.to_string(), "Handler for '/api/fail' failed: disk full");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_configuration());
    }
}
