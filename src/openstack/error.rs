//! Error types for the OpenStack client.

use std::fmt;

use openstack::ErrorKind;
use thiserror::Error;

/// Broad class of a failed service call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fault {
    /// The resource does not exist.
    NotFound,
    /// The credentials lack permission for the call.
    AccessDenied,
    /// The resource is in a state that forbids the call.
    Conflict,
    /// The service rejected the request body or parameters.
    InvalidInput,
    /// The service failed internally.
    ServerError,
    /// Anything else the SDK reports, including transport failures.
    Other,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::AccessDenied => "access denied",
            Self::Conflict => "conflict",
            Self::InvalidInput => "invalid input",
            Self::ServerError => "server error",
            Self::Other => "request failed",
        };
        f.write_str(label)
    }
}

/// Errors raised by cloud API calls.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CloudError {
    /// Raised when the identity service rejects the credentials.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Message reported by the identity service.
        message: String,
    },
    /// Raised when the service catalog lacks a required endpoint.
    #[error("service endpoint not found: {message}")]
    EndpointNotFound {
        /// Message naming the missing service.
        message: String,
    },
    /// Raised when the proxy URL cannot be used.
    #[error("invalid proxy '{proxy}': {message}")]
    InvalidProxy {
        /// Proxy URL as configured.
        proxy: String,
        /// Parser or client error message.
        message: String,
    },
    /// Raised when a service call fails.
    #[error("{fault}: {message}")]
    Api {
        /// Class of the failure.
        fault: Fault,
        /// Message reported by the SDK or the service.
        message: String,
    },
    /// Raised when a lookup by name matches nothing.
    #[error("{resource} '{name}' not found")]
    NotFound {
        /// Resource kind (for example `flavor`).
        resource: &'static str,
        /// Name used for the lookup.
        name: String,
    },
    /// Raised when a lookup by name matches more than one resource.
    #[error("found {count} {resource}s named '{name}'")]
    Ambiguous {
        /// Resource kind (for example `image`).
        resource: &'static str,
        /// Name used for the lookup.
        name: String,
        /// Number of matching resources.
        count: usize,
    },
}

impl CloudError {
    /// Returns `true` when the service reported that the resource is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Api {
                fault: Fault::NotFound,
                ..
            } | Self::NotFound { .. }
        )
    }
}

impl From<openstack::Error> for CloudError {
    fn from(err: openstack::Error) -> Self {
        let message = err.to_string();
        let fault = match err.kind() {
            ErrorKind::AuthenticationFailed => return Self::Authentication { message },
            ErrorKind::EndpointNotFound => return Self::EndpointNotFound { message },
            ErrorKind::ResourceNotFound => Fault::NotFound,
            ErrorKind::AccessDenied => Fault::AccessDenied,
            ErrorKind::Conflict => Fault::Conflict,
            ErrorKind::InvalidInput => Fault::InvalidInput,
            ErrorKind::InternalServerError => Fault::ServerError,
            _ => Fault::Other,
        };
        Self::Api { fault, message }
    }
}

/// Turns a "resource not found" answer into `Ok(None)`.
pub(crate) fn absent_as_none<T>(
    result: Result<T, openstack::Error>,
) -> Result<Option<T>, CloudError> {
    match result {
        Ok(found) => Ok(Some(found)),
        Err(err) if err.kind() == ErrorKind::ResourceNotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ErrorKind::ResourceNotFound, Fault::NotFound)]
    #[case(ErrorKind::AccessDenied, Fault::AccessDenied)]
    #[case(ErrorKind::Conflict, Fault::Conflict)]
    #[case(ErrorKind::InternalServerError, Fault::ServerError)]
    #[case(ErrorKind::OperationTimedOut, Fault::Other)]
    fn sdk_failures_map_to_faults(#[case] kind: ErrorKind, #[case] expected: Fault) {
        let error = CloudError::from(openstack::Error::new(kind, "boom"));
        let CloudError::Api { fault, ref message } = error else {
            panic!("expected api error, got {error:?}");
        };
        assert_eq!(fault, expected);
        assert!(message.contains("boom"), "message: {message}");
    }

    #[test]
    fn rejected_credentials_become_authentication_error() {
        let error = CloudError::from(openstack::Error::new(
            ErrorKind::AuthenticationFailed,
            "The request you have made requires authentication.",
        ));
        assert!(
            matches!(
                error,
                CloudError::Authentication { ref message }
                    if message.contains("requires authentication")
            ),
            "got {error:?}"
        );
    }

    #[test]
    fn missing_catalog_entry_becomes_endpoint_error() {
        let error = CloudError::from(openstack::Error::new(
            ErrorKind::EndpointNotFound,
            "volumev3 not in catalog",
        ));
        assert!(matches!(error, CloudError::EndpointNotFound { .. }), "got {error:?}");
    }

    #[test]
    fn not_found_lookup_yields_none() {
        let result: Result<&str, _> = Err(openstack::Error::new(
            ErrorKind::ResourceNotFound,
            "Keypair docker-machine-key not found",
        ));
        assert_eq!(absent_as_none(result), Ok(None));
    }

    #[test]
    fn other_lookup_failures_propagate() {
        let result: Result<&str, _> = Err(openstack::Error::new(
            ErrorKind::AccessDenied,
            "policy forbids os_compute_api:os-keypairs:show",
        ));
        let error = absent_as_none(result).expect_err("access denied must propagate");
        assert!(!error.is_not_found());
        assert!(matches!(
            error,
            CloudError::Api {
                fault: Fault::AccessDenied,
                ..
            }
        ));
    }

    #[test]
    fn found_lookup_is_kept() {
        assert_eq!(absent_as_none(Ok::<_, openstack::Error>("key")), Ok(Some("key")));
    }
}
