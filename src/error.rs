//! Error types for provider operations.
//!
//! This module defines the classified errors for every call against the
//! debrid provider, mapping its ad-hoc failure signals (HTTP statuses,
//! response `detail` strings, transport faults) onto a small closed set
//! the rest of the crate can act on uniformly.

use thiserror::Error;

/// Errors that can occur when talking to the debrid provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The credential was rejected by the provider and must be refreshed.
    ///
    /// This variant propagates unchanged through every public operation so
    /// the caller can prompt for re-authentication.
    #[error("provider credential rejected; re-authentication required")]
    AuthenticationExpired,

    /// The account lacks the plan/tier required for the operation.
    #[error("access denied by provider: {detail}")]
    AccessDenied {
        /// The provider's explanation (e.g. "Account not premium.").
        detail: String,
    },

    /// Network failure, timeout, rate limit, or provider-side 5xx.
    #[error("provider unavailable during {operation}: {detail}")]
    ProviderUnavailable {
        /// The operation that was in flight.
        operation: &'static str,
        /// What went wrong at the transport or service level.
        detail: String,
    },

    /// A hash, file, or folder the caller asked about does not exist.
    ///
    /// Expected during resolution; drives state transitions rather than
    /// surfacing as a fault.
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing thing.
        what: String,
    },

    /// A failure that fits none of the recognized kinds.
    #[error("unexpected provider failure during {operation}: {detail}")]
    Unexpected {
        /// The operation that was in flight.
        operation: &'static str,
        /// Diagnostic detail.
        detail: String,
    },
}

impl ProviderError {
    /// Creates an `AccessDenied` error.
    #[must_use]
    pub fn access_denied(detail: &str) -> Self {
        Self::AccessDenied {
            detail: detail.to_string(),
        }
    }

    /// Creates a `ProviderUnavailable` error.
    #[must_use]
    pub fn unavailable(operation: &'static str, detail: &str) -> Self {
        Self::ProviderUnavailable {
            operation,
            detail: detail.to_string(),
        }
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates an `Unexpected` error.
    #[must_use]
    pub fn unexpected(operation: &'static str, detail: &str) -> Self {
        Self::Unexpected {
            operation,
            detail: detail.to_string(),
        }
    }

    /// Classifies a transport-level failure from the HTTP client.
    ///
    /// Timeouts, DNS failures, refused connections, and interrupted bodies
    /// all count as the provider being unavailable.
    #[must_use]
    pub fn from_transport(operation: &'static str, error: &reqwest::Error) -> Self {
        let detail = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            "connection failed".to_string()
        } else {
            error.to_string()
        };
        Self::ProviderUnavailable { operation, detail }
    }

    /// Classifies a non-success HTTP status from the provider.
    ///
    /// Returns `None` for success statuses.
    #[must_use]
    pub fn from_status(operation: &'static str, status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            401 => Some(Self::AuthenticationExpired),
            402 | 403 => Some(Self::AccessDenied {
                detail: format!("provider returned HTTP {status}"),
            }),
            404 => Some(Self::NotFound {
                what: format!("resource for {operation}"),
            }),
            429 => Some(Self::unavailable(operation, "provider rate limit exceeded")),
            s if s >= 500 => Some(Self::ProviderUnavailable {
                operation,
                detail: format!("provider returned HTTP {s}"),
            }),
            s => Some(Self::Unexpected {
                operation,
                detail: format!("provider returned HTTP {s}"),
            }),
        }
    }

    /// Classifies a `detail` string from the provider's response envelope.
    ///
    /// The provider reports some auth failures inside a 200 response, so the
    /// envelope text is checked even on success statuses. Returns `None` for
    /// details that carry no recognized signal.
    #[must_use]
    pub fn from_detail(detail: &str) -> Option<Self> {
        let lowered = detail.to_ascii_lowercase();
        if lowered.contains("not logged in") {
            return Some(Self::AuthenticationExpired);
        }
        if lowered.contains("not premium") {
            return Some(Self::AccessDenied {
                detail: detail.to_string(),
            });
        }
        None
    }

    /// Returns true if this is the credential-rejection signal.
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationExpired)
    }
}
