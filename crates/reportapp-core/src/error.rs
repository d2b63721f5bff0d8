//! Classified failures surfaced by every client and controller operation.

use std::fmt;

use serde_json::Value;

/// A classified failure.
///
/// Every public operation in this crate ends in either a value or one of
/// these variants. Validation variants are produced before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No session token is present but the operation needs one.
    Unauthenticated,
    /// The service rejected the supplied email/password.
    InvalidCredentials,
    /// Password and its confirmation differ.
    PasswordMismatch,
    /// Email does not look like `local@domain.tld`.
    InvalidEmail,
    /// A required field is empty.
    Validation(&'static str),
    /// A device capability (positioning) was refused.
    PermissionDenied,
    /// Reverse geocoding returned no address.
    NoResultsFound,
    /// The remote entity no longer exists.
    NotFound,
    /// Any other non-success response from a remote service.
    Remote {
        status: u16,
        message: Option<String>,
    },
    /// Transport-level failure (connect, DNS, TLS, reset).
    Network(String),
    /// Durable session storage could not be read or written.
    Storage(String),
    /// Registration was refused; carries the service message when it sent one.
    RegistrationFailed(Option<String>),
    /// The service answered the reset request with `success: false`.
    PasswordResetRejected,
    /// Positioning was granted but no fix could be obtained.
    PositionUnavailable(String),
    /// A success response whose body could not be decoded.
    InvalidResponse(String),
    /// A submission is already running for this form.
    SubmissionInProgress,
}

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Builds a `Remote` error from a status and raw response body.
    ///
    /// Extracts `message` or `error.message` from a JSON body when present.
    pub fn remote(status: u16, body: &str) -> Self {
        Self::Remote {
            status,
            message: extract_message(body),
        }
    }

    /// Returns true for failures detected locally before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClientError::PasswordMismatch | ClientError::InvalidEmail | ClientError::Validation(_)
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            ClientError::NotFound => Some(404),
            _ => None,
        }
    }

    /// Short machine-readable label, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Unauthenticated => "unauthenticated",
            ClientError::InvalidCredentials => "invalid_credentials",
            ClientError::PasswordMismatch => "password_mismatch",
            ClientError::InvalidEmail => "invalid_email",
            ClientError::Validation(_) => "validation",
            ClientError::PermissionDenied => "permission_denied",
            ClientError::NoResultsFound => "no_results_found",
            ClientError::NotFound => "not_found",
            ClientError::Remote { .. } => "remote",
            ClientError::Network(_) => "network",
            ClientError::Storage(_) => "storage",
            ClientError::RegistrationFailed(_) => "registration_failed",
            ClientError::PasswordResetRejected => "password_reset_rejected",
            ClientError::PositionUnavailable(_) => "position_unavailable",
            ClientError::InvalidResponse(_) => "invalid_response",
            ClientError::SubmissionInProgress => "submission_in_progress",
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Unauthenticated => write!(f, "Not logged in. Please log in again."),
            ClientError::InvalidCredentials => write!(f, "Incorrect email or password."),
            ClientError::PasswordMismatch => write!(f, "Passwords do not match."),
            ClientError::InvalidEmail => write!(f, "Invalid email address."),
            ClientError::Validation(field) => write!(f, "Missing required field: {field}"),
            ClientError::PermissionDenied => write!(
                f,
                "Location permission denied. Allow location access to use this feature."
            ),
            ClientError::NoResultsFound => write!(f, "No address found for this location."),
            ClientError::NotFound => write!(f, "Report not found."),
            ClientError::Remote {
                status,
                message: Some(msg),
            } => write!(f, "HTTP {status}: {msg}"),
            ClientError::Remote {
                status,
                message: None,
            } => write!(f, "HTTP {status}"),
            ClientError::Network(detail) => write!(f, "Network error: {detail}"),
            ClientError::Storage(detail) => write!(f, "Session storage error: {detail}"),
            ClientError::RegistrationFailed(Some(msg)) => write!(f, "{msg}"),
            ClientError::RegistrationFailed(None) => {
                write!(f, "Registration failed. Please try again.")
            }
            ClientError::PasswordResetRejected => {
                write!(f, "Could not send the password reset email. Try again.")
            }
            ClientError::PositionUnavailable(detail) => {
                write!(f, "Current position unavailable: {detail}")
            }
            ClientError::InvalidResponse(detail) => write!(f, "Unexpected response: {detail}"),
            ClientError::SubmissionInProgress => write!(f, "A submission is already in progress."),
        }
    }
}

impl std::error::Error for ClientError {}

/// Maps a transport failure from reqwest onto the taxonomy.
pub(crate) fn classify_reqwest_error(e: &reqwest::Error) -> ClientError {
    if e.is_decode() {
        ClientError::InvalidResponse(e.to_string())
    } else if e.is_timeout() {
        ClientError::Network(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ClientError::Network(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ClientError::Network(format!("Request error: {e}"))
    } else {
        ClientError::Network(e.to_string())
    }
}

/// Pulls a human-readable message out of an error body.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    let message = json
        .get("message")
        .or_else(|| json.get("error").and_then(|err| err.get("message")))
        .or_else(|| json.get("error"))
        .and_then(Value::as_str)?
        .trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
