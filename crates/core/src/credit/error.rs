//! Credit error types for validation and state errors.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during credit operations.
#[derive(Debug, Error)]
pub enum CreditError {
    /// Amount is non-positive, negative, or would overflow.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Balance does not cover the requested amount.
    ///
    /// Carries the stable code `INSUFFICIENT_BALANCE` so clients can branch
    /// to a top-up flow without string-matching messages.
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        /// Credit available for this operation.
        available: i64,
        /// Credit the operation requested.
        required: i64,
    },

    /// Credit account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Credit account already provisioned.
    #[error("Account already exists: {0}")]
    AccountExists(Uuid),

    /// Chargeable job not found.
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Job is in a terminal state and cannot transition again.
    #[error("Job {0} is not pending")]
    JobNotPending(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CreditError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountExists(_) => "ACCOUNT_EXISTS",
            Self::JobNotFound(_) => "JOB_NOT_FOUND",
            Self::JobNotPending(_) => "JOB_NOT_PENDING",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_) => 400,
            // 402 Payment Required: the client should offer a top-up action.
            Self::InsufficientBalance { .. } => 402,
            Self::AccountNotFound(_) | Self::JobNotFound(_) => 404,
            Self::AccountExists(_) | Self::JobNotPending(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error may succeed on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CreditError::InvalidAmount("zero".to_string()).error_code(),
            "INVALID_AMOUNT"
        );
        assert_eq!(
            CreditError::InsufficientBalance {
                available: 100,
                required: 200,
            }
            .error_code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            CreditError::AccountNotFound(Uuid::nil()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            CreditError::JobNotPending(Uuid::nil()).error_code(),
            "JOB_NOT_PENDING"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            CreditError::InvalidAmount(String::new()).http_status_code(),
            400
        );
        assert_eq!(
            CreditError::InsufficientBalance {
                available: 0,
                required: 1,
            }
            .http_status_code(),
            402
        );
        assert_eq!(
            CreditError::AccountNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            CreditError::AccountExists(Uuid::nil()).http_status_code(),
            409
        );
        assert_eq!(
            CreditError::Database("test".to_string()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(CreditError::Database("connection reset".to_string()).is_retryable());
        assert!(
            !CreditError::InsufficientBalance {
                available: 0,
                required: 1,
            }
            .is_retryable()
        );
        assert!(!CreditError::InvalidAmount(String::new()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = CreditError::InsufficientBalance {
            available: 400,
            required: 800,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: available 400, required 800"
        );
    }
}
