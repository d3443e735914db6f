//! Mapping of `sqlx` failures onto [`BookingError`].

use slotbook_core::BookingError;
use sqlx::error::ErrorKind;

/// SQLSTATEs that mean "try again later" rather than "this request is wrong".
fn is_transient_sqlstate(code: &str) -> bool {
    matches!(
        code,
        // deadlock_detected, lock_not_available, query_canceled, serialization_failure
        "40P01" | "55P03" | "57014" | "40001"
    ) || code.starts_with("08")
}

/// Classify a database error as retryable `Unavailable` or opaque `Storage`.
pub(crate) fn classify(error: sqlx::Error) -> BookingError {
    let transient = match &error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_transient_sqlstate(&code)),
        _ => false,
    };

    if transient {
        tracing::warn!(error = %error, "Transient database failure");
        BookingError::Unavailable(error.to_string())
    } else {
        tracing::error!(error = %error, "Database failure");
        BookingError::Storage(error.to_string())
    }
}

/// Whether `error` is a violation of the given constraint kind.
pub(crate) fn is_violation(error: &sqlx::Error, kind: ErrorKind) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.kind() == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_and_connection_sqlstates_are_transient() {
        for code in ["40P01", "55P03", "57014", "40001", "08006", "08001"] {
            assert!(is_transient_sqlstate(code), "{code}");
        }
        for code in ["23505", "23503", "42P01", "22007"] {
            assert!(!is_transient_sqlstate(code), "{code}");
        }
    }

    #[test]
    fn pool_exhaustion_is_retryable() {
        assert!(classify(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(classify(sqlx::Error::PoolClosed).is_retryable());
    }

    #[test]
    fn missing_row_is_a_storage_error() {
        assert!(matches!(
            classify(sqlx::Error::RowNotFound),
            BookingError::Storage(_)
        ));
    }
}
