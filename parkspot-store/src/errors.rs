use parkspot_core::DomainError;
use tracing::error;

const DEADLOCK_DETECTED: &str = "40P01";
const SERIALIZATION_FAILURE: &str = "40001";

/// Translation table from driver errors to domain errors.
///
/// Unique violations become `on_unique`, foreign-key violations become
/// `InUse`. Everything else is logged and reported as a generic internal
/// error; driver details never leave this crate.
pub(crate) fn translate(err: sqlx::Error, on_unique: DomainError) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return on_unique;
        }
        if db_err.is_foreign_key_violation() {
            return DomainError::InUse(db_err.constraint().unwrap_or("foreign key").to_string());
        }
    }
    internal(err)
}

/// Like [`translate`], for statements where a unique violation is not an
/// expected outcome.
pub(crate) fn store_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return DomainError::InUse(db_err.constraint().unwrap_or("foreign key").to_string());
        }
    }
    internal(err)
}

/// Errors inside a claim transaction. Postgres aborting one of two claimants
/// (deadlock, serialization failure) means the claim was lost.
pub(crate) fn claim_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.code().as_deref(), Some(DEADLOCK_DETECTED) | Some(SERIALIZATION_FAILURE)) {
            return DomainError::AlreadyBooked;
        }
    }
    store_error(err)
}

fn internal(err: sqlx::Error) -> DomainError {
    error!("Unrecognized store error: {}", err);
    DomainError::Internal("database operation failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkspot_core::ErrorKind;

    #[test]
    fn test_non_database_errors_are_internal() {
        let err = translate(sqlx::Error::RowNotFound, DomainError::DuplicatedPreference);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.to_string().contains("no rows"));

        assert_eq!(store_error(sqlx::Error::PoolTimedOut).kind(), ErrorKind::Internal);
        assert_eq!(claim_error(sqlx::Error::PoolClosed).kind(), ErrorKind::Internal);
    }
}
