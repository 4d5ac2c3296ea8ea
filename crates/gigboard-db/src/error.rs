use sea_orm::error::SqlErr;
use sea_orm::DbErr;
use thiserror::Error;

/// Failure taxonomy for all persistence-layer operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad input: invalid phone format, missing required field, or a
    /// foreign key that does not resolve.
    #[error("{0}")]
    Validation(String),
    /// Uniqueness violation, e.g. a duplicate (name, city, state) triple.
    #[error("{0}")]
    Conflict(String),
    /// The id does not resolve to a record of the named kind.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Any other storage failure.
    #[error("database error: {0}")]
    Db(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => StoreError::Validation(msg),
            _ => match err {
                // `before_save` hooks report validation failures as Custom
                DbErr::Custom(msg) => StoreError::Validation(msg),
                other => StoreError::Db(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_db_error_is_validation() {
        let err = StoreError::from(DbErr::Custom("Invalid phone number format: x".into()));
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(err.to_string(), "Invalid phone number format: x");
    }

    #[test]
    fn test_other_db_errors_stay_generic() {
        let err = StoreError::from(DbErr::RecordNotFound("venues".into()));
        assert!(matches!(err, StoreError::Db(_)));
    }

    #[test]
    fn test_not_found_display_names_the_kind() {
        assert_eq!(StoreError::NotFound("venue").to_string(), "venue not found");
        assert_eq!(StoreError::NotFound("artist").to_string(), "artist not found");
    }
}
