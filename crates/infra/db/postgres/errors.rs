use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// True when the error chain carries a Postgres unique-constraint violation, the signal
/// that a concurrent writer won a race a prior existence check could not see.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DieselError>(),
        Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_error(kind: DatabaseErrorKind) -> anyhow::Error {
        anyhow::Error::from(DieselError::DatabaseError(
            kind,
            Box::new("constraint failed".to_string()),
        ))
    }

    #[test]
    fn unique_violation_is_recognised() {
        assert!(is_unique_violation(&database_error(
            DatabaseErrorKind::UniqueViolation
        )));
    }

    #[test]
    fn other_failures_are_not_unique_violations() {
        assert!(!is_unique_violation(&database_error(
            DatabaseErrorKind::ForeignKeyViolation
        )));
        assert!(!is_unique_violation(&DieselError::NotFound.into()));
        assert!(!is_unique_violation(&anyhow::anyhow!("pool timed out")));
    }
}
