/// Why a save request was rejected before it reached the store.
///
/// Every variant is local to the request: nothing is written when one of
/// these is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The body could not be buffered (too large, connection aborted).
    #[error("body: {0}")]
    Body(String),

    /// The body is not a JSON object.
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("field '{0}' must be a string")]
    NotText(&'static str),

    #[error("field '{field}' is not a number: {value}")]
    NotANumber { field: &'static str, value: String },
}

/// Category of a store failure. Lets the caller tell a dead database apart
/// from a rejected row in logs, even though both end up as the same
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store unreachable: network, TLS, pool exhausted or closed.
    Connection,
    /// The row violated a table constraint.
    Constraint,
    /// Any other failure reported by the store.
    Query,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Connection => f.write_str("connection"),
            ErrorKind::Constraint => f.write_str("constraint"),
            ErrorKind::Query => f.write_str("query"),
        }
    }
}

/// Error returned by every `StudentStore` method.
///
/// Carries an `ErrorKind` for categorization and a human-readable message.
#[derive(Clone, PartialEq, Eq)]
pub struct PersistenceError {
    kind: ErrorKind,
    message: String,
}

impl PersistenceError {
    /// Generic store failure (default kind).
    pub fn new(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Query, message: msg.into() }
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Connection, message: msg.into() }
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Constraint, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the message with where the failure happened.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        Self { kind: self.kind, message: format!("{ctx}: {}", self.message) }
    }
}

impl std::fmt::Debug for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PersistenceError {}

/// Outcome of a failed save: either the input or the store is at fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("persistence ({kind}): {0}", kind = .0.kind())]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_keeps_kind_through_context() {
        let err = PersistenceError::connection("pool timed out").with_context("upsert 'Ana'");
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.to_string(), "upsert 'Ana': pool timed out");
        assert_eq!(format!("{err:?}"), "[connection] upsert 'Ana': pool timed out");
    }

    #[test]
    fn save_error_display_names_the_side_at_fault() {
        let v: SaveError = ValidationError::MissingField("name").into();
        assert_eq!(v.to_string(), "validation: missing field 'name'");

        let p: SaveError = PersistenceError::constraint("duplicate key").into();
        assert_eq!(p.to_string(), "persistence (constraint): duplicate key");
    }
}
