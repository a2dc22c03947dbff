use thiserror::Error;

/// Errors that can occur when using an Octothorpe
///
/// Every variant is a caller mistake. Nothing is retried, and a missing key is
/// never an error: lookups return `None` (or [`AnyValue::nil`](crate::AnyValue::nil)).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OctoError {
    /// The source could not be read as key/value pairs
    #[error("expected something hash-like, got {0}")]
    InvalidSource(String),
    /// `guard` was called after `freeze`
    #[error("octothorpe is frozen")]
    Frozen,
    /// A member read was given arguments or a block
    #[error("member `{member}` is a plain read: {reason}")]
    InvalidAccess { member: String, reason: String },
}

/// Result type alias for Octothorpe operations
pub type Result<T> = std::result::Result<T, OctoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            OctoError::InvalidSource("a number".to_string()).to_string(),
            "expected something hash-like, got a number"
        );
        assert_eq!(OctoError::Frozen.to_string(), "octothorpe is frozen");

        let err = OctoError::InvalidAccess {
            member: "two".to_string(),
            reason: "got 1 argument".to_string(),
        };
        assert_eq!(err.to_string(), "member `two` is a plain read: got 1 argument");
    }
}
