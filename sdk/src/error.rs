//! SDK error types.
//!
//! Provides error types for SDK operations.

/// SDK errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    /// Invalid token amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Unknown event kind.
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    /// Invalid subscription registration.
    #[error("invalid subscription: {0}")]
    InvalidSubscription(String),

    /// Payload could not be signed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SdkError::InvalidAmount("12x".to_string());
        assert_eq!(err.to_string(), "invalid amount: 12x");
    }

    #[test]
    fn test_error_unknown_kind() {
        let err = SdkError::UnknownEventKind("MINT".to_string());
        assert_eq!(err.to_string(), "unknown event kind: MINT");
    }
}
