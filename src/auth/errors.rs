use thiserror::Error;

/// Errors raised while constructing the token authority or issuing tokens
///
/// Verification never produces an error: malformed, expired and revoked tokens
/// all come back as an invalid `TokenVerification`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The signing secret is too short for HS256
    #[error("JWT secret must be at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },

    /// Token lifetime must be representable in seconds since the epoch
    #[error("Invalid token lifetime: {0}")]
    InvalidLifetime(String),

    /// Signing the claims failed
    #[error("Token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::WeakSecret { min: 32, actual: 8 };
        assert_eq!(err.to_string(), "JWT secret must be at least 32 bytes, got 8");
    }
}
