//! Error types for PatternFit

use thiserror::Error;

/// PatternFit error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_variant_prefix() {
        let e = Error::Validation("k must be <= n".to_string());
        assert_eq!(e.to_string(), "Validation error: k must be <= n");
    }

    #[test]
    fn test_json_error_converts() {
        let parsed: std::result::Result<f64, serde_json::Error> = serde_json::from_str("{");
        let e: Error = parsed.unwrap_err().into();
        assert!(matches!(e, Error::Json(_)));
    }
}
