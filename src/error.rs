//! Crate-wide error type.
//!
//! Exit codes used by the `snia` binary:
//! - `2`: bad input (arguments, unreadable or malformed files, failed writes)
//! - `3`: empty or inconsistent data (mismatched array lengths, no bands)
//! - `4`: numerical failure (non-convergence, singular fits, non-finite results)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Check that two parallel sequences have the same length.
pub fn ensure_same_len(what: &str, a: usize, b: usize) -> Result<(), AppError> {
    if a != b {
        return Err(AppError::new(
            3,
            format!("Length mismatch in {what}: {a} vs {b}."),
        ));
    }
    Ok(())
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_same_len_reports_both_lengths() {
        assert!(ensure_same_len("x/w", 3, 3).is_ok());
        let err = ensure_same_len("x/w", 3, 2).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("3 vs 2"));
    }
}
