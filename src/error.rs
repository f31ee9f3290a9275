//! Fatal error categories for a pipeline run.
//!
//! Each variant maps to its own log message in `main.rs`; all of them end the
//! process with exit code 1.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    // ---
    #[error("{}", .0.display())]
    InputMissing(PathBuf),

    #[error("{0}")]
    Connect(#[source] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Prefix used when the error is reported at exit; the `Display` text carries
    /// only the detail.
    pub fn category(&self) -> &'static str {
        // ---
        match self {
            PipelineError::InputMissing(_) => "File not found",
            PipelineError::Connect(_) => "Database connection failed",
            PipelineError::Other(_) => "Unexpected error",
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_categories_are_distinct() {
        // ---
        let missing = PipelineError::InputMissing(PathBuf::from("/tmp/none.csv"));
        let connect = PipelineError::Connect(sqlx::Error::PoolTimedOut);
        let other = PipelineError::from(anyhow::anyhow!("boom"));

        assert_eq!(missing.category(), "File not found");
        assert_eq!(connect.category(), "Database connection failed");
        assert_eq!(other.category(), "Unexpected error");
        assert_eq!(missing.to_string(), "/tmp/none.csv");
        assert_eq!(connect.to_string(), sqlx::Error::PoolTimedOut.to_string());
        assert_eq!(other.to_string(), "boom");
    }
}
