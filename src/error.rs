use thiserror::Error;

/// Message shown for every rejected analysis; the offending field is never named.
pub const CHECK_INPUTS: &str = "Check your inputs";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Analysis inputs outside the model's domain. Surfaced as a generic modal.
    #[error("invalid input: {0}")]
    Validation(&'static str),

    /// Field text that is not a number. Swallowed by the input synchronizer.
    #[error("not a number: {0:?}")]
    Parse(String),

    /// Export requested before any chart exists.
    #[error("no chart to export yet")]
    Precondition,
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) => CHECK_INPUTS,
            // Unreachable from the UI: commit failures are swallowed before any notice.
            AppError::Parse(_) => CHECK_INPUTS,
            AppError::Precondition => "Analyze first!",
        }
    }
}
