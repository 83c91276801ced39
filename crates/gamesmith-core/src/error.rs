//! Generation error types.
//!
//! Every failure of a generation run surfaces through [`GenerationError`].
//! Only [`GenerationError::UserInput`] is raised before any network activity;
//! all other variants are reported on the status channel by the flow.

/// Unified error type for the generation flow.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    // -- Input errors --------------------------------------------------------
    /// The prompt was empty or whitespace-only.
    #[error("please enter a game description")]
    UserInput,

    /// A generation is already running on this flow.
    #[error("a generation is already in progress")]
    Busy,

    // -- Attempt errors ------------------------------------------------------
    /// Every attempt hit the per-attempt timeout.
    #[error("request timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The transport failed for a reason other than the timeout.
    #[error("request failed: {reason}")]
    Transport { reason: String },

    /// The caller cancelled the run.
    #[error("generation cancelled")]
    Cancelled,

    // -- Server-reported errors ----------------------------------------------
    /// The endpoint reported that the requested model does not exist.
    #[error("AI model unavailable, please try again later ({message})")]
    ModelUnavailable { message: String },

    /// The endpoint reported a generic failure.
    #[error("AI generation failed: {message}")]
    Generation { message: String },

    // -- Decoding and runtime errors -----------------------------------------
    /// The response body did not have the expected shape.
    #[error("unexpected response: {reason}")]
    Unexpected { reason: String },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    Config { reason: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GenerationError>;

impl GenerationError {
    /// Whether this error was raised before the flow touched the network.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UserInput | Self::Busy)
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected {
            reason: format!("invalid JSON: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified() {
        assert!(GenerationError::UserInput.is_input_error());
        assert!(GenerationError::Busy.is_input_error());
        assert!(!GenerationError::Timeout { attempts: 4 }.is_input_error());
        assert!(!GenerationError::Cancelled.is_input_error());
    }

    #[test]
    fn json_errors_become_unexpected() {
        let err: GenerationError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, GenerationError::Unexpected { .. }));
    }

    #[test]
    fn timeout_message_names_attempts() {
        let err = GenerationError::Timeout { attempts: 4 };
        assert_eq!(err.to_string(), "request timed out after 4 attempts");
    }
}
