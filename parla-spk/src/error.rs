//! Error types for parla-spk

use parla_core::Error as CoreError;
use thiserror::Error;

/// Speech errors
#[derive(Error, Debug)]
pub enum SpeechError {
    /// An utterance is already in flight; the new request was dropped
    #[error("The app is already speaking")]
    AlreadySpeaking,

    /// The request text was empty or whitespace only
    #[error("Message cannot be blank")]
    EmptyText,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl SpeechError {
    /// Pre-flight rejections never reach the engine
    pub fn is_rejection(&self) -> bool {
        matches!(self, SpeechError::AlreadySpeaking | SpeechError::EmptyText)
    }
}

impl From<SpeechError> for CoreError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Core(inner) => inner,
            SpeechError::Config(msg) => CoreError::Configuration(msg),
            other => CoreError::Speech(other.to_string()),
        }
    }
}
