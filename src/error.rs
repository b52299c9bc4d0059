//! Error types for the effector boundaries
//!
//! None of these ever reach the user as a fault. The router and the assistant
//! turn them into sentences that can be spoken.

use thiserror::Error;

/// Failures from the desktop automation layer
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("{0} is not installed or could not be found")]
    NotFound(String),

    #[error("{0} does not appear to be running")]
    NotRunning(String),

    #[error("failed to launch {what}: {source}")]
    Launch {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("keyboard or mouse input failed: {0}")]
    Input(String),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not supported in this build")]
    Unsupported(&'static str),

    #[error("command exited with {0}")]
    CommandFailed(String),
}

/// Failures talking to the hosted chat model
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no chat backend configured")]
    Disabled,

    #[error("missing API key for {0}")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("empty response from model")]
    EmptyResponse,
}

/// Failures from text-to-speech playback
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("no text-to-speech program available")]
    NoEngine,

    #[error("speech playback failed: {0}")]
    Playback(#[from] std::io::Error),
}

/// Failures from the capture and recognition loop
#[derive(Debug, Error)]
pub enum ListenError {
    /// Recognition hiccup; the loop logs it and keeps going
    #[error("transient recognition error: {0}")]
    Transient(String),

    /// Input device or model unusable; the loop exits
    #[error("{0}")]
    Fatal(String),

    /// Input ended normally (EOF on typed input)
    #[error("input closed")]
    Closed,
}

impl ListenError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ListenError::Fatal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_read_as_sentences() {
        let err = AutomationError::NotFound("Microsoft Word".into());
        assert_eq!(
            err.to_string(),
            "Microsoft Word is not installed or could not be found"
        );

        let err = ChatError::Status {
            status: 401,
            body: "invalid api key".into(),
        };
        assert_eq!(err.to_string(), "server returned 401: invalid api key");
    }

    #[test]
    fn test_listen_error_taxonomy() {
        assert!(ListenError::Fatal("no input device".into()).is_fatal());
        assert!(!ListenError::Transient("timeout".into()).is_fatal());
        assert!(!ListenError::Closed.is_fatal());
    }
}
