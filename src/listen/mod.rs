//! Speech (or typed) input
//!
//! A [`Recognizer`] produces utterance text; [`run_capture`] drives it on a
//! background thread and forwards [`ListenEvent`]s over a flume channel. The
//! capture thread never touches assistant state.

mod keyboard;
#[cfg(feature = "mic")]
mod mic;
#[cfg(feature = "mic")]
mod vad;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::error::ListenError;
use crate::ui::Status;

pub use keyboard::KeyboardRecognizer;
#[cfg(feature = "mic")]
pub use mic::{MicRecognizer, ParakeetTranscriber};

/// Messages from the capture thread to the main loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenEvent {
    Status(Status),
    Utterance(String),
}

/// Blocking source of recognized text
pub trait Recognizer: Send {
    /// Next utterance. `Ok(None)` means nothing this round (silence, timeout).
    fn next_utterance(&mut self) -> Result<Option<String>, ListenError>;

    fn name(&self) -> &str;
}

/// Speech-to-text over one captured segment
pub trait Transcribe: Send {
    fn transcribe(&mut self, samples: &[f32], language: &str) -> Result<String, ListenError>;
}

/// Try `primary`, then `secondary`; `Ok(None)` when every attempt failed or was empty
pub fn transcribe_with_fallback(
    engine: &mut dyn Transcribe,
    samples: &[f32],
    primary: &str,
    secondary: Option<&str>,
) -> Result<Option<String>, ListenError> {
    for language in std::iter::once(primary).chain(secondary) {
        match engine.transcribe(samples, language) {
            Ok(text) if !text.trim().is_empty() => {
                debug!(language, "transcribed");
                return Ok(Some(text.trim().to_string()));
            }
            Ok(_) => debug!(language, "empty transcription"),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!(language, error = %e, "transcription failed"),
        }
    }
    Ok(None)
}

/// Capture loop; returns when `running` is cleared, input closes, or a fatal error occurs
///
/// The stop flag is checked between iterations only; a recognition call in
/// flight is allowed to finish.
pub fn run_capture(
    mut recognizer: Box<dyn Recognizer>,
    tx: flume::Sender<ListenEvent>,
    running: Arc<AtomicBool>,
) {
    info!(source = recognizer.name(), "capture started");
    let _ = tx.send(ListenEvent::Status(Status::Listening));

    while running.load(Ordering::SeqCst) {
        match recognizer.next_utterance() {
            Ok(Some(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if tx.send(ListenEvent::Utterance(text.to_string())).is_err() {
                    debug!("receiver gone");
                    return;
                }
            }
            Ok(None) => {}
            Err(ListenError::Closed) => {
                info!("input closed");
                break;
            }
            Err(e) if e.is_fatal() => {
                error!(error = %e, "capture stopped");
                let _ = tx.send(ListenEvent::Status(Status::Error(e.to_string())));
                return;
            }
            Err(e) => warn!(error = %e, "recognition error, continuing"),
        }
    }

    let _ = tx.send(ListenEvent::Status(Status::Stopped));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Result<Option<String>, ListenError>>);

    impl Recognizer for Scripted {
        fn next_utterance(&mut self) -> Result<Option<String>, ListenError> {
            self.0.pop_front().unwrap_or(Err(ListenError::Closed))
        }
        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn collect(script: Vec<Result<Option<String>, ListenError>>) -> Vec<ListenEvent> {
        let (tx, rx) = flume::unbounded();
        run_capture(
            Box::new(Scripted(script.into())),
            tx,
            Arc::new(AtomicBool::new(true)),
        );
        rx.drain().collect()
    }

    #[test]
    fn test_transient_errors_do_not_stop_capture() {
        let events = collect(vec![
            Ok(Some("open notepad".into())),
            Err(ListenError::Transient("network".into())),
            Ok(None),
            Ok(Some("  ".into())),
            Ok(Some("type hello".into())),
        ]);
        assert_eq!(
            events,
            vec![
                ListenEvent::Status(Status::Listening),
                ListenEvent::Utterance("open notepad".into()),
                ListenEvent::Utterance("type hello".into()),
                ListenEvent::Status(Status::Stopped),
            ]
        );
    }

    #[test]
    fn test_fatal_error_reports_and_exits() {
        let events = collect(vec![
            Err(ListenError::Fatal("no input device".into())),
            Ok(Some("never seen".into())),
        ]);
        assert_eq!(
            events,
            vec![
                ListenEvent::Status(Status::Listening),
                ListenEvent::Status(Status::Error("no input device".into())),
            ]
        );
    }

    #[test]
    fn test_stop_flag_checked_between_iterations() {
        let (tx, rx) = flume::unbounded();
        let running = Arc::new(AtomicBool::new(false));
        run_capture(
            Box::new(Scripted(vec![Ok(Some("hello".into()))].into())),
            tx,
            running,
        );
        let events: Vec<_> = rx.drain().collect();
        assert_eq!(
            events,
            vec![
                ListenEvent::Status(Status::Listening),
                ListenEvent::Status(Status::Stopped),
            ]
        );
    }

    struct FailsFor(&'static str);

    impl Transcribe for FailsFor {
        fn transcribe(&mut self, _: &[f32], language: &str) -> Result<String, ListenError> {
            if language == self.0 {
                Err(ListenError::Transient("request failed".into()))
            } else {
                Ok(format!("heard in {}", language))
            }
        }
    }

    #[test]
    fn test_language_fallback() {
        let mut engine = FailsFor("en");
        assert_eq!(
            transcribe_with_fallback(&mut engine, &[], "en", Some("ur")).unwrap(),
            Some("heard in ur".into())
        );
        assert_eq!(
            transcribe_with_fallback(&mut engine, &[], "en", None).unwrap(),
            None
        );
        let mut engine = FailsFor("xx");
        assert_eq!(
            transcribe_with_fallback(&mut engine, &[], "en", Some("ur")).unwrap(),
            Some("heard in en".into())
        );
    }
}
