//! Text-to-speech output
//!
//! [`Voice`] is what the assistant talks to: every response is spoken on its
//! own worker thread so the main loop never waits for audio. Overlapping
//! requests are allowed to race. Muting suppresses playback, never generation.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::config::SpeechConfig;
use crate::error::SpeechError;

/// Trait for speech engines; `say` blocks until playback finishes
pub trait Speaker: Send + Sync {
    fn say(&self, text: &str) -> Result<(), SpeechError>;
}

// ============================================================================
// Voice - mute gate + fire-and-forget playback
// ============================================================================

pub struct Voice {
    speaker: Arc<dyn Speaker>,
    muted: Arc<AtomicBool>,
}

impl Voice {
    pub fn new(speaker: Arc<dyn Speaker>) -> Self {
        Self {
            speaker,
            muted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start speaking `text` in the background; `None` if muted or empty
    pub fn speak(&self, text: &str) -> Option<JoinHandle<()>> {
        if text.trim().is_empty() || self.is_muted() {
            debug!(muted = self.is_muted(), "speech skipped");
            return None;
        }
        let speaker = Arc::clone(&self.speaker);
        let text = text.to_string();
        let spawned = thread::Builder::new()
            .name("speech".into())
            .spawn(move || {
                if let Err(e) = speaker.say(&text) {
                    warn!(error = %e, "speech failed");
                }
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "could not start speech thread");
                None
            }
        }
    }

    pub fn mute(&self) {
        self.muted.store(true, Ordering::SeqCst);
    }

    pub fn unmute(&self) {
        self.muted.store(false, Ordering::SeqCst);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }
}

// ============================================================================
// System speaker - platform TTS program
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    Say,
    Espeak(&'static str),
    SpdSay,
    PowerShell,
}

/// Speaks through whatever TTS program the platform ships
pub struct SystemSpeaker {
    engine: Engine,
    rate: u32,
    volume: f32,
    voice: Option<String>,
}

impl SystemSpeaker {
    pub fn from_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let engine = Self::detect().ok_or(SpeechError::NoEngine)?;
        debug!(?engine, "speech engine");
        Ok(Self {
            engine,
            rate: config.rate,
            volume: config.volume.clamp(0.0, 1.0),
            voice: config.voice.clone(),
        })
    }

    fn detect() -> Option<Engine> {
        if cfg!(target_os = "windows") {
            return Some(Engine::PowerShell);
        }
        if which::which("say").is_ok() && cfg!(target_os = "macos") {
            return Some(Engine::Say);
        }
        for program in ["espeak-ng", "espeak"] {
            if which::which(program).is_ok() {
                return Some(Engine::Espeak(program));
            }
        }
        if which::which("spd-say").is_ok() {
            return Some(Engine::SpdSay);
        }
        None
    }

    fn command(&self, text: &str) -> (Command, Option<String>) {
        match self.engine {
            Engine::Say => {
                let mut cmd = Command::new("say");
                cmd.arg("-r").arg(self.rate.to_string());
                if let Some(voice) = &self.voice {
                    cmd.arg("-v").arg(voice);
                }
                cmd.arg(text);
                (cmd, None)
            }
            Engine::Espeak(program) => {
                let mut cmd = Command::new(program);
                cmd.arg("-s")
                    .arg(self.rate.to_string())
                    .arg("-a")
                    .arg(((self.volume * 200.0) as u32).to_string());
                if let Some(voice) = &self.voice {
                    cmd.arg("-v").arg(voice);
                }
                cmd.arg(text);
                (cmd, None)
            }
            Engine::SpdSay => {
                let mut cmd = Command::new("spd-say");
                cmd.arg("--wait")
                    .arg("-r")
                    .arg(sapi_like_rate(self.rate, 10).to_string())
                    .arg(text);
                (cmd, None)
            }
            Engine::PowerShell => {
                // Text goes in on stdin so no quoting is needed
                let script = format!(
                    "Add-Type -AssemblyName System.Speech; \
                     $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
                     $s.Rate = {}; $s.Volume = {}; {} \
                     $s.Speak([Console]::In.ReadToEnd())",
                    sapi_like_rate(self.rate, 1),
                    (self.volume * 100.0) as u32,
                    self.voice
                        .as_ref()
                        .map(|v| format!("$s.SelectVoice('{}');", v.replace('\'', "")))
                        .unwrap_or_default(),
                );
                let mut cmd = Command::new("powershell");
                cmd.args(["-NoProfile", "-Command", &script]);
                (cmd, Some(text.to_string()))
            }
        }
    }
}

/// Map words per minute (~180 normal) onto a -10..10 style scale
fn sapi_like_rate(wpm: u32, scale: i32) -> i32 {
    (((wpm as i32 - 180) / 20) * scale).clamp(-10 * scale, 10 * scale)
}

impl Speaker for SystemSpeaker {
    fn say(&self, text: &str) -> Result<(), SpeechError> {
        let (mut cmd, stdin_text) = self.command(text);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        if stdin_text.is_some() {
            cmd.stdin(Stdio::piped());
        }
        let mut child = cmd.spawn()?;
        if let (Some(input), Some(mut stdin)) = (stdin_text, child.stdin.take()) {
            stdin.write_all(input.as_bytes())?;
        }
        child.wait()?;
        Ok(())
    }
}

// ============================================================================
// Silent speakers
// ============================================================================

/// Used when speech is disabled or no engine exists
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn say(&self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// Keeps everything it was asked to say
#[cfg(any(test, feature = "testing"))]
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: std::sync::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "testing"))]
impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Speaker for RecordingSpeaker {
    fn say(&self, text: &str) -> Result<(), SpeechError> {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
        Ok(())
    }
}

/// Speaker for the configured settings, falling back to silence
pub fn speaker_from_config(config: &SpeechConfig) -> Arc<dyn Speaker> {
    if !config.enabled {
        return Arc::new(NullSpeaker);
    }
    match SystemSpeaker::from_config(config) {
        Ok(speaker) => Arc::new(speaker),
        Err(e) => {
            warn!(error = %e, "speech disabled");
            Arc::new(NullSpeaker)
        }
    }
}
