//! Microphone capture with local Parakeet transcription

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use flume::RecvTimeoutError;
use rubato::{FftFixedIn, Resampler};
use tracing::{debug, info, warn};
use transcribe_rs::{
    TranscriptionEngine,
    engines::parakeet::{ParakeetEngine, ParakeetModelParams},
};

use crate::config::ListenConfig;
use crate::error::ListenError;

use super::vad::{FRAME_SAMPLES, Segmenter, TARGET_RATE, VadEngine};
use super::{Recognizer, Transcribe, transcribe_with_fallback};

const RESAMPLE_CHUNK: usize = 1024;
const POLL: Duration = Duration::from_millis(200);

fn fatal(context: &str, e: impl std::fmt::Display) -> ListenError {
    ListenError::Fatal(format!("{}: {}", context, e))
}

// ============================================================================
// Transcription
// ============================================================================

pub struct ParakeetTranscriber {
    engine: ParakeetEngine,
}

impl ParakeetTranscriber {
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, ListenError> {
        let mut engine = ParakeetEngine::new();
        info!(path = %model_path.as_ref().display(), "loading transcription model");
        engine
            .load_model_with_params(model_path.as_ref(), ParakeetModelParams::int8())
            .map_err(|e| fatal("could not load transcription model", e))?;
        Ok(Self { engine })
    }

    #[hotpath::measure]
    fn run(&mut self, samples: &[f32]) -> Result<String, ListenError> {
        let result = self
            .engine
            .transcribe_samples(samples.to_vec(), None)
            .map_err(|e| ListenError::Transient(e.to_string()))?;
        Ok(result.text.trim().to_string())
    }
}

impl Transcribe for ParakeetTranscriber {
    fn transcribe(&mut self, samples: &[f32], language: &str) -> Result<String, ListenError> {
        // Parakeet picks the language itself; the tag labels the attempt
        debug!(language, samples = samples.len(), "transcribing");
        self.run(samples)
    }
}

// ============================================================================
// Capture
// ============================================================================

struct FrameResampler {
    resampler: Option<FftFixedIn<f32>>,
    in_buf: Vec<f32>,
    pending: Vec<f32>,
}

impl FrameResampler {
    fn new(in_hz: usize) -> Result<Self, ListenError> {
        let resampler = if in_hz == TARGET_RATE {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(in_hz, TARGET_RATE, RESAMPLE_CHUNK, 1, 1)
                    .map_err(|e| fatal("could not create resampler", e))?,
            )
        };
        Ok(Self {
            resampler,
            in_buf: Vec::with_capacity(RESAMPLE_CHUNK),
            pending: Vec::with_capacity(FRAME_SAMPLES * 2),
        })
    }

    /// Push mono input, emit 16kHz frames of `FRAME_SAMPLES`
    fn push(&mut self, src: &[f32], mut emit: impl FnMut(Vec<f32>)) {
        match self.resampler.as_mut() {
            None => self.pending.extend_from_slice(src),
            Some(resampler) => {
                self.in_buf.extend_from_slice(src);
                while self.in_buf.len() >= RESAMPLE_CHUNK {
                    let chunk: Vec<f32> = self.in_buf.drain(..RESAMPLE_CHUNK).collect();
                    if let Ok(out) = resampler.process(&[&chunk], None) {
                        if let Some(channel) = out.first() {
                            self.pending.extend_from_slice(channel);
                        }
                    }
                }
            }
        }
        while self.pending.len() >= FRAME_SAMPLES {
            emit(self.pending.drain(..FRAME_SAMPLES).collect());
        }
    }
}

/// Own the input stream on this thread and forward finished segments
fn capture_segments(
    vad: VadEngine,
    segments: flume::Sender<Vec<f32>>,
    ready: &flume::Sender<Result<(), ListenError>>,
    running: Arc<AtomicBool>,
) -> Result<(), ListenError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| ListenError::Fatal("no input device".into()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| fatal("could not read input config", e))?;
    let input_rate = u32::from(supported.sample_rate()) as usize;
    let channels = supported.channels() as usize;

    let mut resampler = FrameResampler::new(input_rate)?;
    let (frame_tx, frame_rx) = flume::unbounded::<Vec<f32>>();

    let stream = device
        .build_input_stream(
            &supported.config(),
            move |data: &[f32], _| {
                let mono: Vec<f32> = if channels == 1 {
                    data.to_vec()
                } else {
                    data.chunks(channels)
                        .map(|c| c.iter().sum::<f32>() / channels as f32)
                        .collect()
                };
                resampler.push(&mono, |frame| {
                    let _ = frame_tx.send(frame);
                });
            },
            |err| warn!(error = %err, "input stream error"),
            None,
        )
        .map_err(|e| fatal("could not open microphone", e))?;
    stream
        .play()
        .map_err(|e| fatal("could not start microphone", e))?;

    let mut segmenter = Segmenter::new(vad);
    info!(
        rate = input_rate,
        channels,
        vad = segmenter.vad_name(),
        "microphone open"
    );
    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        match frame_rx.recv_timeout(POLL) {
            Ok(frame) => {
                if let Some(segment) = segmenter.push(&frame) {
                    debug!(samples = segment.len(), "speech segment");
                    if segments.send(segment).is_err() {
                        break;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    drop(stream);
    Ok(())
}

/// Microphone recognizer: VAD-segmented capture on its own thread
pub struct MicRecognizer {
    segments: flume::Receiver<Vec<f32>>,
    transcriber: Box<dyn Transcribe>,
    primary: String,
    secondary: Option<String>,
    running: Arc<AtomicBool>,
    _worker: JoinHandle<()>,
}

impl MicRecognizer {
    pub fn start(config: &ListenConfig, running: Arc<AtomicBool>) -> Result<Self, ListenError> {
        let transcriber = ParakeetTranscriber::load(&config.model_path)?;
        let vad = match VadEngine::silero(&config.vad_model_path) {
            Ok(vad) => vad,
            Err(e) => {
                warn!(error = %e, "falling back to energy VAD");
                VadEngine::energy()
            }
        };

        let (seg_tx, seg_rx) = flume::unbounded();
        let (ready_tx, ready_rx) = flume::bounded(1);
        let flag = running.clone();
        let worker = thread::Builder::new()
            .name("mic".into())
            .spawn(move || {
                if let Err(e) = capture_segments(vad, seg_tx, &ready_tx, flag) {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| fatal("could not start capture thread", e))?;

        ready_rx
            .recv()
            .map_err(|_| ListenError::Fatal("capture thread exited".into()))??;

        Ok(Self {
            segments: seg_rx,
            transcriber: Box::new(transcriber),
            primary: config.primary_language.clone(),
            secondary: config.secondary_language.clone(),
            running,
            _worker: worker,
        })
    }
}

impl Recognizer for MicRecognizer {
    fn next_utterance(&mut self) -> Result<Option<String>, ListenError> {
        match self.segments.recv_timeout(POLL) {
            Ok(samples) => transcribe_with_fallback(
                self.transcriber.as_mut(),
                &samples,
                &self.primary,
                self.secondary.as_deref(),
            ),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) if !self.running.load(Ordering::SeqCst) => {
                Err(ListenError::Closed)
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(ListenError::Fatal("microphone stream ended".into()))
            }
        }
    }

    fn name(&self) -> &str {
        "microphone"
    }
}
