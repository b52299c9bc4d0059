//! Voice activity detection and utterance segmentation

use std::collections::VecDeque;

use vad_rs::Vad;

use crate::error::ListenError;

pub const TARGET_RATE: usize = 16000;
/// 30ms frames at 16kHz
pub const FRAME_SAMPLES: usize = 480;

const VAD_THRESHOLD: f32 = 0.3;
const VAD_THRESHOLD_END: f32 = 0.25;
const ENERGY_THRESHOLD: f32 = 0.01;
const ENERGY_THRESHOLD_END: f32 = 0.006;

const MIN_SPEECH_SAMPLES: usize = TARGET_RATE / 2;
const MAX_SPEECH_SAMPLES: usize = TARGET_RATE * 10;
const SILENCE_FRAMES_TO_END: usize = 15;
const PREFILL_FRAMES: usize = 10;
const ONSET_FRAMES: usize = 3;

pub enum VadEngine {
    Silero(Vad),
    Energy,
}

impl VadEngine {
    pub fn silero(model_path: &str) -> Result<Self, ListenError> {
        let vad = Vad::new(model_path, TARGET_RATE)
            .map_err(|e| ListenError::Fatal(format!("could not load VAD model: {}", e)))?;
        Ok(VadEngine::Silero(vad))
    }

    pub fn energy() -> Self {
        VadEngine::Energy
    }

    /// Lower threshold once speech has started so trailing syllables are kept
    pub fn is_speech(&mut self, frame: &[f32], currently_speaking: bool) -> bool {
        match self {
            VadEngine::Silero(vad) => {
                let threshold = if currently_speaking {
                    VAD_THRESHOLD_END
                } else {
                    VAD_THRESHOLD
                };
                vad.compute(frame)
                    .map(|r| r.prob > threshold)
                    .unwrap_or(false)
            }
            VadEngine::Energy => {
                let threshold = if currently_speaking {
                    ENERGY_THRESHOLD_END
                } else {
                    ENERGY_THRESHOLD
                };
                rms(frame) > threshold
            }
        }
    }

    pub fn reset(&mut self) {
        if let VadEngine::Silero(vad) = self {
            vad.reset();
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VadEngine::Silero(_) => "Silero",
            VadEngine::Energy => "Energy",
        }
    }
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Onset(usize),
    Speaking(usize),
}

/// Turns a stream of frames into whole utterances
pub struct Segmenter {
    vad: VadEngine,
    state: State,
    speech: Vec<f32>,
    prefill: VecDeque<Vec<f32>>,
}

impl Segmenter {
    pub fn new(vad: VadEngine) -> Self {
        Self {
            vad,
            state: State::Idle,
            speech: Vec::with_capacity(MAX_SPEECH_SAMPLES),
            prefill: VecDeque::with_capacity(PREFILL_FRAMES + 1),
        }
    }

    pub fn vad_name(&self) -> &'static str {
        self.vad.name()
    }

    fn remember(&mut self, frame: &[f32]) {
        self.prefill.push_back(frame.to_vec());
        if self.prefill.len() > PREFILL_FRAMES {
            self.prefill.pop_front();
        }
    }

    /// Feed one frame; returns a finished segment when speech ends
    pub fn push(&mut self, frame: &[f32]) -> Option<Vec<f32>> {
        let speaking = matches!(self.state, State::Speaking(_));
        let is_speech = self.vad.is_speech(frame, speaking);

        match self.state {
            State::Idle => {
                if is_speech {
                    self.state = State::Onset(1);
                }
                self.remember(frame);
            }
            State::Onset(count) => {
                self.remember(frame);
                if !is_speech {
                    self.state = State::Idle;
                } else if count + 1 >= ONSET_FRAMES {
                    for f in self.prefill.drain(..) {
                        self.speech.extend_from_slice(&f);
                    }
                    self.state = State::Speaking(0);
                } else {
                    self.state = State::Onset(count + 1);
                }
            }
            State::Speaking(silence) => {
                self.speech.extend_from_slice(frame);
                self.state = State::Speaking(if is_speech { 0 } else { silence + 1 });
            }
        }

        let done = match self.state {
            State::Speaking(silence) => {
                silence >= SILENCE_FRAMES_TO_END || self.speech.len() >= MAX_SPEECH_SAMPLES
            }
            _ => false,
        };
        if !done {
            return None;
        }

        self.state = State::Idle;
        self.vad.reset();
        let samples = std::mem::take(&mut self.speech);
        (samples.len() >= MIN_SPEECH_SAMPLES).then_some(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone() -> Vec<f32> {
        (0..FRAME_SAMPLES)
            .map(|i| if i % 2 == 0 { 0.2 } else { -0.2 })
            .collect()
    }

    #[test]
    fn test_energy_segmenter_emits_after_silence() {
        let mut seg = Segmenter::new(VadEngine::energy());
        let silence = vec![0.0; FRAME_SAMPLES];

        let mut out = None;
        for _ in 0..40 {
            assert!(seg.push(&tone()).is_none());
        }
        for _ in 0..SILENCE_FRAMES_TO_END {
            if let Some(s) = seg.push(&silence) {
                out = Some(s);
            }
        }
        let samples = out.expect("segment after trailing silence");
        assert!(samples.len() >= 40 * FRAME_SAMPLES);
    }

    #[test]
    fn test_short_blips_are_dropped() {
        let mut seg = Segmenter::new(VadEngine::energy());
        let silence = vec![0.0; FRAME_SAMPLES];
        for _ in 0..ONSET_FRAMES - 1 {
            seg.push(&tone());
        }
        for _ in 0..SILENCE_FRAMES_TO_END + 2 {
            assert!(seg.push(&silence).is_none());
        }
    }
}
