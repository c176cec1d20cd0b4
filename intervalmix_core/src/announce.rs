use std::path::Path;

use log::debug;
use tempfile::TempDir;

use crate::error::IntervalMixError;
use crate::speech::SpeechSynthesizer;
use crate::tempo::change_tempo;
use crate::track::AudioTrack;

/// Playback speed applied to every spoken line.
pub const ANNOUNCEMENT_TEMPO: f64 = 1.25;

/// Turns text into sped-up speech for one generation run.
///
/// Scratch files live in a private temporary directory that is deleted when
/// the synthesizer is dropped, whether the run succeeded or not.
pub struct AnnouncementSynthesizer<S> {
    speech: S,
    tempo: f64,
    scratch: TempDir,
    spoken: usize,
}

impl<S: SpeechSynthesizer> AnnouncementSynthesizer<S> {
    pub fn new(speech: S) -> Result<Self, IntervalMixError> {
        let scratch = tempfile::Builder::new()
            .prefix("intervalmix-speech-")
            .tempdir()?;
        Ok(Self {
            speech,
            tempo: ANNOUNCEMENT_TEMPO,
            scratch,
            spoken: 0,
        })
    }

    /// Override the playback speed. `1.0` leaves speech untouched.
    pub fn with_tempo(mut self, tempo: f64) -> Self {
        self.tempo = tempo;
        self
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn synthesize(&mut self, text: &str) -> Result<AudioTrack, IntervalMixError> {
        self.spoken += 1;
        let scratch_file = self
            .scratch
            .path()
            .join(format!("announcement-{:02}.wav", self.spoken));

        let speech = self.speech.speak(text, &scratch_file)?;
        let format = speech.format();
        if format.channels == 0 || format.sample_rate == 0 {
            return Err(IntervalMixError::synthesis(
                text,
                format!("speech synthesizer returned audio in an invalid format ({format})"),
            ));
        }
        if speech.is_empty() {
            return Err(IntervalMixError::synthesis(
                text,
                "speech synthesizer returned no audio",
            ));
        }

        let compressed = change_tempo(&speech, self.tempo)?;
        debug!(
            "announcement {:?}: {} ms spoken, {} ms after tempo {}",
            text,
            speech.duration_ms(),
            compressed.duration_ms(),
            self.tempo
        );
        Ok(compressed)
    }
}
