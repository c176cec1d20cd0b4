use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::codec::decode_file;
use crate::error::IntervalMixError;
use crate::track::AudioTrack;

/// Text-to-speech capability.
pub trait SpeechSynthesizer {
    /// Speak `text` in the synthesizer's fixed voice.
    ///
    /// `scratch_file` is a run-scoped path the implementation may write
    /// intermediate audio to; it is removed together with its directory once
    /// the generation run ends.
    fn speak(&self, text: &str, scratch_file: &Path) -> Result<AudioTrack, IntervalMixError>;
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for &T {
    fn speak(&self, text: &str, scratch_file: &Path) -> Result<AudioTrack, IntervalMixError> {
        (**self).speak(text, scratch_file)
    }
}

const VOICE: &str = "en";

/// Speech produced by an external espeak-compatible program
/// (`<program> -v en -w <file> <text>`).
#[derive(Clone, Debug)]
pub struct CommandSpeech {
    program: PathBuf,
}

impl CommandSpeech {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandSpeech {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl SpeechSynthesizer for CommandSpeech {
    fn speak(&self, text: &str, scratch_file: &Path) -> Result<AudioTrack, IntervalMixError> {
        debug!("speaking {text:?} with {}", self.program.display());
        let output = Command::new(&self.program)
            .arg("-v")
            .arg(VOICE)
            .arg("-w")
            .arg(scratch_file)
            .arg(text)
            .output()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => IntervalMixError::synthesis(
                    text,
                    format!("'{}' was not found", self.program.display()),
                ),
                _ => IntervalMixError::synthesis(
                    text,
                    format!("failed to launch '{}': {err}", self.program.display()),
                ),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IntervalMixError::synthesis(
                text,
                format!("'{}' exited with {}: {}", self.program.display(), output.status, stderr.trim()),
            ));
        }

        decode_file(scratch_file)
            .map_err(|err| IntervalMixError::synthesis(text, format!("unusable audio: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn missing_program_is_a_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let speech = CommandSpeech::new(dir.path().join("no-such-tts"));
        let err = speech
            .speak("Begin workout.", &dir.path().join("cue.wav"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Synthesis);
        assert!(err.to_string().contains("Begin workout."));
    }

    #[test]
    fn defaults_to_espeak_ng() {
        assert_eq!(CommandSpeech::default().program, PathBuf::from("espeak-ng"));
    }
}
