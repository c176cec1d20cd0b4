use std::path::PathBuf;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

use crate::track::AudioFormat;

/// Errors that can occur while generating a workout track.
#[derive(Debug, Error)]
pub enum IntervalMixError {
    /// A source file could not be found or opened.
    #[error("input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    /// A source file exists but could not be opened.
    #[error("cannot read '{}': {reason}", .path.display())]
    UnreadableInput { path: PathBuf, reason: String },

    /// The output path has no file name or no extension to pick a container from.
    #[error("invalid output path: {}", .0.display())]
    InvalidOutputPath(PathBuf),

    /// The container of a source file is not one the decoder understands.
    #[error("unsupported audio format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The stream lacks a default track, a sample rate or a usable codec.
    #[error("'{}' does not contain a decodable audio track", .0.display())]
    UndecodableInput(PathBuf),

    /// A source track decoded to zero frames.
    #[error("audio track '{0}' is empty")]
    EmptyTrack(String),

    /// Extraction was requested from a track without any audio.
    #[error("cannot extract audio from a zero-length track")]
    ZeroLengthSource,

    /// A segment too long to hold in memory was requested.
    #[error("cannot extract {0} ms of audio: segment is too long")]
    SegmentTooLong(u64),

    /// Work, recovery or round values outside their permitted range.
    #[error("invalid workout plan: {0}")]
    InvalidPlan(String),

    /// A `M:SS` duration string could not be parsed.
    #[error("invalid duration label '{0}', expected M:SS")]
    InvalidDurationLabel(String),

    /// Error returned when the output file already exists and overwriting is disabled.
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Error returned when the directory holding the output file is missing.
    #[error("output directory does not exist: {}", .0.display())]
    MissingOutputDirectory(PathBuf),

    /// The text-to-speech collaborator failed or produced unusable audio.
    #[error("speech synthesis failed for \"{text}\": {reason}")]
    Synthesis { text: String, reason: String },

    /// Encoding, transcoding or persisting the output file failed.
    #[error("failed to export '{}': {reason}", .path.display())]
    Export { path: PathBuf, reason: String },

    /// Two buffers with different sample layouts were joined.
    #[error("cannot join audio in {left} with audio in {right}")]
    FormatMismatch { left: AudioFormat, right: AudioFormat },

    /// The time-stretch processor returned no audio.
    #[error("tempo processing produced no audio")]
    TempoFailed,

    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification reported to the front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Synthesis,
    Export,
    Unexpected,
}

impl IntervalMixError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput(_)
            | Self::UnreadableInput { .. }
            | Self::InvalidOutputPath(_)
            | Self::UnsupportedFormat(_)
            | Self::UndecodableInput(_)
            | Self::EmptyTrack(_)
            | Self::ZeroLengthSource
            | Self::SegmentTooLong(_)
            | Self::InvalidPlan(_)
            | Self::InvalidDurationLabel(_)
            | Self::OutputExists(_)
            | Self::MissingOutputDirectory(_) => ErrorKind::InvalidInput,
            Self::Synthesis { .. } => ErrorKind::Synthesis,
            Self::Export { .. } => ErrorKind::Export,
            Self::FormatMismatch { .. }
            | Self::TempoFailed
            | Self::Symphonia(_)
            | Self::Io(_) => ErrorKind::Unexpected,
        }
    }

    pub fn synthesis(text: &str, reason: impl Into<String>) -> Self {
        Self::Synthesis {
            text: text.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn export(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Export {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Synthesis => "synthesis error",
            ErrorKind::Export => "export error",
            ErrorKind::Unexpected => "unexpected error",
        };
        f.write_str(label)
    }
}
