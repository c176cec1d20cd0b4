use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::error::IntervalMixError;
use crate::track::{AudioFormat, AudioTrack};

/// File IO for whole audio tracks.
pub trait AudioCodec {
    /// Decode the file at `path` into memory.
    fn decode(&self, path: &Path) -> Result<AudioTrack, IntervalMixError>;

    /// Write `track` to `path`, choosing the container from the file extension.
    ///
    /// Implementations must not leave a partially written file at `path`.
    fn encode(&self, track: &AudioTrack, path: &Path) -> Result<(), IntervalMixError>;
}

/// Symphonia decoding, WAV encoding with hound and an `ffmpeg` hand-off for
/// every other output container.
#[derive(Clone, Debug)]
pub struct DefaultCodec {
    ffmpeg: PathBuf,
}

impl DefaultCodec {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }
}

impl Default for DefaultCodec {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl AudioCodec for DefaultCodec {
    fn decode(&self, path: &Path) -> Result<AudioTrack, IntervalMixError> {
        decode_file(path)
    }

    fn encode(&self, track: &AudioTrack, path: &Path) -> Result<(), IntervalMixError> {
        let extension = output_extension(path)?;
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        // Stage next to the target so the final rename stays on one filesystem.
        let staged = tempfile::Builder::new()
            .prefix(".intervalmix-")
            .suffix(&format!(".{extension}"))
            .tempfile_in(parent)
            .map_err(|err| IntervalMixError::export(path, err))?;

        if extension == "wav" {
            write_wav(track, staged.path()).map_err(|err| IntervalMixError::export(path, err))?;
        } else {
            let scratch = tempfile::tempdir().map_err(|err| IntervalMixError::export(path, err))?;
            let wav_path = scratch.path().join("mix.wav");
            write_wav(track, &wav_path).map_err(|err| IntervalMixError::export(path, err))?;
            transcode(&self.ffmpeg, &wav_path, staged.path())
                .map_err(|reason| IntervalMixError::export(path, reason))?;
        }

        staged
            .persist(path)
            .map_err(|err| IntervalMixError::export(path, err.error))?;
        info!(
            "wrote {} ms of audio to '{}'",
            track.duration_ms(),
            path.display()
        );
        Ok(())
    }
}

/// Decode an audio file into an in-memory [`AudioTrack`].
pub fn decode_file(path: &Path) -> Result<AudioTrack, IntervalMixError> {
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => IntervalMixError::MissingInput(path.to_path_buf()),
        _ => IntervalMixError::UnreadableInput {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let opened = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| match err {
            SymphoniaError::Unsupported(_) | SymphoniaError::IoError(_) => {
                IntervalMixError::UnsupportedFormat(path.to_path_buf())
            }
            other => IntervalMixError::Symphonia(other),
        })?;
    let mut reader = opened.format;

    let track = reader
        .default_track()
        .ok_or_else(|| IntervalMixError::UndecodableInput(path.to_path_buf()))?;
    if track.codec_params.codec == CODEC_TYPE_NULL {
        return Err(IntervalMixError::UndecodableInput(path.to_path_buf()));
    }
    let track_id = track.id;

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| match err {
            SymphoniaError::Unsupported(_) => IntervalMixError::UndecodableInput(path.to_path_buf()),
            other => IntervalMixError::Symphonia(other),
        })?;

    // Header values, replaced by the first decoded buffer's spec.
    let mut format = track.codec_params.sample_rate.map(|rate| {
        let channels = track.codec_params.channels.map_or(0, |c| c.count());
        AudioFormat::new(rate, channels as u16)
    });
    let mut samples: Vec<f32> = Vec::new();
    let mut last_layout = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(IntervalMixError::from(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!("skipping undecodable packet in '{}': {reason}", path.display());
                continue;
            }
            Err(err) => return Err(IntervalMixError::from(err)),
        };

        let spec = *decoded.spec();
        let layout = AudioFormat::new(spec.rate, spec.channels.count() as u16);
        let target = match format {
            Some(current) if !samples.is_empty() => current,
            _ => {
                format = Some(layout);
                layout
            }
        };
        if layout != target && last_layout != Some(layout) {
            warn!(
                "'{}' changed layout from {target} to {layout} mid-stream; converting",
                path.display()
            );
        }
        last_layout = Some(layout);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        append_in_layout(&mut samples, target, buffer.samples(), layout);
    }

    let format = match format {
        Some(format) if format.sample_rate > 0 && format.channels > 0 => format,
        _ => return Err(IntervalMixError::UndecodableInput(path.to_path_buf())),
    };
    let track = AudioTrack::new(samples, format);
    debug!(
        "decoded '{}': {} frames, {format}, {} ms",
        path.display(),
        track.frames(),
        track.duration_ms()
    );
    Ok(track)
}

/// Append `chunk`, decoded in `layout`, to samples held in `target`.
fn append_in_layout(samples: &mut Vec<f32>, target: AudioFormat, chunk: &[f32], layout: AudioFormat) {
    if layout == target {
        samples.extend_from_slice(chunk);
    } else {
        let converted = AudioTrack::new(chunk.to_vec(), layout).conform(target);
        samples.extend_from_slice(converted.samples());
    }
}

fn output_extension(path: &Path) -> Result<String, IntervalMixError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| IntervalMixError::InvalidOutputPath(path.to_path_buf()))
}

fn write_wav(track: &AudioTrack, path: &Path) -> Result<(), hound::Error> {
    let format = track.format();
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in track.samples() {
        let scaled = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()
}

fn transcode(ffmpeg: &Path, input: &Path, output: &Path) -> Result<(), String> {
    debug!(
        "transcoding '{}' to '{}' with {}",
        input.display(),
        output.display(),
        ffmpeg.display()
    );
    let result = Command::new(ffmpeg)
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(input)
        .arg(output)
        .output()
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => format!("'{}' was not found", ffmpeg.display()),
            _ => format!("failed to launch '{}': {err}", ffmpeg.display()),
        })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(format!(
            "'{}' exited with {}: {}",
            ffmpeg.display(),
            result.status,
            stderr.trim()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tone(format: AudioFormat, duration_ms: u64) -> AudioTrack {
        let frames = format.ms_to_frames(duration_ms);
        let mut samples = Vec::with_capacity(frames * usize::from(format.channels));
        for n in 0..frames {
            let theta = n as f32 / format.sample_rate as f32 * std::f32::consts::TAU * 440.0;
            for _ in 0..format.channels {
                samples.push(theta.sin() * 0.5);
            }
        }
        AudioTrack::new(samples, format)
    }

    #[test]
    fn wav_export_decodes_back_with_same_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mix.wav");
        let format = AudioFormat::new(8_000, 2);
        let track = tone(format, 750);

        DefaultCodec::default().encode(&track, &path).unwrap();
        let decoded = DefaultCodec::default().decode(&path).unwrap();

        assert_eq!(decoded.format(), format);
        assert_eq!(decoded.frames(), track.frames());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "staging file left behind: {leftovers:?}");
    }

    #[test]
    fn buffers_in_a_new_layout_are_converted_to_the_first_one() {
        let stereo = AudioFormat::new(8_000, 2);
        let mut samples = vec![0.1, 0.1, 0.2, 0.2];
        append_in_layout(&mut samples, stereo, &[0.3, 0.3], stereo);
        assert_eq!(samples.len(), 6);

        let mono = AudioFormat::new(8_000, 1);
        append_in_layout(&mut samples, stereo, &[0.5, 0.7], mono);
        assert_eq!(samples.len(), 10);
        assert_eq!(&samples[6..], &[0.5, 0.5, 0.7, 0.7]);

        let fast = AudioFormat::new(16_000, 2);
        append_in_layout(&mut samples, stereo, &[0.0; 8], fast);
        let track = AudioTrack::new(samples, stereo);
        assert_eq!(track.frames(), 7);
    }

    #[test]
    fn missing_input_is_reported_as_such() {
        let err = decode_file(Path::new("definitely/not/here.mp3")).unwrap_err();
        assert!(matches!(err, IntervalMixError::MissingInput(_)));
    }

    #[test]
    fn garbage_input_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        fs::write(&path, b"not an audio file").unwrap();
        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, IntervalMixError::UnsupportedFormat(_)));
    }

    #[test]
    fn output_without_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let track = tone(AudioFormat::new(8_000, 1), 10);
        let err = DefaultCodec::default()
            .encode(&track, &dir.path().join("workout"))
            .unwrap_err();
        assert!(matches!(err, IntervalMixError::InvalidOutputPath(_)));
    }

    #[test]
    fn failed_transcode_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workout.mp3");
        let track = tone(AudioFormat::new(8_000, 1), 10);
        let codec = DefaultCodec::new(dir.path().join("no-such-ffmpeg"));

        let err = codec.encode(&track, &path).unwrap_err();
        assert!(matches!(err, IntervalMixError::Export { .. }));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
