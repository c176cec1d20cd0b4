use std::fmt;

use crate::error::IntervalMixError;

/// Sample layout shared by every buffer that is joined into one timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Number of whole frames that fit into `ms` milliseconds.
    pub fn ms_to_frames(&self, ms: u64) -> usize {
        let frames = u128::from(ms) * u128::from(self.sample_rate) / 1_000;
        frames.try_into().unwrap_or(usize::MAX)
    }

    /// Duration of `frames` frames, rounded to the nearest millisecond.
    pub fn frames_to_ms(&self, frames: usize) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let rate = u128::from(self.sample_rate);
        let ms = (frames as u128 * 1_000 + rate / 2) / rate;
        ms.try_into().unwrap_or(u64::MAX)
    }

    /// The smallest layout able to hold both inputs without loss.
    pub fn widest(self, other: AudioFormat) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate.max(other.sample_rate),
            channels: self.channels.max(other.channels),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz/{}ch", self.sample_rate, self.channels)
    }
}

/// Decoded audio held in memory as interleaved samples in `[-1.0, 1.0]`.
///
/// Operations never modify `self`; slicing, joining and conforming return
/// new buffers so a loaded source track can be shared read-only for a whole
/// generation run.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    samples: Vec<f32>,
    format: AudioFormat,
}

impl AudioTrack {
    /// Wrap interleaved samples. A trailing partial frame is dropped.
    pub fn new(mut samples: Vec<f32>, format: AudioFormat) -> Self {
        let channels = usize::from(format.channels.max(1));
        let whole = samples.len() - samples.len() % channels;
        samples.truncate(whole);
        Self { samples, format }
    }

    pub fn empty(format: AudioFormat) -> Self {
        Self::new(Vec::new(), format)
    }

    pub fn silent(duration_ms: u64, format: AudioFormat) -> Self {
        let len = format.ms_to_frames(duration_ms) * usize::from(format.channels);
        Self::new(vec![0.0; len], format)
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channel_count()
    }

    pub fn duration_ms(&self) -> u64 {
        self.format.frames_to_ms(self.frames())
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copy `length_ms` starting at `start_ms`, clamped to the end of the track.
    pub fn slice(&self, start_ms: u64, length_ms: u64) -> AudioTrack {
        self.slice_frames(
            self.format.ms_to_frames(start_ms),
            self.format.ms_to_frames(length_ms),
        )
    }

    pub(crate) fn slice_frames(&self, start: usize, len: usize) -> AudioTrack {
        let frames = self.frames();
        let start = start.min(frames);
        let len = len.min(frames - start);
        let channels = self.channel_count();
        let range = start * channels..(start + len) * channels;
        AudioTrack {
            samples: self.samples[range].to_vec(),
            format: self.format,
        }
    }

    /// Join `parts` in order. Every part must already be in `format`.
    pub fn concat<'a, I>(format: AudioFormat, parts: I) -> Result<AudioTrack, IntervalMixError>
    where
        I: IntoIterator<Item = &'a AudioTrack>,
    {
        let mut joined = AudioTrack::empty(format);
        for part in parts {
            joined.append(part)?;
        }
        Ok(joined)
    }

    pub(crate) fn append(&mut self, other: &AudioTrack) -> Result<(), IntervalMixError> {
        if other.format != self.format {
            return Err(IntervalMixError::FormatMismatch {
                left: self.format,
                right: other.format,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Convert to `target`, remixing channels and resampling linearly.
    pub fn conform(&self, target: AudioFormat) -> AudioTrack {
        if self.format == target {
            return self.clone();
        }
        let remixed = remix_channels(&self.samples, self.format.channels, target.channels);
        let resampled = resample_linear(
            &remixed,
            usize::from(target.channels),
            self.format.sample_rate,
            target.sample_rate,
        );
        AudioTrack::new(resampled, target)
    }

    fn channel_count(&self) -> usize {
        usize::from(self.format.channels.max(1))
    }
}

fn remix_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    let from = usize::from(from.max(1));
    let to = usize::from(to.max(1));
    if from == to {
        return samples.to_vec();
    }

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            // Extra output channels reuse the last input channel.
            out.extend((0..to).map(|channel| frame[channel.min(from - 1)]));
        }
    }
    out
}

fn resample_linear(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let in_frames = samples.len() / channels;
    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let out_frames = ((in_frames as f64) / ratio).round() as usize;
    let mut out = Vec::with_capacity(out_frames * channels);

    for index in 0..out_frames {
        let position = index as f64 * ratio;
        let left = (position.floor() as usize).min(in_frames - 1);
        let right = (left + 1).min(in_frames - 1);
        let frac = (position - left as f64) as f32;
        for channel in 0..channels {
            let a = samples[left * channels + channel];
            let b = samples[right * channels + channel];
            out.push(a + (b - a) * frac);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO_1K: AudioFormat = AudioFormat::new(1_000, 1);

    fn ramp(frames: usize) -> AudioTrack {
        AudioTrack::new((0..frames).map(|n| n as f32).collect(), MONO_1K)
    }

    #[test]
    fn converts_between_milliseconds_and_frames() {
        let cd = AudioFormat::new(44_100, 2);
        assert_eq!(cd.ms_to_frames(1_000), 44_100);
        assert_eq!(cd.ms_to_frames(1), 44);
        assert_eq!(cd.frames_to_ms(44), 1);
        assert_eq!(cd.frames_to_ms(cd.ms_to_frames(12_345)), 12_345);
    }

    #[test]
    fn slice_is_clamped_to_track_end() {
        let track = ramp(10);
        let tail = track.slice(7, 100);
        assert_eq!(tail.samples(), &[7.0, 8.0, 9.0]);
        assert!(track.slice(50, 10).is_empty());
        assert_eq!(track.slice(2, 3).samples(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn slicing_leaves_the_source_untouched() {
        let track = ramp(6);
        let _ = track.slice(1, 2);
        assert_eq!(track.frames(), 6);
    }

    #[test]
    fn concat_preserves_order_and_sums_durations() {
        let a = ramp(3);
        let b = AudioTrack::silent(2, MONO_1K);
        let joined = AudioTrack::concat(MONO_1K, [&a, &b, &a]).unwrap();
        assert_eq!(joined.duration_ms(), 8);
        assert_eq!(
            joined.samples(),
            &[0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 1.0, 2.0]
        );
    }

    #[test]
    fn concat_rejects_mixed_formats() {
        let stereo = AudioTrack::silent(5, AudioFormat::new(1_000, 2));
        let err = AudioTrack::concat(MONO_1K, [&stereo]).unwrap_err();
        assert!(matches!(err, IntervalMixError::FormatMismatch { .. }));
    }

    #[test]
    fn drops_trailing_partial_frames() {
        let track = AudioTrack::new(vec![0.1, 0.2, 0.3], AudioFormat::new(1_000, 2));
        assert_eq!(track.frames(), 1);
    }

    #[test]
    fn conform_upmixes_and_resamples() {
        let mono = AudioTrack::new(vec![0.5; 100], AudioFormat::new(8_000, 1));
        let target = AudioFormat::new(16_000, 2);
        let converted = mono.conform(target);
        assert_eq!(converted.format(), target);
        assert_eq!(converted.frames(), 200);
        assert!(converted.samples().iter().all(|s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn conform_downmixes_by_averaging() {
        let stereo = AudioTrack::new(vec![1.0, 0.0, 0.5, 0.5], AudioFormat::new(1_000, 2));
        let mono = stereo.conform(MONO_1K);
        assert_eq!(mono.samples(), &[0.5, 0.5]);
    }

    #[test]
    fn widest_format_takes_highest_rate_and_channels() {
        let a = AudioFormat::new(22_050, 2);
        let b = AudioFormat::new(44_100, 1);
        assert_eq!(a.widest(b), AudioFormat::new(44_100, 2));
    }
}
