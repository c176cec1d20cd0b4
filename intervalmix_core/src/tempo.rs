use soundtouch::SoundTouch;

use crate::error::IntervalMixError;
use crate::track::{AudioFormat, AudioTrack};

const RECEIVE_FRAMES: usize = 4_096;

/// Wrapper around SoundTouch for tempo changes without pitch shift.
struct Stretcher {
    st: SoundTouch,
    channels: u16,
}

impl Stretcher {
    fn new(format: AudioFormat, tempo: f64) -> Self {
        let mut st = SoundTouch::new();
        st.set_sample_rate(format.sample_rate);
        st.set_channels(u32::from(format.channels));
        st.set_tempo(tempo);
        Stretcher {
            st,
            channels: format.channels,
        }
    }

    /// Feed interleaved input samples into SoundTouch.
    fn put_samples(&mut self, samples: &[f32]) {
        self.st
            .put_samples(samples, samples.len() / self.channels as usize);
    }

    /// Returns the number of samples written (total, not per channel).
    fn receive_samples(&mut self, output: &mut [f32]) -> usize {
        let max_frames = output.len() / self.channels as usize;
        let received_frames = self.st.receive_samples(output, max_frames);
        received_frames * self.channels as usize
    }

    fn flush(&mut self) {
        self.st.flush();
    }
}

/// Play `track` back `tempo` times faster while keeping its pitch.
///
/// The result is cut to `frames / tempo` frames so the padding SoundTouch
/// appends on flush does not leak into the timeline.
pub fn change_tempo(track: &AudioTrack, tempo: f64) -> Result<AudioTrack, IntervalMixError> {
    if track.is_empty() || (tempo - 1.0).abs() < f64::EPSILON {
        return Ok(track.clone());
    }

    let format = track.format();
    let channels = usize::from(format.channels);
    let mut stretcher = Stretcher::new(format, tempo);
    stretcher.put_samples(track.samples());
    stretcher.flush();

    let mut output = Vec::with_capacity(track.samples().len());
    let mut chunk = vec![0.0f32; RECEIVE_FRAMES * channels];
    loop {
        let received = stretcher.receive_samples(&mut chunk);
        if received == 0 {
            break;
        }
        output.extend_from_slice(&chunk[..received]);
    }

    if output.is_empty() {
        return Err(IntervalMixError::TempoFailed);
    }

    let expected_frames = (track.frames() as f64 / tempo).round() as usize;
    output.truncate(expected_frames * channels);
    Ok(AudioTrack::new(output, format))
}
