use crate::error::IntervalMixError;
use crate::track::AudioTrack;

/// Pull `requested_ms` of audio out of `track`.
///
/// Without `cycle_mode` every request starts at the beginning of the track and
/// a track shorter than the request is looped end to end. With `cycle_mode`
/// the read starts at `cursor_ms` and wraps around the end of the track as
/// often as needed. The returned cursor is
/// `(cursor_ms + requested_ms) % track.duration_ms()` in cycle mode and
/// `cursor_ms` otherwise.
///
/// The segment always holds exactly as many frames as `requested_ms` covers
/// in the track's sample rate. Requests too large to hold in memory fail with
/// [`IntervalMixError::SegmentTooLong`].
pub fn extract(
    track: &AudioTrack,
    requested_ms: u64,
    cycle_mode: bool,
    cursor_ms: u64,
) -> Result<(AudioTrack, u64), IntervalMixError> {
    let duration_ms = track.duration_ms();
    let total = track.frames();
    if total == 0 || duration_ms == 0 {
        return Err(IntervalMixError::ZeroLengthSource);
    }

    if requested_ms == 0 {
        return Ok((AudioTrack::empty(track.format()), cursor_ms));
    }

    let wanted = track.format().ms_to_frames(requested_ms);
    let channels = usize::from(track.format().channels.max(1));
    let fits_in_memory = wanted
        .checked_mul(channels)
        .and_then(|samples| samples.checked_mul(std::mem::size_of::<f32>()))
        .is_some_and(|bytes| bytes <= isize::MAX as usize);
    if !fits_in_memory {
        return Err(IntervalMixError::SegmentTooLong(requested_ms));
    }

    if !cycle_mode {
        return Ok((read_wrapping(track, 0, wanted)?, cursor_ms));
    }

    let cursor_ms = cursor_ms % duration_ms;
    let start = track.format().ms_to_frames(cursor_ms) % total;
    let segment = read_wrapping(track, start, wanted)?;

    let next_cursor = (cursor_ms + requested_ms % duration_ms) % duration_ms;
    Ok((segment, next_cursor))
}

/// `wanted` frames starting at frame `start`, continuing from the top of the
/// track whenever its end is reached.
fn read_wrapping(
    track: &AudioTrack,
    start: usize,
    wanted: usize,
) -> Result<AudioTrack, IntervalMixError> {
    let total = track.frames();
    if start + wanted <= total {
        return Ok(track.slice_frames(start, wanted));
    }

    let mut segment = track.slice_frames(start, total - start);
    let mut remaining = wanted - (total - start);
    while remaining > 0 {
        if remaining <= total {
            segment.append(&track.slice_frames(0, remaining))?;
            remaining = 0;
        } else {
            segment.append(track)?;
            remaining -= total;
        }
    }
    Ok(segment)
}
