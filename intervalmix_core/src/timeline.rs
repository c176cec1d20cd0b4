use std::borrow::Cow;

use log::{debug, info};

use crate::announce::AnnouncementSynthesizer;
use crate::error::IntervalMixError;
use crate::extract::extract;
use crate::plan::{workout_info_text, Method, WorkoutPlan};
use crate::progress::{NoProgress, ProgressEvent, ProgressReporter, Stage};
use crate::speech::SpeechSynthesizer;
use crate::track::{AudioFormat, AudioTrack};

pub const DISCLAIMER: &str = "Warning: Consult with a medical professional before starting any new exercise regimen. \
Do not over-exert yourself. Listen to your body and stop if you feel pain or discomfort.";
pub const BEGIN_WARMUP: &str = "Begin warm-up.";
pub const BEGIN_WORKOUT: &str = "Begin workout.";
pub const BEGIN_COOLDOWN: &str = "Begin cool-down.";
pub const WORKOUT_COMPLETE: &str = "Workout complete. Great job!";

const SHORT_PAUSE_MS: u64 = 500;
const LONG_PAUSE_MS: u64 = 1_000;

/// Spoken lines of a workout, in the order they are heard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Disclaimer,
    WorkoutInfo,
    BeginWarmup,
    BeginWorkout,
    BeginCooldown,
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Silence,
    Announcement(Cue),
    Warmup,
    Work { round: u32 },
    Recovery { round: u32 },
    Cooldown,
}

#[derive(Clone, Debug)]
pub struct Segment {
    pub kind: SegmentKind,
    pub audio: AudioTrack,
}

/// Ordered pieces of a workout, all in one sample format.
#[derive(Clone, Debug)]
pub struct Timeline {
    format: AudioFormat,
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            segments: Vec::new(),
        }
    }

    /// Append `audio`, converting it to the timeline's format when needed.
    pub fn push(&mut self, kind: SegmentKind, audio: AudioTrack) {
        let audio = if audio.format() == self.format {
            audio
        } else {
            audio.conform(self.format)
        };
        debug!("{kind:?}: {} ms", audio.duration_ms());
        self.segments.push(Segment { kind, audio });
    }

    pub fn push_silence(&mut self, duration_ms: u64) {
        let silence = AudioTrack::silent(duration_ms, self.format);
        self.push(SegmentKind::Silence, silence);
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn kinds(&self) -> Vec<SegmentKind> {
        self.segments.iter().map(|segment| segment.kind).collect()
    }

    pub fn frames(&self) -> usize {
        self.segments.iter().map(|segment| segment.audio.frames()).sum()
    }

    pub fn duration_ms(&self) -> u64 {
        self.format.frames_to_ms(self.frames())
    }

    /// Concatenate every segment, in order, into one track.
    pub fn render(&self) -> Result<AudioTrack, IntervalMixError> {
        AudioTrack::concat(self.format, self.segments.iter().map(|segment| &segment.audio))
    }
}

/// Playback positions of the two music sources while cycling through them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cursors {
    intense_ms: u64,
    moderate_ms: u64,
}

struct Cues {
    disclaimer: AudioTrack,
    workout_info: AudioTrack,
    begin_warmup: AudioTrack,
    begin_workout: AudioTrack,
    begin_cooldown: AudioTrack,
    complete: AudioTrack,
}

/// Lays out announcements, silences and music slices for one workout.
pub struct TimelineBuilder<S> {
    announcer: AnnouncementSynthesizer<S>,
}

impl<S: SpeechSynthesizer> TimelineBuilder<S> {
    pub fn new(announcer: AnnouncementSynthesizer<S>) -> Self {
        Self { announcer }
    }

    /// Assemble and render the whole workout into one track.
    pub fn build(
        &mut self,
        intense: &AudioTrack,
        moderate: &AudioTrack,
        plan: &WorkoutPlan,
        method: Method,
    ) -> Result<AudioTrack, IntervalMixError> {
        self.assemble(intense, moderate, plan, method, &mut NoProgress)?
            .render()
    }

    /// Lay out the workout without joining the pieces.
    ///
    /// The output format is the widest of the two music sources. Cursors for
    /// cycle mode start at zero on every call; warm-up and cool-down always
    /// play the moderate track from its beginning and leave the cursors alone.
    pub fn assemble(
        &mut self,
        intense: &AudioTrack,
        moderate: &AudioTrack,
        plan: &WorkoutPlan,
        method: Method,
        progress: &mut dyn ProgressReporter,
    ) -> Result<Timeline, IntervalMixError> {
        if intense.is_empty() {
            return Err(IntervalMixError::EmptyTrack("intense".into()));
        }
        if moderate.is_empty() {
            return Err(IntervalMixError::EmptyTrack("moderate".into()));
        }

        let format = intense.format().widest(moderate.format());
        let intense = conformed(intense, format);
        let moderate = conformed(moderate, format);

        progress.on_event(ProgressEvent::Stage(Stage::Announcements));
        let cues = self.synthesize_cues(method, plan)?;

        let mut timeline = Timeline::new(format);
        timeline.push_silence(SHORT_PAUSE_MS);
        timeline.push(SegmentKind::Announcement(Cue::Disclaimer), cues.disclaimer);
        timeline.push_silence(LONG_PAUSE_MS);
        timeline.push(SegmentKind::Announcement(Cue::WorkoutInfo), cues.workout_info);
        timeline.push_silence(LONG_PAUSE_MS);
        timeline.push(SegmentKind::Announcement(Cue::BeginWarmup), cues.begin_warmup);
        timeline.push_silence(SHORT_PAUSE_MS);

        if plan.warmup_ms() > 0 {
            progress.on_event(ProgressEvent::Stage(Stage::Warmup));
            let (warmup, _) = extract(&moderate, plan.warmup_ms(), false, 0)?;
            timeline.push(SegmentKind::Warmup, warmup);
            timeline.push_silence(SHORT_PAUSE_MS);
        }

        timeline.push(SegmentKind::Announcement(Cue::BeginWorkout), cues.begin_workout);
        timeline.push_silence(SHORT_PAUSE_MS);

        let mut cursors = Cursors::default();
        for round in 1..=plan.rounds() {
            progress.on_event(ProgressEvent::Stage(Stage::Round {
                index: round,
                total: plan.rounds(),
            }));

            let (work, intense_ms) =
                extract(&intense, plan.work_ms(), plan.cycle_mode(), cursors.intense_ms)?;
            cursors.intense_ms = intense_ms;
            timeline.push(SegmentKind::Work { round }, work);

            let (recovery, moderate_ms) = extract(
                &moderate,
                plan.recovery_ms(),
                plan.cycle_mode(),
                cursors.moderate_ms,
            )?;
            cursors.moderate_ms = moderate_ms;
            timeline.push(SegmentKind::Recovery { round }, recovery);
        }
        debug!("final playback cursors: {cursors:?}");

        timeline.push_silence(SHORT_PAUSE_MS);
        timeline.push(SegmentKind::Announcement(Cue::BeginCooldown), cues.begin_cooldown);
        timeline.push_silence(SHORT_PAUSE_MS);

        if plan.cooldown_ms() > 0 {
            progress.on_event(ProgressEvent::Stage(Stage::Cooldown));
            let (cooldown, _) = extract(&moderate, plan.cooldown_ms(), false, 0)?;
            timeline.push(SegmentKind::Cooldown, cooldown);
            timeline.push_silence(SHORT_PAUSE_MS);
        }

        timeline.push(SegmentKind::Announcement(Cue::Complete), cues.complete);
        timeline.push_silence(SHORT_PAUSE_MS);

        info!(
            "assembled {} segments, {} ms total ({format})",
            timeline.segments().len(),
            timeline.duration_ms()
        );
        Ok(timeline)
    }

    fn synthesize_cues(&mut self, method: Method, plan: &WorkoutPlan) -> Result<Cues, IntervalMixError> {
        let info_text = workout_info_text(method, plan)?;
        Ok(Cues {
            disclaimer: self.announcer.synthesize(DISCLAIMER)?,
            workout_info: self.announcer.synthesize(&info_text)?,
            begin_warmup: self.announcer.synthesize(BEGIN_WARMUP)?,
            begin_workout: self.announcer.synthesize(BEGIN_WORKOUT)?,
            begin_cooldown: self.announcer.synthesize(BEGIN_COOLDOWN)?,
            complete: self.announcer.synthesize(WORKOUT_COMPLETE)?,
        })
    }
}

fn conformed(track: &AudioTrack, format: AudioFormat) -> Cow<'_, AudioTrack> {
    if track.format() == format {
        Cow::Borrowed(track)
    } else {
        Cow::Owned(track.conform(format))
    }
}
