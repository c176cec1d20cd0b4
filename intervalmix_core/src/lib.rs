//! Build interval-training workout tracks from two music sources.
//!
//! A run decodes an intense and a moderate track, speaks a fixed set of
//! announcements, alternates work and recovery slices for every round and
//! writes the joined result to a single output file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

pub mod announce;
pub mod codec;
pub mod error;
pub mod extract;
pub mod plan;
pub mod progress;
pub mod speech;
pub mod tempo;
pub mod timeline;
pub mod track;

pub use announce::{AnnouncementSynthesizer, ANNOUNCEMENT_TEMPO};
pub use codec::{AudioCodec, DefaultCodec};
pub use error::{ErrorKind, IntervalMixError};
pub use extract::extract;
pub use plan::{
    format_for_speech, format_total_duration, plan, workout_info_text, Method, WorkoutPlan,
    WorkoutPlanner, MAX_INTERVAL_MS, MAX_ROUNDS, MAX_SECTION_MS,
};
pub use progress::{NoProgress, ProgressEvent, ProgressReporter, Stage};
pub use speech::{CommandSpeech, SpeechSynthesizer};
pub use timeline::{Cue, Segment, SegmentKind, Timeline, TimelineBuilder};
pub use track::{AudioFormat, AudioTrack};

/// Configuration for one generation run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Canonicalized path of the music played during work intervals.
    pub intense_path: PathBuf,
    /// Canonicalized path of the music played during warm-up, recovery and cool-down.
    pub moderate_path: PathBuf,
    /// Destination file; its extension selects the output container.
    pub output_path: PathBuf,
    pub method: Method,
    pub plan: WorkoutPlan,
    /// Replace an existing output file.
    pub overwrite: bool,
    /// Program used to speak announcements.
    pub tts_program: PathBuf,
    /// Program used to encode containers other than WAV.
    pub ffmpeg_program: PathBuf,
}

impl Config {
    /// Construct a new [`Config`] with default collaborators.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        intense: P,
        moderate: Q,
        output: R,
        method: Method,
        plan: WorkoutPlan,
    ) -> Result<Self, IntervalMixError> {
        Self::builder(intense, moderate, output, method, plan).build()
    }

    pub fn builder<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        intense: P,
        moderate: Q,
        output: R,
        method: Method,
        plan: WorkoutPlan,
    ) -> ConfigBuilder {
        ConfigBuilder {
            intense: intense.as_ref().to_path_buf(),
            moderate: moderate.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            method,
            plan,
            overwrite: false,
            tts_program: PathBuf::from("espeak-ng"),
            ffmpeg_program: PathBuf::from("ffmpeg"),
        }
    }
}

/// Builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    intense: PathBuf,
    moderate: PathBuf,
    output: PathBuf,
    method: Method,
    plan: WorkoutPlan,
    overwrite: bool,
    tts_program: PathBuf,
    ffmpeg_program: PathBuf,
}

impl ConfigBuilder {
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn tts_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.tts_program = program.into();
        self
    }

    pub fn ffmpeg_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.ffmpeg_program = program.into();
        self
    }

    /// Validate the paths and produce a [`Config`].
    ///
    /// Both sources must be existing files. The output must name a file with
    /// an extension inside an existing directory, and may only already exist
    /// when overwriting is enabled.
    pub fn build(self) -> Result<Config, IntervalMixError> {
        let intense_path = canonical_input(&self.intense)?;
        let moderate_path = canonical_input(&self.moderate)?;
        let output_path = resolve_output(&self.output)?;

        if output_path.exists() && !self.overwrite {
            return Err(IntervalMixError::OutputExists(output_path));
        }

        Ok(Config {
            intense_path,
            moderate_path,
            output_path,
            method: self.method,
            plan: self.plan,
            overwrite: self.overwrite,
            tts_program: self.tts_program,
            ffmpeg_program: self.ffmpeg_program,
        })
    }
}

fn canonical_input(path: &Path) -> Result<PathBuf, IntervalMixError> {
    let canonical = fs::canonicalize(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => IntervalMixError::MissingInput(path.to_path_buf()),
        _ => IntervalMixError::UnreadableInput {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })?;
    if !canonical.is_file() {
        return Err(IntervalMixError::UnreadableInput {
            path: path.to_path_buf(),
            reason: String::from("not a regular file"),
        });
    }
    Ok(canonical)
}

fn resolve_output(path: &Path) -> Result<PathBuf, IntervalMixError> {
    let file_name = path
        .file_name()
        .filter(|_| path.extension().is_some_and(|ext| !ext.is_empty()))
        .ok_or_else(|| IntervalMixError::InvalidOutputPath(path.to_path_buf()))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let directory = fs::canonicalize(parent)
        .map_err(|_| IntervalMixError::MissingOutputDirectory(parent.to_path_buf()))?;
    if !directory.is_dir() {
        return Err(IntervalMixError::MissingOutputDirectory(parent.to_path_buf()));
    }
    Ok(directory.join(file_name))
}

/// Generate the workout described by `config` with the default collaborators.
pub fn run(config: Config) -> Result<PathBuf, IntervalMixError> {
    run_with_progress(config, NoProgress)
}

/// Same as [`run`], reporting progress to `progress`.
pub fn run_with_progress<R>(config: Config, mut progress: R) -> Result<PathBuf, IntervalMixError>
where
    R: ProgressReporter,
{
    let codec = DefaultCodec::new(&config.ffmpeg_program);
    let speech = CommandSpeech::new(&config.tts_program);
    run_with(config, &codec, speech, &mut progress)
}

/// Generate a workout with explicit codec and speech collaborators.
///
/// Returns the path of the written file. Temporary files are removed whether
/// or not the run succeeds.
pub fn run_with<C, S>(
    config: Config,
    codec: &C,
    speech: S,
    progress: &mut dyn ProgressReporter,
) -> Result<PathBuf, IntervalMixError>
where
    C: AudioCodec + ?Sized,
    S: SpeechSynthesizer,
{
    let plan = config.plan;
    info!(
        "generating {} workout: {} rounds of {} ms / {} ms, cycle mode {}",
        config.method,
        plan.rounds(),
        plan.work_ms(),
        plan.recovery_ms(),
        if plan.cycle_mode() { "on" } else { "off" }
    );
    progress.on_event(ProgressEvent::Start {
        rounds: plan.rounds(),
    });

    progress.on_event(ProgressEvent::Stage(Stage::Decoding));
    let intense = load_source(codec, &config.intense_path)?;
    let moderate = load_source(codec, &config.moderate_path)?;

    let announcer = AnnouncementSynthesizer::new(speech)?;
    let mut builder = TimelineBuilder::new(announcer);
    let timeline = builder.assemble(&intense, &moderate, &plan, config.method, progress)?;

    progress.on_event(ProgressEvent::Stage(Stage::Rendering));
    let workout = timeline.render()?;
    drop(timeline);

    progress.on_event(ProgressEvent::Stage(Stage::Exporting));
    codec.encode(&workout, &config.output_path)?;

    progress.on_event(ProgressEvent::Finish);
    Ok(config.output_path)
}

fn load_source<C>(codec: &C, path: &Path) -> Result<AudioTrack, IntervalMixError>
where
    C: AudioCodec + ?Sized,
{
    let track = codec.decode(path)?;
    if track.is_empty() {
        return Err(IntervalMixError::EmptyTrack(path.display().to_string()));
    }
    info!(
        "loaded '{}': {} ms, {}",
        path.display(),
        track.duration_ms(),
        track.format()
    );
    Ok(track)
}
