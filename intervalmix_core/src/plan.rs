//! Interval-training methods and the workout plans derived from them.

use std::fmt;
use std::str::FromStr;

use crate::error::IntervalMixError;

/// Work/recovery cadence for a method, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preset {
    pub work_s: u32,
    pub recovery_s: u32,
    pub default_rounds: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Tabata,
    Gibala,
    Zuniga,
    General,
    Custom,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Tabata,
        Method::Gibala,
        Method::Zuniga,
        Method::General,
        Method::Custom,
    ];

    /// Intervals and round count of the method. For [`Method::Custom`] these
    /// are the starting values offered before the user enters their own.
    pub const fn preset(self) -> Preset {
        let (work_s, recovery_s, default_rounds) = match self {
            Method::Tabata => (20, 10, 8),
            Method::Gibala => (60, 75, 10),
            Method::Zuniga => (30, 30, 10),
            Method::General => (30, 15, 10),
            Method::Custom => (30, 30, 10),
        };
        Preset {
            work_s,
            recovery_s,
            default_rounds,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Method::Tabata => "Tabata",
            Method::Gibala => "Gibala",
            Method::Zuniga => "Zuniga",
            Method::General => "General",
            Method::Custom => "Custom",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Method::Tabata => "20s work / 10s recovery (high intensity, short bursts)",
            Method::Gibala => "60s work / 75s recovery (moderate volume for regular folks)",
            Method::Zuniga => "30s work / 30s recovery (balanced work-rest ratio)",
            Method::General => "30s work / 15s recovery (2:1 work-to-rest ratio)",
            Method::Custom => "Set your own work and recovery intervals",
        }
    }

    pub const fn is_custom(self) -> bool {
        matches!(self, Method::Custom)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = Method::ALL.iter().map(|m| m.name().to_lowercase()).collect();
        write!(
            f,
            "unknown workout method '{}' (expected one of: {})",
            self.0,
            names.join(", ")
        )
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Method::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownMethod(value.to_owned()))
    }
}

/// Longest accepted work or recovery interval.
pub const MAX_INTERVAL_MS: u64 = 300_000;
/// Longest accepted warm-up or cool-down.
pub const MAX_SECTION_MS: u64 = 600_000;
pub const MAX_ROUNDS: u32 = 100;

/// Concrete, validated parameters of one workout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkoutPlan {
    work_ms: u64,
    recovery_ms: u64,
    rounds: u32,
    warmup_ms: u64,
    cooldown_ms: u64,
    cycle_mode: bool,
}

impl WorkoutPlan {
    /// A plan without warm-up or cool-down that restarts the music every interval.
    ///
    /// Work and recovery must lie in `1..=MAX_INTERVAL_MS` and rounds in
    /// `1..=MAX_ROUNDS`.
    pub fn new(work_ms: u64, recovery_ms: u64, rounds: u32) -> Result<Self, IntervalMixError> {
        check_interval("work", work_ms)?;
        check_interval("recovery", recovery_ms)?;
        if !(1..=MAX_ROUNDS).contains(&rounds) {
            return Err(IntervalMixError::InvalidPlan(format!(
                "rounds must be between 1 and {MAX_ROUNDS}, got {rounds}"
            )));
        }
        Ok(Self {
            work_ms,
            recovery_ms,
            rounds,
            warmup_ms: 0,
            cooldown_ms: 0,
            cycle_mode: false,
        })
    }

    /// Zero skips the warm-up; anything above `MAX_SECTION_MS` is rejected.
    pub fn with_warmup_ms(mut self, warmup_ms: u64) -> Result<Self, IntervalMixError> {
        self.warmup_ms = check_section("warm-up", warmup_ms)?;
        Ok(self)
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Result<Self, IntervalMixError> {
        self.cooldown_ms = check_section("cool-down", cooldown_ms)?;
        Ok(self)
    }

    pub fn with_cycle_mode(mut self, cycle_mode: bool) -> Self {
        self.cycle_mode = cycle_mode;
        self
    }

    pub fn work_ms(&self) -> u64 {
        self.work_ms
    }

    pub fn recovery_ms(&self) -> u64 {
        self.recovery_ms
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn warmup_ms(&self) -> u64 {
        self.warmup_ms
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    pub fn cycle_mode(&self) -> bool {
        self.cycle_mode
    }
}

fn check_interval(name: &str, ms: u64) -> Result<u64, IntervalMixError> {
    if ms == 0 {
        return Err(IntervalMixError::InvalidPlan(format!(
            "{name} interval must be greater than zero"
        )));
    }
    if ms > MAX_INTERVAL_MS {
        return Err(IntervalMixError::InvalidPlan(format!(
            "{name} interval of {ms} ms exceeds the {} s limit",
            MAX_INTERVAL_MS / 1_000
        )));
    }
    Ok(ms)
}

fn check_section(name: &str, ms: u64) -> Result<u64, IntervalMixError> {
    if ms > MAX_SECTION_MS {
        return Err(IntervalMixError::InvalidPlan(format!(
            "{name} of {ms} ms exceeds the {} s limit",
            MAX_SECTION_MS / 1_000
        )));
    }
    Ok(ms)
}

/// Build a plan from a method, taking work and recovery from the preset
/// unless the method is [`Method::Custom`].
///
/// Missing custom values fall back to the custom starting values.
pub fn plan(
    method: Method,
    custom_work_ms: Option<u64>,
    custom_recovery_ms: Option<u64>,
    rounds: u32,
) -> Result<WorkoutPlan, IntervalMixError> {
    let preset = method.preset();
    let preset_work = u64::from(preset.work_s) * 1_000;
    let preset_recovery = u64::from(preset.recovery_s) * 1_000;
    let (work_ms, recovery_ms) = if method.is_custom() {
        (
            custom_work_ms.unwrap_or(preset_work),
            custom_recovery_ms.unwrap_or(preset_recovery),
        )
    } else {
        (preset_work, preset_recovery)
    };
    WorkoutPlan::new(work_ms, recovery_ms, rounds)
}

/// Total interval time as `M:SS`, e.g. `"22:30"`.
pub fn format_total_duration(plan: &WorkoutPlan) -> String {
    total_duration_label(plan.work_ms, plan.recovery_ms, plan.rounds)
}

fn total_duration_label(work_ms: u64, recovery_ms: u64, rounds: u32) -> String {
    let total_s = work_ms
        .saturating_add(recovery_ms)
        .saturating_mul(u64::from(rounds))
        / 1_000;
    format!("{}:{:02}", total_s / 60, total_s % 60)
}

/// Render an `M:SS` label as spoken English.
///
/// `"4:00"` becomes `"4 minutes"`, `"4:30"` becomes `"4 minutes and 30 seconds"`.
pub fn format_for_speech(label: &str) -> Result<String, IntervalMixError> {
    let invalid = || IntervalMixError::InvalidDurationLabel(label.to_owned());
    let (minutes, seconds) = label.split_once(':').ok_or_else(invalid)?;
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(minutes) || !all_digits(seconds) {
        return Err(invalid());
    }
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u64 = seconds.parse().map_err(|_| invalid())?;

    if seconds == 0 {
        Ok(format!("{minutes} minutes"))
    } else {
        Ok(format!("{minutes} minutes and {seconds} seconds"))
    }
}

/// Spoken description of the chosen workout.
pub fn workout_info_text(method: Method, plan: &WorkoutPlan) -> Result<String, IntervalMixError> {
    let opening = if method.is_custom() {
        String::from("You have selected a custom workout.")
    } else {
        format!("You have selected the {method} regimen.")
    };
    let total = format_for_speech(&format_total_duration(plan))?;
    Ok(format!(
        "{opening} {} rounds. Work intervals are {} seconds. Recovery intervals are {} seconds. Total workout time: {total}.",
        plan.rounds,
        spoken_seconds(plan.work_ms),
        spoken_seconds(plan.recovery_ms),
    ))
}

fn spoken_seconds(ms: u64) -> String {
    if ms % 1_000 == 0 {
        return (ms / 1_000).to_string();
    }
    let text = format!("{}.{:03}", ms / 1_000, ms % 1_000);
    text.trim_end_matches('0').to_owned()
}

/// Editable workout settings, the way a front end collects them.
///
/// Selecting a method resets the round count to that method's default.
/// Custom work and recovery values survive method changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkoutPlanner {
    method: Method,
    custom_work_ms: u64,
    custom_recovery_ms: u64,
    rounds: u32,
    warmup_ms: u64,
    cooldown_ms: u64,
    cycle_mode: bool,
}

impl Default for WorkoutPlanner {
    fn default() -> Self {
        let custom = Method::Custom.preset();
        Self {
            method: Method::Tabata,
            custom_work_ms: u64::from(custom.work_s) * 1_000,
            custom_recovery_ms: u64::from(custom.recovery_s) * 1_000,
            rounds: Method::Tabata.preset().default_rounds,
            warmup_ms: 180_000,
            cooldown_ms: 180_000,
            cycle_mode: false,
        }
    }
}

impl WorkoutPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_method(&mut self, method: Method) {
        self.method = method;
        self.rounds = method.preset().default_rounds;
    }

    pub fn set_custom_work_ms(&mut self, work_ms: u64) {
        self.custom_work_ms = work_ms;
    }

    pub fn set_custom_recovery_ms(&mut self, recovery_ms: u64) {
        self.custom_recovery_ms = recovery_ms;
    }

    pub fn set_rounds(&mut self, rounds: u32) {
        self.rounds = rounds;
    }

    pub fn set_warmup_ms(&mut self, warmup_ms: u64) {
        self.warmup_ms = warmup_ms;
    }

    pub fn set_cooldown_ms(&mut self, cooldown_ms: u64) {
        self.cooldown_ms = cooldown_ms;
    }

    pub fn set_cycle_mode(&mut self, cycle_mode: bool) {
        self.cycle_mode = cycle_mode;
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn custom_work_ms(&self) -> u64 {
        self.custom_work_ms
    }

    pub fn custom_recovery_ms(&self) -> u64 {
        self.custom_recovery_ms
    }

    /// Live `M:SS` preview of the interval block, available even while the
    /// current values would not yet form a valid plan.
    pub fn workout_length(&self) -> String {
        let (work_ms, recovery_ms) = self.intervals_ms();
        total_duration_label(work_ms, recovery_ms, self.rounds)
    }

    pub fn plan(&self) -> Result<WorkoutPlan, IntervalMixError> {
        let (work_ms, recovery_ms) = self.intervals_ms();
        Ok(WorkoutPlan::new(work_ms, recovery_ms, self.rounds)?
            .with_warmup_ms(self.warmup_ms)?
            .with_cooldown_ms(self.cooldown_ms)?
            .with_cycle_mode(self.cycle_mode))
    }

    fn intervals_ms(&self) -> (u64, u64) {
        if self.method.is_custom() {
            (self.custom_work_ms, self.custom_recovery_ms)
        } else {
            let preset = self.method.preset();
            (
                u64::from(preset.work_s) * 1_000,
                u64::from(preset.recovery_s) * 1_000,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_published_cadences() {
        let tabata = plan(Method::Tabata, None, None, 8).unwrap();
        assert_eq!((tabata.work_ms(), tabata.recovery_ms()), (20_000, 10_000));
        let gibala = plan(Method::Gibala, Some(1), Some(1), 10).unwrap();
        assert_eq!((gibala.work_ms(), gibala.recovery_ms()), (60_000, 75_000));
        assert_eq!(Method::Zuniga.preset().recovery_s, 30);
        assert_eq!(Method::General.preset().recovery_s, 15);
    }

    #[test]
    fn custom_plan_uses_caller_values() {
        let custom = plan(Method::Custom, Some(45_000), Some(15_000), 6).unwrap();
        assert_eq!(custom.work_ms(), 45_000);
        assert_eq!(custom.recovery_ms(), 15_000);
        assert_eq!(custom.rounds(), 6);
    }

    #[test]
    fn rejects_zero_length_intervals_and_rounds() {
        for result in [
            plan(Method::Custom, Some(0), Some(10_000), 4),
            plan(Method::Custom, Some(10_000), Some(0), 4),
            plan(Method::Tabata, None, None, 0),
        ] {
            assert!(matches!(result, Err(IntervalMixError::InvalidPlan(_))));
        }
    }

    #[test]
    fn rejects_values_beyond_the_limits() {
        for result in [
            plan(Method::Custom, Some(MAX_INTERVAL_MS + 1), Some(10_000), 4),
            plan(Method::Custom, Some(10_000), Some(u64::MAX), 4),
            plan(Method::Tabata, None, None, MAX_ROUNDS + 1),
        ] {
            assert!(matches!(result, Err(IntervalMixError::InvalidPlan(_))));
        }

        let longest = plan(Method::Custom, Some(MAX_INTERVAL_MS), Some(MAX_INTERVAL_MS), MAX_ROUNDS)
            .unwrap();
        assert!(longest.with_warmup_ms(MAX_SECTION_MS).is_ok());
        assert!(matches!(
            longest.with_warmup_ms(u64::MAX),
            Err(IntervalMixError::InvalidPlan(_))
        ));
        assert!(matches!(
            longest.with_cooldown_ms(MAX_SECTION_MS + 1),
            Err(IntervalMixError::InvalidPlan(_))
        ));
    }

    #[test]
    fn planner_rejects_oversized_warmup() {
        let mut planner = WorkoutPlanner::new();
        planner.set_warmup_ms(u64::MAX);
        assert!(matches!(
            planner.plan(),
            Err(IntervalMixError::InvalidPlan(_))
        ));
    }

    #[test]
    fn formats_total_duration_as_minutes_and_seconds() {
        let tabata = plan(Method::Tabata, None, None, 8).unwrap();
        assert_eq!(format_total_duration(&tabata), "4:00");
        let gibala = plan(Method::Gibala, None, None, 10).unwrap();
        assert_eq!(format_total_duration(&gibala), "22:30");
        let short = plan(Method::Custom, Some(3_000), Some(2_000), 1).unwrap();
        assert_eq!(format_total_duration(&short), "0:05");
    }

    #[test]
    fn total_duration_ignores_warmup_and_cooldown() {
        let tabata = plan(Method::Tabata, None, None, 8)
            .unwrap()
            .with_warmup_ms(180_000)
            .unwrap()
            .with_cooldown_ms(60_000)
            .unwrap();
        assert_eq!(format_total_duration(&tabata), "4:00");
    }

    #[test]
    fn formats_labels_for_speech() {
        assert_eq!(format_for_speech("4:00").unwrap(), "4 minutes");
        assert_eq!(
            format_for_speech("4:30").unwrap(),
            "4 minutes and 30 seconds"
        );
        assert_eq!(
            format_for_speech("22:05").unwrap(),
            "22 minutes and 5 seconds"
        );
    }

    #[test]
    fn rejects_malformed_labels() {
        for label in ["", "4", "4:", ":30", "4:3x", "-1:00", "4:00:00"] {
            assert!(
                matches!(
                    format_for_speech(label),
                    Err(IntervalMixError::InvalidDurationLabel(_))
                ),
                "label {label:?}"
            );
        }
    }

    #[test]
    fn parses_method_names_case_insensitively() {
        assert_eq!("tabata".parse::<Method>().unwrap(), Method::Tabata);
        assert_eq!(" GIBALA ".parse::<Method>().unwrap(), Method::Gibala);
        assert_eq!("Custom".parse::<Method>().unwrap(), Method::Custom);
        let err = "crossfit".parse::<Method>().unwrap_err();
        assert!(err.to_string().contains("tabata, gibala, zuniga, general, custom"));
    }

    #[test]
    fn info_text_for_presets_names_the_regimen() {
        let tabata = plan(Method::Tabata, None, None, 8).unwrap();
        assert_eq!(
            workout_info_text(Method::Tabata, &tabata).unwrap(),
            "You have selected the Tabata regimen. 8 rounds. Work intervals are 20 seconds. \
             Recovery intervals are 10 seconds. Total workout time: 4 minutes."
        );
    }

    #[test]
    fn info_text_for_custom_workouts() {
        let custom = plan(Method::Custom, Some(45_000), Some(1_500), 3).unwrap();
        assert_eq!(
            workout_info_text(Method::Custom, &custom).unwrap(),
            "You have selected a custom workout. 3 rounds. Work intervals are 45 seconds. \
             Recovery intervals are 1.5 seconds. Total workout time: 2 minutes and 19 seconds."
        );
    }

    #[test]
    fn selecting_a_preset_resets_rounds() {
        let mut planner = WorkoutPlanner::new();
        planner.set_rounds(3);
        planner.select_method(Method::Gibala);
        assert_eq!(planner.rounds(), 10);
        planner.set_rounds(4);
        planner.select_method(Method::Tabata);
        assert_eq!(planner.rounds(), 8);
        assert_eq!(planner.workout_length(), "4:00");
    }

    #[test]
    fn selecting_custom_keeps_entered_intervals() {
        let mut planner = WorkoutPlanner::new();
        planner.select_method(Method::Custom);
        planner.set_custom_work_ms(40_000);
        planner.set_custom_recovery_ms(20_000);
        planner.select_method(Method::Zuniga);
        planner.select_method(Method::Custom);
        assert_eq!(planner.custom_work_ms(), 40_000);
        assert_eq!(planner.custom_recovery_ms(), 20_000);

        let plan = planner.plan().unwrap();
        assert_eq!((plan.work_ms(), plan.recovery_ms()), (40_000, 20_000));
        assert_eq!(planner.workout_length(), "10:00");
    }

    #[test]
    fn planner_carries_warmup_cooldown_and_cycle_mode() {
        let mut planner = WorkoutPlanner::new();
        planner.set_warmup_ms(0);
        planner.set_cooldown_ms(90_000);
        planner.set_cycle_mode(true);
        let plan = planner.plan().unwrap();
        assert_eq!(plan.warmup_ms(), 0);
        assert_eq!(plan.cooldown_ms(), 90_000);
        assert!(plan.cycle_mode());
        assert_eq!(plan.rounds(), 8);
    }

    #[test]
    fn planner_preview_survives_invalid_values() {
        let mut planner = WorkoutPlanner::new();
        planner.select_method(Method::Custom);
        planner.set_custom_work_ms(0);
        assert_eq!(planner.workout_length(), "5:00");
        assert!(planner.plan().is_err());
    }
}
