mod cli;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use indicatif::{HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};
use intervalmix_core::{
    format_total_duration, run_with_progress, Config, Method, ProgressEvent, Stage, WorkoutPlan,
    WorkoutPlanner,
};

use crate::cli::build_cli;

fn duration_to_millis(duration: Duration) -> u64 {
    duration
        .as_millis()
        .min(u128::from(u64::MAX))
        .try_into()
        .unwrap_or(u64::MAX)
}

fn print_methods() {
    println!("Available interval methods:");
    for method in Method::ALL {
        let preset = method.preset();
        println!(
            "  {:<8} {} [{} rounds]",
            method.name().to_lowercase(),
            method.description(),
            preset.default_rounds
        );
    }
}

fn section_label(ms: u64) -> String {
    if ms == 0 {
        String::from("none")
    } else {
        format!("{}", HumanDuration(Duration::from_millis(ms)))
    }
}

fn print_plan(method: Method, plan: &WorkoutPlan, output: &Path) {
    println!("Dry run: would generate a {method} workout:");
    println!("  rounds:    {}", plan.rounds());
    println!("  work:      {} ms", plan.work_ms());
    println!("  recovery:  {} ms", plan.recovery_ms());
    println!("  intervals: {}", format_total_duration(plan));
    println!("  warm-up:   {}", section_label(plan.warmup_ms()));
    println!("  cool-down: {}", section_label(plan.cooldown_ms()));
    println!(
        "  playback:  {}",
        if plan.cycle_mode() {
            "cycle (songs continue across intervals)"
        } else {
            "restart (songs start over every interval)"
        }
    );
    println!("  output:    {}", output.display());
}

fn stage_message(stage: Stage) -> String {
    match stage {
        Stage::Decoding => String::from("Decoding source tracks"),
        Stage::Announcements => String::from("Synthesizing announcements"),
        Stage::Warmup => String::from("Building warm-up"),
        Stage::Round { index, total } => format!("Building round {index} / {total}"),
        Stage::Cooldown => String::from("Building cool-down"),
        Stage::Rendering => String::from("Rendering workout"),
        Stage::Exporting => String::from("Exporting"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    if matches.get_flag("list-methods") {
        print_methods();
        return Ok(());
    }

    let intense_path = matches
        .get_one::<PathBuf>("intense")
        .expect("required argument");
    let moderate_path = matches
        .get_one::<PathBuf>("moderate")
        .expect("required argument");
    for input_path in [intense_path, moderate_path] {
        if !input_path.is_file() {
            return Err(anyhow!(
                "input file does not exist: {}",
                input_path.display()
            ));
        }
    }

    let method = *matches
        .get_one::<Method>("method")
        .expect("defaulted argument");
    let work = matches.get_one::<Duration>("work").copied();
    let recovery = matches.get_one::<Duration>("recovery").copied();
    if !method.is_custom() && (work.is_some() || recovery.is_some()) {
        bail!("--work and --recovery only apply to the custom method, not {method}");
    }

    let mut planner = WorkoutPlanner::new();
    planner.select_method(method);
    if let Some(work) = work {
        planner.set_custom_work_ms(duration_to_millis(work));
    }
    if let Some(recovery) = recovery {
        planner.set_custom_recovery_ms(duration_to_millis(recovery));
    }
    if let Some(rounds) = matches.get_one::<u32>("rounds") {
        planner.set_rounds(*rounds);
    }
    let warmup = matches
        .get_one::<Duration>("warmup")
        .expect("defaulted argument");
    let cooldown = matches
        .get_one::<Duration>("cooldown")
        .expect("defaulted argument");
    planner.set_warmup_ms(duration_to_millis(*warmup));
    planner.set_cooldown_ms(duration_to_millis(*cooldown));
    planner.set_cycle_mode(matches.get_flag("cycle"));

    let plan = planner
        .plan()
        .with_context(|| format!("failed to plan the {method} workout"))?;

    let output_path = matches
        .get_one::<PathBuf>("output")
        .expect("defaulted argument");
    let tts_program = matches
        .get_one::<PathBuf>("tts-command")
        .expect("defaulted argument");
    let ffmpeg_program = matches
        .get_one::<PathBuf>("ffmpeg")
        .expect("defaulted argument");
    let overwrite = matches.get_flag("overwrite");
    let dry_run = matches.get_flag("dry-run");

    let config = Config::builder(intense_path, moderate_path, output_path, method, plan)
        .overwrite(overwrite)
        .tts_program(tts_program)
        .ffmpeg_program(ffmpeg_program)
        .build()
        .with_context(|| {
            format!(
                "failed to create configuration for '{}'",
                output_path.display()
            )
        })?;

    if dry_run {
        print_plan(method, &config.plan, &config.output_path);
        return Ok(());
    }

    let progress = ProgressBar::new_spinner();
    progress.set_draw_target(ProgressDrawTarget::stderr());
    let spinner_style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    progress.set_style(spinner_style);

    let progress_handle = progress.clone();
    let result = run_with_progress(config, move |event: ProgressEvent| match event {
        ProgressEvent::Start { rounds } => {
            progress_handle.enable_steady_tick(Duration::from_millis(100));
            progress_handle.set_message(format!("Preparing {rounds} rounds"));
        }
        ProgressEvent::Stage(stage) => progress_handle.set_message(stage_message(stage)),
        ProgressEvent::Finish => {
            progress_handle.set_message(String::from("Completed"));
        }
    })
    .map_err(|err| {
        let kind = err.kind();
        anyhow::Error::new(err).context(format!(
            "{kind}: failed to generate workout '{}'",
            output_path.display()
        ))
    });

    progress.finish_and_clear();

    let written = result?;
    println!("Workout written to {}", written.display());

    Ok(())
}
