mod duration;

use std::path::PathBuf;
use std::time::Duration;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};
use intervalmix_core::{Method, MAX_INTERVAL_MS, MAX_ROUNDS, MAX_SECTION_MS};

pub use duration::{parse_duration, parse_duration_allow_zero};

pub const DEFAULT_OUTPUT: &str = "workout.mp3";

fn parse_method(value: &str) -> Result<Method, String> {
    value.parse::<Method>().map_err(|err| err.to_string())
}

fn at_most(duration: Duration, limit_ms: u64) -> Result<Duration, String> {
    if duration > Duration::from_millis(limit_ms) {
        return Err(format!("must not exceed {} seconds", limit_ms / 1_000));
    }
    Ok(duration)
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    let duration = parse_duration(value).map_err(|err| err.to_string())?;
    at_most(duration, MAX_INTERVAL_MS)
}

fn parse_section(value: &str) -> Result<Duration, String> {
    let duration = parse_duration_allow_zero(value).map_err(|err| err.to_string())?;
    at_most(duration, MAX_SECTION_MS)
}

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Build an interval-training workout track from an intense and a moderate song")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("intense")
                .long("intense")
                .value_name("FILE")
                .help("Music played during work intervals")
                .required_unless_present("list-methods")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("moderate")
                .long("moderate")
                .value_name("FILE")
                .help("Music played during warm-up, recovery and cool-down")
                .required_unless_present("list-methods")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Where to write the workout; .wav is written directly, other formats go through ffmpeg")
                .default_value(DEFAULT_OUTPUT)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("method")
                .short('m')
                .long("method")
                .value_name("METHOD")
                .help("Interval method: tabata, gibala, zuniga, general or custom")
                .default_value("tabata")
                .value_parser(ValueParser::new(parse_method)),
        )
        .arg(
            Arg::new("work")
                .long("work")
                .value_name("DURATION")
                .help("Work interval for the custom method, up to 5m (e.g. 45s) [default: 30s]")
                .value_parser(ValueParser::new(parse_interval)),
        )
        .arg(
            Arg::new("recovery")
                .long("recovery")
                .value_name("DURATION")
                .help("Recovery interval for the custom method, up to 5m (e.g. 15s) [default: 30s]")
                .value_parser(ValueParser::new(parse_interval)),
        )
        .arg(
            Arg::new("rounds")
                .short('r')
                .long("rounds")
                .value_name("ROUNDS")
                .help("Number of work/recovery rounds, 1 to 100 [default: the method's default]")
                .value_parser(value_parser!(u32).range(1..=i64::from(MAX_ROUNDS))),
        )
        .arg(
            Arg::new("warmup")
                .long("warmup")
                .value_name("DURATION")
                .help("Warm-up length played from the moderate track, up to 10m; 0 skips it")
                .default_value("3m")
                .value_parser(ValueParser::new(parse_section)),
        )
        .arg(
            Arg::new("cooldown")
                .long("cooldown")
                .value_name("DURATION")
                .help("Cool-down length played from the moderate track, up to 10m; 0 skips it")
                .default_value("3m")
                .value_parser(ValueParser::new(parse_section)),
        )
        .arg(
            Arg::new("cycle")
                .long("cycle")
                .help("Continue each song where the previous interval left off instead of restarting it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow replacing an existing output file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the workout plan without generating audio")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tts-command")
                .long("tts-command")
                .value_name("PROGRAM")
                .help("espeak-compatible program used to speak announcements")
                .default_value("espeak-ng")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("ffmpeg")
                .long("ffmpeg")
                .value_name("PROGRAM")
                .help("ffmpeg binary used to encode non-WAV output")
                .default_value("ffmpeg")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("list-methods")
                .long("list-methods")
                .help("Describe the available interval methods and exit")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> clap::ArgMatches {
        let mut argv = vec!["intervalmix", "--intense", "a.mp3", "--moderate", "b.mp3"];
        argv.extend_from_slice(args);
        build_cli().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn defaults_match_the_tabata_preset() {
        let matches = parse(&[]);
        assert_eq!(matches.get_one::<Method>("method"), Some(&Method::Tabata));
        assert_eq!(
            matches.get_one::<Duration>("warmup"),
            Some(&Duration::from_secs(180))
        );
        assert_eq!(
            matches.get_one::<PathBuf>("output"),
            Some(&PathBuf::from(DEFAULT_OUTPUT))
        );
        assert!(matches.get_one::<u32>("rounds").is_none());
        assert!(!matches.get_flag("cycle"));
    }

    #[test]
    fn parses_custom_intervals() {
        let matches = parse(&["-m", "Custom", "--work", "45s", "--recovery", "1m", "-r", "6"]);
        assert_eq!(matches.get_one::<Method>("method"), Some(&Method::Custom));
        assert_eq!(
            matches.get_one::<Duration>("work"),
            Some(&Duration::from_secs(45))
        );
        assert_eq!(
            matches.get_one::<Duration>("recovery"),
            Some(&Duration::from_secs(60))
        );
        assert_eq!(matches.get_one::<u32>("rounds"), Some(&6));
    }

    #[test]
    fn warmup_may_be_zero_but_work_may_not() {
        let matches = parse(&["--warmup", "0", "--cooldown", "0s"]);
        assert_eq!(matches.get_one::<Duration>("warmup"), Some(&Duration::ZERO));
        assert!(build_cli()
            .try_get_matches_from(["intervalmix", "--intense", "a", "--moderate", "b", "--work", "0s"])
            .is_err());
    }

    #[test]
    fn rejects_unknown_methods_and_zero_rounds() {
        let base = ["intervalmix", "--intense", "a", "--moderate", "b"];
        let mut unknown = base.to_vec();
        unknown.extend(["--method", "crossfit"]);
        assert!(build_cli().try_get_matches_from(unknown).is_err());

        let mut zero = base.to_vec();
        zero.extend(["--rounds", "0"]);
        assert!(build_cli().try_get_matches_from(zero).is_err());
    }

    #[test]
    fn rejects_values_beyond_the_limits() {
        let base = ["intervalmix", "--intense", "a", "--moderate", "b"];
        for extra in [
            ["--warmup", "18446744073709551615ms"],
            ["--cooldown", "10m1s"],
            ["--work", "301s"],
            ["--recovery", "6m"],
            ["--rounds", "101"],
        ] {
            let mut args = base.to_vec();
            args.extend(extra);
            assert!(
                build_cli().try_get_matches_from(args).is_err(),
                "accepted {extra:?}"
            );
        }

        let matches = parse(&["--warmup", "10m", "--work", "5m", "-r", "100"]);
        assert_eq!(
            matches.get_one::<Duration>("warmup"),
            Some(&Duration::from_secs(600))
        );
        assert_eq!(matches.get_one::<u32>("rounds"), Some(&100));
    }

    #[test]
    fn list_methods_needs_no_inputs() {
        let matches = build_cli()
            .try_get_matches_from(["intervalmix", "--list-methods"])
            .unwrap();
        assert!(matches.get_flag("list-methods"));
    }
}
