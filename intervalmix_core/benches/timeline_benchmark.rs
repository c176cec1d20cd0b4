use std::f32::consts::TAU;
use std::path::Path;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use intervalmix_core::{
    extract, plan, AnnouncementSynthesizer, AudioFormat, AudioTrack, IntervalMixError, Method,
    NoProgress, SpeechSynthesizer, TimelineBuilder,
};

const FORMAT: AudioFormat = AudioFormat::new(44_100, 2);

fn sine_track(seconds: u32, frequency: f32) -> AudioTrack {
    let total_frames = seconds as usize * FORMAT.sample_rate as usize;
    let amplitude = 0.6;
    let mut samples = Vec::with_capacity(total_frames * FORMAT.channels as usize);

    for frame in 0..total_frames {
        let t = frame as f32 / FORMAT.sample_rate as f32;
        let sample = amplitude * (frequency * TAU * t).sin();
        for _ in 0..FORMAT.channels {
            samples.push(sample);
        }
    }

    AudioTrack::new(samples, FORMAT)
}

struct QuietSpeech;

impl SpeechSynthesizer for QuietSpeech {
    fn speak(&self, _text: &str, _scratch_file: &Path) -> Result<AudioTrack, IntervalMixError> {
        Ok(AudioTrack::silent(1_500, AudioFormat::new(22_050, 1)))
    }
}

struct Scenario {
    name: &'static str,
    requested_ms: u64,
    cycle_mode: bool,
}

fn extraction_benchmarks(c: &mut Criterion) {
    let track = sine_track(25, 440.0);

    let scenarios = [
        Scenario {
            name: "restart_within_track",
            requested_ms: 20_000,
            cycle_mode: false,
        },
        Scenario {
            name: "restart_looping",
            requested_ms: 75_000,
            cycle_mode: false,
        },
        Scenario {
            name: "cycle_wrapping",
            requested_ms: 60_000,
            cycle_mode: true,
        },
    ];

    let mut group = c.benchmark_group("extract");
    for scenario in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(scenario.name),
            &scenario,
            |b, scenario| {
                b.iter(|| {
                    extract(&track, scenario.requested_ms, scenario.cycle_mode, 17_000)
                        .expect("extraction failed")
                });
            },
        );
    }
    group.finish();
}

fn assembly_benchmarks(c: &mut Criterion) {
    let intense = sine_track(25, 880.0);
    let moderate = sine_track(40, 220.0);

    let mut group = c.benchmark_group("assemble");
    group.sample_size(10);
    for method in [Method::Tabata, Method::Gibala] {
        let plan = plan(method, None, None, method.preset().default_rounds)
            .expect("preset plan")
            .with_cycle_mode(true)
            .with_warmup_ms(60_000)
            .expect("warm-up within limits")
            .with_cooldown_ms(60_000)
            .expect("cool-down within limits");
        group.bench_with_input(BenchmarkId::from_parameter(method), &plan, |b, plan| {
            b.iter(|| {
                let announcer = AnnouncementSynthesizer::new(QuietSpeech)
                    .expect("scratch directory")
                    .with_tempo(1.0);
                TimelineBuilder::new(announcer)
                    .assemble(&intense, &moderate, plan, method, &mut NoProgress)
                    .expect("assembly failed")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, extraction_benchmarks, assembly_benchmarks);
criterion_main!(benches);
