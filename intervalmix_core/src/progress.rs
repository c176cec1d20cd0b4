/// Coarse steps of a generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Decoding,
    Announcements,
    Warmup,
    Round { index: u32, total: u32 },
    Cooldown,
    Rendering,
    Exporting,
}

/// Events emitted while a workout track is generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Start { rounds: u32 },
    Stage(Stage),
    Finish,
}

/// Receives progress notifications. Every method has a no-op default.
pub trait ProgressReporter {
    fn on_event(&mut self, _event: ProgressEvent) {}
}

impl<F> ProgressReporter for F
where
    F: FnMut(ProgressEvent),
{
    fn on_event(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Reporter that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}
