//! Segment-advancement state machine
//!
//! The runner owns the loaded workouts, the current position inside the
//! selected workout and the one-second tick source. Side effects (cues,
//! wake lock, display refresh) are reported through a [`RunnerSink`] so
//! the machine runs with no rendering surface present.

use std::time::Instant;

use crate::chart::{chart_samples, ChartSample};
use crate::models::{format_clock, Segment, Workout};
use crate::ticker::Ticker;

/// Remaining seconds at or below which the countdown cue fires
pub const COUNTDOWN_SECONDS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Idle => "Idle",
            Phase::Running => "Running",
            Phase::Paused => "Paused",
            Phase::Complete => "Complete",
        }
    }
}

/// Side effects requested by the runner
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    /// A segment began; play the start cue
    SegmentStarted { index: usize, status: String },
    /// One of the last seconds of a segment; play the countdown cue
    Countdown { remaining: u32 },
    /// Toggle the blinking timer display
    Warning(bool),
    AcquireWakeLock,
    ReleaseWakeLock,
    Completed,
    /// Chart samples for a newly selected workout
    ChartChanged(Vec<ChartSample>),
    /// Display refresh, emitted each tick and on state entry
    Progress(Progress),
}

pub trait RunnerSink {
    fn emit(&mut self, event: RunnerEvent);
}

impl RunnerSink for Vec<RunnerEvent> {
    fn emit(&mut self, event: RunnerEvent) {
        self.push(event);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NextSegment {
    pub status: String,
    pub duration: u32,
}

/// Snapshot of everything the display shows
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: Phase,
    pub segment: usize,
    pub remaining: u32,
    /// 0.0-1.0 through the current segment
    pub segment_fraction: f32,
    /// 0.0-1.0 through the whole workout
    pub total_fraction: f32,
    pub current: Option<String>,
    pub next: Option<NextSegment>,
}

impl Progress {
    pub fn clock(&self) -> String {
        format_clock(self.remaining)
    }
}

#[derive(Debug)]
pub struct WorkoutRunner {
    workouts: Vec<Workout>,
    selected: usize,
    segment: usize,
    remaining: u32,
    phase: Phase,
    warning: bool,
    ticker: Ticker,
    chart: Vec<ChartSample>,
}

impl WorkoutRunner {
    pub fn new(workouts: Vec<Workout>) -> Self {
        let chart = workouts.first().map(chart_samples).unwrap_or_default();
        WorkoutRunner {
            workouts,
            selected: 0,
            segment: 0,
            remaining: 0,
            phase: Phase::Idle,
            warning: false,
            ticker: Ticker::every_second(),
            chart,
        }
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn workout(&self) -> Option<&Workout> {
        self.workouts.get(self.selected)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn segment_index(&self) -> usize {
        self.segment
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_warning(&self) -> bool {
        self.warning
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn chart(&self) -> &[ChartSample] {
        &self.chart
    }

    fn current_segment(&self) -> Option<&Segment> {
        self.workout().and_then(|w| w.segments.get(self.segment))
    }

    /// Switches workouts, discarding any progress. Out-of-range indices are
    /// ignored.
    pub fn select(&mut self, index: usize, sink: &mut impl RunnerSink) {
        let Some(workout) = self.workouts.get(index) else {
            tracing::debug!(index, "Ignoring selection of unknown workout");
            return;
        };

        self.chart = chart_samples(workout);
        tracing::debug!(index, name = %workout.name, "Workout selected");

        let was_active = matches!(self.phase, Phase::Running | Phase::Paused);
        self.selected = index;
        self.stop(sink, was_active);
        sink.emit(RunnerEvent::ChartChanged(self.chart.clone()));
        sink.emit(RunnerEvent::Progress(self.progress()));
    }

    pub fn start(&mut self, now: Instant, sink: &mut impl RunnerSink) {
        if self.phase != Phase::Idle {
            return;
        }
        let Some(workout) = self.workout() else {
            return;
        };

        match workout.segments.first() {
            None => {
                tracing::debug!(name = %workout.name, "Workout has no segments");
                self.phase = Phase::Complete;
                self.segment = 0;
                self.remaining = 0;
                sink.emit(RunnerEvent::Completed);
            }
            Some(first) => {
                let (duration, status) = (first.duration, first.status.clone());
                self.segment = 0;
                self.remaining = duration;
                self.phase = Phase::Running;
                self.ticker.start(now);
                tracing::debug!(remaining = self.remaining, "Workout started");
                sink.emit(RunnerEvent::SegmentStarted { index: 0, status });
                sink.emit(RunnerEvent::AcquireWakeLock);
            }
        }
        sink.emit(RunnerEvent::Progress(self.progress()));
    }

    pub fn pause(&mut self, sink: &mut impl RunnerSink) {
        if self.phase != Phase::Running {
            return;
        }
        self.ticker.stop();
        self.phase = Phase::Paused;
        // Paused frames are not repainted, so the blink must end here
        self.set_warning(false, sink);
        tracing::debug!(segment = self.segment, remaining = self.remaining, "Paused");
        sink.emit(RunnerEvent::ReleaseWakeLock);
        sink.emit(RunnerEvent::Progress(self.progress()));
    }

    pub fn resume(&mut self, now: Instant, sink: &mut impl RunnerSink) {
        if self.phase != Phase::Paused {
            return;
        }
        self.ticker.start(now);
        self.phase = Phase::Running;
        tracing::debug!(segment = self.segment, remaining = self.remaining, "Resumed");
        sink.emit(RunnerEvent::AcquireWakeLock);
        sink.emit(RunnerEvent::Progress(self.progress()));
    }

    /// The single pause/resume control.
    pub fn toggle_pause(&mut self, now: Instant, sink: &mut impl RunnerSink) {
        match self.phase {
            Phase::Running => self.pause(sink),
            Phase::Paused => self.resume(now, sink),
            Phase::Idle | Phase::Complete => {}
        }
    }

    pub fn reset(&mut self, sink: &mut impl RunnerSink) {
        let was_active = matches!(self.phase, Phase::Running | Phase::Paused);
        self.stop(sink, was_active);
        sink.emit(RunnerEvent::Progress(self.progress()));
    }

    fn stop(&mut self, sink: &mut impl RunnerSink, release: bool) {
        self.ticker.stop();
        self.phase = Phase::Idle;
        self.segment = 0;
        self.remaining = 0;
        if self.warning {
            self.warning = false;
            sink.emit(RunnerEvent::Warning(false));
        }
        if release {
            sink.emit(RunnerEvent::ReleaseWakeLock);
        }
    }

    /// Feeds every tick that fell due since the last poll.
    pub fn poll(&mut self, now: Instant, sink: &mut impl RunnerSink) {
        for _ in 0..self.ticker.due(now) {
            if self.phase != Phase::Running {
                break;
            }
            self.tick(sink);
        }
    }

    /// Advances the running workout by one second.
    pub fn tick(&mut self, sink: &mut impl RunnerSink) {
        if self.phase != Phase::Running {
            return;
        }

        self.remaining = self.remaining.saturating_sub(1);

        if self.remaining == 0 {
            self.set_warning(false, sink);
            self.advance(sink);
        } else if self.remaining <= COUNTDOWN_SECONDS {
            sink.emit(RunnerEvent::Countdown {
                remaining: self.remaining,
            });
            self.set_warning(true, sink);
        } else {
            self.set_warning(false, sink);
        }

        sink.emit(RunnerEvent::Progress(self.progress()));
    }

    fn advance(&mut self, sink: &mut impl RunnerSink) {
        let next = self.segment + 1;
        let next_segment = self
            .workout()
            .and_then(|w| w.segments.get(next))
            .map(|s| (s.duration, s.status.clone()));

        match next_segment {
            Some((duration, status)) => {
                self.segment = next;
                self.remaining = duration;
                tracing::debug!(segment = next, %status, "Segment started");
                sink.emit(RunnerEvent::SegmentStarted {
                    index: next,
                    status,
                });
            }
            None => {
                self.segment = next;
                self.ticker.stop();
                self.phase = Phase::Complete;
                tracing::info!("Workout complete");
                sink.emit(RunnerEvent::ReleaseWakeLock);
                sink.emit(RunnerEvent::Completed);
            }
        }
    }

    fn set_warning(&mut self, on: bool, sink: &mut impl RunnerSink) {
        if self.warning != on {
            self.warning = on;
            sink.emit(RunnerEvent::Warning(on));
        }
    }

    pub fn progress(&self) -> Progress {
        let workout = self.workout();
        let total = workout.map(|w| w.total_duration()).unwrap_or(0);

        let (segment_fraction, total_fraction) = match (self.phase, self.current_segment()) {
            (Phase::Running | Phase::Paused, Some(segment)) => {
                let done = segment.duration - self.remaining.min(segment.duration);
                let before = workout.map(|w| w.elapsed_before(self.segment)).unwrap_or(0);
                let total_fraction = if total > 0 {
                    (before + done) as f32 / total as f32
                } else {
                    0.0
                };
                (done as f32 / segment.duration as f32, total_fraction)
            }
            (Phase::Complete, _) => (1.0, 1.0),
            _ => (0.0, 0.0),
        };

        let current = match self.phase {
            Phase::Complete => None,
            _ => self.current_segment().map(|s| s.status.clone()),
        };
        let next = match self.phase {
            Phase::Complete => None,
            _ => workout
                .and_then(|w| w.segments.get(self.segment + 1))
                .map(|s| NextSegment {
                    status: s.status.clone(),
                    duration: s.duration,
                }),
        };

        Progress {
            phase: self.phase,
            segment: self.segment,
            remaining: self.remaining,
            segment_fraction,
            total_fraction,
            current,
            next,
        }
    }

    /// Minutes into the workout, for the chart cursor.
    pub fn elapsed_minutes(&self) -> Option<f32> {
        let workout = self.workout()?;
        match self.phase {
            Phase::Running | Phase::Paused => {
                let segment = self.current_segment()?;
                let elapsed = workout.elapsed_before(self.segment) + segment.duration
                    - self.remaining.min(segment.duration);
                Some(elapsed as f32 / 60.0)
            }
            Phase::Complete => Some(workout.total_duration() as f32 / 60.0),
            Phase::Idle => None,
        }
    }

    pub fn phase_label(&self) -> &str {
        self.phase.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn warmup_sprint() -> Workout {
        Workout {
            name: "Warmup Sprint".to_string(),
            segments: vec![
                Segment::new(5, 3.0, "Warmup"),
                Segment::new(3, 8.0, "Sprint"),
            ],
        }
    }

    fn endurance() -> Workout {
        Workout {
            name: "Endurance".to_string(),
            segments: vec![Segment::new(65, 4.0, "Steady")],
        }
    }

    fn runner() -> WorkoutRunner {
        WorkoutRunner::new(vec![warmup_sprint(), endurance()])
    }

    fn segment_starts(events: &[RunnerEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                RunnerEvent::SegmentStarted { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    fn countdowns(events: &[RunnerEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                RunnerEvent::Countdown { remaining } => Some(*remaining),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_worked_example() {
        let mut runner = runner();
        let mut events = Vec::new();

        runner.start(Instant::now(), &mut events);
        assert_eq!(runner.phase(), Phase::Running);
        assert_eq!(runner.segment_index(), 0);
        assert_eq!(runner.remaining(), 5);
        assert!(runner.is_ticking());
        assert_eq!(segment_starts(&events), vec![0]);
        assert!(events.contains(&RunnerEvent::AcquireWakeLock));

        events.clear();
        for _ in 0..5 {
            runner.tick(&mut events);
        }
        assert_eq!(runner.segment_index(), 1);
        assert_eq!(runner.remaining(), 3);
        assert_eq!(segment_starts(&events), vec![1]);

        events.clear();
        for _ in 0..3 {
            runner.tick(&mut events);
        }
        assert_eq!(runner.phase(), Phase::Complete);
        assert!(!runner.is_ticking());
        assert!(events.contains(&RunnerEvent::Completed));
        assert!(events.contains(&RunnerEvent::ReleaseWakeLock));
    }

    #[test]
    fn test_total_ticks_reach_complete() {
        let workout = Workout {
            name: "Mixed".to_string(),
            segments: vec![
                Segment::new(1, 1.0, "A"),
                Segment::new(7, 5.0, "B"),
                Segment::new(2, 9.0, "C"),
                Segment::new(4, 2.0, "D"),
            ],
        };
        let total = workout.total_duration();
        let mut runner = WorkoutRunner::new(vec![workout]);
        let mut events = Vec::new();

        runner.start(Instant::now(), &mut events);
        for tick in 1..=total {
            assert_eq!(runner.phase(), Phase::Running, "tick {}", tick);
            runner.tick(&mut events);
        }
        assert_eq!(runner.phase(), Phase::Complete);
        assert!(!runner.is_ticking());
        assert_eq!(segment_starts(&events), vec![0, 1, 2, 3]);

        // Further ticks are ignored once complete
        runner.tick(&mut events);
        assert_eq!(runner.phase(), Phase::Complete);
    }

    #[test]
    fn test_countdown_window() {
        let mut runner = WorkoutRunner::new(vec![endurance()]);
        let mut events = Vec::new();
        runner.start(Instant::now(), &mut events);

        for _ in 0..65 {
            let before = events.len();
            runner.tick(&mut events);
            let fired = !countdowns(&events[before..]).is_empty();
            let remaining = runner.remaining();
            let in_window = runner.phase() == Phase::Running
                && remaining > 0
                && remaining <= COUNTDOWN_SECONDS;
            assert_eq!(fired, in_window, "remaining {}", remaining);
            assert_eq!(runner.is_warning(), in_window);
        }

        assert_eq!(countdowns(&events), vec![3, 2, 1]);
        assert_eq!(runner.phase(), Phase::Complete);
    }

    #[test]
    fn test_pause_resume_preserves_position() {
        let mut runner = runner();
        let mut events = Vec::new();
        let now = Instant::now();
        runner.start(now, &mut events);

        for _ in 0..6 {
            runner.tick(&mut events);
        }
        let (segment, remaining) = (runner.segment_index(), runner.remaining());
        assert_eq!((segment, remaining), (1, 2));

        events.clear();
        runner.toggle_pause(now, &mut events);
        assert_eq!(runner.phase(), Phase::Paused);
        assert!(!runner.is_ticking());
        assert!(events.contains(&RunnerEvent::ReleaseWakeLock));

        // Ticks while paused change nothing
        runner.tick(&mut events);
        runner.poll(now + Duration::from_secs(10), &mut events);
        assert_eq!((runner.segment_index(), runner.remaining()), (segment, remaining));

        events.clear();
        runner.toggle_pause(now, &mut events);
        assert_eq!(runner.phase(), Phase::Running);
        assert!(runner.is_ticking());
        assert!(events.contains(&RunnerEvent::AcquireWakeLock));
        assert!(segment_starts(&events).is_empty());
        assert_eq!((runner.segment_index(), runner.remaining()), (segment, remaining));

        runner.tick(&mut events);
        assert_eq!(runner.remaining(), remaining - 1);
    }

    #[test]
    fn test_reset_from_every_phase() {
        let now = Instant::now();
        let setups: [fn(&mut WorkoutRunner, &mut Vec<RunnerEvent>); 4] = [
            |_, _| {},
            |r, e| {
                r.start(Instant::now(), e);
                r.tick(e);
            },
            |r, e| {
                r.start(Instant::now(), e);
                r.tick(e);
                r.pause(e);
            },
            |r, e| {
                r.start(Instant::now(), e);
                for _ in 0..8 {
                    r.tick(e);
                }
            },
        ];

        for setup in setups {
            let mut runner = runner();
            let mut events = Vec::new();
            setup(&mut runner, &mut events);

            runner.reset(&mut events);
            assert_eq!(runner.phase(), Phase::Idle);
            assert_eq!(runner.segment_index(), 0);
            assert_eq!(runner.remaining(), 0);
            assert!(!runner.is_ticking());
            assert_eq!(runner.ticker().clone().due(now + Duration::from_secs(3600)), 0);
        }
    }

    #[test]
    fn test_select_discards_progress_and_rebuilds_chart() {
        let mut runner = runner();
        let mut events = Vec::new();
        runner.start(Instant::now(), &mut events);
        runner.tick(&mut events);
        runner.tick(&mut events);

        events.clear();
        runner.select(1, &mut events);

        assert_eq!(runner.selected_index(), 1);
        assert_eq!(runner.phase(), Phase::Idle);
        assert_eq!(runner.segment_index(), 0);
        assert_eq!(runner.remaining(), 0);
        assert!(!runner.is_ticking());
        assert!(events.contains(&RunnerEvent::ReleaseWakeLock));

        let expected = chart_samples(&endurance());
        assert_eq!(runner.chart(), expected.as_slice());
        assert!(events.contains(&RunnerEvent::ChartChanged(expected)));
    }

    #[test]
    fn test_select_unknown_index_is_ignored() {
        let mut runner = runner();
        let mut events = Vec::new();
        runner.select(7, &mut events);

        assert_eq!(runner.selected_index(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_zero_segment_workout_completes_immediately() {
        let mut runner = WorkoutRunner::new(vec![Workout {
            name: "Nothing".to_string(),
            segments: Vec::new(),
        }]);
        let mut events = Vec::new();

        runner.start(Instant::now(), &mut events);
        assert_eq!(runner.phase(), Phase::Complete);
        assert!(!runner.is_ticking());
        assert!(events.contains(&RunnerEvent::Completed));
        assert!(!events.contains(&RunnerEvent::AcquireWakeLock));
    }

    #[test]
    fn test_actions_without_workouts_are_noops() {
        let mut runner = WorkoutRunner::new(Vec::new());
        let mut events = Vec::new();
        let now = Instant::now();

        runner.start(now, &mut events);
        runner.toggle_pause(now, &mut events);
        runner.tick(&mut events);
        runner.select(0, &mut events);

        assert_eq!(runner.phase(), Phase::Idle);
        assert!(runner.chart().is_empty());
        assert!(!events
            .iter()
            .any(|e| matches!(e, RunnerEvent::SegmentStarted { .. })));
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let mut runner = runner();
        let mut events = Vec::new();
        runner.start(Instant::now(), &mut events);
        runner.tick(&mut events);

        runner.start(Instant::now(), &mut events);
        assert_eq!(runner.remaining(), 4);
        assert_eq!(segment_starts(&events), vec![0]);
    }

    #[test]
    fn test_poll_feeds_due_ticks() {
        let mut runner = runner();
        let mut events = Vec::new();
        let start = Instant::now();
        runner.start(start, &mut events);

        runner.poll(start + Duration::from_millis(2500), &mut events);
        assert_eq!(runner.remaining(), 3);

        // Far past the end: stops at Complete without panicking
        runner.poll(start + Duration::from_secs(60), &mut events);
        assert_eq!(runner.phase(), Phase::Complete);
    }

    #[test]
    fn test_progress_fractions() {
        let mut runner = runner();
        let mut events = Vec::new();
        runner.start(Instant::now(), &mut events);

        let progress = runner.progress();
        assert_eq!(progress.clock(), "00:05");
        assert_eq!(progress.segment_fraction, 0.0);
        assert_eq!(progress.current.as_deref(), Some("Warmup"));
        assert_eq!(
            progress.next,
            Some(NextSegment {
                status: "Sprint".to_string(),
                duration: 3
            })
        );

        for _ in 0..6 {
            runner.tick(&mut events);
        }
        let progress = runner.progress();
        assert_eq!(progress.remaining, 2);
        assert!((progress.segment_fraction - 1.0 / 3.0).abs() < 1e-6);
        assert!((progress.total_fraction - 6.0 / 8.0).abs() < 1e-6);
        assert_eq!(progress.current.as_deref(), Some("Sprint"));
        assert_eq!(progress.next, None);

        for _ in 0..2 {
            runner.tick(&mut events);
        }
        let progress = runner.progress();
        assert_eq!(progress.phase, Phase::Complete);
        assert_eq!(progress.total_fraction, 1.0);
        assert_eq!(progress.current, None);
    }

    #[test]
    fn test_each_tick_emits_progress() {
        let mut runner = runner();
        let mut events = Vec::new();
        runner.start(Instant::now(), &mut events);
        events.clear();

        runner.tick(&mut events);
        assert!(matches!(
            events.last(),
            Some(RunnerEvent::Progress(Progress { remaining: 4, .. }))
        ));
    }

    #[test]
    fn test_select_while_paused_stops_timer() {
        let mut runner = runner();
        let mut events = Vec::new();
        let now = Instant::now();
        runner.start(now, &mut events);
        runner.tick(&mut events);
        runner.tick(&mut events);
        runner.pause(&mut events);
        assert_eq!(runner.phase(), Phase::Paused);

        events.clear();
        runner.select(1, &mut events);

        assert_eq!(runner.phase(), Phase::Idle);
        assert_eq!(runner.segment_index(), 0);
        assert_eq!(runner.remaining(), 0);
        assert!(!runner.is_ticking());
        assert!(events.contains(&RunnerEvent::ReleaseWakeLock));

        // No implicit resume after switching
        runner.toggle_pause(now, &mut events);
        assert_eq!(runner.phase(), Phase::Idle);
    }

    #[test]
    fn test_countdown_across_segments() {
        let mut runner = runner();
        let mut events = Vec::new();
        runner.start(Instant::now(), &mut events);

        let mut warnings = Vec::new();
        for _ in 0..8 {
            runner.tick(&mut events);
            warnings.push(runner.is_warning());
        }

        assert_eq!(runner.phase(), Phase::Complete);
        assert_eq!(countdowns(&events), vec![3, 2, 1, 2, 1]);
        // The tick entering Sprint at 3 seconds left is a segment start, not a countdown
        assert_eq!(
            warnings,
            vec![false, true, true, true, false, true, true, false]
        );
    }

    #[test]
    fn test_pause_clears_warning() {
        let mut runner = runner();
        let mut events = Vec::new();
        let now = Instant::now();
        runner.start(now, &mut events);
        for _ in 0..3 {
            runner.tick(&mut events);
        }
        assert!(runner.is_warning());

        events.clear();
        runner.pause(&mut events);
        assert!(!runner.is_warning());
        assert!(events.contains(&RunnerEvent::Warning(false)));
        assert_eq!(runner.remaining(), 2);

        runner.resume(now, &mut events);
        runner.tick(&mut events);
        assert!(runner.is_warning());
        assert_eq!(countdowns(&events), vec![1]);
    }
}
