use crate::chart::ChartSample;
use crate::cues::{Cue, CuePlayer};
use crate::runner::{Phase, Progress, RunnerEvent, RunnerSink};
use crate::wake_lock::WakeLock;

/// UI-side consumer of runner events.
///
/// Audio and wake lock failures are logged here and never travel back to
/// the runner.
pub struct UiEffects {
    cues: Option<CuePlayer>,
    wake_lock: Option<WakeLock>,
    pub blinking: bool,
    pub complete: bool,
    pub chart: Vec<ChartSample>,
    pub progress: Progress,
}

impl UiEffects {
    pub fn new(
        cues: Option<CuePlayer>,
        wake_lock: Option<WakeLock>,
        chart: Vec<ChartSample>,
        progress: Progress,
    ) -> Self {
        UiEffects {
            cues,
            wake_lock,
            blinking: false,
            complete: false,
            chart,
            progress,
        }
    }

    fn play(&mut self, cue: Cue) {
        if let Some(player) = &mut self.cues {
            if let Err(e) = player.play(cue) {
                tracing::warn!(?cue, error = %e, "Failed to play cue");
            }
        }
    }
}

impl RunnerSink for UiEffects {
    fn emit(&mut self, event: RunnerEvent) {
        match event {
            RunnerEvent::SegmentStarted { index, status } => {
                tracing::debug!(index, %status, "Segment start cue");
                self.complete = false;
                self.play(Cue::SegmentStart);
            }
            RunnerEvent::Countdown { .. } => self.play(Cue::Countdown),
            RunnerEvent::Warning(on) => self.blinking = on,
            RunnerEvent::AcquireWakeLock => {
                if let Some(lock) = &mut self.wake_lock {
                    if let Err(e) = lock.acquire() {
                        tracing::warn!(error = %e, "Wake lock unavailable");
                    }
                }
            }
            RunnerEvent::ReleaseWakeLock => {
                if let Some(lock) = &mut self.wake_lock {
                    lock.release();
                    tracing::debug!(held = lock.is_held(), "Wake lock state");
                }
            }
            RunnerEvent::Completed => self.complete = true,
            RunnerEvent::ChartChanged(samples) => {
                self.complete = false;
                self.chart = samples;
            }
            RunnerEvent::Progress(progress) => {
                if progress.phase != Phase::Complete {
                    self.complete = false;
                }
                self.progress = progress;
            }
        }
    }
}
