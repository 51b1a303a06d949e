//! Error types for loading workouts and driving side effects

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading the workout list
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read workout file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch workouts from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse workout JSON")]
    Parse(#[from] serde_json::Error),

    #[error("invalid workout {name:?}: {reason}")]
    InvalidWorkout { name: String, reason: String },
}

/// Errors from the audio cue player
#[derive(Debug, Error)]
pub enum CueError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to query output config")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream")]
    Play(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format {0:?}")]
    SampleFormat(cpal::SampleFormat),
}

/// Errors from the screen wake lock
#[derive(Debug, Error)]
pub enum WakeLockError {
    #[error("screen wake lock is not supported on this platform")]
    Unsupported,

    #[error("failed to spawn {program}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
}
