use std::fs;
use std::path::PathBuf;

use crate::error::LoadError;
use crate::models::Workout;

pub const DEFAULT_WORKOUTS: &str = "data/workouts.json";

/// Loads the workout list from a local file or an http(s) URL.
pub fn load_workouts(source: &str) -> Result<Vec<Workout>, LoadError> {
    let json_data = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source)?
    } else {
        fs::read_to_string(source).map_err(|source_err| LoadError::ReadFile {
            path: PathBuf::from(source),
            source: source_err,
        })?
    };

    let workouts = parse_workouts(&json_data)?;
    tracing::info!(source, count = workouts.len(), "Loaded workouts");
    Ok(workouts)
}

fn fetch_remote(url: &str) -> Result<String, LoadError> {
    let client = reqwest::blocking::Client::new();
    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|source| LoadError::Fetch {
            url: url.to_string(),
            source,
        })
}

pub fn parse_workouts(json_data: &str) -> Result<Vec<Workout>, LoadError> {
    let workouts: Vec<Workout> = serde_json::from_str(json_data)?;
    for workout in &workouts {
        validate(workout)?;
    }
    Ok(workouts)
}

fn validate(workout: &Workout) -> Result<(), LoadError> {
    for (index, segment) in workout.segments.iter().enumerate() {
        let reason = if segment.duration == 0 {
            Some(format!("segment {} has zero duration", index))
        } else if !(0.0..=10.0).contains(&segment.intensity) {
            Some(format!(
                "segment {} intensity {} is outside 0-10",
                index, segment.intensity
            ))
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(LoadError::InvalidWorkout {
                name: workout.name.clone(),
                reason,
            });
        }
    }
    Ok(())
}
