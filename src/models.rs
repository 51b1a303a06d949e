//models.rs
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Segment {
    /// Length in seconds
    pub duration: u32,
    /// Target effort on a 0-10 scale
    pub intensity: f32,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Workout {
    pub name: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Segment {
    pub fn new(duration: u32, intensity: f32, status: &str) -> Self {
        Segment {
            duration,
            intensity,
            status: status.to_string(),
        }
    }
}

impl Workout {
    pub fn total_duration(&self) -> u32 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Seconds covered by the segments before `index`
    pub fn elapsed_before(&self, index: usize) -> u32 {
        self.segments.iter().take(index).map(|s| s.duration).sum()
    }
}

/// Formats seconds as `mm:ss`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn test_durations() {
        let workout = Workout {
            name: "Pyramid".to_string(),
            segments: vec![
                Segment::new(60, 3.0, "Warmup"),
                Segment::new(30, 8.0, "Sprint"),
                Segment::new(90, 2.0, "Recover"),
            ],
        };

        assert_eq!(workout.total_duration(), 180);
        assert_eq!(workout.elapsed_before(0), 0);
        assert_eq!(workout.elapsed_before(2), 90);
        assert_eq!(workout.elapsed_before(3), 180);
    }
}
