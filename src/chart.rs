use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};

use crate::models::Workout;

/// Seconds between chart samples
pub const SAMPLE_STRIDE: u32 = 30;
pub const MAX_INTENSITY: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartSample {
    pub minutes: f32,
    pub intensity: f32,
}

/// Samples every segment at a fixed stride. A segment shorter than the
/// stride still contributes one sample at its start.
///
/// Offsets are the true time into the workout (`segment start + k * stride`).
/// Stepping a running total by one stride per sample would drift after any
/// segment that is not a multiple of the stride; the two agree otherwise.
pub fn chart_samples(workout: &Workout) -> Vec<ChartSample> {
    let mut samples = Vec::new();
    let mut segment_start = 0;

    for segment in &workout.segments {
        for offset in (0..segment.duration).step_by(SAMPLE_STRIDE as usize) {
            samples.push(ChartSample {
                minutes: (segment_start + offset) as f32 / 60.0,
                intensity: segment.intensity,
            });
        }
        segment_start += segment.duration;
    }

    samples
}

/// Draws the intensity profile as a line chart. `elapsed_minutes` marks the
/// current position while a workout is in progress.
pub fn paint_profile(
    ui: &mut Ui,
    samples: &[ChartSample],
    total_minutes: f32,
    elapsed_minutes: Option<f32>,
) {
    let desired = Vec2::new(ui.available_width(), 220.0);
    let (response, painter) = ui.allocate_painter(desired, Sense::hover());
    let frame = response.rect;
    let visuals = ui.visuals();

    painter.rect_filled(frame, 4.0, visuals.extreme_bg_color);

    let plot = Rect::from_min_max(
        frame.min + Vec2::new(36.0, 10.0),
        frame.max - Vec2::new(10.0, 28.0),
    );
    let axis_stroke = Stroke::new(1.0, visuals.weak_text_color());
    let label_font = FontId::proportional(12.0);

    painter.line_segment([plot.left_bottom(), plot.right_bottom()], axis_stroke);
    painter.line_segment([plot.left_bottom(), plot.left_top()], axis_stroke);

    for level in [0.0, 5.0, 10.0] {
        let y = plot.bottom() - plot.height() * level / MAX_INTENSITY;
        painter.text(
            Pos2::new(plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            format!("{}", level),
            label_font.clone(),
            visuals.weak_text_color(),
        );
    }
    painter.text(
        Pos2::new(plot.center().x, frame.bottom() - 4.0),
        Align2::CENTER_BOTTOM,
        "Time (minutes)",
        label_font.clone(),
        visuals.weak_text_color(),
    );

    if samples.is_empty() || total_minutes <= 0.0 {
        painter.text(
            plot.center(),
            Align2::CENTER_CENTER,
            "No segments",
            label_font,
            visuals.weak_text_color(),
        );
        return;
    }

    let to_screen = |minutes: f32, intensity: f32| {
        Pos2::new(
            plot.left() + plot.width() * (minutes / total_minutes).clamp(0.0, 1.0),
            plot.bottom() - plot.height() * (intensity / MAX_INTENSITY).clamp(0.0, 1.0),
        )
    };

    let points: Vec<Pos2> = samples
        .iter()
        .map(|s| to_screen(s.minutes, s.intensity))
        .collect();
    painter.add(egui::Shape::line(
        points,
        Stroke::new(2.0, Color32::from_rgb(75, 192, 192)),
    ));

    if let Some(elapsed) = elapsed_minutes {
        let x = to_screen(elapsed, 0.0).x;
        painter.line_segment(
            [Pos2::new(x, plot.top()), Pos2::new(x, plot.bottom())],
            Stroke::new(1.5, Color32::from_rgb(235, 203, 139)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Segment;

    fn workout(segments: Vec<Segment>) -> Workout {
        Workout {
            name: "Test".to_string(),
            segments,
        }
    }

    #[test]
    fn test_single_segment_strides() {
        let samples = chart_samples(&workout(vec![Segment::new(65, 4.0, "Steady")]));

        let minutes: Vec<f32> = samples.iter().map(|s| s.minutes).collect();
        assert_eq!(minutes, vec![0.0, 0.5, 1.0]);
        assert!(samples.iter().all(|s| s.intensity == 4.0));
    }

    #[test]
    fn test_short_segment_yields_one_sample() {
        let samples = chart_samples(&workout(vec![
            Segment::new(10, 7.0, "Burst"),
            Segment::new(60, 2.0, "Rest"),
        ]));

        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples[0],
            ChartSample {
                minutes: 0.0,
                intensity: 7.0
            }
        );
        // Offsets follow real elapsed time, not the sample count
        assert!((samples[1].minutes - 10.0 / 60.0).abs() < 1e-6);
        assert_eq!(samples[1].intensity, 2.0);
    }

    #[test]
    fn test_empty_workout_has_no_samples() {
        assert!(chart_samples(&workout(Vec::new())).is_empty());
    }
}
