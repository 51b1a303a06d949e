use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use clap::Parser;
use eframe::{egui, App, CreationContext, Frame};
use egui::{Align, Color32, Layout, RichText, Ui};
use egui_extras::{Column, TableBuilder};

mod chart;
mod cues;
mod effects;
mod error;
mod logging;
mod models;
mod routines;
mod runner;
mod ticker;
mod wake_lock;

use cues::CuePlayer;
use effects::UiEffects;
use models::format_clock;
use runner::{Phase, WorkoutRunner};
use wake_lock::WakeLock;

#[derive(Parser, Debug)]
#[command(version, about = "Interval workout timer")]
struct Args {
    /// Workout list, a JSON file path or an http(s) URL
    #[arg(short, long, default_value = routines::DEFAULT_WORKOUTS)]
    workouts: String,

    /// Index of the workout selected at startup
    #[arg(long, default_value_t = 0)]
    workout: usize,

    /// Disable audio cues
    #[arg(long)]
    mute: bool,

    /// Cue volume, 0.0 to 1.0
    #[arg(long, default_value_t = 0.5)]
    volume: f32,

    /// Do not keep the screen awake while running
    #[arg(long)]
    no_wake_lock: bool,

    /// Custom TTF/OTF font
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), eframe::Error> {
    let args = Args::parse();
    logging::init(args.verbose);

    let (workouts, load_error) = match routines::load_workouts(&args.workouts) {
        Ok(workouts) => (workouts, None),
        Err(e) => {
            let message = error_chain(&e);
            tracing::error!(source = %args.workouts, error = %message, "Failed to load workouts");
            (Vec::new(), Some(message))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Interval Timer",
        options,
        Box::new(move |cc| {
            if let Some(path) = &args.font {
                install_font(&cc.egui_ctx, path);
            }
            Ok(Box::new(WorkoutApp::new(cc, workouts, load_error, &args)))
        }),
    )
}

fn install_font(ctx: &egui::Context, path: &Path) {
    let font_data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Failed to open font file");
            return;
        }
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        "custom".to_owned(),
        Arc::from(egui::FontData::from_owned(font_data)),
    );
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .insert(0, "custom".to_owned());
    }
    ctx.set_fonts(fonts);
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

struct WorkoutApp {
    runner: WorkoutRunner,
    effects: UiEffects,
    load_error: Option<String>,
    show_chart: bool,
    started_at: Option<DateTime<Local>>,
}

impl WorkoutApp {
    fn new(
        _cc: &CreationContext,
        workouts: Vec<models::Workout>,
        load_error: Option<String>,
        args: &Args,
    ) -> Self {
        let cues = if args.mute {
            None
        } else {
            match CuePlayer::new(args.volume) {
                Ok(player) => Some(player),
                Err(e) => {
                    tracing::warn!(error = %error_chain(&e), "Audio cues disabled");
                    None
                }
            }
        };
        let wake_lock = if args.no_wake_lock {
            None
        } else {
            Some(WakeLock::new())
        };

        let mut runner = WorkoutRunner::new(workouts);
        let mut effects = UiEffects::new(cues, wake_lock, runner.chart().to_vec(), runner.progress());
        if args.workout != 0 {
            runner.select(args.workout, &mut effects);
        }

        WorkoutApp {
            runner,
            effects,
            load_error,
            show_chart: true,
            started_at: None,
        }
    }

    fn start(&mut self) {
        self.runner.start(Instant::now(), &mut self.effects);
        if self.runner.phase() == Phase::Running {
            self.started_at = Some(Local::now());
        }
    }

    fn toggle_pause(&mut self) {
        self.runner.toggle_pause(Instant::now(), &mut self.effects);
    }

    fn reset(&mut self) {
        self.runner.reset(&mut self.effects);
        self.started_at = None;
    }
}

impl App for WorkoutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.runner.poll(Instant::now(), &mut self.effects);

        if ctx.input(|i| i.key_pressed(egui::Key::S)) {
            self.start();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle_pause();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::R)) {
            self.reset();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::C)) {
            self.show_chart = !self.show_chart;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(Layout::top_down_justified(Align::Center), |ui| {
                ui.add_space(10.0);

                if let Some(error) = &self.load_error {
                    ui.label(
                        RichText::new(format!("Could not load workouts: {}", error))
                            .size(20.0)
                            .color(Color32::RED),
                    );
                    return;
                }

                self.show_controls(ui);
                ui.add_space(20.0);
                self.show_timer(ui);
                ui.add_space(20.0);

                if self.show_chart {
                    let total_minutes = self
                        .runner
                        .workout()
                        .map(|w| w.total_duration() as f32 / 60.0)
                        .unwrap_or(0.0);
                    chart::paint_profile(
                        ui,
                        &self.effects.chart,
                        total_minutes,
                        self.runner.elapsed_minutes(),
                    );
                    ui.add_space(20.0);
                }

                self.show_segments(ui);
            });
        });

        if let Some(wait) = self.runner.ticker().until_next(Instant::now()) {
            let wait = if self.effects.blinking {
                wait.min(Duration::from_millis(250))
            } else {
                wait
            };
            ctx.request_repaint_after(wait);
        }
    }
}

impl WorkoutApp {
    fn show_controls(&mut self, ui: &mut Ui) {
        let names: Vec<String> = self
            .runner
            .workouts()
            .iter()
            .map(|w| w.name.clone())
            .collect();
        let mut selected = self.runner.selected_index();

        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Workout")
                .selected_text(names.get(selected).cloned().unwrap_or_default())
                .show_ui(ui, |ui| {
                    for (index, name) in names.iter().enumerate() {
                        ui.selectable_value(&mut selected, index, name.as_str());
                    }
                });

            let phase = self.runner.phase();
            if ui
                .add_enabled(phase == Phase::Idle, egui::Button::new("Start"))
                .clicked()
            {
                self.start();
            }

            let pause_label = if phase == Phase::Paused { "Resume" } else { "Pause" };
            if ui
                .add_enabled(
                    matches!(phase, Phase::Running | Phase::Paused),
                    egui::Button::new(pause_label),
                )
                .clicked()
            {
                self.toggle_pause();
            }

            if ui.button("Reset").clicked() {
                self.reset();
            }

            let chart_label = if self.show_chart { "Hide Chart" } else { "Show Chart" };
            if ui.button(chart_label).clicked() {
                self.show_chart = !self.show_chart;
            }
        });

        if selected != self.runner.selected_index() {
            self.runner.select(selected, &mut self.effects);
            self.started_at = None;
        }
    }

    fn show_timer(&mut self, ui: &mut Ui) {
        let progress = &self.effects.progress;

        let clock = if self.effects.complete {
            "Workout Complete!".to_string()
        } else {
            progress.clock()
        };
        let blink_on = self.effects.blinking && (ui.input(|i| i.time) * 2.0) as i64 % 2 == 0;
        let mut text = RichText::new(clock).heading().size(96.0).strong();
        if blink_on {
            text = text.color(Color32::RED);
        }
        ui.label(text);

        let status = match self.started_at {
            Some(started) => format!(
                "Status: {} (started {})",
                self.runner.phase_label(),
                started.format("%H:%M:%S")
            ),
            None => format!("Status: {}", self.runner.phase_label()),
        };
        ui.label(RichText::new(status).size(18.0));

        if let Some(current) = &progress.current {
            ui.label(RichText::new(format!("Current: {}", current)).size(28.0).strong());
        }
        let next = match &progress.next {
            Some(next) => format!("Next: {} ({})", next.status, format_clock(next.duration)),
            None => "Next: N/A".to_string(),
        };
        ui.label(RichText::new(next).size(22.0));

        ui.add_space(10.0);
        ui.label("Segment");
        ui.add(
            egui::ProgressBar::new(progress.segment_fraction)
                .text(format!("{:.0}%", progress.segment_fraction * 100.0)),
        );
        ui.label("Workout");
        ui.add(
            egui::ProgressBar::new(progress.total_fraction)
                .text(format!("{:.0}%", progress.total_fraction * 100.0)),
        );
    }

    fn show_segments(&mut self, ui: &mut Ui) {
        let Some(workout) = self.runner.workout() else {
            ui.label(RichText::new("No workouts loaded.").size(24.0));
            return;
        };
        let progress = &self.effects.progress;
        let active = match progress.phase {
            Phase::Running | Phase::Paused => Some(progress.segment),
            _ => None,
        };

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::exact(40.0))
            .column(Column::remainder())
            .column(Column::exact(90.0))
            .column(Column::exact(90.0))
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                header.col(|ui| {
                    ui.strong("Segment");
                });
                header.col(|ui| {
                    ui.strong("Duration");
                });
                header.col(|ui| {
                    ui.strong("Intensity");
                });
            })
            .body(|mut body| {
                for (index, segment) in workout.segments.iter().enumerate() {
                    body.row(20.0, |mut row| {
                        row.set_selected(active == Some(index));
                        row.col(|ui| {
                            ui.label(format!("{}", index + 1));
                        });
                        row.col(|ui| {
                            ui.label(segment.status.as_str());
                        });
                        row.col(|ui| {
                            ui.label(format_clock(segment.duration));
                        });
                        row.col(|ui| {
                            ui.label(format!("{}", segment.intensity));
                        });
                    });
                }
            });
    }
}
