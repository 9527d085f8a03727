//! Interactive window that plays the animation.

use crate::animation::{AnimationController, AnimationState};
use crate::error::AppError;
use crate::processing::PlotData;
use crate::style::{Marker, Rgb};
use eframe::egui::{self, Color32};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};
use std::time::{Duration, Instant};

fn to_color32(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

fn marker_shape(marker: Marker) -> MarkerShape {
    match marker {
        Marker::Point | Marker::Circle => MarkerShape::Circle,
        Marker::Square => MarkerShape::Square,
        Marker::Triangle => MarkerShape::Up,
        Marker::Cross => MarkerShape::Cross,
        Marker::Plus => MarkerShape::Plus,
        Marker::Diamond => MarkerShape::Diamond,
    }
}

/// Egui app drawing the visible part of every series, one frame per interval.
struct AnimationApp {
    plot: PlotData,
    controller: AnimationController,
    frame: usize,
    interval: Duration,
    last_tick: Option<Instant>,
}

impl AnimationApp {
    fn new(plot: PlotData) -> Self {
        let controller = AnimationController::new(plot.frame_count());
        let interval = Duration::from_millis(plot.config.interval_ms.into());
        Self {
            plot,
            controller,
            frame: 0,
            interval,
            last_tick: None,
        }
    }

    /// Moves to the next frame once the interval has elapsed since the last one.
    fn advance(&mut self, now: Instant) {
        let due = self
            .last_tick
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if !due {
            return;
        }
        if let Some(frame) = self.controller.tick() {
            self.frame = frame;
            self.last_tick = Some(now);
        }
    }

    fn axis_label(name: &str, log: bool) -> String {
        if log {
            format!("log10({})", name)
        } else {
            name.to_string()
        }
    }
}

impl eframe::App for AnimationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance(Instant::now());

        let config = &self.plot.config;
        let (xs, ys) = self.plot.axis_ranges();

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(title) = &config.title {
                ui.vertical_centered(|ui| {
                    ui.heading(title);
                });
            }

            let mut plot = Plot::new("animation")
                .x_axis_label(Self::axis_label(&config.x_label, config.xlog))
                .y_axis_label(Self::axis_label(&config.y_label, config.ylog))
                .include_x(xs.start)
                .include_x(xs.end)
                .include_y(ys.start)
                .include_y(ys.end);
            if self.plot.show_legend() {
                plot = plot.legend(Legend::default());
            }

            plot.show(ui, |plot_ui| {
                for (i, series) in self.plot.series.iter().enumerate() {
                    let color = to_color32(series.style.resolved_color(i));
                    let shown: Vec<[f64; 2]> = series
                        .visible(self.frame)
                        .iter()
                        .map(|&(x, y)| [x, y])
                        .collect();

                    if let Some(marker) = series.style.marker {
                        let radius = if marker == Marker::Point { 1.5 } else { 3.0 };
                        let mut points = Points::new(PlotPoints::from(shown.clone()))
                            .shape(marker_shape(marker))
                            .radius(radius)
                            .filled(true)
                            .color(color);
                        if let Some(label) = &series.style.label {
                            points = points.name(label);
                        }
                        plot_ui.points(points);
                    }

                    let mut line = Line::new(PlotPoints::from(shown)).color(color).width(2.0);
                    if let Some(label) = &series.style.label {
                        line = line.name(label);
                    }
                    plot_ui.line(line);
                }
            });
        });

        if self.controller.state() != AnimationState::Completed {
            ctx.request_repaint_after(self.interval);
        }
    }
}

/// Opens a window playing the animation and blocks until it is closed.
pub fn show(plot: PlotData) -> Result<(), AppError> {
    let (width, height) = plot.config.pixel_size();
    let title = plot
        .config
        .title
        .clone()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let mut options = eframe::NativeOptions::default();
    options.viewport = egui::ViewportBuilder::default()
        .with_inner_size([width as f32, height as f32])
        .with_title(title.clone());

    let app = AnimationApp::new(plot);
    eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| AppError::Display(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{FigureConfig, PlotSeries};
    use crate::style::SeriesStyle;
    use polars::prelude::DataFrame;

    fn plot_with(points: Vec<(f64, f64)>) -> PlotData {
        PlotData {
            config: FigureConfig::default(),
            x_field: "x".to_string(),
            y_field: "y".to_string(),
            series: vec![PlotSeries {
                file_name: "a.csv".to_string(),
                table: DataFrame::default(),
                points,
                style: SeriesStyle::default(),
            }],
        }
    }

    #[test]
    fn frames_advance_once_per_interval() {
        let mut app = AnimationApp::new(plot_with(vec![(0.0, 1.0), (1.0, 2.0)]));
        let start = Instant::now();

        app.advance(start);
        assert_eq!(app.frame, 0);
        app.advance(start + Duration::from_millis(10));
        assert_eq!(app.frame, 0);
        app.advance(start + Duration::from_millis(60));
        assert_eq!(app.frame, 1);
        app.advance(start + Duration::from_millis(120));
        assert_eq!(app.frame, 2);
        assert_eq!(app.controller.state(), AnimationState::Completed);

        // The last frame stays on screen.
        app.advance(start + Duration::from_millis(500));
        assert_eq!(app.frame, 2);
    }

    #[test]
    fn log_axes_are_labelled() {
        assert_eq!(AnimationApp::axis_label("t", true), "log10(t)");
        assert_eq!(AnimationApp::axis_label("t", false), "t");
    }

    #[test]
    fn markers_map_to_egui_shapes() {
        assert_eq!(marker_shape(Marker::Triangle), MarkerShape::Up);
        assert_eq!(to_color32(Rgb(1, 2, 3)), Color32::from_rgb(1, 2, 3));
    }
}
