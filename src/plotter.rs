use crate::animation::AnimationController;
use crate::data_loader::extension_of;
use crate::error::AppError;
use crate::processing::PlotData;
use crate::style::{Marker, Rgb};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::debug;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn render_error<E: Display>(e: E) -> AppError {
    AppError::Render(e.to_string())
}

fn to_color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Draws one frame of the animation onto `root`.
///
/// The axes cover the full data so they stay fixed from frame to frame; only
/// the visible prefix of each series changes.
pub fn draw_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &PlotData,
    frame: usize,
) -> Result<(), AppError> {
    let config = &plot.config;
    let (x_range, y_range) = plot.axis_ranges();

    root.fill(&WHITE).map_err(render_error)?;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if let Some(title) = &config.title {
        builder.caption(title, ("sans-serif", 24));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_error)?;

    let x_formatter = |v: &f64| tick_label(*v, config.xlog);
    let y_formatter = |v: &f64| tick_label(*v, config.ylog);
    chart
        .configure_mesh()
        .x_desc(config.x_label.as_str())
        .y_desc(config.y_label.as_str())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .draw()
        .map_err(render_error)?;

    for (i, series) in plot.series.iter().enumerate() {
        let color = to_color(series.style.resolved_color(i));
        let shown = series.visible(frame);

        let line = chart
            .draw_series(LineSeries::new(shown.iter().copied(), color.stroke_width(2)))
            .map_err(render_error)?;
        if let Some(label) = &series.style.label {
            line.label(label.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        }

        if let Some(marker) = series.style.marker {
            draw_markers(&mut chart, shown, marker, color)?;
        }
    }

    if plot.show_legend() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
    }
    Ok(())
}

fn draw_markers<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    points: &[(f64, f64)],
    marker: Marker,
    color: RGBColor,
) -> Result<(), AppError> {
    let filled = color.filled();
    let stroke = color.stroke_width(1);
    let points = points.iter().copied();

    match marker {
        Marker::Point => chart.draw_series(points.map(|p| Circle::new(p, 1, filled))),
        Marker::Circle => chart.draw_series(points.map(|p| Circle::new(p, 3, filled))),
        Marker::Triangle => chart.draw_series(points.map(|p| TriangleMarker::new(p, 4, filled))),
        Marker::Cross => chart.draw_series(points.map(|p| Cross::new(p, 3, stroke))),
        Marker::Square => chart.draw_series(
            points.map(|p| EmptyElement::at(p) + Rectangle::new([(-3, -3), (3, 3)], filled)),
        ),
        Marker::Plus => chart.draw_series(points.map(|p| {
            EmptyElement::at(p)
                + PathElement::new(vec![(-4, 0), (4, 0)], stroke)
                + PathElement::new(vec![(0, -4), (0, 4)], stroke)
        })),
        Marker::Diamond => chart.draw_series(points.map(|p| {
            EmptyElement::at(p)
                + PathElement::new(vec![(0, -4), (4, 0), (0, 4), (-4, 0), (0, -4)], stroke)
        })),
    }
    .map(|_| ())
    .map_err(render_error)
}

/// Tick label for a coordinate; log axes hold base-10 exponents.
pub fn tick_label(value: f64, log: bool) -> String {
    let value = if log { 10f64.powf(value) } else { value };
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e5).contains(&magnitude) {
        return format!("{:.1e}", value);
    }
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        _ => text.to_string(),
    }
}

/// Renders every frame into an animated GIF.
pub fn save_animation(plot: &PlotData, path: &Path) -> Result<(), AppError> {
    if extension_of(path) != "gif" {
        return Err(AppError::UnsupportedOutput(path.to_path_buf()));
    }
    ensure_parent_dir(path)?;

    let root = BitMapBackend::gif(path, plot.config.pixel_size(), plot.config.interval_ms)
        .map_err(render_error)?
        .into_drawing_area();
    let frames = draw_animation(&root, plot)?;
    debug!("Wrote {} frames to '{}'", frames, path.display());
    Ok(())
}

/// Draws and presents every frame in order. Returns the number of frames drawn.
fn draw_animation<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &PlotData,
) -> Result<usize, AppError> {
    let mut frames = 0;
    for frame in AnimationController::new(plot.frame_count()) {
        draw_frame(root, plot, frame)?;
        root.present().map_err(render_error)?;
        frames += 1;
    }
    Ok(frames)
}

/// Renders the fully revealed plot into a static image (PNG, JPEG, BMP or SVG).
pub fn save_static(plot: &PlotData, path: &Path) -> Result<(), AppError> {
    let size = plot.config.pixel_size();
    let frame = plot.final_frame();

    match extension_of(path).as_str() {
        "svg" => {
            ensure_parent_dir(path)?;
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_frame(&root, plot, frame)?;
            root.present().map_err(render_error)
        }
        "png" | "jpg" | "jpeg" | "bmp" => {
            ensure_parent_dir(path)?;
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_frame(&root, plot, frame)?;
            root.present().map_err(render_error)
        }
        _ => Err(AppError::UnsupportedOutput(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{FigureConfig, PlotSeries};
    use crate::style::SeriesStyle;
    use polars::prelude::DataFrame;
    use std::path::PathBuf;

    fn empty_plot() -> PlotData {
        PlotData {
            config: FigureConfig::default(),
            x_field: "x".to_string(),
            y_field: "y".to_string(),
            series: Vec::new(),
        }
    }

    fn series(name: &str, points: Vec<(f64, f64)>, marker: Option<Marker>) -> PlotSeries {
        PlotSeries {
            file_name: name.to_string(),
            table: DataFrame::default(),
            points,
            style: SeriesStyle {
                label: Some(name.to_string()),
                color: None,
                marker,
            },
        }
    }

    fn two_series_plot() -> PlotData {
        PlotData {
            config: FigureConfig {
                title: Some("growth".to_string()),
                x_label: "time".to_string(),
                y_label: "value".to_string(),
                dpi: 50,
                ..FigureConfig::default()
            },
            x_field: "time".to_string(),
            y_field: "value".to_string(),
            series: vec![
                series("a.csv", vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)], Some(Marker::Circle)),
                series("b.csv", vec![(0.0, 5.0), (1.0, 6.0)], Some(Marker::Diamond)),
            ],
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("animplot-plotter-{}-{}", name, std::process::id()));
        // A leftover from an earlier run may or may not exist.
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Text layout needs a system font; headless machines may have none.
    fn fonts_available() -> bool {
        let available = ("sans-serif", 12.0).into_font().box_size("0").is_ok();
        if !available {
            eprintln!("no sans-serif font found, skipping render test");
        }
        available
    }

    fn assert_written(path: &Path) {
        let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        assert!(len > 0, "{} is missing or empty", path.display());
    }

    #[test]
    fn static_images_are_written() {
        if !fonts_available() {
            return;
        }
        let dir = scratch_dir("static");
        let plot = two_series_plot();

        for name in ["final.svg", "final.png", "nested/final.bmp"] {
            let path = dir.join(name);
            save_static(&plot, &path).unwrap();
            assert_written(&path);
        }
    }

    #[test]
    fn animation_draws_every_frame() {
        if !fonts_available() {
            return;
        }
        let plot = two_series_plot();
        let (width, height) = plot.config.pixel_size();
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            assert_eq!(draw_animation(&root, &plot).unwrap(), plot.frame_count());
        }
        assert_eq!(plot.frame_count(), 4);
        assert!(buffer.iter().any(|&b| b != 0));

        let path = scratch_dir("gif").join("growth.gif");
        save_animation(&plot, &path).unwrap();
        assert_written(&path);
    }

    #[test]
    fn linear_tick_labels_are_trimmed() {
        assert_eq!(tick_label(2.5, false), "2.5");
        assert_eq!(tick_label(3.0, false), "3");
        assert_eq!(tick_label(0.0, false), "0");
        assert_eq!(tick_label(-0.0001, false), "-1.0e-4");
        assert_eq!(tick_label(250000.0, false), "2.5e5");
    }

    #[test]
    fn log_tick_labels_show_the_value() {
        assert_eq!(tick_label(2.0, true), "100");
        assert_eq!(tick_label(-1.0, true), "0.1");
        assert_eq!(tick_label(6.0, true), "1.0e6");
    }

    #[test]
    fn animation_needs_a_gif_path() {
        let err = save_animation(&empty_plot(), Path::new("out.mp4")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedOutput(_)));
    }

    #[test]
    fn static_image_rejects_unknown_formats() {
        let err = save_static(&empty_plot(), Path::new("out.tiff")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedOutput(_)));
    }
}
