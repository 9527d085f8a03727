//! This module handles the logic for selecting and preparing data for plotting.
//!
//! It takes the loaded tables and the parsed command-line arguments to determine
//! which columns are plotted on the X and Y axes, extracts one series of points per
//! table, and gathers the figure settings shared by every renderer.

use crate::animation;
use crate::cli::Cli;
use crate::data_loader::LoadedTables;
use crate::error::AppError;
use crate::style::{self, SeriesStyle};
use polars::prelude::*;
use std::ops::Range;
use tracing::{debug, warn};

/// Figure settings. Every field has a default; renderers never need to check
/// whether a setting was given.
#[derive(Clone, Debug, PartialEq)]
pub struct FigureConfig {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    /// Values on a log axis are stored as their base-10 logarithm.
    pub xlog: bool,
    pub ylog: bool,
    /// Width and height in inches.
    pub size: (f64, f64),
    pub dpi: u32,
    /// Delay between animation frames, in milliseconds.
    pub interval_ms: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            title: None,
            x_label: String::new(),
            y_label: String::new(),
            xlog: false,
            ylog: false,
            size: (6.4, 4.8),
            dpi: 100,
            interval_ms: 50,
        }
    }
}

impl FigureConfig {
    /// Output size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi.max(1) as f64;
        (
            (self.size.0 * dpi).round().max(1.0) as u32,
            (self.size.1 * dpi).round().max(1.0) as u32,
        )
    }
}

/// One input file, ready to be animated.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub file_name: String,
    pub table: DataFrame,
    /// Plottable (x, y) rows, in reveal order.
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

impl PlotSeries {
    /// Points shown at `frame`.
    pub fn visible(&self, frame: usize) -> &[(f64, f64)] {
        animation::visible(&self.points, frame)
    }
}

/// A container for all the data and configuration needed to render a plot.
///
/// This struct is the output of the `prepare_plot_data` function and serves as the
/// input for the `plotter` and `display` modules.
#[derive(Debug, Clone)]
pub struct PlotData {
    pub config: FigureConfig,
    pub x_field: String,
    pub y_field: String,
    pub series: Vec<PlotSeries>,
}

impl PlotData {
    /// Number of frames needed to reveal every series completely.
    pub fn frame_count(&self) -> usize {
        animation::frame_count(self.series.iter().map(|s| s.points.len()))
    }

    /// Index of the frame where everything is visible.
    pub fn final_frame(&self) -> usize {
        self.frame_count() - 1
    }

    pub fn show_legend(&self) -> bool {
        self.series.iter().any(|s| s.style.label.is_some())
    }

    /// Axis ranges covering every point of every series, padded by 5%.
    ///
    /// The ranges do not depend on the frame, so the axes stay still while the
    /// lines grow.
    pub fn axis_ranges(&self) -> (Range<f64>, Range<f64>) {
        let all = self.series.iter().flat_map(|s| s.points.iter());
        let xs = padded_range(all.clone().map(|p| p.0));
        let ys = padded_range(all.map(|p| p.1));
        (xs, ys)
    }
}

fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if max - min <= f64::EPSILON * max.abs().max(1.0) {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

/// Picks the (x, y) columns to plot.
///
/// With explicit `names`, the first two are used. Otherwise the first two
/// columns present in every table are used, in the column order of the first
/// table. `inverse` swaps the pair.
pub fn resolve_fields(
    tables: &[DataFrame],
    names: Option<&[String]>,
    inverse: bool,
) -> Result<(String, String), AppError> {
    let (x, y) = match names {
        Some(names) => match names {
            [x, y, ..] => (x.clone(), y.clone()),
            _ => return Err(AppError::InsufficientNames(names.len())),
        },
        None => {
            let mut common = common_columns(tables);
            if common.len() < 2 {
                return Err(AppError::InsufficientCommonColumns(common));
            }
            common.truncate(2);
            let y = common.pop().unwrap_or_default();
            let x = common.pop().unwrap_or_default();
            (x, y)
        }
    };

    if inverse {
        Ok((y, x))
    } else {
        Ok((x, y))
    }
}

/// Column names shared by all tables, in the first table's order.
fn common_columns(tables: &[DataFrame]) -> Vec<String> {
    let Some((first, rest)) = tables.split_first() else {
        return Vec::new();
    };
    first
        .get_column_names()
        .into_iter()
        .filter(|name| {
            rest.iter()
                .all(|df| df.get_column_names().iter().any(|n| n == name))
        })
        .map(|name| name.to_string())
        .collect()
}

/// Selects the X and Y columns and packages every table for plotting.
///
/// # Arguments
///
/// * `loaded` - The tables and file names produced by the loader.
/// * `cli` - The parsed arguments supplying names, axes, ordering, styles and figure settings.
///
/// # Returns
///
/// A `Result` containing the `PlotData` with one series per table, in input order.
///
/// # Errors
///
/// Returns an error if the columns cannot be resolved, a style entry is invalid,
/// or a selected column is missing from a table.
pub fn prepare_plot_data(loaded: LoadedTables, cli: &Cli) -> Result<PlotData, AppError> {
    // 1. Determine the X and Y fields.
    let (x_field, y_field) = resolve_fields(&loaded.tables, cli.names.as_deref(), cli.inverse)?;
    debug!("Selected columns: x = '{}', y = '{}'", x_field, y_field);

    // 2. Match styles to series.
    let styles = style::series_styles(
        loaded.tables.len(),
        cli.labels.as_deref(),
        cli.colors.as_deref(),
        cli.markers.as_deref(),
    )?;

    // 3. Figure settings.
    let defaults = FigureConfig::default();
    let config = FigureConfig {
        title: cli.title.clone(),
        x_label: x_field.clone(),
        y_label: y_field.clone(),
        xlog: cli.xlog,
        ylog: cli.ylog,
        size: match cli.size.as_deref() {
            Some(&[w, h]) => (w, h),
            _ => defaults.size,
        },
        dpi: cli.dpi.unwrap_or(defaults.dpi),
        interval_ms: cli.interval,
    };

    // 4. Extract the points of each series.
    let mut series = Vec::with_capacity(loaded.tables.len());
    for ((table, file_name), style) in loaded
        .tables
        .into_iter()
        .zip(loaded.file_names)
        .zip(styles)
    {
        let points = extract_points(&table, &file_name, &x_field, &y_field, &config, cli.order)?;
        series.push(PlotSeries {
            file_name,
            table,
            points,
            style,
        });
    }

    Ok(PlotData {
        config,
        x_field,
        y_field,
        series,
    })
}

/// Reads the (x, y) points of one table.
///
/// Rows where either value is missing or not a number are skipped, as are rows
/// with a non-positive value on a log axis. With `order`, points are sorted by x.
pub fn extract_points(
    table: &DataFrame,
    file_name: &str,
    x_field: &str,
    y_field: &str,
    config: &FigureConfig,
    order: bool,
) -> Result<Vec<(f64, f64)>, AppError> {
    let xs = column_values(table, x_field)?;
    let ys = column_values(table, y_field)?;

    let mut points = Vec::with_capacity(xs.len());
    let mut missing = 0;
    let mut non_positive = 0;
    for (x, y) in xs.into_iter().zip(ys) {
        let (Some(x), Some(y)) = (x, y) else {
            missing += 1;
            continue;
        };
        if !x.is_finite() || !y.is_finite() {
            missing += 1;
            continue;
        }
        if (config.xlog && x <= 0.0) || (config.ylog && y <= 0.0) {
            non_positive += 1;
            continue;
        }
        let x = if config.xlog { x.log10() } else { x };
        let y = if config.ylog { y.log10() } else { y };
        points.push((x, y));
    }

    if missing > 0 {
        warn!("{}: skipped {} rows without numeric '{}'/'{}' values", file_name, missing, x_field, y_field);
    }
    if non_positive > 0 {
        warn!("{}: skipped {} non-positive rows on a log axis", file_name, non_positive);
    }

    if order {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    Ok(points)
}

/// Reads a column as floats. Text cells are parsed; anything else is cast.
fn column_values(table: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AppError> {
    let column = table
        .column(name)
        .map_err(|_| AppError::ColumnNotFound(name.to_string()))?;

    if matches!(column.dtype(), DataType::String) {
        let values = column
            .str()?
            .into_iter()
            .map(|v| v.and_then(|t| t.trim().parse::<f64>().ok()))
            .collect();
        return Ok(values);
    }

    let cast = column.cast(&DataType::Float64)?;
    let values = cast.f64()?.into_iter().collect();
    Ok(values)
}

/// Prints each series with its styling and its full table to stdout.
pub fn print_summary(plot: &PlotData) {
    // Polars truncates long tables unless told otherwise.
    if std::env::var_os("POLARS_FMT_MAX_ROWS").is_none() {
        std::env::set_var("POLARS_FMT_MAX_ROWS", "-1");
    }

    for (i, series) in plot.series.iter().enumerate() {
        println!("File:   {}", series.file_name);
        println!("Label:  {}", series.style.label.as_deref().unwrap_or("-"));
        println!(
            "Marker: {}",
            series
                .style
                .marker
                .map_or_else(|| "-".to_string(), |m| m.to_string())
        );
        println!("Color:  {}", series.style.resolved_color(i));
        println!("Points: {}", series.points.len());
        println!("{}", series.table);
        println!();
    }
    println!(
        "X: '{}', Y: '{}', frames: {}",
        plot.x_field,
        plot.y_field,
        plot.frame_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn loaded(tables: Vec<DataFrame>) -> LoadedTables {
        let file_names = (0..tables.len()).map(|i| format!("{}.csv", i)).collect();
        LoadedTables {
            tables,
            file_names,
            skipped: Vec::new(),
        }
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["animplot", "placeholder.csv"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn auto_resolution_uses_common_columns_only() {
        let a = df!("a" => &[1.0], "b" => &[2.0], "c" => &[3.0]).unwrap();
        let b = df!("b" => &[1.0], "c" => &[2.0], "d" => &[3.0]).unwrap();
        let (x, y) = resolve_fields(&[a, b], None, false).unwrap();
        assert_eq!((x.as_str(), y.as_str()), ("b", "c"));
    }

    #[test]
    fn auto_resolution_is_deterministic() {
        let a = df!("z" => &[1.0], "m" => &[2.0], "a" => &[3.0]).unwrap();
        let b = df!("a" => &[1.0], "m" => &[2.0], "z" => &[3.0]).unwrap();
        for _ in 0..5 {
            let fields = resolve_fields(&[a.clone(), b.clone()], None, false).unwrap();
            assert_eq!(fields, ("z".to_string(), "m".to_string()));
        }
    }

    #[test]
    fn auto_resolution_fails_without_two_common_columns() {
        let a = df!("a" => &[1.0]).unwrap();
        let b = df!("b" => &[1.0]).unwrap();
        let err = resolve_fields(&[a, b], None, false).unwrap_err();
        assert!(matches!(err, AppError::InsufficientCommonColumns(ref c) if c.is_empty()));
    }

    #[test]
    fn explicit_names_need_two_entries() {
        let a = df!("a" => &[1.0], "b" => &[2.0]).unwrap();
        let fields = resolve_fields(&[a.clone()], Some(names(&["a", "b", "c"]).as_slice()), false).unwrap();
        assert_eq!(fields, ("a".to_string(), "b".to_string()));

        let err = resolve_fields(&[a], Some(names(&["a"]).as_slice()), false).unwrap_err();
        assert!(matches!(err, AppError::InsufficientNames(1)));
    }

    #[test]
    fn inverse_swaps_fields() {
        let a = df!("a" => &[1.0], "b" => &[2.0]).unwrap();
        let fields = resolve_fields(&[a], None, true).unwrap();
        assert_eq!(fields, ("b".to_string(), "a".to_string()));
    }

    #[test]
    fn inverse_swaps_plotted_axes() {
        let table = df!("t" => &[0.0, 1.0, 2.0], "v" => &[5.0, 7.0, 6.0]).unwrap();
        let plain = prepare_plot_data(loaded(vec![table.clone()]), &cli(&[])).unwrap();
        let swapped = prepare_plot_data(loaded(vec![table]), &cli(&["-i"])).unwrap();

        assert_eq!((plain.x_field.as_str(), plain.y_field.as_str()), ("t", "v"));
        assert_eq!((swapped.config.x_label.as_str(), swapped.config.y_label.as_str()), ("v", "t"));
        let flipped: Vec<(f64, f64)> = plain.series[0].points.iter().map(|&(x, y)| (y, x)).collect();
        assert_eq!(swapped.series[0].points, flipped);
    }

    #[test]
    fn ordered_reveal_is_non_decreasing_in_x() {
        let table = df!("x" => &[3.0, 1.0, 2.0, 1.0, 0.5], "y" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let plot = prepare_plot_data(loaded(vec![table]), &cli(&["-o"])).unwrap();

        for frame in 0..plot.frame_count() {
            let shown = plot.series[0].visible(frame);
            assert!(shown.windows(2).all(|w| w[0].0 <= w[1].0));
        }
        // Ties keep their original row order.
        assert_eq!(plot.series[0].points[1..3], [(1.0, 2.0), (1.0, 4.0)]);
    }

    #[test]
    fn rows_without_numbers_are_skipped() {
        let table = df!(
            "x" => &[Some("time"), Some("0"), Some("1"), None],
            "y" => &[Some("value"), Some("1"), Some("2"), Some("3")]
        )
        .unwrap();
        let points =
            extract_points(&table, "a.csv", "x", "y", &FigureConfig::default(), false).unwrap();
        assert_eq!(points, vec![(0.0, 1.0), (1.0, 2.0)]);
    }

    #[test]
    fn log_axes_store_log10_and_drop_non_positive_rows() {
        let table = df!("x" => &[1.0, 10.0, 0.0, 100.0], "y" => &[1.0, 2.0, 3.0, -4.0]).unwrap();
        let config = FigureConfig {
            xlog: true,
            ..Default::default()
        };
        let points = extract_points(&table, "a.csv", "x", "y", &config, false).unwrap();
        assert_eq!(points, vec![(0.0, 1.0), (1.0, 2.0), (2.0, -4.0)]);
    }

    #[test]
    fn missing_column_is_reported() {
        let table = df!("x" => &[1.0]).unwrap();
        let err = extract_points(&table, "a.csv", "x", "nope", &FigureConfig::default(), false)
            .unwrap_err();
        assert!(matches!(err, AppError::ColumnNotFound(ref c) if c == "nope"));
    }

    #[test]
    fn figure_settings_come_from_the_cli() {
        let table = df!("t" => &[0.0, 1.0], "v" => &[1.0, 2.0]).unwrap();
        let plot = prepare_plot_data(
            loaded(vec![table]),
            &cli(&["-t", "Run", "-s", "4", "3", "-p", "50", "-l", "first", "-c", "red"]),
        )
        .unwrap();

        assert_eq!(plot.config.title.as_deref(), Some("Run"));
        assert_eq!(plot.config.pixel_size(), (200, 150));
        assert!(plot.show_legend());
        assert_eq!(plot.series[0].style.color, Some(crate::style::Rgb(255, 0, 0)));
        assert_eq!(plot.frame_count(), 3);
        assert_eq!(FigureConfig::default().pixel_size(), (640, 480));
    }

    #[test]
    fn axis_ranges_cover_all_series_with_padding() {
        let a = df!("t" => &[0.0, 10.0], "v" => &[0.0, 1.0]).unwrap();
        let b = df!("t" => &[5.0], "v" => &[3.0]).unwrap();
        let plot = prepare_plot_data(loaded(vec![a, b]), &cli(&[])).unwrap();
        let (xs, ys) = plot.axis_ranges();
        assert!((xs.start + 0.5).abs() < 1e-9 && (xs.end - 10.5).abs() < 1e-9);
        assert!((ys.start + 0.15).abs() < 1e-9 && (ys.end - 3.15).abs() < 1e-9);
    }
}
