//! The main library for the `animplot` application.
//!
//! This crate provides the core logic for loading tabular data and rendering it as
//! animated line plots, where every line is drawn progressively from its first point
//! to its last. The primary entry point is the `run` function, which takes the parsed
//! CLI arguments and executes the whole process.
//!
//! The library is structured into several modules:
//! - `cli`: Defines the command-line interface.
//! - `data_loader`: Reads delimited text and spreadsheet files into DataFrames.
//! - `processing`: Selects the X and Y columns and prepares the series for plotting.
//! - `animation`: Frame planning and the per-frame reveal rule.
//! - `style`: Per-series colors and markers.
//! - `plotter`: Renders frames and writes the animation and static image files.
//! - `display`: Plays the animation in an interactive window.
//! - `error`: Defines the application's custom error type.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

pub mod animation;
pub mod cli;
pub mod data_loader;
pub mod display;
pub mod error;
pub mod plotter;
pub mod processing;
pub mod style;

use crate::cli::Cli;
use crate::data_loader::{FileKind, LoadOptions};
use crate::error::AppError;

/// The main entry point for the application logic.
///
/// This function orchestrates the entire process:
/// 1.  It resolves the input files, expanding directories.
/// 2.  It loads every supported file and selects the columns to plot.
/// 3.  It writes the requested outputs: animation, static image, and window.
///
/// # Arguments
///
/// * `cli` - A reference to the `Cli` struct containing parsed command-line arguments.
///
/// # Errors
///
/// Returns an error if no file can be loaded, the columns cannot be resolved, or
/// any requested output fails. Nothing is written when loading fails.
pub fn run(cli: &Cli) -> Result<()> {
    // 1. Discover files to process
    let paths = resolve_input_paths(&cli.files, cli.directory.as_deref())?;
    info!("Found {} input files", paths.len());

    // 2. Load data into DataFrames
    let options = LoadOptions::from(cli);
    let loaded = data_loader::load_tables(&paths, &options).context("Failed to load input data")?;

    // 3. Prepare the series for plotting
    let plot = processing::prepare_plot_data(loaded, cli).context("Failed to prepare plot data")?;
    info!(
        "Plotting '{}' against '{}' for {} series over {} frames",
        plot.y_field,
        plot.x_field,
        plot.series.len(),
        plot.frame_count()
    );

    if cli.verbose {
        processing::print_summary(&plot);
    }

    // 4. Write the outputs
    if let Some(path) = &cli.save {
        plotter::save_animation(&plot, path)
            .with_context(|| format!("Failed to save animation to {}", path.display()))?;
        info!("Animation saved to '{}'", path.display());
    }

    if let Some(path) = &cli.fixed {
        plotter::save_static(&plot, path)
            .with_context(|| format!("Failed to save image to {}", path.display()))?;
        info!("Image saved to '{}'", path.display());
    }

    if cli.display {
        display::show(plot)?;
    } else if cli.save.is_none() && cli.fixed.is_none() {
        info!("No output requested; use --save, --fixed or --display");
    }

    Ok(())
}

/// Joins each file name to `directory` and expands directories.
///
/// A directory is replaced by the supported files directly inside it, sorted by
/// name. Other paths are kept as given so that unsupported files can be reported
/// by the loader; a supported file that does not exist is an error.
///
/// # Arguments
///
/// * `files` - The positional inputs, files or directories.
/// * `directory` - An optional prefix joined to every input.
///
/// # Returns
///
/// A `Result` containing the paths to hand to the loader, in order.
///
/// # Errors
///
/// Returns `AppError::InvalidInputPath` if a supported file does not exist.
pub fn resolve_input_paths(files: &[PathBuf], directory: Option<&Path>) -> Result<Vec<PathBuf>, AppError> {
    let mut paths = Vec::new();

    for file in files {
        let path = match directory {
            Some(dir) => dir.join(file),
            None => file.clone(),
        };

        if path.is_dir() {
            for entry in WalkDir::new(&path)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && FileKind::from_path(entry.path()).is_some() {
                    paths.push(entry.path().to_path_buf());
                }
            }
        } else if FileKind::from_path(&path).is_some() && !path.is_file() {
            return Err(AppError::InvalidInputPath(path));
        } else {
            paths.push(path);
        }
    }
    Ok(paths)
}
