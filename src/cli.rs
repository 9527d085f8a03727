use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A tool to generate animated line plots from delimited text and spreadsheet files."
)]
pub struct Cli {
    /// Data files to plot, one line per file.
    /// A directory is expanded to the supported files directly inside it.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Directory prepended to each file name.
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// A custom title for the plot.
    #[arg(short, long)]
    pub title: Option<String>,

    /// Figure size in inches (width height).
    #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    pub size: Option<Vec<f64>>,

    /// Use a logarithmic X axis.
    #[arg(short = 'x', long, default_value_t = false)]
    pub xlog: bool,

    /// Use a logarithmic Y axis.
    #[arg(short = 'y', long, default_value_t = false)]
    pub ylog: bool,

    /// Reveal each line from left to right (sort rows by X first).
    #[arg(short, long, default_value_t = false)]
    pub order: bool,

    /// Column names, applied as the header of every file.
    /// The first two are used as X and Y. If omitted, the first two columns
    /// shared by all files are used.
    #[arg(short, long, num_args = 1..)]
    pub names: Option<Vec<String>>,

    /// Swap the X and Y columns.
    #[arg(short, long, default_value_t = false)]
    pub inverse: bool,

    /// Index of the header row.
    #[arg(short = 'H', long)]
    pub header: Option<usize>,

    /// Field separator for delimited files.
    /// Defaults to any run of whitespace. One character (or `\t`) is a literal
    /// delimiter; anything longer is a regular expression.
    #[arg(long, alias = "sp")]
    pub separator: Option<String>,

    /// Add a column holding the number tagged in each file name.
    /// With `--tag alpha`, `run_alpha3.dat` gets a constant `alpha` column of 3.
    #[arg(long)]
    pub tag: Option<String>,

    /// Legend labels, one per file.
    #[arg(short, long, num_args = 1..)]
    pub labels: Option<Vec<String>>,

    /// Line colors, one per file (names like `red`, `C1`, or `#1f77b4`).
    #[arg(short, long, num_args = 1..)]
    pub colors: Option<Vec<String>>,

    /// Point markers, one per file (`o`, `.`, `s`, `^`, `x`, `+`, `D`).
    #[arg(short, long, num_args = 1..)]
    pub markers: Option<Vec<String>>,

    /// Save the animation to this path (GIF).
    #[arg(short = 'S', long)]
    pub save: Option<PathBuf>,

    /// Resolution of saved outputs, in pixels per inch.
    #[arg(short = 'p', long)]
    pub dpi: Option<u32>,

    /// Save a static image of the fully drawn plot to this path.
    #[arg(short, long)]
    pub fixed: Option<PathBuf>,

    /// Delay between animation frames, in milliseconds.
    #[arg(long, default_value_t = 50)]
    pub interval: u32,

    /// Print each series and its data before plotting.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Open a window playing the animation.
    #[arg(short = 'D', long, default_value_t = false)]
    pub display: bool,

    /// Print debug info about detected columns and types
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
