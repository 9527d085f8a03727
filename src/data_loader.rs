use crate::cli::Cli;
use crate::error::AppError;
use polars::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Separator spelling that stands for "any run of whitespace".
const WHITESPACE_SEPARATOR: &str = r"\s+";

/// The kind of parser a file needs, derived once from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// `.csv`, `.dat`: delimited text.
    Delimited,
    /// `.xls`, `.xlsx` and the other workbook formats calamine reads.
    Spreadsheet,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension_of(path).as_str() {
            "csv" | "dat" => Some(FileKind::Delimited),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Some(FileKind::Spreadsheet),
            _ => None,
        }
    }

    fn reader(self) -> ReadFn {
        match self {
            FileKind::Delimited => read_delimited_file,
            FileKind::Spreadsheet => read_spreadsheet_file,
        }
    }
}

type ReadFn = fn(&Path, &ReadSettings) -> Result<RawTable, AppError>;

/// How fields of a delimited line are split.
#[derive(Clone, Debug)]
pub enum Separator {
    /// Any run of whitespace.
    Whitespace,
    /// A single-byte delimiter; quoted fields may contain it.
    Delimiter(u8),
    /// A regular expression matching the gap between fields.
    Pattern(Regex),
}

impl FromStr for Separator {
    type Err = AppError;

    /// Empty text and `\s+` mean whitespace. One character, or an escape such as
    /// `\t`, is a literal delimiter. Anything longer is a regular expression.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == WHITESPACE_SEPARATOR {
            return Ok(Separator::Whitespace);
        }
        let literal = match s {
            r"\t" => "\t",
            r"\|" => "|",
            _ => s,
        };
        if let [byte] = literal.as_bytes() {
            return Ok(Separator::Delimiter(*byte));
        }
        Regex::new(s)
            .map(Separator::Pattern)
            .map_err(|e| AppError::InvalidPattern {
                pattern: s.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Options shared by every file of a run.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Column names replacing the parsed headers.
    pub names: Option<Vec<String>>,
    /// Index of the header row. When unset, row 0 is the header unless
    /// `names` are given, in which case every row is data.
    pub header: Option<usize>,
    /// Field separator for delimited files; unset means any run of whitespace.
    pub separator: Option<String>,
    /// Name of a numeric parameter encoded in file names as `_<tag><N>`.
    pub tag: Option<String>,
}

impl From<&Cli> for LoadOptions {
    fn from(cli: &Cli) -> Self {
        LoadOptions {
            names: cli.names.clone(),
            header: cli.header,
            separator: cli.separator.clone(),
            tag: cli.tag.clone(),
        }
    }
}

impl LoadOptions {
    fn header_row(&self) -> Option<usize> {
        match (self.header, &self.names) {
            (Some(h), _) => Some(h),
            (None, Some(_)) => None,
            (None, None) => Some(0),
        }
    }

    fn field_separator(&self) -> Result<Separator, AppError> {
        self.separator.as_deref().unwrap_or_default().parse()
    }
}

/// Reader settings resolved once per run.
#[derive(Debug)]
struct ReadSettings {
    header: Option<usize>,
    separator: Separator,
}

impl ReadSettings {
    fn new(options: &LoadOptions) -> Result<Self, AppError> {
        Ok(ReadSettings {
            header: options.header_row(),
            separator: options.field_separator()?,
        })
    }
}

/// A numeric parameter read from file names, e.g. `alpha` in `run_alpha3.dat`.
#[derive(Debug)]
struct FileTag {
    name: String,
    pattern: Regex,
}

impl FileTag {
    fn new(name: &str) -> Result<Self, AppError> {
        let source = format!(
            r"_{}([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)(?:_|$)",
            regex::escape(name)
        );
        let pattern = Regex::new(&source).map_err(|e| AppError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(FileTag {
            name: name.to_string(),
            pattern,
        })
    }

    /// The last `_<name><N>` value in the file stem.
    fn value(&self, path: &Path) -> Option<f64> {
        let stem = path.file_stem()?.to_str()?;
        self.pattern
            .captures_iter(stem)
            .last()
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Appends the tag as a constant column, or warns when the name carries none.
    fn apply(&self, path: &Path, df: &mut DataFrame) -> Result<(), AppError> {
        match self.value(path) {
            Some(value) => {
                df.with_column(Series::new(&self.name, vec![value; df.height()]))?;
            }
            None => warn!(
                "'{}' has no '_{}<number>' tag in its name",
                path.display(),
                self.name
            ),
        }
        Ok(())
    }
}

/// Tables loaded for a run, in input order, with the base name of each file.
#[derive(Debug, Default)]
pub struct LoadedTables {
    pub tables: Vec<DataFrame>,
    pub file_names: Vec<String>,
    /// Inputs dropped because of their extension.
    pub skipped: Vec<PathBuf>,
}

/// Loads every supported file into a typed DataFrame.
///
/// Files with an unsupported extension are skipped with a warning. Any other
/// failure aborts the whole load, as does ending up with no table at all.
///
/// # Arguments
///
/// * `paths` - The input files, in the order their series should be drawn.
/// * `options` - Header, separator, column names and file-name tag shared by every file.
///
/// # Returns
///
/// A `Result` containing the loaded tables, their base names and the skipped paths.
///
/// # Errors
///
/// Returns `AppError::NoValidInput` if no file could be loaded, or the first
/// read, parse or naming error encountered.
pub fn load_tables(paths: &[PathBuf], options: &LoadOptions) -> Result<LoadedTables, AppError> {
    let settings = ReadSettings::new(options)?;
    let tag = options.tag.as_deref().map(FileTag::new).transpose()?;
    let mut loaded = LoadedTables::default();

    for path in paths {
        let Some(kind) = FileKind::from_path(path) else {
            warn!(
                "Skipping '{}': unsupported extension '{}'",
                path.display(),
                extension_of(path)
            );
            loaded.skipped.push(path.clone());
            continue;
        };

        let raw = (kind.reader())(path, &settings)?;
        let mut df = raw.into_dataframe(&base_name(path), options.names.as_deref())?;
        if let Some(tag) = &tag {
            tag.apply(path, &mut df)?;
        }
        debug!(
            "Loaded '{}': {} rows x {} cols",
            path.display(),
            df.height(),
            df.width()
        );
        for s in df.get_columns() {
            debug!("  - {}: {:?}", s.name(), s.dtype());
        }

        loaded.tables.push(df);
        loaded.file_names.push(base_name(path));
    }

    if loaded.tables.is_empty() {
        return Err(AppError::NoValidInput);
    }
    Ok(loaded)
}

pub fn base_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Lowercase extension of `path`, empty when there is none.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

/// Untyped cells of a table, before column names are settled.
#[derive(Debug, Default, PartialEq)]
pub struct RawTable {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Splits `rows` at the header row, if there is one.
    fn from_rows(
        mut rows: Vec<Vec<Option<String>>>,
        header: Option<usize>,
        file: &str,
    ) -> Result<Self, AppError> {
        let Some(h) = header else {
            return Ok(RawTable {
                headers: None,
                rows,
            });
        };
        if h >= rows.len() {
            return Err(AppError::MissingHeader {
                file: file.to_string(),
                header: h,
            });
        }

        let data = rows.split_off(h + 1);
        let header_row = rows.pop().unwrap_or_default();
        let headers = header_row
            .into_iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Some(name) if !name.is_empty() => name,
                _ => format!("col_{}", i + 1),
            })
            .collect();
        Ok(RawTable {
            headers: Some(headers),
            rows: data,
        })
    }

    fn width(&self) -> usize {
        match &self.headers {
            Some(headers) => headers.len(),
            None => self.rows.iter().map(|r| r.len()).max().unwrap_or(0),
        }
    }

    /// Builds a typed DataFrame, renaming the columns to `names` when given.
    pub fn into_dataframe(self, file: &str, names: Option<&[String]>) -> Result<DataFrame, AppError> {
        let width = self.width();

        let headers: Vec<String> = match (names, self.headers) {
            (Some(names), _) => {
                if names.len() != width {
                    return Err(AppError::NameCountMismatch {
                        file: file.to_string(),
                        count: names.len(),
                        width,
                    });
                }
                names.to_vec()
            }
            (None, Some(headers)) => headers,
            (None, None) => (1..=width).map(|i| format!("col_{}", i)).collect(),
        };

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(self.rows.len()); width];
        for row in self.rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().flatten());
            }
        }

        let series_vec: Vec<Series> = headers
            .iter()
            .zip(&columns)
            .map(|(name, values)| infer_series(name, values))
            .collect();
        let df = DataFrame::new(series_vec)?;
        Ok(df)
    }
}

/// Builds a numeric Series when most non-empty cells parse as numbers, a String
/// Series otherwise. Cells that do not parse become nulls in a numeric Series.
fn infer_series(name: &str, values: &[Option<String>]) -> Series {
    let floats: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.as_deref().and_then(|t| t.trim().parse::<f64>().ok()))
        .collect();
    let present = values.iter().filter(|v| v.is_some()).count();
    let numeric = floats.iter().filter(|v| v.is_some()).count();

    if numeric * 2 <= present {
        return Series::new(name, values);
    }

    let ints: Vec<Option<i64>> = values
        .iter()
        .map(|v| v.as_deref().and_then(|t| t.trim().parse::<i64>().ok()))
        .collect();
    if ints.iter().filter(|v| v.is_some()).count() == numeric {
        Series::new(name, ints)
    } else {
        Series::new(name, floats)
    }
}

fn read_delimited_file(path: &Path, settings: &ReadSettings) -> Result<RawTable, AppError> {
    let text = fs::read_to_string(path)?;
    parse_delimited(&text, &settings.separator, settings.header, &base_name(path))
}

/// Parses delimited text into untyped rows.
///
/// Blank lines are ignored. Rows shorter than the header are padded with nulls;
/// rows longer than it are rejected.
pub fn parse_delimited(
    text: &str,
    separator: &Separator,
    header: Option<usize>,
    file: &str,
) -> Result<RawTable, AppError> {
    let (line_numbers, rows): (Vec<usize>, Vec<_>) = match separator {
        Separator::Delimiter(byte) => quoted_records(text, *byte)?,
        Separator::Whitespace => split_lines(text, |line| line.split_whitespace().collect()),
        Separator::Pattern(re) => split_lines(text, |line| re.split(line).collect()),
    }
    .into_iter()
    .unzip();

    // Data rows start right after the header, if any.
    let first_data = header.map_or(0, |h| h + 1);
    let table = RawTable::from_rows(rows, header, file)?;

    if table.headers.is_some() {
        let expected = table.width();
        for (row, &line) in table.rows.iter().zip(&line_numbers[first_data..]) {
            if row.len() > expected {
                return Err(AppError::RaggedRow {
                    file: file.to_string(),
                    line,
                    expected,
                    found: row.len(),
                });
            }
        }
    }
    Ok(table)
}

type NumberedRow = (usize, Vec<Option<String>>);

fn cell(field: &str) -> Option<String> {
    let field = field.trim();
    (!field.is_empty()).then(|| field.to_string())
}

/// Reads records with the csv crate, which keeps quoted delimiters inside a field.
fn quoted_records(text: &str, delimiter: u8) -> Result<Vec<NumberedRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields: Vec<Option<String>> = record.iter().map(cell).collect();
        if fields.iter().all(Option::is_none) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line() as usize);
        rows.push((line, fields));
    }
    Ok(rows)
}

fn split_lines<'a, F>(text: &'a str, split: F) -> Vec<NumberedRow>
where
    F: Fn(&'a str) -> Vec<&'a str>,
{
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let fields = split(line)
                .into_iter()
                .map(|f| cell(f.trim().trim_matches('"')))
                .collect();
            (i + 1, fields)
        })
        .collect()
}

/// Reads the first worksheet of a workbook.
fn read_spreadsheet_file(path: &Path, settings: &ReadSettings) -> Result<RawTable, AppError> {
    use calamine::{open_workbook_auto, DataType as Xl, Reader};

    let file = base_name(path);
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::EmptyWorkbook(file.clone()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| AppError::EmptyWorkbook(file.clone()))??;

    // Fully empty rows carry no data and are not counted.
    let rows: Vec<Vec<Option<String>>> = range
        .rows()
        .filter(|r| !r.iter().all(|c| matches!(c, Xl::Empty)))
        .map(|r| {
            r.iter()
                .map(|c| match c {
                    Xl::Empty => None,
                    Xl::String(s) => Some(s.trim().to_string()),
                    Xl::Float(v) => Some(v.to_string()),
                    Xl::Int(v) => Some(v.to_string()),
                    Xl::Bool(v) => Some(v.to_string()),
                    Xl::DateTime(v) => Some(v.to_string()),
                    Xl::Duration(v) => Some(v.to_string()),
                    Xl::DateTimeIso(s) => Some(s.trim().to_string()),
                    Xl::DurationIso(s) => Some(s.trim().to_string()),
                    Xl::Error(_) => None,
                })
                .collect()
        })
        .collect();

    RawTable::from_rows(rows, settings.header, &file)
}
