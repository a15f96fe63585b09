//! Monthly popularity series for jean styles.
//!
//! One CSV per style with at least a `Month` (`YYYY-MM`) and a `Popularity`
//! column. The style name comes from the file name: `wide-leg.csv` is
//! "Wide Leg". Series are shown as-is: no resampling, no gap filling.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::{debug, warn};

pub const MONTH_COLUMN: &str = "Month";
pub const POPULARITY_COLUMN: &str = "Popularity";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum TrendError {
    Io { file: String, source: std::io::Error },
    Csv { file: String, source: csv::Error },
    MissingColumn { file: String, column: &'static str },
    BadValue { file: String, row: usize, column: &'static str, value: String },
}

impl fmt::Display for TrendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendError::Io { file, source } => write!(f, "{}: {}", file, source),
            TrendError::Csv { file, source } => write!(f, "{}: {}", file, source),
            TrendError::MissingColumn { file, column } => {
                write!(f, "{}: missing '{}' column", file, column)
            }
            TrendError::BadValue { file, row, column, value } => write!(
                f, "{}: row {}: '{}' is not a valid {} value", file, row, value, column
            ),
        }
    }
}

impl std::error::Error for TrendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrendError::Io { source, .. } => Some(source),
            TrendError::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One row of the combined table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// First day of the month.
    pub month: NaiveDate,
    pub popularity: f64,
    pub style: String,
}

/// One style's series, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub style: String,
    pub points: Vec<(NaiveDate, f64)>,
}

// ---------------------------------------------------------------------------
// Names and discovery
// ---------------------------------------------------------------------------

/// `"wide-leg.csv"` → `"Wide Leg"`: drop the extension, hyphens become
/// spaces, every word is capitalized and the rest lower-cased.
pub fn style_name_from_file(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".csv").unwrap_or(file_name);
    let spaced = stem.replace('-', " ");

    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// `*.csv` file names in `dir`, sorted.
pub fn list_trend_files(dir: &Path) -> Result<Vec<String>> {
    let read = std::fs::read_dir(dir).map_err(|source| TrendError::Io {
        file: dir.display().to_string(),
        source,
    })?;

    let mut names: Vec<String> = read
        .flatten()
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(|s| s.to_owned()))
        .filter(|name| name.ends_with(".csv"))
        .collect();
    names.sort();
    Ok(names)
}

/// Keeps the selections that name a listed file, in the order given.
/// Anything path-like or unknown is dropped.
pub fn sanitize_selection(selected: &[String], available: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for name in selected {
        if available.contains(name) && !kept.contains(name) {
            kept.push(name.clone());
        } else {
            warn!("ignoring trend selection '{}'", name);
        }
    }
    kept
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()
}

/// Parses one style's CSV. Header names are trimmed before matching.
pub fn parse_trend(data: &[u8], file_name: &str) -> Result<TrendSeries> {
    let csv_err = |source| TrendError::Csv { file: file_name.to_owned(), source };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(csv_err)?.clone();
    let column = |name: &'static str| {
        headers.iter().position(|h| h.trim() == name).ok_or(TrendError::MissingColumn {
            file: file_name.to_owned(),
            column: name,
        })
    };
    let month_idx = column(MONTH_COLUMN)?;
    let pop_idx = column(POPULARITY_COLUMN)?;

    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let row = i + 1;
        let bad = |column: &'static str, value: &str| TrendError::BadValue {
            file: file_name.to_owned(),
            row,
            column,
            value: value.to_owned(),
        };

        let month_raw = record.get(month_idx).unwrap_or("");
        let month = parse_month(month_raw).ok_or_else(|| bad(MONTH_COLUMN, month_raw))?;

        let pop_raw = record.get(pop_idx).unwrap_or("");
        let popularity = pop_raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| bad(POPULARITY_COLUMN, pop_raw))?;

        points.push((month, popularity));
    }

    debug!("{}: {} points", file_name, points.len());
    Ok(TrendSeries { style: style_name_from_file(file_name), points })
}

pub fn load_trend(path: &Path) -> Result<TrendSeries> {
    let file_name = path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_owned();
    let data = std::fs::read(path).map_err(|source| TrendError::Io { file: file_name.clone(), source })?;
    parse_trend(&data, &file_name)
}

/// Loads each selected file from `dir`, in selection order.
pub fn load_selected(dir: &Path, selected: &[String]) -> Result<Vec<TrendSeries>> {
    selected.iter()
        .map(|name| load_trend(&PathBuf::from(dir).join(name)))
        .collect()
}

/// Concatenates series into one table, every row tagged with its style.
pub fn combine(series: &[TrendSeries]) -> Vec<TrendPoint> {
    series.iter()
        .flat_map(|s| s.points.iter().map(move |&(month, popularity)| TrendPoint {
            month,
            popularity,
            style: s.style.clone(),
        }))
        .collect()
}
