use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::nexus::AnalysisSettings;

/// Settings for one conversion, as they arrive from the CLI or a JSON job
/// file. Every field is optional here; [`resolve`] decides defaults and
/// which side wins.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    pub input: Option<PathBuf>,
    pub sheet: Option<usize>,
    /// First data row, 1-based as displayed in Excel.
    pub first_row: Option<u32>,
    /// Last data row, 1-based, inclusive.
    pub last_row: Option<u32>,
    pub output: Option<PathBuf>,
    pub ngen: Option<u64>,
    pub run_name: Option<String>,
}

/// Fully resolved run parameters.
#[derive(Debug)]
pub struct Job {
    pub input: PathBuf,
    pub sheet: usize,
    /// Zero-based, half-open row range over the sheet.
    pub rows: Range<u32>,
    pub output: PathBuf,
    pub settings: AnalysisSettings,
}

/// Merge CLI flags over an optional job file. Explicit flags always win;
/// the workbook path and the row range have no defaults.
pub fn resolve(overrides: JobFile, job_path: Option<&Path>) -> Result<Job> {
    let file = match job_path {
        Some(path) => load_job_file(path)?,
        None => JobFile::default(),
    };

    let input = overrides
        .input
        .or(file.input)
        .context("no input workbook given (pass a path, or set \"input\" in the job file)")?;
    let first_row = overrides
        .first_row
        .or(file.first_row)
        .context("no first data row given (--first-row, or \"first_row\" in the job file)")?;
    let last_row = overrides
        .last_row
        .or(file.last_row)
        .context("no last data row given (--last-row, or \"last_row\" in the job file)")?;
    ensure!(first_row >= 1, "data rows are 1-based, as displayed in Excel");
    ensure!(
        first_row <= last_row,
        "first data row {first_row} is after last data row {last_row}"
    );

    let sheet = overrides.sheet.or(file.sheet).unwrap_or(0);
    let output = overrides
        .output
        .or(file.output)
        .unwrap_or_else(|| input.with_extension("nex"));

    let defaults = AnalysisSettings::default();
    let ngen = overrides.ngen.or(file.ngen).unwrap_or(defaults.ngen);
    ensure!(ngen > 0, "ngen must be positive");
    let run_name = overrides
        .run_name
        .or(file.run_name)
        .unwrap_or(defaults.run_name);

    Ok(Job {
        input,
        sheet,
        rows: (first_row - 1)..last_row,
        output,
        settings: AnalysisSettings { ngen, run_name },
    })
}

fn load_job_file(path: &Path) -> Result<JobFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read job file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse job file {}", path.display()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn flags(input: &str, first_row: u32, last_row: u32) -> JobFile {
        JobFile {
            input: Some(PathBuf::from(input)),
            first_row: Some(first_row),
            last_row: Some(last_row),
            ..Default::default()
        }
    }

    #[test]
    fn flags_alone_with_defaults() {
        let job = resolve(flags("data.xlsx", 4, 118), None).unwrap();
        assert_eq!(job.input, PathBuf::from("data.xlsx"));
        assert_eq!(job.sheet, 0);
        assert_eq!(job.rows, 3..118);
        assert_eq!(job.output, PathBuf::from("data.nex"));
        assert_eq!(job.settings.ngen, 1_000_000);
        assert_eq!(job.settings.run_name, "analysis");
    }

    #[test]
    fn job_file_fills_gaps_and_flags_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"input": "field.xlsx", "sheet": 1, "first_row": 2, "last_row": 10, "ngen": 500000}}"#
        )
        .unwrap();

        let overrides = JobFile {
            first_row: Some(5),
            ..Default::default()
        };
        let job = resolve(overrides, Some(file.path())).unwrap();
        assert_eq!(job.input, PathBuf::from("field.xlsx"));
        assert_eq!(job.sheet, 1);
        assert_eq!(job.rows, 4..10);
        assert_eq!(job.settings.ngen, 500_000);
    }

    #[test]
    fn missing_input_is_an_error() {
        let overrides = JobFile {
            first_row: Some(1),
            last_row: Some(2),
            ..Default::default()
        };
        let err = resolve(overrides, None).unwrap_err();
        assert!(err.to_string().contains("input"), "{err}");
    }

    #[test]
    fn reversed_row_range_is_an_error() {
        assert!(resolve(flags("data.xlsx", 10, 2), None).is_err());
    }

    #[test]
    fn zero_first_row_is_an_error() {
        assert!(resolve(flags("data.xlsx", 0, 2), None).is_err());
    }

    #[test]
    fn unknown_job_file_keys_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"inptu": "typo.xlsx"}}"#).unwrap();
        assert!(resolve(JobFile::default(), Some(file.path())).is_err());
    }
}
