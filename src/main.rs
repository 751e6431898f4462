mod config;
mod matrix;
mod nexus;
mod sheet;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "nexgen",
    about = "Convert coded morphological character matrices from Excel to NEXUS/MrBayes input"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a sheet of coded characters into a NEXUS file with an
    /// embedded MrBayes command block
    Convert {
        /// Input workbook (.xlsx or .xls)
        input: Option<PathBuf>,
        /// Zero-based sheet index (default: 0)
        #[arg(short, long)]
        sheet: Option<usize>,
        /// First data row, 1-based as displayed in Excel
        #[arg(short, long)]
        first_row: Option<u32>,
        /// Last data row, 1-based, inclusive
        #[arg(short, long)]
        last_row: Option<u32>,
        /// Output path (default: input path with a .nex extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// MCMC generations for the MrBayes block
        #[arg(long)]
        ngen: Option<u64>,
        /// Filename stem MrBayes uses for its run output files
        #[arg(long)]
        run_name: Option<String>,
        /// JSON job file carrying the same settings; explicit flags win
        #[arg(short, long)]
        job: Option<PathBuf>,
    },
    /// List a workbook's sheets, or preview one sheet's first rows
    Inspect {
        /// Input workbook (.xlsx or .xls)
        input: PathBuf,
        /// Preview this zero-based sheet index instead of listing sheets
        #[arg(short, long)]
        sheet: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            sheet,
            first_row,
            last_row,
            output,
            ngen,
            run_name,
            job,
        } => {
            let overrides = config::JobFile {
                input,
                sheet,
                first_row,
                last_row,
                output,
                ngen,
                run_name,
            };
            let job = config::resolve(overrides, job.as_deref())?;
            convert(&job)
        }
        Commands::Inspect { input, sheet } => inspect(&input, sheet),
    }
}

fn convert(job: &config::Job) -> Result<()> {
    let grid = sheet::load_grid(&job.input, job.sheet)?;
    let taxa = matrix::extract_rows(&grid, job.rows.clone())?;
    info!(
        "Extracted {} taxa with {} characters each",
        taxa.len(),
        taxa[0].nchars
    );

    let doc = nexus::render(&taxa, &job.settings)?;
    fs::write(&job.output, &doc)
        .with_context(|| format!("failed to write {}", job.output.display()))?;

    println!(
        "Wrote {} ({} taxa, {} characters, ngen = {})",
        job.output.display(),
        taxa.len(),
        taxa[0].nchars,
        job.settings.ngen
    );
    Ok(())
}

const PREVIEW_ROWS: usize = 8;
const PREVIEW_COLS: usize = 10;

fn inspect(input: &Path, sheet: Option<usize>) -> Result<()> {
    let Some(index) = sheet else {
        let sheets = sheet::sheet_overview(input)?;
        println!("{:>3} | {:<28} | {:>6} | {:>5}", "#", "Sheet", "Rows", "Cols");
        println!("{}", "-".repeat(52));
        for (i, s) in sheets.iter().enumerate() {
            println!(
                "{:>3} | {:<28} | {:>6} | {:>5}",
                i,
                truncate(&s.name, 28),
                s.rows,
                s.cols
            );
        }
        return Ok(());
    };

    let grid = sheet::load_grid(input, index)?;
    let first_row = grid.start().map(|(row, _)| row as usize).unwrap_or(0);
    for (i, row) in grid.rows().take(PREVIEW_ROWS).enumerate() {
        let cells: Vec<String> = row
            .iter()
            .take(PREVIEW_COLS)
            .map(|cell| truncate(&cell.to_string(), 14))
            .collect();
        println!("{:>4}  {}", first_row + i + 1, cells.join(" | "));
    }
    if grid.height() > PREVIEW_ROWS {
        println!("  ... {} more rows", grid.height() - PREVIEW_ROWS);
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
