use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use parametric::comparison::ComparisonMode;
use parametric::config::AppConfig;
use parametric::error::AppError;
use parametric::ingest;
use parametric::matcher::SourceSet;
use parametric::service::AnalysisService;
use serde::Serialize;

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    /// CSV exports to compare, one per source
    #[arg(long = "file", required = true)]
    files: Vec<PathBuf>,
    /// CSV export to treat as the reference source
    #[arg(long)]
    reference: Option<PathBuf>,
    /// Comparison mode to run
    #[arg(long, value_enum, default_value_t = ModeArg::FileToFile)]
    mode: ModeArg,
    /// Override the configured tolerance percentage
    #[arg(long)]
    tolerance: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct QcArgs {
    /// CSV exports to validate
    #[arg(long = "file", required = true)]
    files: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    FileToFile,
    FileToReference,
    Statistical,
    Correlation,
}

impl From<ModeArg> for ComparisonMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::FileToFile => ComparisonMode::FileToFile,
            ModeArg::FileToReference => ComparisonMode::FileToReference,
            ModeArg::Statistical => ComparisonMode::Statistical,
            ModeArg::Correlation => ComparisonMode::Correlation,
        }
    }
}

pub(crate) fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let mut settings = config.engine;
    if let Some(tolerance) = args.tolerance {
        settings.comparison.tolerance_pct = tolerance;
    }

    let mut set = SourceSet::new();
    for path in &args.files {
        let (label, records) = load_export(path)?;
        set.add_source(label, records)?;
    }
    if let Some(path) = &args.reference {
        let (label, records) = load_export(path)?;
        set.set_reference(label, records)?;
    }

    let service = AnalysisService::new(settings)?;
    let run = service.run_comparison(args.mode.into(), &set)?;
    print_json(&run)
}

pub(crate) fn run_qc(args: QcArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let mut set = SourceSet::new();
    for path in &args.files {
        let (label, records) = load_export(path)?;
        set.add_source(label, records)?;
    }

    let service = AnalysisService::new(config.engine)?;
    let view = service.run_qc(&set);
    print_json(&view)
}

fn load_export(path: &Path) -> Result<(String, Vec<parametric::domain::ParameterRecord>), AppError> {
    let label = source_label(path);
    let file = File::open(path)?;
    let records = ingest::parse_records(file, &label)?;
    Ok((label, records))
}

fn source_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    writeln!(handle)?;
    Ok(())
}
