use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use leafscan::{
    decode_image, encode_png, AnalysisError, AnalysisReport, AnalysisResult, AnalyzeConfig,
    AnnotationError, IoError, LeafAnalyzer, LeafAnalyzerParams, ParamsError,
};

#[derive(Parser, Debug)]
#[command(
    name = "leafscan",
    version,
    about = "Measure leaves in a photo calibrated by a reference square"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Log level for stderr output (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,
    /// Emit JSON-formatted tracing events (builds with the `tracing` feature).
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect, calibrate and measure every leaf in an image.
    Analyze(AnalyzeArgs),
    /// Redraw a previous report's leaves, optionally deleting some first.
    Rerender(RerenderArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input photo (any format the `image` crate decodes).
    #[arg(long)]
    image: Option<PathBuf>,
    /// Real area of the reference square, e.g. in cm².
    #[arg(long)]
    reference_area: Option<f64>,
    /// JSON config; command-line values take precedence over it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where to write the JSON report.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Where to write the annotated PNG.
    #[arg(long)]
    annotated: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RerenderArgs {
    /// The original, unannotated photo.
    #[arg(long)]
    image: PathBuf,
    /// Report produced by `leafscan analyze`.
    #[arg(long)]
    report: PathBuf,
    /// Leaf ids to delete, comma separated.
    #[arg(long, value_delimiter = ',')]
    remove: Vec<u32>,
    /// Where to write the re-rendered PNG.
    #[arg(long)]
    annotated: PathBuf,
    /// Where to write the updated report.
    #[arg(long)]
    output_report: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0} (pass it on the command line or in --config)")]
    MissingInput(&'static str),
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("unknown log level `{s}`"))
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    if cli.json_logs {
        let _ = tracing_log::LogTracer::init_with_filter(cli.log_level);
        leafscan::geometry::init_tracing(true);
    } else if let Err(err) = leafscan::geometry::init_with_level(cli.log_level) {
        eprintln!("logger already installed: {err}");
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    if let Err(err) = leafscan::geometry::init_with_level(cli.log_level) {
        eprintln!("logger already installed: {err}");
    }
    if cli.json_logs {
        log::warn!("--json-logs needs the `tracing` feature; using plain logs");
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn print_summary(result: &AnalysisResult) {
    println!(
        "{:>4} {:>12} {:>12} {:>10} {:>10} {:>7}",
        "id", "area", "perimeter", "length", "width", "w/l"
    );
    for leaf in &result.leaves {
        println!(
            "{:>4} {:>12.4} {:>12.4} {:>10.4} {:>10.4} {:>7.3}",
            leaf.id,
            leaf.area,
            leaf.perimeter,
            leaf.length,
            leaf.width,
            leaf.width_to_length_ratio
        );
    }
    let agg = &result.aggregates;
    println!(
        "{} leaves, total area {:.4}, mean area {:.4} (sd {:.4}), mean w/l {:.3}",
        result.leaf_count,
        agg.total_area,
        agg.average_area,
        agg.std_dev_area,
        agg.average_width_to_length_ratio
    );
}

fn analyze(args: AnalyzeArgs) -> Result<ExitCode, CliError> {
    let mut config = match &args.config {
        Some(path) => AnalyzeConfig::load_json(path)?,
        None => AnalyzeConfig {
            image_path: String::new(),
            reference_area: f64::NAN,
            report_path: None,
            annotated_path: None,
            params: LeafAnalyzerParams::default(),
        },
    };
    if let Some(image) = &args.image {
        config.image_path = image.display().to_string();
    }
    if let Some(area) = args.reference_area {
        config.reference_area = area;
    }
    if let Some(report) = &args.report {
        config.report_path = Some(report.display().to_string());
    }
    if let Some(annotated) = &args.annotated {
        config.annotated_path = Some(annotated.display().to_string());
    }
    if config.image_path.is_empty() {
        return Err(CliError::MissingInput("--image is required"));
    }
    if args.config.is_none() && args.reference_area.is_none() {
        return Err(CliError::MissingInput("--reference-area is required"));
    }

    let analyzer = config.build_analyzer()?;
    let bytes = read(Path::new(&config.image_path))?;
    let outcome = analyzer.analyze_bytes(&bytes, config.reference_area);

    let (result, code) = match outcome {
        Ok(result) => (result, ExitCode::SUCCESS),
        Err(err) => {
            log::error!("{}: {err}", config.image_path);
            (AnalysisResult::from_error(&err), ExitCode::FAILURE)
        }
    };

    if !result.is_error() {
        print_summary(&result);
    }
    if let (Some(path), Some(png)) = (&config.annotated_path, &result.annotated_image) {
        write(Path::new(path), png)?;
        log::info!("annotated image written to {path}");
    }
    if config.report_path.is_some() {
        let path = config.report_path();
        AnalysisReport::new(&config, result).write_json(&path)?;
        log::info!("report written to {}", path.display());
    }
    Ok(code)
}

fn rerender(args: RerenderArgs) -> Result<ExitCode, CliError> {
    let mut report = AnalysisReport::load_json(&args.report)?;
    let analyzer = LeafAnalyzer::new(report.params.clone())?;
    let source = decode_image(&read(&args.image)?)?;

    if !args.remove.is_empty() {
        let removed = analyzer.remove_leaves(&mut report.result, &source, &args.remove);
        if removed < args.remove.len() {
            log::warn!(
                "{} of {} requested ids were not in the report",
                args.remove.len() - removed,
                args.remove.len()
            );
        }
    }

    // Reports never carry the image, so this is only set by a removal above.
    let png = match report.result.annotated_image.take() {
        Some(png) => png,
        None => encode_png(&analyzer.rerender(&source, &report.result.leaves))?,
    };
    write(&args.annotated, &png)?;
    print_summary(&report.result);

    if let Some(path) = &args.output_report {
        report.write_json(path)?;
        log::info!("report written to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let outcome = match cli.command {
        Command::Analyze(args) => analyze(args),
        Command::Rerender(args) => rerender(args),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
