//! CLI entry point for the tsunami events cleaning pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tsunami_processing::{
    CleaningConfig, CleaningReport, CleaningResult, CleaningStage, DataProfiler, Pipeline,
    ReportGenerator, SchemaValidator, load_for_config,
};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tsunami events cleaning and profiling pipeline",
    long_about = "Cleans the historical tsunami events export and profiles the result.\n\n\
                  EXAMPLES:\n  \
                  # Clean with the built-in rules\n  \
                  tsunami-processing -i tsunami_events.tsv\n\n  \
                  # Custom rules and output location\n  \
                  tsunami-processing -i events.tsv -c rules.json -o cleaned/\n\n  \
                  # Check the input without writing anything\n  \
                  tsunami-processing -i events.tsv --dry-run\n\n  \
                  # Machine-readable report on stdout\n  \
                  tsunami-processing -i events.tsv --json"
)]
struct Args {
    /// Path to the delimited events file
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the cleaned CSV and report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file name without extension
    #[arg(long)]
    output_name: Option<String>,

    /// JSON file with cleaning rules; absent fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input field separator ("tab" or "\t" for tabs)
    #[arg(long, value_parser = parse_separator)]
    separator: Option<char>,

    /// Write the CSV without the leading index column
    #[arg(long)]
    no_index: bool,

    /// Most frequent values listed per categorical column
    #[arg(long)]
    top_n: Option<usize>,

    /// Histogram bins per numeric column
    #[arg(long)]
    bins: Option<usize>,

    /// Validate the input and show the planned stages without writing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Print the JSON report to stdout instead of the summary
    ///
    /// Disables all logging so stdout holds only JSON.
    #[arg(long)]
    json: bool,

    /// Write the JSON report next to the cleaned CSV
    #[arg(short = 'r', long)]
    emit_report: bool,
}

fn parse_separator(value: &str) -> std::result::Result<char, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok('\t'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("expected a single character, got {:?}", other)),
            }
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Under `--json` no subscriber is installed so stdout carries only JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = build_config(&args)?;

    if args.dry_run {
        return run_dry_run(&args, &config);
    }

    let mut builder = Pipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    match pipeline.process_file(&args.input) {
        Ok(result) => handle_pipeline_output(&result, &args),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Default rules, then the config file, then command-line overrides.
fn build_config(args: &Args) -> Result<CleaningConfig> {
    let mut config = match &args.config {
        Some(path) => CleaningConfig::from_json_file(path)
            .with_context(|| format!("Loading configuration from {}", path.display()))?,
        None => CleaningConfig::default(),
    };

    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(name) = &args.output_name {
        config.output_name = name.clone();
    }
    if let Some(separator) = args.separator {
        config.input_separator = separator;
    }
    if args.no_index {
        config.include_index = false;
    }
    if let Some(n) = args.top_n {
        config.top_n_categories = n;
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    if args.emit_report {
        config.generate_reports = true;
    }

    config.validate()?;
    Ok(config)
}

/// Show what a run would do without running it.
///
/// Uses `println!` on purpose: this is the command's output, not logging.
fn run_dry_run(args: &Args, config: &CleaningConfig) -> Result<()> {
    let data = load_for_config(&args.input, config)?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning stages");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!();

    println!("MISSING VALUES");
    println!("{}", "-".repeat(40));
    println!("{:<34} {:>10} {:>10}", "Column", "Missing", "Missing %");
    for entry in DataProfiler::missing_report(&data) {
        println!(
            "{:<34} {:>10} {:>10.1}",
            truncate_str(&entry.column, 33),
            entry.null_count,
            entry.null_percentage
        );
    }
    println!();

    println!("SCHEMA");
    println!("{}", "-".repeat(40));
    let schema_ok = match SchemaValidator::validate(&data, config) {
        Ok(()) => {
            println!("  Input matches the expected layout");
            true
        }
        Err(e) => {
            println!("  {}", e);
            false
        }
    };
    println!();

    println!("STAGES");
    println!("{}", "-".repeat(40));
    println!(
        "  {}: {} columns",
        CleaningStage::ColumnPruning.display_name(),
        config.drop_columns.len()
    );
    println!(
        "  {}: {} integer, {} categorical",
        CleaningStage::TypeNormalization.display_name(),
        config.int_columns.len(),
        config.category_columns.len()
    );
    println!(
        "  {}: keep '{}' in {:?}",
        CleaningStage::ValidityFilter.display_name(),
        config.validity_column,
        config.valid_codes
    );
    println!(
        "  {}: {}",
        CleaningStage::MedianImputation.display_name(),
        config.median_fill_columns.join(", ")
    );
    for fill in &config.constant_fills {
        println!(
            "  {}: '{}' := {}",
            CleaningStage::FallbackImputation.display_name(),
            fill.column,
            fill.value
        );
    }
    for patch in &config.data_patches {
        println!(
            "  {}: '{}' := {} (at most {} row(s))",
            CleaningStage::FallbackImputation.display_name(),
            patch.column,
            patch.value,
            patch.expected_matches
        );
    }
    let chain: Vec<String> = config.coordinate_fallback.iter().map(|t| t.to_string()).collect();
    println!(
        "  {}: {} via {}",
        CleaningStage::CoordinateImputation.display_name(),
        config.coordinate_columns.join(", "),
        chain.join(" -> ")
    );
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    let generator = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());
    println!("  - {}", generator.csv_path().display());
    if config.generate_reports {
        println!("  - {}", generator.report_path().display());
    }
    println!();

    println!("{}", "=".repeat(80));
    if schema_ok {
        println!("To run the cleaning, drop --dry-run");
    } else {
        println!("The input does not match the configured layout; a run would fail");
    }
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Print the run result.
///
/// - Default: human-readable summary
/// - `--json`: report JSON only
fn handle_pipeline_output(result: &CleaningResult, args: &Args) -> Result<()> {
    let report = ReportGenerator::build_report(Some(args.input.as_path()), result);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(path) = &result.report_file {
        info!("Report written to: {}", path.display());
    }
    print_human_readable_summary(&report, result, &args.input);
    Ok(())
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v))
}

fn print_human_readable_summary(report: &CleaningReport, result: &CleaningResult, input: &Path) {
    let summary = &report.processing_summary;
    let profile = &result.profile;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        input.display(),
        summary.rows_before,
        summary.columns_before
    );
    match &report.output_file {
        Some(path) => println!(
            "Output: {} ({} rows x {} columns)",
            path, summary.rows_after, summary.columns_after
        ),
        None => println!(
            "Output: not written ({} rows x {} columns)",
            summary.rows_after, summary.columns_after
        ),
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed, {:.1}%)",
        summary.rows_before, summary.rows_after, summary.rows_removed, summary.rows_removed_percent
    );
    println!(
        "  Columns: {} -> {} ({} removed)",
        summary.columns_before, summary.columns_after, summary.columns_removed
    );
    println!(
        "  Data Quality: {:.1}% -> {:.1}%",
        summary.data_quality_before * 100.0,
        summary.data_quality_after * 100.0
    );
    println!();

    if !profile.numeric_summaries.is_empty() {
        println!("Numeric Columns:");
        println!(
            "  {:<28} {:>10} {:>10} {:>10} {:>10}",
            "Column", "Mean", "Median", "Std", "Skew"
        );
        for s in &profile.numeric_summaries {
            println!(
                "  {:<28} {:>10.3} {:>10.3} {:>10} {:>10}",
                truncate_str(&s.column, 27),
                s.mean,
                s.median,
                format_optional(s.std),
                format_optional(s.skewness)
            );
        }
        println!();
    }

    if !profile.category_frequencies.is_empty() {
        println!("Top Categories:");
        for freq in &profile.category_frequencies {
            let top: Vec<String> = freq
                .top
                .iter()
                .map(|c| format!("{} ({:.1}%)", c.value, c.percentage))
                .collect();
            println!(
                "  {} [{} distinct]: {}",
                freq.column,
                freq.distinct_values,
                top.join(", ")
            );
        }
        println!();
    }

    if !profile.strongest_correlations.is_empty() {
        println!("Strongest Correlations:");
        for pair in &profile.strongest_correlations {
            println!("  {:+.3}  {} / {}", pair.coefficient, pair.left, pair.right);
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}
