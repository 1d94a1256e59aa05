//! CLI entry point for the descriptive statistics engine.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use lex_statistics::{
    AnalysisConfig, ColumnAnalysis, ColumnAnalyzer, CorrelationMatrix, Estimate, FrameAnalysis,
    Measures, MissingValuePolicy, NormalityOutcome, OutlierReport, ReadOptions, TextEncoding,
    load_csv, pearson_matrix, prepare_for_correlation,
};
use serde::Serialize;
use tracing::info;

/// CLI-compatible missing-value policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingPolicy {
    /// Drop missing entries
    Drop,
    /// Replace with the mean of the present values
    Mean,
    /// Replace with the median of the present values
    Median,
    /// Replace with zero
    Zero,
}

impl From<CliMissingPolicy> for MissingValuePolicy {
    fn from(cli: CliMissingPolicy) -> Self {
        match cli {
            CliMissingPolicy::Drop => MissingValuePolicy::Drop,
            CliMissingPolicy::Mean => MissingValuePolicy::Mean,
            CliMissingPolicy::Median => MissingValuePolicy::Median,
            CliMissingPolicy::Zero => MissingValuePolicy::Zero,
        }
    }
}

/// CLI-compatible text encoding enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEncoding {
    /// Strict UTF-8
    Utf8,
    /// UTF-8 with invalid bytes replaced
    LossyUtf8,
}

impl From<CliEncoding> for TextEncoding {
    fn from(cli: CliEncoding) -> Self {
        match cli {
            CliEncoding::Utf8 => TextEncoding::Utf8,
            CliEncoding::LossyUtf8 => TextEncoding::LossyUtf8,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Descriptive statistics for tabular data",
    long_about = "Classifies each column, builds its frequency table and reports measures,\n\
                  quartiles, outliers and normality tests.\n\n\
                  EXAMPLES:\n  \
                  # Analyze every column\n  \
                  lex-statistics -i data.csv\n\n  \
                  # Semicolon-separated file with decimal commas\n  \
                  lex-statistics -i data.csv --separator ';' --decimal-comma\n\n  \
                  # Two columns plus their correlation, as JSON\n  \
                  lex-statistics -i data.csv --column age --column income --correlation --json"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Column to analyze (repeatable; defaults to all columns)
    #[arg(short, long = "column")]
    columns: Vec<String>,

    /// Field separator
    #[arg(long, default_value = ",")]
    separator: char,

    /// Parse numbers written with a decimal comma
    #[arg(long)]
    decimal_comma: bool,

    /// Text encoding of the input
    #[arg(long, value_enum, default_value = "utf8")]
    encoding: CliEncoding,

    /// The file has no header row
    #[arg(long)]
    no_header: bool,

    /// How to handle missing values before analysis
    #[arg(long, value_enum, default_value = "drop")]
    missing: CliMissingPolicy,

    /// Absolute z-score above which a value is an outlier
    #[arg(long, default_value = "3.0")]
    z_threshold: f64,

    /// Significance level for the normality tests
    #[arg(long, default_value = "0.05")]
    alpha: f64,

    /// Also compute the Pearson correlation matrix
    #[arg(long)]
    correlation: bool,

    /// Output JSON to stdout instead of the text report
    ///
    /// Disables all logs; only the JSON document is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON document.
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
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a str,
    rows: usize,
    #[serde(flatten)]
    analysis: &'a FrameAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation: Option<&'a CorrelationMatrix>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !args.separator.is_ascii() {
        return Err(anyhow!("Separator must be a single ASCII character"));
    }

    let options = ReadOptions {
        separator: args.separator as u8,
        decimal_comma: args.decimal_comma,
        encoding: args.encoding.into(),
        has_header: !args.no_header,
    };

    info!("Loading dataset from: {}", args.input);
    let df = load_csv(&args.input, &options)?;
    info!("Dataset loaded: {} rows x {} columns", df.height(), df.width());

    let config = AnalysisConfig::builder()
        .missing_policy(args.missing.into())
        .z_threshold(args.z_threshold)
        .alpha(args.alpha)
        .build()?;
    let analyzer = ColumnAnalyzer::new(config.clone())?;

    let analysis = if args.columns.is_empty() {
        analyzer.analyze_frame(&df)
    } else {
        analyzer.analyze_columns(&df, &args.columns)
    };

    let correlation = if args.correlation {
        let selected = (!args.columns.is_empty()).then_some(args.columns.as_slice());
        let prepared = prepare_for_correlation(&df, selected, &config)?;
        if !prepared.dropped.is_empty() {
            info!("Excluded from correlation: {}", prepared.dropped.join(", "));
        }
        pearson_matrix(&prepared)
    } else {
        None
    };

    if args.json {
        let report = JsonReport {
            input: &args.input,
            rows: df.height(),
            analysis: &analysis,
            correlation: correlation.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&args.input, df.height(), &analysis);
    if let Some(ref matrix) = correlation {
        print_correlation(matrix);
    } else if args.correlation {
        println!("Correlation: fewer than two usable columns");
    }
    Ok(())
}

/// Print the text report.
///
/// Uses `println!` on purpose: the report is the program's output, not a log.
fn print_report(input: &str, rows: usize, analysis: &FrameAnalysis) {
    println!("{}", "=".repeat(80));
    println!("DESCRIPTIVE STATISTICS: {input} ({rows} rows)");
    println!("{}", "=".repeat(80));

    for column in &analysis.columns {
        print_column(column);
    }

    if !analysis.failures.is_empty() {
        println!();
        println!("Columns not analyzed:");
        for failure in &analysis.failures {
            println!("  ! {} [{}] {}", failure.name, failure.code, failure.message);
        }
    }
}

fn print_column(column: &ColumnAnalysis) {
    println!();
    println!("{} ({})", column.name, column.variable_type);
    println!("{}", "-".repeat(80));
    println!("  n = {}, missing = {}", column.n, column.missing);
    if column.non_numeric > 0 {
        println!("  non-numeric = {}", column.non_numeric);
    }
    println!();

    println!(
        "  {:<28} {:>8} {:>10} {:>8} {:>10}",
        "Value", "f", "fr", "%", "F"
    );
    for row in &column.frequency_table.rows {
        let cumulative = row
            .cumulative_absolute
            .map(|c| c.to_string())
            .unwrap_or_default();
        println!(
            "  {:<28} {:>8} {:>10.4} {:>7.2}% {:>10}",
            truncate_str(&row.label.to_string(), 28),
            row.absolute,
            row.relative,
            row.percentage,
            cumulative
        );
    }
    println!();

    match &column.measures {
        Some(Measures::Grouped(m)) => {
            println!("  Grouped measures");
            println!(
                "    mean {:.4}  median {}  mode {}",
                m.mean,
                fmt_estimate(m.median),
                fmt_estimate(m.mode)
            );
            println!(
                "    variance {:.4} (sample {:.4})  std {:.4} (sample {:.4})",
                m.population_variance, m.sample_variance, m.population_std, m.sample_std
            );
            println!(
                "    CV {:.2}%  skewness {}  excess kurtosis {}",
                m.coefficient_of_variation,
                fmt_estimate(m.skewness),
                fmt_estimate(m.excess_kurtosis)
            );
        }
        Some(Measures::Raw(m)) => {
            let modes: Vec<String> = m.modes.iter().map(|v| v.to_string()).collect();
            println!("  Measures");
            println!(
                "    mean {:.4}  median {:.4}  mode {} ({:?})",
                m.mean,
                m.median,
                modes.join(", "),
                m.modality
            );
            println!(
                "    std {}  CV {}  range [{} - {}]",
                fmt_estimate(m.sample_std),
                fmt_estimate(m.coefficient_of_variation),
                m.min,
                m.max
            );
            println!(
                "    skewness {} {}",
                fmt_estimate(m.skewness),
                m.skewness_interpretation.as_deref().unwrap_or("")
            );
            println!(
                "    excess kurtosis {} {}",
                fmt_estimate(m.excess_kurtosis),
                m.kurtosis_interpretation.as_deref().unwrap_or("")
            );
            if let Some(ci) = m.confidence_interval {
                println!(
                    "    {:.0}% CI for the mean [{:.4}, {:.4}]",
                    ci.level * 100.0,
                    ci.lower,
                    ci.upper
                );
            }
        }
        Some(Measures::Qualitative(m)) => {
            println!("  Measures");
            println!(
                "    mode '{}' ({} of {}, {:.2}%)  unique {}  entropy {:.4} bits",
                m.mode,
                m.mode_frequency,
                m.n,
                m.mode_proportion * 100.0,
                m.unique,
                m.entropy
            );
        }
        None => {}
    }

    if !column.quartiles.is_empty() {
        let q = column.quartiles;
        println!(
            "  Quartiles  Q1 {}  Q2 {}  Q3 {}",
            fmt_option(q.q1),
            fmt_option(q.q2),
            fmt_option(q.q3)
        );
    }

    for report in [&column.iqr_outliers, &column.zscore_outliers]
        .into_iter()
        .flatten()
    {
        print_outliers(report);
    }

    for result in &column.normality {
        match &result.outcome {
            NormalityOutcome::Completed {
                statistic,
                p_value,
                interpretation,
                ..
            } => println!(
                "  {:<20} stat {:.4}  p {:.4}  {}",
                result.test.display_name(),
                statistic,
                p_value,
                interpretation
            ),
            NormalityOutcome::Failed { error } => {
                println!("  {:<20} failed: {}", result.test.display_name(), error)
            }
        }
    }

    for warning in &column.warnings {
        println!("  ! {warning}");
    }
}

fn print_outliers(report: &OutlierReport) {
    let values: Vec<String> = report.values.iter().map(|v| v.to_string()).collect();
    println!(
        "  Outliers ({:?}): {} ({:.2}%) {}",
        report.method,
        report.count,
        report.percentage,
        values.join(", ")
    );
}

fn print_correlation(matrix: &CorrelationMatrix) {
    println!();
    println!("PEARSON CORRELATION");
    println!("{}", "-".repeat(80));

    print!("  {:<16}", "");
    for name in &matrix.columns {
        print!(" {:>10}", truncate_str(name, 10));
    }
    println!();

    for (name, row) in matrix.columns.iter().zip(&matrix.cells) {
        print!("  {:<16}", truncate_str(name, 16));
        for cell in row {
            match cell {
                Some(cell) => print!(" {:>10.4}", cell.r),
                None => print!(" {:>10}", "N/A"),
            }
        }
        println!();
    }
}

fn fmt_estimate(estimate: Estimate) -> String {
    match estimate {
        Estimate::Value(v) => format!("{v:.4}"),
        Estimate::NotApplicable => estimate.to_string(),
    }
}

fn fmt_option(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "N/A".to_string())
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
