use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use m3usift_engine::{
    CheckerConfig, LinkChecker, LinkStatus, RunSummary, Verdict, load_playlist, parse_playlist,
    summarize, write_playlist,
};
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Environment variable naming the CI output file (GitHub Actions style).
const OUTPUT_VAR_FILE_ENV: &str = "GITHUB_OUTPUT";

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate the links of an M3U playlist and save the playable subset", long_about = None)]
struct Args {
    /// URL or local path of the M3U playlist to check
    m3u_source: String,

    /// Per-link probe timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Timeout for downloading the playlist itself, in seconds
    #[arg(long, default_value_t = 45)]
    download_timeout: u64,

    /// Directory the filtered playlist is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Filename prefix of the filtered playlist
    #[arg(long, default_value = "valid_")]
    output_prefix: String,

    /// Number of concurrent probe workers
    #[arg(long, default_value_t = 10)]
    workers: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(&args).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Application error: {e:#}");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<i32> {
    let start = Instant::now();
    let config = CheckerConfig {
        probe_timeout: Duration::from_secs(args.timeout),
        download_timeout: Duration::from_secs(args.download_timeout),
        max_workers: args.workers,
        ..CheckerConfig::default()
    };

    let lines = load_playlist(&args.m3u_source, &config)
        .await
        .with_context(|| format!("failed to load playlist from {}", args.m3u_source))?;

    let entries = parse_playlist(&lines);
    if entries.is_empty() {
        println!("No stream entries found in the playlist.");
        return Ok(0);
    }

    let checker = LinkChecker::new(&config).context("failed to set up the link checker")?;
    let verdicts = checker.check_all(&entries).await;

    print_report(&verdicts);
    let summary = summarize(&verdicts);
    print_summary(&summary);

    if let Some(saved) = write_playlist(&verdicts, &args.output_dir, &args.output_prefix) {
        println!("Saved playable entries to {}", saved.display());
        record_output_var(&saved);
    }

    println!("Total time: {:.2} s", start.elapsed().as_secs_f64());
    Ok(exit_code(&summary))
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}

fn status_marker(status: LinkStatus) -> &'static str {
    match status {
        LinkStatus::Valid => "✓",
        LinkStatus::PossiblyValid => "?",
        LinkStatus::Invalid => "✗",
        LinkStatus::Skipped => "~",
    }
}

/// Per-entry outcomes in original playlist order.
fn print_report(verdicts: &[Verdict]) {
    let mut ordered: Vec<&Verdict> = verdicts.iter().collect();
    ordered.sort_by_key(|v| v.entry.original_index);

    println!("\n--- Check results ---");
    for verdict in ordered {
        println!(
            "[{}] {} | {} - {}",
            status_marker(verdict.status),
            verdict.entry.label(),
            verdict.entry.url,
            verdict.reason
        );
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\nParsed entries:        {}", summary.total());
    println!("Checked HTTP(S) links: {}", summary.checked());
    println!("Skipped non-HTTP(S):   {}", summary.skipped);
    println!("Playable entries:      {}", summary.valid + summary.possibly_valid);
    println!("Invalid links:         {}", summary.invalid);
}

/// 1 when any checked entry turned out invalid, else 0.
fn exit_code(summary: &RunSummary) -> i32 {
    if summary.invalid > 0 { 1 } else { 0 }
}

/// CI hook: append the saved path as `saved_m3u_path=<path>` to the output
/// file named by `GITHUB_OUTPUT`, when set.
fn record_output_var(saved: &Path) {
    let Ok(output_file) = std::env::var(OUTPUT_VAR_FILE_ENV) else {
        return;
    };
    if let Err(e) = append_output_var(Path::new(&output_file), saved) {
        error!("failed to record output variable in {output_file}: {e}");
    }
}

fn append_output_var(output_file: &Path, saved: &Path) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)?;
    writeln!(file, "saved_m3u_path={}", saved.display())
}
