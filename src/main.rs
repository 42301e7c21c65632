//! s3-parallel-put - Concurrent upload benchmark for S3-compatible stores
//!
//! Uploads `CONCURRENCY` objects at once and reports elapsed time, objects per
//! second and bandwidth.

use anyhow::Context;
use clap::Parser;
use s3_parallel_put::bench::{self, report, OutputFormat, Workload};
use s3_parallel_put::config::{
    BenchOptions, Config, DEFAULT_META_COUNT, DEFAULT_META_SIZE, DEFAULT_OBJECT_SIZE,
};
use s3_parallel_put::s3::S3Client;
use s3_parallel_put::upload::multipart::DEFAULT_PART_SIZE;
use s3_parallel_put::{metrics, VERSION};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Log output format
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// s3-parallel-put - measure concurrent upload throughput against S3
///
/// Connection settings come from the ACCESSKEY, SECRETKEY, ENDPOINT, BUCKET,
/// REGION and NODE environment variables; CONCURRENCY is required.
#[derive(Parser, Debug)]
#[command(name = "s3-parallel-put")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Size of the object to upload, in bytes
    #[arg(long, default_value_t = DEFAULT_OBJECT_SIZE)]
    size: usize,

    /// Metadata entry count of the object to upload
    #[arg(long, default_value_t = DEFAULT_META_COUNT)]
    meta_count: usize,

    /// Metadata size of each entry of the object to upload, in bytes
    #[arg(long, default_value_t = DEFAULT_META_SIZE)]
    meta_size: usize,

    /// Part size used for multipart uploads, in bytes
    #[arg(long, default_value_t = DEFAULT_PART_SIZE)]
    part_size: usize,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    output: OutputFormat,

    /// Optional YAML file with connection settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write Prometheus metrics of the run to this file
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Args {
    fn options(&self) -> BenchOptions {
        BenchOptions {
            object_size: self.size,
            meta_count: self.meta_count,
            meta_size: self.meta_size,
            part_size: self.part_size,
        }
    }
}

/// Single-dash spellings accepted for compatibility with existing scripts
const LEGACY_FLAGS: [&str; 3] = ["-size", "-meta-count", "-meta-size"];

/// Rewrite `-size 16` and `-size=16` style flags to their `--` form
fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let legacy = arg.to_str().is_some_and(|s| {
                LEGACY_FLAGS.iter().any(|flag| {
                    s == *flag || s.strip_prefix(flag).is_some_and(|rest| rest.starts_with('='))
                })
            });
            if legacy {
                let mut rewritten = OsString::from("-");
                rewritten.push(&arg);
                rewritten
            } else {
                arg
            }
        })
        .collect()
}

/// Logs go to stderr; stdout carries only the report
fn init_logging(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_from(normalize_legacy_flags(std::env::args_os()));
    init_logging(&args.log_level, args.log_format)?;

    info!("Starting s3-parallel-put v{}", VERSION);

    if let Err(err) = run(args).await {
        error!(error = %format!("{:#}", err), "Benchmark failed");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(args.options(), args.config.as_deref())
        .context("Failed to load configuration")?;
    info!(
        concurrency = config.bench.concurrency,
        object_size = config.bench.object_size,
        meta_count = config.bench.meta_count,
        meta_size = config.bench.meta_size,
        endpoint = %config.s3.endpoint,
        bucket = %config.s3.bucket,
        "Loaded configuration"
    );

    let client = S3Client::connect(&config.s3)
        .await
        .context("Failed to create S3 client")?;

    let workload = Workload::generate(&config.bench);
    let run = bench::run(Arc::new(client), &workload)
        .await
        .context("Benchmark run failed")?;

    println!("{}", report::render(args.output, &config.bench, &run)?);

    if let Some(path) = &args.metrics_file {
        metrics::write_textfile(path)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    Ok(())
}
