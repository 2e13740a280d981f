//! The `dermlens analyze` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use dermlens_core::{
    analyze_stream, AnalysisRecord, Config, FileDiscovery, ImageSource, OutputWriter, SkinAnalyzer,
};
use futures_util::StreamExt;

use super::{create_progress_bar, open_output, resolve_format, Backend, OutputFormat};

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image file or directory to analyze
    pub input: PathBuf,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of images analyzed concurrently (defaults to config)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Override the configured encoder backend
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Compact JSON even when the config asks for pretty output
    #[arg(long)]
    pub compact: bool,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(backend) = args.backend {
        config.embedding.backend = backend.into();
    }
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }

    if !args.input.exists() {
        anyhow::bail!("Input path does not exist: {}", args.input.display());
    }

    // Loading may run ONNX inference over every prompt.
    let analyzer = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || SkinAnalyzer::new(&config)).await??
    };
    let analyzer = Arc::new(analyzer);
    let pretty = config.output.pretty && !args.compact;
    let format = resolve_format(args.format, &config);

    if args.input.is_file() {
        let source = ImageSource::from(args.input.as_path());
        let analysis = {
            let analyzer = Arc::clone(&analyzer);
            tokio::task::spawn_blocking(move || analyzer.analyze(&source)).await?
        };

        let mut writer = OutputWriter::new(
            open_output(args.output.as_deref())?,
            format,
            pretty,
        );
        writer.write(&analysis)?;
        writer.flush()?;
        return Ok(());
    }

    analyze_directory(analyzer, &config, &args, format, pretty).await
}

async fn analyze_directory(
    analyzer: Arc<SkinAnalyzer>,
    config: &Config,
    args: &AnalyzeArgs,
    format: dermlens_core::OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    let discovery = FileDiscovery::new(config.limits.clone());
    let files = discovery.discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported images found in {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} images to analyze", files.len());

    let total_bytes: u64 = files.iter().map(|f| f.size).sum();
    let sources: Vec<ImageSource> = files.into_iter().map(|f| f.path.into()).collect();
    let progress = create_progress_bar(sources.len() as u64)?;

    let mut writer = OutputWriter::new(
        open_output(args.output.as_deref())?,
        format,
        pretty,
    );
    // JSON output is a single array, so records are held until the end.
    let stream_records = format == dermlens_core::OutputFormat::JsonLines;
    let mut collected = Vec::new();

    let mut succeeded: u64 = 0;
    let mut failed: u64 = 0;
    let start = Instant::now();

    let stream = analyze_stream(analyzer, sources, config.processing.parallel_workers);
    futures_util::pin_mut!(stream);

    while let Some((source, analysis)) = stream.next().await {
        if analysis.is_error() {
            failed += 1;
        } else {
            succeeded += 1;
        }

        let record = AnalysisRecord {
            source: source.display_path().display().to_string(),
            analysis,
        };
        if stream_records {
            writer.write(&record)?;
        } else {
            collected.push(record);
        }

        progress.inc(1);
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            progress.set_message(format!("{:.1} img/sec", (succeeded + failed) as f64 / elapsed));
        }
    }

    if !stream_records {
        writer.write_all(&collected)?;
    }
    writer.flush()?;
    progress.finish_and_clear();

    print_summary(succeeded, failed, total_bytes, start.elapsed());
    Ok(())
}

/// Print a summary table to stderr after a directory run.
fn print_summary(succeeded: u64, failed: u64, total_bytes: u64, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        (succeeded + failed) as f64 / secs
    } else {
        0.0
    };
    let throughput = if secs > 0.0 {
        (total_bytes as f64 / 1_048_576.0) / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Analyzed:     {:>8}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", succeeded + failed);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("    Throughput:   {:>7.1} MB/sec", throughput);
    eprintln!("  ====================================");
}
