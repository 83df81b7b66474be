use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::config::{Args, Config};
use crate::diagnostics::{Report, Severity};
use crate::io::{BlockingLines, CHANNEL_CAPACITY, read_lines, write_lines};
use crate::pipeline::Pipeline;

/// Parse the command line, clean the file and report
pub async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = Config::from_args(args)?;
    for source in &config.sources {
        info!("Using config {}", source.display());
    }

    let report = clean_file(&config).await?;
    summarize(&config, &report);
    Ok(())
}

/// `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second init (tests, embedding) keeps the first logger
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Run the pipeline from `config.input` to `config.output`.
///
/// Reading and writing stay on the runtime; the pipeline itself runs on a
/// blocking thread pulling lines as the writer drains them.
pub async fn clean_file(config: &Config) -> Result<Report> {
    info!(
        "Cleaning {} into {}",
        config.input.display(),
        config.output.display()
    );

    let (input_rx, reader) = read_lines(&config.input).await?;
    let (output_tx, output_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let writer = {
        let path = config.output.clone();
        let echo = !config.quiet;
        tokio::spawn(async move { write_lines(&path, output_rx, echo).await })
    };

    let pipeline = Pipeline::new(config.clean.clone());
    let cleaning = tokio::task::spawn_blocking(move || {
        let mut report = Report::new();
        let mut output_line = 0;
        for line in pipeline.lines(BlockingLines::new(input_rx)) {
            output_line += 1;
            let text = line.to_string();
            for diagnostic in line.diagnostics {
                report.add(output_line, diagnostic);
            }
            // The writer failed; its error is picked up below
            if output_tx.blocking_send(text).is_err() {
                break;
            }
        }
        report
    });

    let mut report = cleaning.await.context("Cleaning task failed")?;
    report.lines_written = writer.await.context("Writer task failed")??;
    report.lines_read = reader.await.context("Reader task failed")??;
    Ok(report)
}

fn summarize(config: &Config, report: &Report) {
    for located in &report.diagnostics {
        match located.diagnostic.severity {
            Severity::Error => error!("{located}"),
            Severity::Warning => warn!("{located}"),
            Severity::Info => info!("{located}"),
        }
    }

    let saved = report.lines_read.saturating_sub(report.lines_written);
    info!(
        "{}: {} lines read, {} written ({} removed), {} errors, {} warnings",
        config.output.display(),
        report.lines_read,
        report.lines_written,
        saved,
        report.count(Severity::Error),
        report.count(Severity::Warning)
    );
}
