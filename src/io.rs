//! File input and output
//!
//! Reading and writing run as tokio tasks joined to the synchronous pipeline
//! by bounded channels, so memory stays flat however long the program is.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Lines in flight between a file task and the pipeline
pub const CHANNEL_CAPACITY: usize = 1024;
/// Inserted before the extension of the input name
pub const OUTPUT_MARKER: &str = "clean";
/// Extension given to the output when the input has none
pub const DEFAULT_EXTENSION: &str = "nc";

/// `dir/name.ext` becomes `dir/name.clean.ext`, `dir/name` becomes
/// `dir/name.clean.nc`
pub fn output_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(OUTPUT_MARKER);
    name.push(".");
    name.push(
        input
            .extension()
            .unwrap_or_else(|| OsStr::new(DEFAULT_EXTENSION)),
    );
    input.with_file_name(name)
}

/// Start reading `path` line by line. The task resolves to the number of
/// lines read; it stops early without error if the receiver goes away.
pub async fn read_lines(
    path: &Path,
) -> Result<(mpsc::Receiver<String>, JoinHandle<Result<usize>>)> {
    let file = File::open(path)
        .await
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let handle = tokio::spawn(pump(file, tx, path.display().to_string()));
    Ok((rx, handle))
}

async fn pump(file: File, tx: mpsc::Sender<String>, display: String) -> Result<usize> {
    let mut lines = BufReader::new(file).lines();
    let mut count = 0;
    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Failed to read input file: {display}"))?
    {
        count += 1;
        if tx.send(line).await.is_err() {
            debug!("reader for {display} stopped after {count} lines");
            break;
        }
    }
    Ok(count)
}

/// Write every received line to `path`, replacing any existing file.
/// Returns the number of lines written.
pub async fn write_lines(path: &Path, mut rx: mpsc::Receiver<String>, echo: bool) -> Result<usize> {
    let file = File::create(path)
        .await
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut count = 0;

    while let Some(line) = rx.recv().await {
        count += 1;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        if echo {
            println!("{count:>6}: {line}");
        }
    }

    writer
        .flush()
        .await
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    Ok(count)
}

/// Blocking view of a line channel for the synchronous pipeline. Must not
/// be driven from inside an async context.
pub struct BlockingLines {
    rx: mpsc::Receiver<String>,
}

impl BlockingLines {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }
}

impl Iterator for BlockingLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.rx.blocking_recv()
    }
}
