//! Subcommand implementations
//!
//! Each command writes its report to `out` and returns whether it
//! succeeded; I/O and configuration problems surface as errors.

use anyhow::{bail, Context};
use quire_sandbox::{inspect, Bindings};
use quire_session::{AnalysisSession, CannedGenerator, Notice, QuireConfig, ReviewSession};
use quire_table::{JsonTableCodec, Table, TableLoader};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "quire=info";

/// Install the stderr subscriber
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`]; the `quire` directive covers
/// every `quire_*` crate target.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Configuration from `path`, or defaults
///
/// # Errors
/// Returns the load failure with the path attached
pub fn load_config(path: Option<&Path>) -> anyhow::Result<QuireConfig> {
    match path {
        Some(path) => QuireConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(QuireConfig::default()),
    }
}

fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Parse a sheet document from disk
///
/// # Errors
/// Returns read or decode failures with the path attached
pub fn read_sheet(path: &Path) -> anyhow::Result<Table> {
    let bytes = read_bytes(path)?;
    JsonTableCodec::new()
        .parse(&bytes)
        .with_context(|| format!("decoding sheet {}", path.display()))
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Interactive review of one sheet
///
/// # Errors
/// Returns I/O failures; a rejected sheet is reported and returns `Ok(false)`
pub fn review<R: BufRead, W: Write>(
    config: &QuireConfig,
    sheet: &Path,
    page_size: Option<usize>,
    input: R,
    out: &mut W,
) -> anyhow::Result<bool> {
    let mut review_config = config.review.clone();
    if let Some(size) = page_size {
        if size == 0 {
            bail!("--page-size must be at least 1");
        }
        review_config.page_size = size;
    }
    let mut session = ReviewSession::new(review_config);
    let codec = JsonTableCodec::new();
    let notice = session.upload(&codec, &read_bytes(sheet)?);
    writeln!(out, "{notice}")?;
    if notice.is_failure() {
        return Ok(false);
    }
    crate::repl::run_review(&mut session, &codec, input, out)?;
    Ok(true)
}

/// Per-file edit given as `FILE=VALUE`
fn split_edit(spec: &str) -> anyhow::Result<(&str, &str)> {
    match spec.split_once('=') {
        Some((file, value)) if !file.is_empty() && !value.is_empty() => Ok((file, value)),
        _ => bail!("expected FILE=VALUE, got '{spec}'"),
    }
}

fn merged_session(
    config: &QuireConfig,
    sheets: &[PathBuf],
    drop_columns: &[String],
    drop_rows: &[String],
    generator: Arc<CannedGenerator>,
    out: &mut impl Write,
) -> anyhow::Result<Option<AnalysisSession>> {
    let mut session =
        AnalysisSession::new(config.analysis.clone(), config.sandbox.sandbox(), generator);
    let codec = JsonTableCodec::new();
    for sheet in sheets {
        let notice = session.upload(&upload_name(sheet), &codec, &read_bytes(sheet)?);
        if !report(out, &notice)? {
            return Ok(None);
        }
    }
    for spec in drop_columns {
        let (file, column) = split_edit(spec)?;
        if !report(out, &session.drop_columns(file, &[column.to_string()]))? {
            return Ok(None);
        }
    }
    for spec in drop_rows {
        let (file, row) = split_edit(spec)?;
        let row: usize = row
            .parse()
            .with_context(|| format!("'{row}' is not a row index"))?;
        if !report(out, &session.drop_rows(file, &[row]))? {
            return Ok(None);
        }
    }
    if !report(out, &session.merge())? {
        return Ok(None);
    }
    Ok(Some(session))
}

fn report(out: &mut impl Write, notice: &Notice) -> std::io::Result<bool> {
    writeln!(out, "{notice}")?;
    Ok(!notice.is_failure())
}

/// Edit, merge and write the merged sheet into `output`
///
/// # Errors
/// Returns I/O failures and malformed edit specs
pub fn merge<W: Write>(
    config: &QuireConfig,
    sheets: &[PathBuf],
    drop_columns: &[String],
    drop_rows: &[String],
    output: &Path,
    out: &mut W,
) -> anyhow::Result<bool> {
    let generator = Arc::new(CannedGenerator::new());
    let Some(session) = merged_session(config, sheets, drop_columns, drop_rows, generator, out)?
    else {
        return Ok(false);
    };
    match session.download(&JsonTableCodec::new()) {
        Ok(download) => {
            let path = output.join(&download.file_name);
            std::fs::write(&path, &download.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            writeln!(out, "{}", Notice::success(format!("Saved {}", path.display())))?;
            Ok(true)
        }
        Err(notice) => report(out, &notice).map_err(Into::into),
    }
}

/// Report validation findings for a program file
///
/// # Errors
/// Returns read failures
pub fn validate<W: Write>(code: &Path, out: &mut W) -> anyhow::Result<bool> {
    let source = std::fs::read_to_string(code)
        .with_context(|| format!("reading {}", code.display()))?;
    let findings = inspect(&source);
    if findings.is_empty() {
        writeln!(out, "{}", Notice::success("no findings"))?;
        return Ok(true);
    }
    for finding in &findings {
        writeln!(out, "{finding}")?;
    }
    writeln!(out, "{}", Notice::error(format!("{} finding(s)", findings.len())))?;
    Ok(false)
}

/// Run a program file against a sheet and print the execution as JSON
///
/// # Errors
/// Returns read or encode failures
pub fn run<W: Write>(
    config: &QuireConfig,
    code: &Path,
    table: &Path,
    out: &mut W,
) -> anyhow::Result<bool> {
    let source = std::fs::read_to_string(code)
        .with_context(|| format!("reading {}", code.display()))?;
    let table = read_sheet(table)?;
    match config.sandbox.sandbox().execute(&source, &Bindings::standard(table)) {
        Ok(execution) => {
            serde_json::to_writer_pretty(&mut *out, &execution).context("encoding execution")?;
            writeln!(out)?;
            Ok(true)
        }
        Err(err) => {
            writeln!(out, "{}", Notice::error(err.to_string()))?;
            Ok(false)
        }
    }
}

/// Merge sheets and replay a saved model reply as a visualization request
///
/// # Errors
/// Returns read or encode failures
pub async fn visualize<W: Write>(
    config: &QuireConfig,
    sheets: &[PathBuf],
    reply: &Path,
    request: &str,
    out: &mut W,
) -> anyhow::Result<bool> {
    let reply = std::fs::read_to_string(reply)
        .with_context(|| format!("reading {}", reply.display()))?;
    let generator = Arc::new(CannedGenerator::new().with_reply(reply));
    let Some(mut session) = merged_session(config, sheets, &[], &[], generator, out)? else {
        return Ok(false);
    };
    let notice = session.visualize(request).await;
    writeln!(out, "{notice}")?;
    if let Some(viz) = session.visualization() {
        serde_json::to_writer_pretty(&mut *out, viz).context("encoding visualization")?;
        writeln!(out)?;
    }
    Ok(!notice.is_failure())
}
