//! Office-to-PDF conversion through headless LibreOffice
//!
//! The engine is an external process: discovered once per call, invoked
//! synchronously with a hard timeout, and treated as opaque. LibreOffice
//! sometimes exits before its output hits the disk, so a bounded poll for
//! the expected file follows every successful run and failure to appear is
//! reported separately from a failed run.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Hard timeout for a document conversion run.
const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);

/// Spreadsheet exports get longer; scaling filters are slow to warm up.
const SPREADSHEET_TIMEOUT: Duration = Duration::from_secs(120);

/// How long to wait for the output file after a clean engine exit.
const OUTPUT_WAIT: Duration = Duration::from_secs(10);

/// Export filter that scales a sheet onto a single page.
const CALC_FIT_FILTER: &str = concat!(
    "pdf:calc_pdf_Export:{\"ScaleToPagesX\":{\"type\":\"long\",\"value\":\"1\"},",
    "\"ScaleToPagesY\":{\"type\":\"long\",\"value\":\"1\"}}"
);

/// Locate a runnable LibreOffice binary.
///
/// Checks the standard Windows install paths first, then `PATH` candidates.
/// Each candidate is probed with `--version`.
pub fn find_engine() -> Result<String> {
    #[cfg(windows)]
    {
        const INSTALL_PATHS: [&str; 2] = [
            r"C:\Program Files\LibreOffice\program\soffice.exe",
            r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
        ];
        for path in INSTALL_PATHS {
            if Path::new(path).exists() && probe_engine(path) {
                return Ok(path.to_string());
            }
        }
    }

    for candidate in ["soffice", "libreoffice"] {
        if probe_engine(candidate) {
            return Ok(candidate.to_string());
        }
    }

    Err(Error::EngineNotFound)
}

fn probe_engine(command: &str) -> bool {
    log::debug!("Probing conversion engine: {}", command);
    run_with_timeout(
        Command::new(command).arg("--version"),
        Duration::from_secs(15),
        Path::new(command),
    )
    .map(|output| output.status.success())
    .unwrap_or(false)
}

/// Convert an office document to PDF in `output_dir` and return the output
/// path.
///
/// Spreadsheets first attempt a fit-to-one-page export and fall back to the
/// plain export; other formats get a single plain run. All failures surface
/// immediately; there are no retries beyond that one fallback.
pub fn convert_office_to_pdf(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let engine = find_engine()?;
    let expected = super::pdf_output_path(input, output_dir)?;

    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let is_spreadsheet = matches!(extension.as_str(), "xlsx" | "xls" | "ods");

    if is_spreadsheet {
        match run_convert(&engine, input, output_dir, CALC_FIT_FILTER, SPREADSHEET_TIMEOUT) {
            Ok(()) if expected.exists() => return Ok(expected),
            Ok(()) => {
                log::warn!("Scaled export produced no output, retrying with plain export");
            }
            Err(Error::ConversionFailed(detail)) => {
                log::warn!("Scaled export failed ({}), retrying with plain export", detail);
            }
            Err(other) => return Err(other),
        }
        run_convert(
            &engine,
            input,
            output_dir,
            "pdf:calc_pdf_Export",
            SPREADSHEET_TIMEOUT,
        )?;
    } else {
        run_convert(&engine, input, output_dir, "pdf", CONVERT_TIMEOUT)?;
    }

    wait_for_output(&expected)
}

/// One `--headless --convert-to` run of the engine.
fn run_convert(
    engine: &str,
    input: &Path,
    output_dir: &Path,
    filter: &str,
    timeout: Duration,
) -> Result<()> {
    log::info!(
        "Running {} --headless --convert-to {} --outdir {} {}",
        engine,
        filter,
        output_dir.display(),
        input.display()
    );

    let output = run_with_timeout(
        Command::new(engine)
            .args(["--headless", "--convert-to", filter, "--outdir"])
            .arg(output_dir)
            .arg(input),
        timeout,
        input,
    )?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(Error::ConversionFailed(format!(
            "{} exited with {}: {}",
            engine, output.status, detail
        )));
    }

    Ok(())
}

/// Run a command, killing it if it outlives `timeout`.
fn run_with_timeout(command: &mut Command, timeout: Duration, input: &Path) -> Result<Output> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let started = Instant::now();
    loop {
        match child.try_wait()? {
            Some(_) => return Ok(child.wait_with_output()?),
            None if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::ConversionTimeout(input.to_path_buf()));
            }
            None => std::thread::sleep(Duration::from_millis(200)),
        }
    }
}

/// Poll for the converted file after a clean exit.
///
/// Distinguishes "the engine reported success but wrote nothing" from a
/// failed run.
fn wait_for_output(expected: &Path) -> Result<PathBuf> {
    poll_for_file(expected, OUTPUT_WAIT)
}

fn poll_for_file(expected: &Path, wait: Duration) -> Result<PathBuf> {
    let deadline = Instant::now() + wait;
    while !expected.exists() {
        if Instant::now() >= deadline {
            return Err(Error::MissingOutput(expected.to_path_buf()));
        }
        std::thread::sleep(Duration::from_millis(250));
    }
    Ok(expected.to_path_buf())
}
