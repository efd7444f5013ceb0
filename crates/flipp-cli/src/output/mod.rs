//! Command results on stdout. Logs and progress stay on stderr, so stdout
//! is always a single parseable document.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;

/// Serialize `value` and write it, newline-terminated, to `out`.
pub fn write_to<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut *out, value)?,
        OutputFormat::Raw => serde_json::to_writer(&mut *out, value)?,
    }
    writeln!(out)?;
    Ok(())
}

/// Print a command result on stdout.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_to(&mut lock, value, format)?;
    lock.flush()?;
    Ok(())
}
