//! File and stream helpers for the command-line layer.
//!
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8. A
//!   leading byte order mark selects its own encoding and is removed.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!("Failed to decode text with encoding {}", used.name()))
    } else {
        Ok(text.into_owned())
    }
}

pub fn read_input_bytes(path: &Path) -> Result<Vec<u8>> {
    if is_dash(path) {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("Reading from stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Opening input file {path:?}"))
    }
}

pub fn read_input_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = read_input_bytes(path)?;
    decode_bytes(&bytes, encoding).with_context(|| format!("Decoding {path:?}"))
}

/// Writes to `path`, or to stdout for `-`.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if is_dash(path) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        return Ok(());
    }
    fs::write(path, bytes).with_context(|| format!("Creating output file {path:?}"))
}
