//! File and stdout helpers shared by the subcommands.
//!
//! Every writer takes an optional path; `None` means stdout.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use serde::{Serialize, de::DeserializeOwned};

pub fn create_file(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn describe(path: Option<&Path>) -> String {
    path.map_or_else(|| "stdout".to_owned(), |p| p.display().to_string())
}

/// Runs `write` against the file at `path` (or stdout) and flushes it.
pub fn write_to<F>(path: Option<&Path>, write: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let result = match path {
        Some(path) => {
            let mut writer = create_file(path)?;
            write(&mut writer).and_then(|()| writer.flush())
        }
        None => {
            let mut writer = io::stdout().lock();
            write(&mut writer).and_then(|()| writer.flush())
        }
    };
    result.with_context(|| format!("Failed to write to {}", describe(path)))
}

pub fn write_text(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    write_to(path, |w| w.write_all(text.as_bytes()))
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json<T>(path: Option<&Path>, value: &T) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    write_to(path, |w| {
        serde_json::to_writer_pretty(&mut *w, value)?;
        writeln!(w)
    })
}

pub fn read_json_file<T>(file_kind: &str, path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} file: {}", path.display()))
}
