use anyhow::Context;
use chrono::{DateTime, Utc};
use engine::{ComparisonOutcome, TokenReport};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// The document written by `compare --export`; loadable again with `compare --input`.
#[derive(Debug, Serialize)]
pub struct ComparisonExport<'a> {
    pub generated_at: DateTime<Utc>,
    pub reports: &'a [TokenReport],
    #[serde(flatten)]
    pub outcome: &'a ComparisonOutcome,
}

/// Writes `value` as pretty JSON so that readers never observe a partial file.
///
/// The document goes to a temporary file in the target directory first and is then
/// renamed over `path`. Missing parent directories are created.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut file, value).context("Failed to serialize export")?;
    file.write_all(b"\n")?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), "Exported JSON");
    Ok(())
}
