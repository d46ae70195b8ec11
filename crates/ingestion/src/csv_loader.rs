//! Local CSV loading.

use async_trait::async_trait;
use cot_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::source::{DataSource, SourceRecord};

/// Loads TFF rows from CSV files.
///
/// Each path is a file, a directory or a glob pattern. A directory
/// contributes its `*.csv` files in name order; a pattern contributes every
/// matching file in name order.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    paths: Vec<PathBuf>,
}

impl CsvLoader {
    pub fn new<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand directories and glob patterns into files.
    pub fn resolve_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in &self.paths {
            if path.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && is_csv(p))
                    .collect();
                entries.sort();
                files.extend(entries);
            } else if path.is_file() {
                files.push(path.clone());
            } else if let Some(pattern) = path.to_str().filter(|p| is_glob(p)) {
                let matched = expand_glob(pattern)?;
                if matched.is_empty() {
                    return Err(Error::data(format!("no files match pattern: {pattern}")));
                }
                files.extend(matched);
            } else {
                return Err(Error::data(format!("no such file or directory: {}", path.display())));
            }
        }
        Ok(files)
    }

    /// Read every record from every resolved file.
    pub fn load_records(&self) -> Result<Vec<SourceRecord>> {
        let mut records = Vec::new();
        for file in self.resolve_files()? {
            let before = records.len();
            read_file(&file, &mut records)?;
            debug!(file = %file.display(), rows = records.len() - before, "read CSV file");
        }
        info!(files = self.paths.len(), rows = records.len(), "loaded CSV records");
        Ok(records)
    }
}

#[async_trait]
impl DataSource for CsvLoader {
    async fn load(&self) -> Result<Vec<SourceRecord>> {
        self.load_records()
    }

    fn describe(&self) -> String {
        format!("csv ({} path(s))", self.paths.len())
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn is_glob(path: &str) -> bool {
    path.contains(|c| matches!(c, '*' | '?' | '['))
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|e| Error::data(format!("invalid pattern {pattern}: {e}")))?;
    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| Error::data(format!("failed to read {pattern}: {e}")))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_file(path: &Path, out: &mut Vec<SourceRecord>) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    for result in reader.records() {
        let record = result?;
        out.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(())
}
