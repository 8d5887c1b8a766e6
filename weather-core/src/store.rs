//! Append-only CSV history of current-conditions lookups.
//!
//! The file is created with a header on first append. Mutations are
//! serialized inside this process; writers in other processes are not
//! coordinated with.

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::{HISTORY_COLUMNS, HistoryRow, WeatherRecord},
};

#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// Optional filters for history queries. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryFilter {
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first if the file is missing or empty.
    pub fn append(&self, record: &WeatherRecord) -> Result<()> {
        let _guard = self.lock()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let is_new = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer.write_record(HISTORY_COLUMNS)?;
        }
        writer.serialize(HistoryRow::from(record))?;
        writer.flush()?;

        tracing::debug!(city = %record.city, path = %self.path.display(), "appended history row");
        Ok(())
    }

    /// Every stored row in append order. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<HistoryRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        reader
            .deserialize::<HistoryRow>()
            .map(|row| row.map_err(|e| WeatherError::MalformedRow(e.to_string())))
            .collect()
    }

    /// Drop every row, keeping only the header. No-op if the file is absent.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock()?;

        if !self.path.exists() {
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(HISTORY_COLUMNS)?;
        writer.flush()?;

        tracing::info!(path = %self.path.display(), "history cleared");
        Ok(())
    }

    /// Raw file contents for export, if the file exists.
    pub fn raw(&self) -> Result<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&self.path)?))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| WeatherError::Persistence("history write lock poisoned".to_string()))
    }
}

/// Apply `filter` to `rows`, keeping their order.
///
/// City matches are case-insensitive substrings; date bounds are inclusive
/// and compared as plain strings.
pub fn filter(rows: Vec<HistoryRow>, filter: &HistoryFilter) -> Vec<HistoryRow> {
    let city = non_blank(&filter.city).map(str::to_lowercase);
    let start = non_blank(&filter.start_date);
    let end = non_blank(&filter.end_date);

    rows.into_iter()
        .filter(|row| {
            city.as_deref()
                .is_none_or(|c| row.city.to_lowercase().contains(c))
        })
        .filter(|row| start.is_none_or(|s| row.date.as_str() >= s))
        .filter(|row| end.is_none_or(|e| row.date.as_str() <= e))
        .collect()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
