//! File-backed behavior record store.
//!
//! The whole table lives in memory and is rewritten in full after every
//! mutation. At most one record exists per (student, date).

use crate::{csv, palette};
use chrono::NaiveDate;
use log::{error, info, warn};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DATA_FILE_NAME: &str = "behavior_data.csv";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
const HEADER: [&str; 3] = ["student", "date", "color"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BehaviorRecord {
    pub student: String,
    pub date: NaiveDate,
    pub color: String,
}

/// Inclusive date bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map(|s| date >= s).unwrap_or(true) && self.end.map(|e| date <= e).unwrap_or(true)
    }
}

#[derive(Debug)]
pub enum StoreError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        path: PathBuf,
        reason: String,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Validation {
        code: &'static str,
        message: String,
    },
}

impl StoreError {
    /// Stable code surfaced over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Read { .. } | StoreError::Malformed { .. } => "storage_read_failed",
            StoreError::Write { .. } => "storage_write_failed",
            StoreError::Validation { code, .. } => *code,
        }
    }

    fn validation(code: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Read { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            StoreError::Malformed { path, reason } => {
                write!(f, "malformed behavior file {}: {}", path.display(), reason)
            }
            StoreError::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            StoreError::Validation { message, .. } => f.write_str(message),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Read { source, .. } | StoreError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    records: Vec<BehaviorRecord>,
}

impl RecordStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Opens the store, falling back to an empty one when the file is missing,
    /// unreadable or malformed. An unreadable or malformed file is copied aside
    /// first so the next persist does not destroy it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load_checked(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!(
                    "event=store_load module=store status=fallback_empty path={} error={}",
                    path.display(),
                    e
                );
                if matches!(e, StoreError::Read { .. } | StoreError::Malformed { .. }) {
                    quarantine(&path);
                }
                Self::empty(path)
            }
        }
    }

    /// Strict variant of [`RecordStore::load`]. A missing file is still an
    /// empty store.
    pub fn load_checked(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            info!(
                "event=store_load module=store status=new path={}",
                path.display()
            );
            return Ok(Self::empty(path));
        }
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let (records, skipped) = parse_table(&text).map_err(|reason| StoreError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;
        if skipped > 0 {
            warn!(
                "event=store_load module=store status=rows_skipped path={} skipped={}",
                path.display(),
                skipped
            );
        }
        info!(
            "event=store_load module=store status=ok path={} records={}",
            path.display(),
            records.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[BehaviorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts or replaces the color for (student, date), then persists.
    ///
    /// Validation failures leave the store untouched. A write failure keeps the
    /// in-memory change.
    pub fn upsert(&mut self, student: &str, color: &str, date: NaiveDate) -> Result<(), StoreError> {
        let student = student.trim();
        if student.is_empty() {
            return Err(StoreError::validation(
                "invalid_student",
                "student name must not be empty",
            ));
        }
        let Some(entry) = palette::lookup(color) else {
            return Err(StoreError::validation(
                "invalid_color",
                format!("unknown color: {}", color.trim()),
            ));
        };

        match self
            .records
            .iter_mut()
            .find(|r| r.student == student && r.date == date)
        {
            Some(existing) => existing.color = entry.name.to_string(),
            None => self.records.push(BehaviorRecord {
                student: student.to_string(),
                date,
                color: entry.name.to_string(),
            }),
        }
        self.persist()
    }

    /// All records for one student, ascending by date.
    pub fn query(&self, student: &str) -> Vec<BehaviorRecord> {
        let student = student.trim();
        let mut out: Vec<BehaviorRecord> = self
            .records
            .iter()
            .filter(|r| r.student == student)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.date);
        out
    }

    /// Records inside `range` (all when `None`), ordered by date then student.
    pub fn query_all(&self, range: Option<DateRange>) -> Vec<BehaviorRecord> {
        let range = range.unwrap_or_default();
        let mut out: Vec<BehaviorRecord> = self
            .records
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.student.cmp(&b.student)));
        out
    }

    /// Students with at least one record, in first-seen order.
    pub fn students(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for r in &self.records {
            if !seen.iter().any(|s| s == &r.student) {
                seen.push(r.student.clone());
            }
        }
        seen
    }

    pub fn delete_student(&mut self, student: &str) -> Result<(), StoreError> {
        let student = student.trim();
        let before = self.records.len();
        self.records.retain(|r| r.student != student);
        info!(
            "event=store_delete_student module=store removed={}",
            before - self.records.len()
        );
        self.persist()
    }

    pub fn delete_all(&mut self) -> Result<(), StoreError> {
        let removed = self.records.len();
        self.records.clear();
        info!("event=store_delete_all module=store removed={}", removed);
        self.persist()
    }

    /// Rewrites the backing file through a temp file and rename.
    pub fn persist(&self) -> Result<(), StoreError> {
        write_atomic(&self.path, &render_table(&self.records)).map_err(|source| {
            error!(
                "event=store_persist module=store status=error path={} error={}",
                self.path.display(),
                source
            );
            StoreError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Writes the current table to `out_path`. Returns `None` when there is
    /// nothing to export.
    pub fn export_to(&self, out_path: &Path) -> Result<Option<PathBuf>, StoreError> {
        if self.records.is_empty() {
            return Ok(None);
        }
        write_atomic(out_path, &render_table(&self.records)).map_err(|source| {
            error!(
                "event=store_export module=store status=error path={} error={}",
                out_path.display(),
                source
            );
            StoreError::Write {
                path: out_path.to_path_buf(),
                source,
            }
        })?;
        info!(
            "event=store_export module=store status=ok path={} records={}",
            out_path.display(),
            self.records.len()
        );
        Ok(Some(out_path.to_path_buf()))
    }
}

pub fn default_export_file_name(now: chrono::NaiveDateTime) -> String {
    format!("behavior_export_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    // pandas may write "YYYY-MM-DD 00:00:00" once a column was converted.
    let day = match t.char_indices().nth(10) {
        Some((idx, ' ')) | Some((idx, 'T')) => &t[..idx],
        _ => t,
    };
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

fn parse_table(text: &str) -> Result<(Vec<BehaviorRecord>, usize), String> {
    let rows = csv::parse_records(text);
    let Some((header, body)) = rows.split_first() else {
        return Ok((Vec::new(), 0));
    };
    let idx = |name: &str| {
        csv::column_index(header, name).ok_or_else(|| format!("missing column `{}`", name))
    };
    let (student_idx, date_idx, color_idx) = (idx("student")?, idx("date")?, idx("color")?);

    let mut records: Vec<BehaviorRecord> = Vec::new();
    let mut skipped = 0usize;
    for row in body {
        let field = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");
        let student = field(student_idx);
        let Some(date) = parse_date(field(date_idx)) else {
            skipped += 1;
            continue;
        };
        if student.is_empty() {
            skipped += 1;
            continue;
        }
        let raw_color = field(color_idx);
        let color = palette::lookup(raw_color)
            .map(|c| c.name.to_string())
            .unwrap_or_else(|| raw_color.to_string());
        // Older writers could leave duplicate keys; the last row wins.
        match records
            .iter_mut()
            .find(|r| r.student == student && r.date == date)
        {
            Some(existing) => existing.color = color,
            None => records.push(BehaviorRecord {
                student: student.to_string(),
                date,
                color,
            }),
        }
    }
    Ok((records, skipped))
}

fn render_table(records: &[BehaviorRecord]) -> String {
    let mut out = String::new();
    csv::write_record(&mut out, &HEADER);
    for r in records {
        let date = r.date.format(DATE_FORMAT).to_string();
        csv::write_record(&mut out, &[&r.student, &date, &r.color]);
    }
    out
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| DATA_FILE_NAME.to_string());
    let tmp = path.with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()));
    if let Err(e) = std::fs::write(&tmp, contents) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn quarantine(path: &Path) {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
        return;
    };
    let mut target = path.with_file_name(format!("{}.corrupt-{}", name, millis));
    let mut n = 1u32;
    while target.exists() {
        target = path.with_file_name(format!("{}.corrupt-{}-{}", name, millis, n));
        n += 1;
    }
    match std::fs::copy(path, &target) {
        Ok(_) => warn!(
            "event=store_quarantine module=store status=ok copy={}",
            target.display()
        ),
        Err(e) => error!(
            "event=store_quarantine module=store status=error path={} error={}",
            path.display(),
            e
        ),
    }
}
