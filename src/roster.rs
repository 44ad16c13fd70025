use crate::{csv, store};
use anyhow::{anyhow, Context};
use std::path::Path;

pub const ROSTER_FILE_NAME: &str = "last_uploaded_roster.csv";

/// Student names from the first column of a roster table. The first row is a
/// header. Blank cells are dropped and repeats keep their first position.
pub fn parse_roster_text(text: &str) -> Vec<String> {
    let rows = csv::parse_records(text);
    let mut names: Vec<String> = Vec::new();
    for row in rows.iter().skip(1) {
        let Some(first) = row.first().map(|s| s.trim()) else {
            continue;
        };
        if first.is_empty() || names.iter().any(|n| n == first) {
            continue;
        }
        names.push(first.to_string());
    }
    names
}

pub fn import_roster_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ext != "csv" && ext != "txt" {
        return Err(anyhow!("unsupported roster file type: .{}", ext));
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.to_string_lossy()))?;
    let names = parse_roster_text(&text);
    if names.is_empty() {
        return Err(anyhow!(
            "no student names found in the first column of {}",
            path.to_string_lossy()
        ));
    }
    Ok(names)
}

pub fn save_roster(path: &Path, names: &[String]) -> anyhow::Result<()> {
    let mut out = String::new();
    csv::write_record(&mut out, &["name"]);
    for n in names {
        csv::write_record(&mut out, &[n.as_str()]);
    }
    store::write_atomic(path, &out)
        .with_context(|| format!("failed to save roster {}", path.to_string_lossy()))
}

/// Reads the roster saved by [`save_roster`]; `None` when none was saved yet.
pub fn load_saved_roster(path: &Path) -> anyhow::Result<Option<Vec<String>>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.to_string_lossy()))?;
    Ok(Some(parse_roster_text(&text)))
}
