use crate::palette::{self, PALETTE};
use crate::store::BehaviorRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Half-up 1-decimal rounding used for every displayed percentage:
/// `Int(10*x + 0.5) / 10`
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round_off_1_decimal(100.0 * part / whole)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSummary {
    pub total_good_points: i64,
    /// Magnitude of the negative points.
    pub total_bad_points: i64,
    pub good_percentage: f64,
    pub days_recorded: usize,
}

pub fn summarize(records: &[BehaviorRecord]) -> PointSummary {
    let mut good: i64 = 0;
    let mut bad: i64 = 0;
    let mut days: BTreeSet<NaiveDate> = BTreeSet::new();
    for r in records {
        let p = palette::points_for(&r.color);
        if p > 0 {
            good += p;
        } else if p < 0 {
            bad += -p;
        }
        days.insert(r.date);
    }
    PointSummary {
        total_good_points: good,
        total_bad_points: bad,
        good_percentage: percent(good as f64, (good + bad) as f64),
        days_recorded: days.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorShare {
    pub color: String,
    pub hex: Option<&'static str>,
    pub count: usize,
    pub percentage: f64,
}

fn color_counts(records: &[BehaviorRecord]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.color.clone()).or_insert(0) += 1;
    }
    counts
}

/// Share of entries per color. Every palette color is listed in display order;
/// stored colors outside the palette follow by name.
pub fn color_distribution(records: &[BehaviorRecord]) -> Vec<ColorShare> {
    let counts = color_counts(records);
    let total = records.len() as f64;
    let mut out: Vec<ColorShare> = PALETTE
        .iter()
        .map(|c| {
            let count = counts.get(c.name).copied().unwrap_or(0);
            ColorShare {
                color: c.name.to_string(),
                hex: Some(c.hex),
                count,
                percentage: percent(count as f64, total),
            }
        })
        .collect();
    for (color, count) in counts.iter() {
        if palette::display_index(color).is_none() {
            out.push(ColorShare {
                color: color.clone(),
                hex: None,
                count: *count,
                percentage: percent(*count as f64, total),
            });
        }
    }
    out
}

/// The newest `limit` records, newest first.
pub fn recent_timeline(records: &[BehaviorRecord], limit: usize) -> Vec<BehaviorRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.student.cmp(&b.student)));
    out.truncate(limit);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub total_entries: usize,
    pub color_counts: BTreeMap<String, usize>,
    pub first_entry_date: NaiveDate,
    pub most_recent_date: NaiveDate,
    pub points: PointSummary,
}

pub fn student_summary(records: &[BehaviorRecord]) -> Option<StudentSummary> {
    let first = records.iter().map(|r| r.date).min()?;
    let last = records.iter().map(|r| r.date).max()?;
    Some(StudentSummary {
        total_entries: records.len(),
        color_counts: color_counts(records),
        first_entry_date: first,
        most_recent_date: last,
        points: summarize(records),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub total_students: usize,
    pub total_entries: usize,
    pub color_counts: BTreeMap<String, usize>,
    pub students_with_data: Vec<String>,
    pub points: PointSummary,
}

pub fn class_summary(records: &[BehaviorRecord]) -> Option<ClassSummary> {
    if records.is_empty() {
        return None;
    }
    let students = students_first_seen(records);
    Some(ClassSummary {
        total_students: students.len(),
        total_entries: records.len(),
        color_counts: color_counts(records),
        students_with_data: students,
        points: summarize(records),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReportRow {
    pub student: String,
    pub on_roster: bool,
    pub total_entries: usize,
    pub points: PointSummary,
    pub distribution: Vec<ColorShare>,
}

/// One row per roster student in roster order, then every other student that
/// has records, in first-seen order.
pub fn bulk_report(records: &[BehaviorRecord], roster: &[String]) -> Vec<StudentReportRow> {
    let mut order: Vec<(String, bool)> = roster.iter().map(|s| (s.clone(), true)).collect();
    for s in students_first_seen(records) {
        if !roster.contains(&s) {
            order.push((s, false));
        }
    }
    order
        .into_iter()
        .map(|(student, on_roster)| {
            let mine: Vec<BehaviorRecord> = records
                .iter()
                .filter(|r| r.student == student)
                .cloned()
                .collect();
            StudentReportRow {
                total_entries: mine.len(),
                points: summarize(&mine),
                distribution: color_distribution(&mine),
                student,
                on_roster,
            }
        })
        .collect()
}

fn students_first_seen(records: &[BehaviorRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in records {
        if !out.contains(&r.student) {
            out.push(r.student.clone());
        }
    }
    out
}
