use crate::calc::DEFAULT_RECENT_LIMIT;
use crate::roster::ROSTER_FILE_NAME;
use crate::store::DATA_FILE_NAME;
use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "behaviord.json";

/// Optional per-workspace settings. Every field has a default so a missing
/// file and `{}` behave the same.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub data_file: String,
    pub roster_file: String,
    /// When set, clearing data requires this password.
    pub clear_password: Option<String>,
    /// IANA zone name used for "today", e.g. `America/Chicago`.
    pub time_zone: Option<String>,
    /// Fixed offset used when no zone is named. Local time when both are unset.
    pub utc_offset_minutes: Option<i32>,
    pub recent_limit: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            data_file: DATA_FILE_NAME.to_string(),
            roster_file: ROSTER_FILE_NAME.to_string(),
            clear_password: None,
            time_zone: None,
            utc_offset_minutes: None,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl WorkspaceConfig {
    pub fn load(workspace: &Path) -> anyhow::Result<Self> {
        let path = workspace.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.to_string_lossy()))?;
        if let Some(name) = cfg.time_zone.as_deref() {
            Tz::from_str(name).map_err(|e| {
                anyhow::anyhow!("invalid timeZone `{}` in {}: {}", name, path.display(), e)
            })?;
        }
        Ok(cfg)
    }

    pub fn data_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.data_file)
    }

    pub fn roster_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.roster_file)
    }

    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now_at(Utc::now())
    }

    /// Calendar date of `instant` in the workspace zone. `timeZone` wins over
    /// `utcOffsetMinutes`; the host zone is used when neither is set.
    pub fn today_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.now_at(instant).date()
    }

    pub fn now_at(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        if let Some(tz) = self.time_zone.as_deref().and_then(|n| Tz::from_str(n).ok()) {
            return instant.with_timezone(&tz).naive_local();
        }
        match self
            .utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
        {
            Some(offset) => instant.with_timezone(&offset).naive_local(),
            None => instant.with_timezone(&Local).naive_local(),
        }
    }
}
