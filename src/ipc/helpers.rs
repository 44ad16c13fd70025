use crate::ipc::error::HandlerErr;
use crate::ipc::types::{AppState, Workspace};
use crate::store::{self, DateRange};
use chrono::NaiveDate;
use serde_json::Value;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_optional_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let Some(s) = v.as_str() else {
        return Err(HandlerErr::bad_params(format!("{} must be a string", key)));
    };
    if s.trim().is_empty() {
        return Ok(None);
    }
    store::parse_date(s)
        .map(Some)
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

/// `start`/`end` params as an inclusive range; `None` when both are absent.
pub fn get_date_range(params: &Value) -> Result<Option<DateRange>, HandlerErr> {
    let start = get_optional_date(params, "start")?;
    let end = get_optional_date(params, "end")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(HandlerErr::bad_params("start must not be after end"));
        }
    }
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    Ok(Some(DateRange { start, end }))
}

pub fn workspace(state: &AppState) -> Result<&Workspace, HandlerErr> {
    state
        .workspace
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn workspace_mut(state: &mut AppState) -> Result<&mut Workspace, HandlerErr> {
    state
        .workspace
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

/// Gate for destructive methods when the workspace sets a clear password.
pub fn check_clear_password(ws: &Workspace, params: &Value) -> Result<(), HandlerErr> {
    let Some(expected) = ws.config.clear_password.as_deref() else {
        return Ok(());
    };
    let given = params.get("password").and_then(|v| v.as_str()).unwrap_or("");
    if given != expected {
        return Err(HandlerErr::new("bad_password", "incorrect password"));
    }
    Ok(())
}
