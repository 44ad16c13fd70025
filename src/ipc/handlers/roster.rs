use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, workspace, workspace_mut};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use log::info;
use serde_json::json;
use std::path::PathBuf;

fn roster_import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let students = match (get_optional_str(params, "path"), params.get("text").and_then(|v| v.as_str())) {
        (Some(path), _) => roster::import_roster_file(&PathBuf::from(path))
            .map_err(|e| HandlerErr::new("roster_failed", format!("{e:#}")))?,
        (None, Some(text)) => roster::parse_roster_text(text),
        (None, None) => return Err(HandlerErr::bad_params("missing path or text")),
    };
    if students.is_empty() {
        return Err(HandlerErr::new(
            "roster_failed",
            "no student names found in the first column",
        ));
    }
    roster::save_roster(&ws.config.roster_path(&ws.path), &students)
        .map_err(|e| HandlerErr::new("roster_failed", format!("{e:#}")))?;
    info!("event=roster_import module=ipc count={}", students.len());
    ws.roster = students;
    Ok(json!({ "students": ws.roster, "count": ws.roster.len() }))
}

fn handle_roster_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    match roster_import(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_roster_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match workspace(state) {
        Ok(ws) => ok(
            &req.id,
            json!({
                "students": ws.roster,
                "studentsWithData": ws.store.students(),
            }),
        ),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.import" => Some(handle_roster_import(state, req)),
        "roster.get" => Some(handle_roster_get(state, req)),
        _ => None,
    }
}
