use crate::calc;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{
    check_clear_password, get_date_range, get_optional_date, get_optional_str, get_required_str,
    workspace, workspace_mut,
};
use crate::ipc::types::{AppState, Request};
use crate::store;
use log::info;
use serde_json::json;
use std::path::PathBuf;

fn behavior_record(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let student = get_required_str(params, "student")
        .map_err(|_| HandlerErr::new("invalid_student", "student name must not be empty"))?;
    let color = get_required_str(params, "color")?;
    let date = get_optional_date(params, "date")?.unwrap_or_else(|| ws.config.today());

    ws.store.upsert(&student, &color, date)?;
    let record = ws
        .store
        .query(&student)
        .into_iter()
        .find(|r| r.date == date);
    Ok(json!({ "record": record }))
}

fn behavior_student(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace(state)?;
    let student = get_required_str(params, "student")?;
    let limit = params
        .get("recentLimit")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(ws.config.recent_limit);
    let records = ws.store.query(&student);
    Ok(json!({
        "student": student,
        "records": records,
        "summary": calc::summarize(&records),
        "distribution": calc::color_distribution(&records),
        "recent": calc::recent_timeline(&records, limit),
        "studentSummary": calc::student_summary(&records),
    }))
}

fn behavior_all(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace(state)?;
    let range = get_date_range(params)?;
    Ok(json!({ "records": ws.store.query_all(range) }))
}

fn behavior_clear_student(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let student = get_required_str(params, "student")?;
    check_clear_password(ws, params)?;
    ws.store.delete_student(&student)?;
    info!("event=behavior_clear_student module=ipc status=ok");
    Ok(json!({ "cleared": true, "student": student }))
}

fn behavior_clear_all(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    check_clear_password(ws, params)?;
    ws.store.delete_all()?;
    info!("event=behavior_clear_all module=ipc status=ok");
    Ok(json!({ "cleared": true }))
}

fn behavior_export(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace(state)?;
    let out_path = get_optional_str(params, "outPath")
        .map(PathBuf::from)
        .unwrap_or_else(|| ws.path.join(store::default_export_file_name(ws.config.now())));
    let written = ws.store.export_to(&out_path).map_err(|e| HandlerErr {
        code: "export_failed",
        ..HandlerErr::from(e)
    })?;
    Ok(json!({ "path": written.map(|p| p.to_string_lossy().to_string()) }))
}

fn respond(req: &Request, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "behavior.record" => behavior_record(state, &req.params),
        "behavior.student" => behavior_student(state, &req.params),
        "behavior.all" => behavior_all(state, &req.params),
        "behavior.clearStudent" => behavior_clear_student(state, &req.params),
        "behavior.clearAll" => behavior_clear_all(state, &req.params),
        "behavior.export" => behavior_export(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
