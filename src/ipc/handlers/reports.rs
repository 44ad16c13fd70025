use crate::calc;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_date_range, workspace};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn reports_class_summary(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace(state)?;
    Ok(json!({ "summary": calc::class_summary(ws.store.records()) }))
}

fn reports_bulk(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace(state)?;
    let range = get_date_range(params)?;
    let records = ws.store.query_all(range);
    let rows = calc::bulk_report(&records, &ws.roster);
    Ok(json!({
        "start": range.and_then(|r| r.start),
        "end": range.and_then(|r| r.end),
        "rows": rows,
        "classPoints": calc::summarize(&records),
    }))
}

fn respond(req: &Request, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "reports.classSummary" => reports_class_summary(state),
        "reports.bulk" => reports_bulk(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
