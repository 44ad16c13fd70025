use crate::config::WorkspaceConfig;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::palette::PALETTE;
use crate::roster;
use crate::store::RecordStore;
use log::{info, warn};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|w| w.path.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    if let Err(e) = std::fs::create_dir_all(&path) {
        return err(
            &req.id,
            "workspace_open_failed",
            e.to_string(),
            Some(json!({ "path": path.to_string_lossy() })),
        );
    }
    let config = match WorkspaceConfig::load(&path) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_config", format!("{e:#}"), None),
    };
    let store = RecordStore::load(config.data_path(&path));
    // A broken roster file must not prevent the workspace from opening.
    let students = match roster::load_saved_roster(&config.roster_path(&path)) {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => {
            warn!("event=roster_load module=ipc status=error error={e:#}");
            Vec::new()
        }
    };
    info!(
        "event=workspace_select module=ipc path={} records={} roster={}",
        path.display(),
        store.len(),
        students.len()
    );

    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "dataFile": store.path().to_string_lossy(),
        "recordCount": store.len(),
        "rosterCount": students.len(),
    });
    state.workspace = Some(Workspace {
        path,
        config,
        store,
        roster: students,
    });
    ok(&req.id, result)
}

fn handle_palette_list(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "colors": PALETTE }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "palette.list" => Some(handle_palette_list(req)),
        _ => None,
    }
}
