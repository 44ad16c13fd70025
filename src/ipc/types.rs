use std::path::PathBuf;

use crate::config::WorkspaceConfig;
use crate::store::RecordStore;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// An opened workspace directory: settings, the record store and the last
/// imported roster.
pub struct Workspace {
    pub path: PathBuf,
    pub config: WorkspaceConfig,
    pub store: RecordStore,
    pub roster: Vec<String>,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<Workspace>,
}
