use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use log::debug;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    debug!("event=ipc_request module=ipc method={}", req.method);
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::roster::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::behavior::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::reports::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
