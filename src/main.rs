mod calc;
mod config;
mod csv;
mod ipc;
mod logging;
mod palette;
mod roster;
mod store;

use std::io::{self, BufRead, Write};

fn main() {
    let _logger = match logging::init_logging(&logging::LogSettings::from_env()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("behaviord: logging disabled: {e:#}");
            None
        }
    };

    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                log::error!("event=stdin_read module=main status=error error={}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("event=bad_json module=main error={}", e);
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    log::info!("event=app_stop module=main status=ok");
}
