use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_behaviord");
    let mut child = Command::new(exe)
        .env("BEHAVIORD_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn behaviord");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("behaviord-router-smoke");
    let export_out = workspace.join("smoke-export.csv");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert!(health["result"]["workspacePath"].is_null());

    let before = request(&mut stdin, &mut reader, "2", "behavior.all", json!({}));
    assert_eq!(before["error"]["code"], json!("no_workspace"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let palette = request(&mut stdin, &mut reader, "4", "palette.list", json!({}));
    assert_eq!(
        palette["result"]["colors"].as_array().map(|a| a.len()),
        Some(7)
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "roster.import",
        json!({ "text": "name\nSmoke Student\n" }),
    );
    let _ = request(&mut stdin, &mut reader, "6", "roster.get", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "behavior.record",
        json!({ "student": "Smoke Student", "color": "Blue", "date": "2024-01-05" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "behavior.student",
        json!({ "student": "Smoke Student" }),
    );
    let _ = request(&mut stdin, &mut reader, "9", "behavior.all", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "behavior.export",
        json!({ "outPath": export_out.to_string_lossy() }),
    );
    let _ = request(&mut stdin, &mut reader, "11", "reports.classSummary", json!({}));
    let _ = request(&mut stdin, &mut reader, "12", "reports.bulk", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "behavior.clearStudent",
        json!({ "student": "Smoke Student" }),
    );
    let _ = request(&mut stdin, &mut reader, "14", "behavior.clearAll", json!({}));

    let unknown = {
        writeln!(stdin, "{}", json!({ "id": "15", "method": "nope.nothing" })).expect("write");
        stdin.flush().expect("flush");
        let mut line = String::new();
        reader.read_line(&mut line).expect("read");
        serde_json::from_str::<serde_json::Value>(line.trim()).expect("json")
    };
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    writeln!(stdin, "this is not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let bad: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(bad["error"]["code"], json!("bad_json"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn reports_without_workspace_answer_with_request_id() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    for (id, method) in [("1", "reports.classSummary"), ("2", "reports.bulk")] {
        let resp = request(&mut stdin, &mut reader, id, method, json!({}));
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("no_workspace"));
    }

    drop(stdin);
    let _ = child.wait();
}
