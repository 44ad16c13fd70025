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
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> String {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

#[test]
fn opens_existing_files_written_by_earlier_versions() {
    let workspace = temp_dir("behaviord-compat");
    std::fs::write(
        workspace.join("behavior_data.csv"),
        "student,date,color\n\"Lee, Ann\",2024-03-01,Purple\nBob,2024-03-01,Red\nBob,2024-03-01,Blue\n",
    )
    .expect("seed data");
    std::fs::write(workspace.join("last_uploaded_roster.csv"), "name\nBob\n\"Lee, Ann\"\n")
        .expect("seed roster");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["recordCount"], json!(2));
    assert_eq!(opened["rosterCount"], json!(2));

    let roster = request_ok(&mut stdin, &mut reader, "2", "roster.get", json!({}));
    assert_eq!(roster["students"], json!(["Bob", "Lee, Ann"]));
    let bob = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "behavior.student",
        json!({ "student": "Bob" }),
    );
    assert_eq!(bob["records"][0]["color"], json!("Blue"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_data_file_opens_empty_and_is_kept_aside() {
    let workspace = temp_dir("behaviord-malformed");
    std::fs::write(workspace.join("behavior_data.csv"), "who,when\nAlice,yesterday\n")
        .expect("seed data");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["recordCount"], json!(0));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "behavior.record",
        json!({ "student": "Alice", "color": "Pink", "date": "2024-03-02" }),
    );

    drop(stdin);
    let _ = child.wait();

    let kept: Vec<String> = std::fs::read_dir(&workspace)
        .expect("read workspace")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with("behavior_data.csv.corrupt-"))
        .collect();
    assert_eq!(kept.len(), 1);
    let original = std::fs::read_to_string(workspace.join(&kept[0])).expect("quarantined");
    assert!(original.starts_with("who,when"));
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn non_utf8_data_file_opens_empty_and_is_kept_aside() {
    let workspace = temp_dir("behaviord-latin1");
    let original: &[u8] = b"student,date,color\nRen\xe9e,2024-01-01,Red\nBob,2024-01-02,Blue\n";
    std::fs::write(workspace.join("behavior_data.csv"), original).expect("seed data");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["recordCount"], json!(0));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "behavior.record",
        json!({ "student": "Alice", "color": "Green", "date": "2024-01-03" }),
    );

    drop(stdin);
    let _ = child.wait();

    let kept: Vec<String> = std::fs::read_dir(&workspace)
        .expect("read workspace")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with("behavior_data.csv.corrupt-"))
        .collect();
    assert_eq!(kept.len(), 1);
    let copy = std::fs::read(workspace.join(&kept[0])).expect("quarantined");
    assert_eq!(copy, original);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn invalid_config_refuses_to_open() {
    let workspace = temp_dir("behaviord-bad-config");
    std::fs::write(workspace.join("behaviord.json"), "{ not json").expect("seed config");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(error_code(&resp), "bad_config");
    let after = request(&mut stdin, &mut reader, "2", "roster.get", json!({}));
    assert_eq!(error_code(&after), "no_workspace");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unknown_time_zone_refuses_to_open() {
    let workspace = temp_dir("behaviord-bad-zone");
    std::fs::write(
        workspace.join("behaviord.json"),
        r#"{"timeZone":"Mars/Olympus_Mons"}"#,
    )
    .expect("seed config");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(error_code(&resp), "bad_config");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
