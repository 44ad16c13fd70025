//! Minimal CSV reading and writing for the workspace files.
//!
//! Quoted fields may contain commas, doubled quotes and line breaks. Blank
//! lines outside quotes are skipped.

/// Splits `text` into records of fields.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut out: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut row_has_content = false;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            row_has_content = true;
            i += 1;
            continue;
        }
        if !in_quotes && ch == ',' {
            row.push(std::mem::take(&mut buf));
            row_has_content = true;
            i += 1;
            continue;
        }
        if !in_quotes && (ch == '\n' || ch == '\r') {
            if ch == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n' {
                i += 1;
            }
            if row_has_content || !buf.is_empty() {
                row.push(std::mem::take(&mut buf));
                out.push(std::mem::take(&mut row));
            }
            row_has_content = false;
            i += 1;
            continue;
        }
        buf.push(ch);
        i += 1;
    }
    if row_has_content || !buf.is_empty() {
        row.push(buf);
        out.push(row);
    }
    out
}

pub fn quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn write_record(out: &mut String, fields: &[&str]) {
    let line: Vec<String> = fields.iter().map(|f| quote(f)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

/// Case-insensitive header lookup.
pub fn column_index(header: &[String], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}
