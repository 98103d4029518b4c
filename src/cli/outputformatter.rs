use serde_json::Value;
use terminal_size::{terminal_size, Width};

// Render a list of directory records (JSON objects) as an ASCII table.
// Returns true if a table was printed, false when there was nothing tabular.
pub fn print_records(records: &[Value]) -> bool {
    if records.is_empty() {
        println!("(no rows)");
        return false;
    }
    let cols = match column_order(records) {
        Some(c) => c,
        None => return false,
    };
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|rec| {
            cols.iter()
                .map(|k| rec.get(k).map(to_cell_string).unwrap_or_default())
                .collect()
        })
        .collect();

    // Detect terminal width once for this rendering
    let termw = get_terminal_width();

    let mut widths: Vec<usize> = cols.iter().map(|s| s.len().min(termw)).collect();
    for r in &rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] {
                widths[i] = w.min(termw);
            }
        }
    }

    let sep = build_separator(&widths);
    println!("{}", fit_line_to_width(&sep, termw));
    println!("{}", fit_line_to_width(&build_row(&cols, &widths), termw));
    println!("{}", fit_line_to_width(&sep, termw));
    for r in &rows {
        println!("{}", fit_line_to_width(&build_row(r, &widths), termw));
    }
    println!("{}", fit_line_to_width(&sep, termw));
    println!("rows: {}", rows.len());

    true
}

// Column order: "id" first when present, remaining keys in sorted order,
// built from the union of keys across all records.
fn column_order(records: &[Value]) -> Option<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();
    let mut any_object = false;
    for rec in records {
        if let Value::Object(map) = rec {
            any_object = true;
            for k in map.keys() {
                if !keys.contains(k) {
                    keys.push(k.clone());
                }
            }
        }
    }
    if !any_object || keys.is_empty() {
        return None;
    }
    keys.sort();
    if let Some(pos) = keys.iter().position(|k| k == "id") {
        let id = keys.remove(pos);
        keys.insert(0, id);
    }
    Some(keys)
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::from("NULL"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // keep objects/arrays compact
        other => other.to_string(),
    }
}

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) => (w as usize).max(20),
        None => 120,
    }
}

fn display_len(s: &str) -> usize {
    s.chars().count()
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        s.push(' ');
        if align_right {
            let pad = w.saturating_sub(display_len(&text));
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            let pad = w.saturating_sub(display_len(&text));
            s.push_str(&" ".repeat(pad));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

fn fit_line_to_width(line: &str, max: usize) -> String {
    if display_len(line) <= max {
        return line.to_string();
    }
    truncate(line, max)
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        return s.to_string();
    }
    if max <= 1 {
        return "…".to_string();
    }
    let take = max - 1;
    s.chars().take(take).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    // crude detection for aligning numbers to right
    let st = s.trim();
    if st.is_empty() {
        return false;
    }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() {
            has_digit = true;
            continue;
        }
        if ".-+eE,_".contains(ch) {
            continue;
        }
        return false;
    }
    has_digit
}
