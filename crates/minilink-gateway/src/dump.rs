use minilink_core::UrlEntry;
use std::fmt::Write;

const HEADERS: [&str; 5] = ["ID", "Long URL", "Short URL", "Created At", "Expires In (sec)"];
const COLUMN_WIDTH: usize = 25;

pub const EMPTY_MESSAGE: &str = "No data found in the url_mapping table.";

/// Renders stored mappings as a fixed-width, pipe-separated table.
pub fn render(entries: &[UrlEntry]) -> String {
    if entries.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }

    let mut out = String::new();
    push_row(&mut out, HEADERS.iter().map(|h| h.to_string()));
    out.push_str(&"-".repeat((COLUMN_WIDTH + 2) * HEADERS.len()));
    out.push('\n');

    for entry in entries {
        push_row(
            &mut out,
            [
                entry.id.to_string(),
                entry.long_url.to_string(),
                entry
                    .alias
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                entry.created_at.to_string(),
                entry.ttl_seconds.to_string(),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
    let line = cells
        .into_iter()
        .map(|cell| format!("{cell:<COLUMN_WIDTH$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{line}");
}
