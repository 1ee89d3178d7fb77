//! Text and JSON rendering of command results.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde::Serialize;

use quire_core::defaults::PREVIEW_CHARS;
use quire_core::{Entry, Tag};

/// Collapse whitespace runs and cut to `max_chars` characters.
///
/// Truncated text gets a trailing `...`.
pub fn preview(content: &str, max_chars: usize) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &collapsed[..cut]),
        None => collapsed,
    }
}

fn timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn tag_line(tags: &[String]) -> String {
    if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(", ")
    }
}

/// Pretty-printed JSON.
pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// One block per entry with a content preview.
pub fn entry_list(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return "No entries found.".to_string();
    }

    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{} [{}] {}",
            entry.title,
            entry.entry_type,
            timestamp(entry.created_at)
        );
        let _ = writeln!(out, "  tags: {}", tag_line(&entry.tags));
        let _ = writeln!(out, "  {}", preview(&entry.content, PREVIEW_CHARS));
    }
    out.trim_end().to_string()
}

/// Full entry with every field.
pub fn entry_detail(entry: &Entry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title:      {}", entry.title);
    let _ = writeln!(out, "ID:         {}", entry.id);
    let _ = writeln!(out, "Type:       {}", entry.entry_type);
    let _ = writeln!(out, "Created by: {}", entry.created_by);
    let _ = writeln!(out, "Created:    {}", timestamp(entry.created_at));
    let _ = writeln!(out, "Updated:    {}", timestamp(entry.updated_at));
    let _ = writeln!(out, "Tags:       {}", tag_line(&entry.tags));
    let _ = writeln!(out);
    out.push_str(&entry.content);
    out
}

/// Tag names with usage counts, already ordered by the repository.
pub fn tag_table(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "No tags found.".to_string();
    }
    let width = tags.iter().map(|t| t.name.chars().count()).max().unwrap_or(0);
    tags.iter()
        .map(|t| format!("{:<width$}  {}", t.name, t.usage_count, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
