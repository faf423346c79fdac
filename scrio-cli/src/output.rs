use crate::cli::OutputFormat;
use crate::error::AppError;
use regex::Regex;
use scrio_engine::{NetworkStatus, ResourceContent, TierStats};
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Number of file paths shown before a pretty listing is elided.
const PREVIEW_PATHS: usize = 10;

/// Render assembled resource content in the requested format.
pub fn render_content(
    content: &ResourceContent,
    format: &OutputFormat,
) -> Result<String, AppError> {
    match format {
        OutputFormat::Pretty => Ok(pretty_content(content)),
        OutputFormat::Json => serde_json::to_string_pretty(&envelope(content)).map_err(json_err),
        OutputFormat::JsonCompact => serde_json::to_string(&envelope(content)).map_err(json_err),
    }
}

/// Render per-tier statistics in the requested format.
pub fn render_stats(stats: &[TierStats], format: &OutputFormat) -> Result<String, AppError> {
    match format {
        OutputFormat::Pretty => {
            let mut out = String::new();
            for tier in stats {
                let items = tier
                    .items
                    .map_or_else(|| "-".to_string(), |count| count.to_string());
                let availability = if tier.available {
                    "available"
                } else {
                    "unavailable"
                };
                let _ = writeln!(
                    out,
                    "{:<8} priority={:<3} {:<11} items={items}",
                    tier.name, tier.priority, availability
                );
            }
            Ok(out)
        }
        OutputFormat::Json => serde_json::to_string_pretty(stats).map_err(json_err),
        OutputFormat::JsonCompact => serde_json::to_string(stats).map_err(json_err),
    }
}

/// Render an upstream reachability report in the requested format.
pub fn render_status(status: &NetworkStatus, format: &OutputFormat) -> Result<String, AppError> {
    match format {
        OutputFormat::Pretty => {
            let verdict = if status.is_online { "online" } else { "offline" };
            let checked = status
                .last_checked_at
                .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
            Ok(format!("Upstream:     {verdict}\nLast checked: {checked}\n"))
        }
        OutputFormat::Json => serde_json::to_string_pretty(status).map_err(json_err),
        OutputFormat::JsonCompact => serde_json::to_string(status).map_err(json_err),
    }
}

/// Pull the file paths out of assembled content, optionally filtered.
pub fn collect_paths(value: &Value, filter: Option<&Regex>) -> Vec<String> {
    value
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("path").and_then(Value::as_str))
                .filter(|path| filter.is_none_or(|pattern| pattern.is_match(path)))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Write rendered output to a file when one is given, stdout otherwise.
pub fn emit(text: &str, output_file: Option<&Path>) -> Result<(), AppError> {
    match output_file {
        Some(path) => {
            std::fs::write(path, text)?;
            info!(path = %path.display(), "output saved");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn envelope(content: &ResourceContent) -> Value {
    json!({
        "origin": content.origin.to_string(),
        "content": content.value,
    })
}

fn pretty_content(content: &ResourceContent) -> String {
    let value = &content.value;
    let mut out = String::new();

    if let Some(language) = value.get("language").and_then(Value::as_str) {
        let organization = value
            .get("organization")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let resource = value.get("resource").and_then(Value::as_str).unwrap_or("?");
        let git_ref = value.get("ref").and_then(Value::as_str).unwrap_or("?");
        let _ = writeln!(out, "Resource:    {organization}/{language}_{resource}@{git_ref}");
    }
    let _ = writeln!(out, "Origin:      {}", content.origin);

    let total = value.get("totalCount").and_then(Value::as_u64).unwrap_or(0);
    let _ = writeln!(out, "Total files: {total}");
    if value.get("manifest").is_some_and(|m| !m.is_null()) {
        let _ = writeln!(out, "Manifest:    present");
    }

    let paths = collect_paths(value, None);
    if !paths.is_empty() {
        let _ = writeln!(out);
        for path in paths.iter().take(PREVIEW_PATHS) {
            let _ = writeln!(out, "  {path}");
        }
        if paths.len() > PREVIEW_PATHS {
            let _ = writeln!(out, "  ... and {} more", paths.len() - PREVIEW_PATHS);
        }
    }
    out
}

fn json_err(e: serde_json::Error) -> AppError {
    AppError::InvalidInput(format!("Failed to serialize output: {e}"))
}
