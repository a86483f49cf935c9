use std::str::FromStr;

use colored::Colorize;
use reqwest::header::{HeaderName, HeaderValue};

use crate::search::SearchTarget;

/// Parses a `Key: Value` header as given on the command line.
pub fn parse_header(value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (key, val) = value
        .split_once(':')
        .ok_or_else(|| "expected 'Key: Value'".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("header name is empty".to_string());
    }
    let name = HeaderName::from_str(key).map_err(|e| format!("bad header name '{key}': {e}"))?;
    let value = HeaderValue::from_str(val.trim())
        .map_err(|e| format!("bad header value for '{key}': {e}"))?;
    Ok((name, value))
}

/// Maps the page a query is typed on to where it is submitted.
pub fn parse_search_target(value: &str) -> Result<SearchTarget, String> {
    match value.trim().to_lowercase().as_str() {
        "results" | "result" | "page" => Ok(SearchTarget::CurrentPage),
        "watch" => Ok(SearchTarget::results()),
        other => Err(format!("unknown page '{other}', expected results or watch")),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// `[INF] message`, tag colored by severity.
pub fn status_line(severity: Severity, message: &str) -> String {
    let tag = match severity {
        Severity::Info => "INF".bold().cyan(),
        Severity::Warn => "WRN".bold().yellow(),
        Severity::Error => "ERR".bold().red(),
    };
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        message
    )
}

pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}
