pub mod report;

use crate::parse::Item;
use crate::runner::PagingResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// One `id<TAB>title` line per item.
pub fn render_text(items: &[Item]) -> Vec<u8> {
    let mut out = String::new();
    for item in items {
        out.push_str(&item.id);
        out.push('\t');
        out.push_str(&item.title);
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(items: &[Item]) -> Vec<u8> {
    serde_json::to_vec_pretty(items).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_html(result: &PagingResult) -> Vec<u8> {
    report::render_html(result)
}

pub fn render(format: OutputFormat, result: &PagingResult) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(&result.items),
        OutputFormat::Json => render_json(&result.items),
        OutputFormat::Html => render_html(result),
    }
}
