use crate::cli::args::CliArgs;
use crate::schema::SchemaFlavor;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.flavor.as_deref() {
        if SchemaFlavor::parse(raw).is_none() {
            return Err(format!("invalid --flavor '{raw}', expected film or card"));
        }
    }
    if let Some(window_size) = args.window_size {
        if window_size == 0 {
            return Err("invalid window-size, expected positive integer".to_string());
        }
    }
    if let Some(pages) = args.pages {
        if pages == 0 {
            return Err("invalid pages, expected positive integer".to_string());
        }
    }
    if let Some(rate) = args.rate {
        if rate == 0 {
            return Err("invalid rate, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.target.as_deref() {
        crate::utils::parse_search_target(raw)
            .map_err(|e| format!("invalid --target '{raw}': {e}"))?;
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    if let Some(url) = args.url.as_deref() {
        reqwest::Url::parse(url.trim()).map_err(|e| format!("invalid URL '{url}': {e}"))?;
    }
    Ok(())
}
