use quick_xml::escape::escape;

use crate::runner::PagingResult;

const STYLE: &str = r#"    body { font-family: sans-serif; margin: 2rem; background: #111; color: #eee; }
    #results { display: flex; flex-wrap: wrap; gap: 1rem; }
    #results a { display: block; width: 185px; color: inherit; text-decoration: none; }
    #results img { width: 100%; }
    .non-watchable_film_item { opacity: 0.5; }
    .results_error { color: #f66; }
    footer { margin-top: 2rem; color: #888; font-size: 0.8rem; }"#;

/// Standalone page around the rendered results container.
pub fn render_html(result: &PagingResult) -> Vec<u8> {
    let page = result.page_url.as_str();
    let status = if result.exhausted {
        "end of results"
    } else if result.failure.is_some() {
        "stopped on error"
    } else {
        "more results available"
    };
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <title>Results for {title}</title>
  <style>
{STYLE}
  </style>
</head>
<body>
  <h1>Results for {title}</h1>
  {container}
  <footer>{count} items from {requests} requests, {status}</footer>
</body>
</html>
"#,
        title = escape(page),
        container = result.container.to_html(),
        count = result.items.len(),
        requests = result.requests.len(),
    );
    html.into_bytes()
}
