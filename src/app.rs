use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::Url;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output::{self, OutputFormat};
use crate::pager::{PageCursor, ResultsPager};
use crate::render;
use crate::runner::{self, Runner};
use crate::schema::{ItemSchema, SchemaFlavor};
use crate::search::{Navigation, SearchTarget, WatchPageSearch};
use crate::utils::{self, Severity};

fn print_banner() {
    const BANNER: &str = r#"
                       _
   ___  ___ _ ____   _(_) __ _ _ __ ___
  / __|/ _ \ '__\ \ / / |/ _` | '_ ` _ \
  \__ \  __/ |   \ V /| | (_| | | | | | |
  |___/\___|_|    \_/ |_|\__,_|_| |_| |_|
"#;
    print!("{}", BANNER);
    println!(
        "        v{} - incremental results pager",
        env!("CARGO_PKG_VERSION")
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn format_opt_value<'a>(v: Option<&'a str>, default: &'a str) -> &'a str {
    match v {
        Some(v) if !v.trim().is_empty() => v,
        _ => default,
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    url: String,
    schema: ItemSchema,
    schema_label: String,
    start: Option<usize>,
    pages: usize,
    retries: u32,
    rate: u32,
    timeout: usize,
    proxy: Option<String>,
    header: Option<String>,
    follow_redirects: bool,
    output: Option<String>,
    output_format: OutputFormat,
    search: Option<String>,
    target: SearchTarget,
    no_color: bool,
    verbose: u8,
}

/// Flavor from the command line wins, then a full schema from the config,
/// then the config's flavor.
fn resolve_schema(args: &CliArgs, cfg: &ConfigFile) -> Result<(ItemSchema, String), String> {
    let flavor = |raw: &str| {
        SchemaFlavor::parse(raw)
            .ok_or_else(|| format!("invalid flavor '{raw}', expected film or card"))
    };
    let (schema, label) = if let Some(raw) = args.flavor.as_deref() {
        let f = flavor(raw)?;
        (f.schema(), f.label().to_string())
    } else if let Some(schema) = cfg.schema.clone() {
        let label = format!("custom ({})", schema.item_tag);
        (schema, label)
    } else {
        let f = flavor(cfg.flavor.as_deref().unwrap_or("card"))?;
        (f.schema(), f.label().to_string())
    };

    let schema = match args.window_size.or(cfg.window_size) {
        Some(size) => schema.with_window_size(size),
        None => schema,
    };
    schema
        .validate()
        .map_err(|e| format!("invalid item schema: {e}"))?;
    Ok((schema, label))
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let url = args
        .url
        .clone()
        .or(cfg.url.clone())
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "a page URL is required (--url or `url` in the config)".to_string())?;
    Url::parse(&url).map_err(|e| format!("invalid URL '{url}': {e}"))?;

    let (schema, schema_label) = resolve_schema(&args, &cfg)?;

    let start = args.start.or(cfg.start);
    if let Some(start) = start {
        if PageCursor::starting_at(start, schema.window_size).is_none() {
            return Err(format!(
                "invalid start {start}, expected a multiple of the window size {} below usize::MAX",
                schema.window_size
            ));
        }
    }

    let pages = args.pages.or(cfg.pages).unwrap_or(1);
    if pages == 0 {
        return Err("invalid pages, expected positive integer".to_string());
    }
    let retries = args.retries.or(cfg.retries).unwrap_or(0);
    let rate = args.rate.or(cfg.rate).unwrap_or(10);
    if rate == 0 {
        return Err("invalid rate, expected positive integer".to_string());
    }
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);

    let proxy = args
        .proxy
        .or(cfg.proxy)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    let header = args
        .header
        .or(cfg.header)
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());
    if let Some(header) = header.as_deref() {
        utils::parse_header(header).map_err(|e| format!("invalid header '{header}': {e}"))?;
    }
    let follow_redirects = args
        .follow_redirects
        .or(cfg.follow_redirects)
        .unwrap_or(true);

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(p.trim()))
        .filter(|p| !p.is_empty());
    let output_format_raw = args.output_format.or(cfg.output_format);
    let output_format = match output_format_raw.as_deref() {
        Some(raw) => OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let target_raw = args
        .target
        .or(cfg.target)
        .unwrap_or_else(|| "results".to_string());
    let target = utils::parse_search_target(&target_raw)
        .map_err(|e| format!("invalid target '{target_raw}': {e}"))?;

    Ok(RunConfig {
        url,
        schema,
        schema_label,
        start,
        pages,
        retries,
        rate,
        timeout,
        proxy,
        header,
        follow_redirects,
        output,
        output_format,
        search: args.search,
        target,
        no_color,
        verbose: args.verbose,
    })
}

/// The navigation a query typed on the configured page produces.
fn search_navigation(run: &RunConfig, query: &str) -> Result<Navigation, String> {
    let page_url = Url::parse(&run.url).map_err(|e| format!("invalid URL '{}': {e}", run.url))?;
    let navigation = match run.target {
        SearchTarget::CurrentPage => {
            let mut pager = ResultsPager::new(page_url, run.schema.clone());
            pager.search_box().set_value(query);
            pager.on_trigger_click()
        }
        SearchTarget::Path(_) => {
            let mut watch = WatchPageSearch::new(page_url);
            watch.search_box().set_value(query);
            watch.on_trigger_click()
        }
    };
    navigation.map_err(|e| format!("failed to submit query: {e}"))
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    if let Some(query) = run.search.as_deref() {
        let navigation = search_navigation(&run, query)?;
        println!("{}", navigation.url);
        return Ok(());
    }

    print_banner();
    format_kv_line("Page", &run.url);
    format_kv_line("Flavor", &run.schema_label);
    format_kv_line("Window", &run.schema.window_size.to_string());
    format_kv_line(
        "Start",
        &run.start.unwrap_or(run.schema.window_size).to_string(),
    );
    format_kv_line("Pages", &run.pages.to_string());
    format_kv_line("Retries", &run.retries.to_string());
    format_kv_line("Rate", &format!("{}/s", run.rate));
    format_kv_line("Timeout", &format!("{}s", run.timeout));
    format_kv_line("Proxy", format_opt_value(run.proxy.as_deref(), "none"));
    format_kv_line("Header", format_opt_value(run.header.as_deref(), "none"));
    format_kv_line("Redirects", format_bool(run.follow_redirects));
    format_kv_line("Output", format_opt_value(run.output.as_deref(), "stdout"));
    format_kv_line("Format", run.output_format.label());
    println!();

    let runner = Runner::new(runner::Options {
        page_url: run.url.clone(),
        schema: run.schema.clone(),
        start: run.start,
        pages: run.pages,
        retries: run.retries,
        rate: run.rate,
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
        follow_redirects: run.follow_redirects,
        header: run.header.clone(),
        verbose: run.verbose > 0,
    })
    .map_err(|e| e.to_string())?;

    let pb = ProgressBar::new(run.pages as u64);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(
            ":: Progress: [{pos}/{len}] :: {per_sec} :: Duration: [{elapsed_precise}] :: {msg}",
        )
        .map_err(|e| format!("failed to build progress bar style: {e}"))?
        .progress_chars(r#"#>-"#),
    );

    let result = runner
        .run_with_progress(&pb)
        .await
        .map_err(|e| e.to_string())?;
    pb.finish_and_clear();

    if run.output.is_none() {
        for item in result.items.iter() {
            let marker = if item.watchable {
                "watchable".bold().green()
            } else {
                "not watchable".bold().yellow()
            };
            println!(
                "{} {} [{}]",
                item.title.bold().white(),
                render::watch_href(&item.id).blue(),
                marker
            );
        }
        if run.verbose > 1 {
            println!();
            println!("{}", result.container.to_html());
        }
    }

    if let Some(path) = run.output.as_deref() {
        write_output(path, &output::render(run.output_format, &result)).await?;
        println!(
            "{}",
            utils::status_line(
                Severity::Info,
                &format!("wrote {} to {path}", utils::plural(result.items.len(), "item"))
            )
        );
    }

    if result.exhausted {
        println!(
            "{}",
            utils::status_line(Severity::Info, "reached the end of the results")
        );
    }

    println!();
    println!(
        ":: Completed :: {} in {} windows, took {}s ::",
        utils::plural(result.items.len(), "item"),
        result.windows_loaded(),
        result.elapsed.as_secs()
    );

    if let Some(failure) = result.failure {
        println!("{}", utils::status_line(Severity::Error, &failure));
        return Err(format!("paging stopped early: {failure}"));
    }
    Ok(())
}

fn load_run_config_file(args: &CliArgs) -> Result<ConfigFile, String> {
    match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                e.print().map_err(|e| format!("failed to print help: {e}"))?;
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        let path = match args.config.as_deref() {
            Some(path) => config::expand_tilde(path),
            None => config::default_config_path()
                .ok_or_else(|| "cannot locate a home directory for the config".to_string())?,
        };
        config::ensure_default_config_file(&path)?;
        println!(
            "{}",
            utils::status_line(
                Severity::Info,
                &format!("config written to {}", path.display())
            )
        );
        return Ok(());
    }

    let cfg = load_run_config_file(&args)?;
    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
