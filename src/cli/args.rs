use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "serviam",
    version,
    about = "incremental results pager for serviam catalogue pages",
    long_about = "serviam loads further result windows from a catalogue results page's XML endpoint and renders them as result markup.\n\nExamples:\n  serviam -u 'http://localhost:8042/results?q=alien'\n  serviam -u 'http://localhost:8042/results?s=1f2e' -k film -m 5 -o films.html\n  serviam -u http://localhost:8042/watch?v=42 --search 'blade runner' --target watch\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Results page URL (its query string is forwarded to the XML endpoint)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.serviam/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a default config file (to --config or the default location) and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'k',
        long = "kd",
        visible_alias = "flavor",
        value_name = "FLAVOR",
        help_heading = "Paging",
        help = "Result markup flavor (film or card)."
    )]
    pub flavor: Option<String>,

    #[arg(
        long = "ws",
        visible_alias = "window-size",
        value_name = "N",
        help_heading = "Paging",
        help = "Override the number of results per window."
    )]
    pub window_size: Option<usize>,

    #[arg(
        long = "st",
        visible_alias = "start",
        value_name = "INDEX",
        help_heading = "Paging",
        help = "First result index to request (defaults to one window in, after the initial page)."
    )]
    pub start: Option<usize>,

    #[arg(
        short = 'm',
        long = "pg",
        visible_alias = "pages",
        value_name = "N",
        help_heading = "Paging",
        help = "Number of windows to load."
    )]
    pub pages: Option<usize>,

    #[arg(
        long = "rty",
        visible_alias = "retries",
        value_name = "N",
        help_heading = "Paging",
        help = "Retries per failed window before giving up."
    )]
    pub retries: Option<u32>,

    #[arg(
        short = 'r',
        long = "rt",
        visible_alias = "rate",
        value_name = "RPS",
        help_heading = "Performance",
        help = "Request rate limit (requests per second)."
    )]
    pub rate: Option<u32>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'F',
        long = "frd",
        visible_alias = "follow-redirects",
        num_args = 0..=1,
        default_missing_value = "true",
        help_heading = "HTTP",
        help = "Follow HTTP redirects (default true)."
    )]
    pub follow_redirects: Option<bool>,

    #[arg(
        short = 'q',
        long = "sq",
        visible_alias = "search",
        value_name = "QUERY",
        help_heading = "Search",
        help = "Print the navigation URL for submitting QUERY from the page and exit."
    )]
    pub search: Option<String>,

    #[arg(
        long = "tg",
        visible_alias = "target",
        value_name = "PAGE",
        help_heading = "Search",
        help = "Page the query is submitted from (results or watch)."
    )]
    pub target: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write results to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json or html)."
    )]
    pub output_format: Option<String>,
}
