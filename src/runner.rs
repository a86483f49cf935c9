use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use indicatif::ProgressBar;
use reqwest::Url;
use thiserror::Error;
use tokio::time::Instant;

use crate::pager::{Fetch, HttpFetcher, PageCursor, PageRequest, PagerError, ResultsPager};
use crate::parse::Item;
use crate::render::ResultsContainer;
use crate::schema::ItemSchema;
use crate::utils::{self, Severity};

#[derive(Clone, Debug)]
pub struct Options {
    pub page_url: String,
    pub schema: ItemSchema,
    /// First index to request; `None` starts right after the initial page.
    pub start: Option<usize>,
    pub pages: usize,
    pub retries: u32,
    pub rate: u32,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub follow_redirects: bool,
    pub header: Option<String>,
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            schema: ItemSchema::default(),
            start: None,
            pages: 1,
            retries: 0,
            rate: 10,
            timeout_seconds: 10,
            proxy: None,
            follow_redirects: true,
            header: None,
            verbose: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid URL: {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid item schema: {message}")]
    InvalidSchema { message: String },

    #[error(
        "invalid start {start}, expected a multiple of the window size {window_size} below usize::MAX"
    )]
    InvalidStart { start: usize, window_size: usize },

    #[error("invalid pages {value}, expected positive integer")]
    InvalidPages { value: usize },

    #[error("invalid rate {value}, expected positive integer")]
    InvalidRate { value: u32 },

    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Pager {
        #[from]
        source: PagerError,
    },
}

#[derive(Clone, Debug)]
pub struct PagingResult {
    pub page_url: Url,
    pub started_at: Instant,
    pub elapsed: Duration,
    pub items: Vec<Item>,
    pub container: ResultsContainer,
    /// Every request sent, retries included, in order.
    pub requests: Vec<PageRequest>,
    /// Set when a window came back short.
    pub exhausted: bool,
    /// The error that stopped paging once retries ran out.
    pub failure: Option<String>,
}

impl PagingResult {
    pub fn windows_loaded(&self) -> usize {
        let mut windows: Vec<_> = self.requests.iter().map(|r| r.window).collect();
        windows.dedup();
        windows.len() - usize::from(self.failure.is_some())
    }
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
    page_url: Url,
    cursor: PageCursor,
    rate: NonZeroU32,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        let page_url =
            Url::parse(options.page_url.trim()).map_err(|source| RunnerError::InvalidUrl {
                url: options.page_url.clone(),
                source,
            })?;
        options
            .schema
            .validate()
            .map_err(|message| RunnerError::InvalidSchema { message })?;
        let window_size = options.schema.window_size;
        let cursor = match options.start {
            Some(start) => PageCursor::starting_at(start, window_size)
                .ok_or(RunnerError::InvalidStart { start, window_size })?,
            None => PageCursor::new(window_size),
        };
        if options.pages == 0 {
            return Err(RunnerError::InvalidPages {
                value: options.pages,
            });
        }
        let rate = NonZeroU32::new(options.rate).ok_or(RunnerError::InvalidRate {
            value: options.rate,
        })?;
        if let Some(header) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            utils::parse_header(header).map_err(|message| RunnerError::InvalidHeader {
                header: header.to_string(),
                message,
            })?;
        }
        Ok(Self {
            options,
            page_url,
            cursor,
            rate,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub async fn run(&self) -> Result<PagingResult, RunnerError> {
        self.run_with_progress(&ProgressBar::hidden()).await
    }

    pub async fn run_with_progress(&self, pb: &ProgressBar) -> Result<PagingResult, RunnerError> {
        let client = build_client(
            self.options.proxy.as_deref(),
            self.options.timeout_seconds,
            self.options.follow_redirects,
            self.options.header.as_deref(),
        )?;
        self.run_with(&HttpFetcher::new(client), pb).await
    }

    /// Loads up to `pages` windows through `fetcher`.
    ///
    /// A failed window is re-requested up to `retries` times; after that the
    /// run stops and the failure is reported in the result rather than as an
    /// error, so the items gathered so far are kept.
    pub async fn run_with<F: Fetch>(
        &self,
        fetcher: &F,
        pb: &ProgressBar,
    ) -> Result<PagingResult, RunnerError> {
        let started_at = Instant::now();
        let lim = RateLimiter::direct(Quota::per_second(self.rate));

        let mut pager = ResultsPager::new(self.page_url.clone(), self.options.schema.clone())
            .with_cursor(self.cursor);
        let mut items: Vec<Item> = Vec::new();
        let mut requests: Vec<PageRequest> = Vec::new();
        let mut failure: Option<String> = None;
        let mut exhausted = false;

        'pages: for _ in 0..self.options.pages {
            let mut attempts = 0u32;
            loop {
                lim.until_ready().await;
                let request = match pager.begin_load_more() {
                    Ok(request) => request,
                    Err(PagerError::Exhausted { .. }) => {
                        exhausted = true;
                        break 'pages;
                    }
                    Err(e) => return Err(e.into()),
                };
                if self.options.verbose {
                    pb.println(utils::status_line(
                        Severity::Info,
                        &format!("GET {} {}", request.window, request.url),
                    ));
                }
                requests.push(request.clone());

                let response = fetcher.fetch(&request.url).await;
                match pager.on_response(request.window, response) {
                    Ok(outcome) => {
                        pb.inc(1);
                        if self.options.verbose {
                            pb.println(utils::status_line(
                                Severity::Info,
                                &format!(
                                    "{} loaded {}",
                                    outcome.window,
                                    utils::plural(outcome.items.len(), "item")
                                ),
                            ));
                        }
                        items.extend(outcome.items);
                        if outcome.exhausted {
                            exhausted = true;
                            break 'pages;
                        }
                        break;
                    }
                    Err(e) => {
                        if attempts >= self.options.retries {
                            failure = Some(e.to_string());
                            break 'pages;
                        }
                        attempts += 1;
                        pb.println(utils::status_line(
                            Severity::Warn,
                            &format!(
                                "{e}, retrying ({attempts}/{})",
                                self.options.retries
                            ),
                        ));
                    }
                }
            }
        }

        Ok(PagingResult {
            page_url: self.page_url.clone(),
            started_at,
            elapsed: started_at.elapsed(),
            items,
            container: pager.into_container(),
            requests,
            exhausted,
            failure,
        })
    }
}

pub fn build_client(
    proxy: Option<&str>,
    timeout_seconds: usize,
    follow_redirects: bool,
    header: Option<&str>,
) -> Result<reqwest::Client, RunnerError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("serviam/", env!("CARGO_PKG_VERSION"))),
    );
    if let Some(header) = header.filter(|h| !h.trim().is_empty()) {
        let (name, value) =
            utils::parse_header(header).map_err(|message| RunnerError::InvalidHeader {
                header: header.to_string(),
                message,
            })?;
        headers.insert(name, value);
    }

    let redirect_policy = if follow_redirects {
        reqwest::redirect::Policy::limited(10)
    } else {
        reqwest::redirect::Policy::none()
    };

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect_policy)
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}
