pub mod cursor;
pub mod fetch;

use reqwest::Url;
use thiserror::Error;

use crate::parse::{self, Item, ParseError};
use crate::render::{self, ResultsContainer};
use crate::schema::ItemSchema;
use crate::search::{Navigation, SearchBox, SearchError, SearchTarget};

pub use cursor::{PageCursor, PageWindow};
pub use fetch::{Fetch, FetchError, FetchedPage, HttpFetcher};

pub const XML_ENDPOINT: &str = "xml";
const RANGE_PARAMS: [&str; 2] = ["f", "l"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    AwaitingResponse(PageWindow),
    /// The window failed; the next load retries it instead of skipping ahead.
    Failed { window: PageWindow, error: String },
    /// A window came back short, there is nothing left to load.
    Exhausted,
}

#[derive(Debug, Error)]
pub enum PagerError {
    #[error("a request for {window} is already in flight")]
    RequestInFlight { window: PageWindow },

    #[error("no more results after index {next}")]
    Exhausted { next: usize },

    #[error("response for {window} does not match the outstanding request")]
    StaleResponse { window: PageWindow },

    #[error("cannot build pagination URL from {page}: {source}")]
    RequestUrl {
        page: String,
        #[source]
        source: url::ParseError,
    },

    #[error("loading {window} failed: {source}")]
    Fetch {
        window: PageWindow,
        #[source]
        source: FetchError,
    },

    #[error("loading {window} returned HTTP {status}")]
    Status { window: PageWindow, status: u16 },

    #[error("loading {window} returned malformed results: {source}")]
    Parse {
        window: PageWindow,
        #[source]
        source: ParseError,
    },
}

/// A pagination request ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub window: PageWindow,
    pub url: Url,
}

#[derive(Clone, Debug)]
pub struct LoadOutcome {
    pub window: PageWindow,
    pub items: Vec<Item>,
    pub exhausted: bool,
}

/// Pages through the XML endpoint behind one results page and appends the
/// rendered items to its results container.
#[derive(Clone, Debug)]
pub struct ResultsPager {
    page_url: Url,
    schema: ItemSchema,
    cursor: PageCursor,
    state: PagerState,
    container: ResultsContainer,
    search: SearchBox,
}

impl ResultsPager {
    pub fn new(page_url: Url, schema: ItemSchema) -> Self {
        let cursor = PageCursor::new(schema.window_size);
        let search = SearchBox::new(page_url.clone(), SearchTarget::CurrentPage);
        Self {
            page_url,
            schema,
            cursor,
            state: PagerState::Idle,
            container: ResultsContainer::new(),
            search,
        }
    }

    pub fn with_cursor(mut self, cursor: PageCursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_container(mut self, container: ResultsContainer) -> Self {
        self.container = container;
        self
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub fn schema(&self) -> &ItemSchema {
        &self.schema
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn state(&self) -> &PagerState {
        &self.state
    }

    pub fn container(&self) -> &ResultsContainer {
        &self.container
    }

    pub fn into_container(self) -> ResultsContainer {
        self.container
    }

    pub fn search_box(&mut self) -> &mut SearchBox {
        &mut self.search
    }

    pub fn on_key_up(&self, key_code: u32) -> Result<Option<Navigation>, SearchError> {
        self.search.on_key_up(key_code)
    }

    pub fn on_trigger_click(&self) -> Result<Navigation, SearchError> {
        self.search.on_trigger_click()
    }

    /// `<page base path>xml?<page query>&f=<first>&l=<last>`
    pub fn pagination_url(&self, window: PageWindow) -> Result<Url, PagerError> {
        let mut url = self
            .page_url
            .join(XML_ENDPOINT)
            .map_err(|source| PagerError::RequestUrl {
                page: self.page_url.to_string(),
                source,
            })?;
        let forwarded: Vec<(String, String)> = self
            .page_url
            .query_pairs()
            .filter(|(k, _)| !RANGE_PARAMS.contains(&&**k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in forwarded.iter() {
                pairs.append_pair(k, v);
            }
            pairs
                .append_pair("f", &window.first.to_string())
                .append_pair("l", &window.last.to_string());
        }
        Ok(url)
    }

    /// Claims the next window and returns the request for it.
    ///
    /// After a failure the same window is handed out again, so retrying never
    /// leaves a gap in the results.
    pub fn begin_load_more(&mut self) -> Result<PageRequest, PagerError> {
        let window = match &self.state {
            PagerState::AwaitingResponse(window) => {
                return Err(PagerError::RequestInFlight { window: *window })
            }
            PagerState::Exhausted => {
                return Err(PagerError::Exhausted {
                    next: self.cursor.window_start(),
                })
            }
            PagerState::Failed { window, .. } => *window,
            PagerState::Idle => match self.cursor.peek() {
                Some(window) => window,
                None => {
                    self.state = PagerState::Exhausted;
                    return Err(PagerError::Exhausted {
                        next: self.cursor.window_start(),
                    });
                }
            },
        };
        let url = self.pagination_url(window)?;
        if self.state == PagerState::Idle {
            self.cursor.advance();
        }
        self.state = PagerState::AwaitingResponse(window);
        Ok(PageRequest { window, url })
    }

    /// Completes the outstanding request for `window`.
    ///
    /// Only a successful, well-formed response appends anything; every other
    /// outcome leaves the container untouched apart from its error notice.
    pub fn on_response(
        &mut self,
        window: PageWindow,
        response: Result<FetchedPage, FetchError>,
    ) -> Result<LoadOutcome, PagerError> {
        if self.state != PagerState::AwaitingResponse(window) {
            return Err(PagerError::StaleResponse { window });
        }

        let page = match response {
            Ok(page) => page,
            Err(source) => return Err(self.fail(PagerError::Fetch { window, source })),
        };
        if !page.is_success() {
            return Err(self.fail(PagerError::Status {
                window,
                status: page.status,
            }));
        }
        let items = match parse::parse_items(&page.body, &self.schema) {
            Ok(items) => items,
            Err(source) => return Err(self.fail(PagerError::Parse { window, source })),
        };

        for item in items.iter() {
            self.container.append(&render::item_element(item, &self.schema));
        }
        self.container.clear_error();

        let exhausted = items.len() < window.len();
        self.state = if exhausted {
            PagerState::Exhausted
        } else {
            PagerState::Idle
        };
        Ok(LoadOutcome {
            window,
            items,
            exhausted,
        })
    }

    pub async fn load_more<F: Fetch>(&mut self, fetcher: &F) -> Result<LoadOutcome, PagerError> {
        let request = self.begin_load_more()?;
        let response = fetcher.fetch(&request.url).await;
        self.on_response(request.window, response)
    }

    fn fail(&mut self, err: PagerError) -> PagerError {
        let window = match &err {
            PagerError::Fetch { window, .. }
            | PagerError::Status { window, .. }
            | PagerError::Parse { window, .. } => *window,
            _ => return err,
        };
        self.state = PagerState::Failed {
            window,
            error: err.to_string(),
        };
        self.container
            .show_error(format!("Could not load more results: {err}"));
        err
    }
}
