use reqwest::Url;
use thiserror::Error;

pub const ENTER_KEY_CODE: u32 = 13;
pub const QUERY_PARAM: &str = "q";

/// Where a submitted query navigates to, relative to the current page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchTarget {
    /// Re-query the page we are on (the results page).
    CurrentPage,
    /// A path resolved against the current page, e.g. `results` from the watch page.
    Path(String),
}

impl SearchTarget {
    pub fn results() -> Self {
        Self::Path("results".to_string())
    }

    pub fn resolve(&self, page_url: &Url) -> Result<Url, SearchError> {
        match self {
            Self::CurrentPage => Ok(page_url.clone()),
            Self::Path(path) => page_url.join(path).map_err(|source| SearchError::Resolve {
                target: path.clone(),
                page: page_url.to_string(),
                source,
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot resolve search target '{target}' against {page}: {source}")]
    Resolve {
        target: String,
        page: String,
        #[source]
        source: url::ParseError,
    },
}

/// A page navigation. `replace` means the current history entry is replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub url: Url,
    pub replace: bool,
}

/// Builds the navigation for a submitted query; the raw input is always
/// form-encoded into `q` so it decodes back to exactly the same string.
pub fn submit_query(
    page_url: &Url,
    target: &SearchTarget,
    raw_input: &str,
) -> Result<Navigation, SearchError> {
    let mut url = target.resolve(page_url)?;
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut().append_pair(QUERY_PARAM, raw_input);
    Ok(Navigation { url, replace: true })
}

pub fn query_of(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == QUERY_PARAM)
        .map(|(_, v)| v.into_owned())
}

/// Search field plus its trigger icon.
#[derive(Clone, Debug)]
pub struct SearchBox {
    page_url: Url,
    target: SearchTarget,
    value: String,
}

impl SearchBox {
    /// The field starts out holding the query the page was rendered for.
    pub fn new(page_url: Url, target: SearchTarget) -> Self {
        let value = query_of(&page_url).unwrap_or_default();
        Self {
            page_url,
            target,
            value,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub fn submit(&self) -> Result<Navigation, SearchError> {
        submit_query(&self.page_url, &self.target, &self.value)
    }

    /// Only Enter submits; every other key is a no-op.
    pub fn on_key_up(&self, key_code: u32) -> Result<Option<Navigation>, SearchError> {
        if key_code == ENTER_KEY_CODE {
            self.submit().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn on_trigger_click(&self) -> Result<Navigation, SearchError> {
        self.submit()
    }
}

/// The watch page only re-submits queries, always to the results page.
#[derive(Clone, Debug)]
pub struct WatchPageSearch {
    search: SearchBox,
}

impl WatchPageSearch {
    pub fn new(page_url: Url) -> Self {
        Self {
            search: SearchBox::new(page_url, SearchTarget::results()),
        }
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
}
