use std::collections::VecDeque;
use std::sync::Mutex;

use indicatif::ProgressBar;
use reqwest::Url;

use crate::pager::{
    Fetch, FetchError, FetchedPage, PageWindow, PagerError, PagerState, ResultsPager,
};
use crate::runner::{Options, Runner, RunnerError};
use crate::schema::SchemaFlavor;

/// Replays canned responses in order and records every requested URL.
struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<FetchedPage, FetchError>>>,
    seen: Mutex<Vec<Url>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<Result<FetchedPage, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<Url> {
        self.seen.lock().unwrap().clone()
    }
}

impl Fetch for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.seen.lock().unwrap().push(url.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::Other {
                    url: url.to_string(),
                    message: "no scripted response left".to_string(),
                })
            })
    }
}

fn films_xml(ids: std::ops::Range<usize>) -> String {
    let mut out = String::from("<films>");
    for i in ids {
        out.push_str(&format!(
            "<film watchable=\"{}\"><id>{i}</id><poster>p{i}.jpg</poster><title>Film {i}</title><release_date>19{i:02}</release_date></film>",
            i % 2 == 0
        ));
    }
    out.push_str("</films>");
    out
}

fn film_options(pages: usize, retries: u32) -> Options {
    Options {
        page_url: "http://localhost:8042/results?q=alien".to_string(),
        schema: SchemaFlavor::Film.schema(),
        pages,
        retries,
        rate: 1000,
        ..Options::default()
    }
}

fn range_of(url: &Url) -> (usize, usize) {
    let get = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap()
    };
    (get("f"), get("l"))
}

#[tokio::test]
async fn runner_appends_every_item_in_order() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(FetchedPage::ok(films_xml(9..18))),
        Ok(FetchedPage::ok(films_xml(18..27))),
    ]);
    let runner = Runner::new(film_options(2, 0)).unwrap();
    let result = runner
        .run_with(&fetcher, &ProgressBar::hidden())
        .await
        .unwrap();

    let ids: Vec<String> = result.items.iter().map(|i| i.id.clone()).collect();
    let expected: Vec<String> = (9..27).map(|i| i.to_string()).collect();
    assert_eq!(ids, expected);
    assert_eq!(result.container.appended(), 18);
    assert!(!result.exhausted);
    assert!(result.failure.is_none());
    assert_eq!(result.windows_loaded(), 2);

    let markup = result.container.markup();
    let first = markup.find("Film 9").unwrap();
    let last = markup.find("Film 26").unwrap();
    assert!(first < last);
    assert!(markup.contains("<img src=\"media/p9.jpg\">"));
}

#[tokio::test]
async fn successive_loads_advance_by_one_window() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(FetchedPage::ok(films_xml(9..18))),
        Ok(FetchedPage::ok(films_xml(18..27))),
    ]);
    let runner = Runner::new(film_options(2, 0)).unwrap();
    runner
        .run_with(&fetcher, &ProgressBar::hidden())
        .await
        .unwrap();

    let seen = fetcher.seen();
    assert_eq!(seen.len(), 2);
    let (f1, l1) = range_of(&seen[0]);
    let (f2, l2) = range_of(&seen[1]);
    assert_eq!((f1, l1), (9, 18));
    assert_eq!(f2 - f1, 9);
    assert_eq!(l2, f2 + 9);
    assert_eq!(
        seen[0].as_str(),
        "http://localhost:8042/xml?q=alien&f=9&l=18"
    );
}

#[tokio::test]
async fn short_window_ends_paging() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(FetchedPage::ok(films_xml(9..18))),
        Ok(FetchedPage::ok(films_xml(18..21))),
    ]);
    let runner = Runner::new(film_options(5, 0)).unwrap();
    let result = runner
        .run_with(&fetcher, &ProgressBar::hidden())
        .await
        .unwrap();

    assert!(result.exhausted);
    assert_eq!(result.items.len(), 12);
    assert_eq!(fetcher.seen().len(), 2);
}

#[tokio::test]
async fn failed_window_is_retried_without_a_gap() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(FetchedPage {
            status: 503,
            body: String::new(),
        }),
        Ok(FetchedPage::ok(films_xml(9..18))),
    ]);
    let runner = Runner::new(film_options(1, 1)).unwrap();
    let result = runner
        .run_with(&fetcher, &ProgressBar::hidden())
        .await
        .unwrap();

    let seen = fetcher.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(range_of(&seen[0]), range_of(&seen[1]));
    assert_eq!(result.items.len(), 9);
    assert!(result.failure.is_none());
    assert!(result.container.error().is_none());
    assert_eq!(result.windows_loaded(), 1);
}

#[tokio::test]
async fn exhausted_retries_keep_earlier_items_and_show_error() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(FetchedPage::ok(films_xml(9..18))),
        Ok(FetchedPage::ok("<films><film><title>no id</title></film></films>")),
    ]);
    let runner = Runner::new(film_options(3, 0)).unwrap();
    let result = runner
        .run_with(&fetcher, &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(result.items.len(), 9);
    assert_eq!(result.container.appended(), 9);
    assert!(result.failure.is_some());
    assert_eq!(result.windows_loaded(), 1);
    let error = result.container.error().unwrap();
    assert!(error.starts_with("Could not load more results"));
    assert!(result
        .container
        .to_html()
        .contains("<p class=\"results_error\">"));
}

#[tokio::test]
async fn runner_honours_explicit_start() {
    let fetcher = ScriptedFetcher::new(vec![Ok(FetchedPage::ok(films_xml(0..9)))]);
    let runner = Runner::new(Options {
        start: Some(0),
        ..film_options(1, 0)
    })
    .unwrap();
    runner
        .run_with(&fetcher, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(range_of(&fetcher.seen()[0]), (0, 9));
}

#[test]
fn runner_rejects_bad_options() {
    assert!(matches!(
        Runner::new(Options {
            page_url: "results".to_string(),
            ..Options::default()
        }),
        Err(RunnerError::InvalidUrl { .. })
    ));
    assert!(matches!(
        Runner::new(Options {
            start: Some(5),
            ..film_options(1, 0)
        }),
        Err(RunnerError::InvalidStart {
            start: 5,
            window_size: 9
        })
    ));
    assert!(matches!(
        Runner::new(Options {
            rate: 0,
            ..film_options(1, 0)
        }),
        Err(RunnerError::InvalidRate { value: 0 })
    ));
    assert!(matches!(
        Runner::new(Options {
            header: Some("broken".to_string()),
            ..film_options(1, 0)
        }),
        Err(RunnerError::InvalidHeader { .. })
    ));
}

#[tokio::test]
async fn card_item_renders_exact_markup() {
    let url = Url::parse("http://localhost:8042/results?q=demo").unwrap();
    let mut pager = ResultsPager::new(url, SchemaFlavor::Card.schema());
    let fetcher = ScriptedFetcher::new(vec![Ok(FetchedPage::ok(
        "<cards><card watchable=\"false\"><id>42</id><picture>foo.jpg</picture><title>Demo</title><text></text></card></cards>",
    ))]);

    let outcome = pager.load_more(&fetcher).await.unwrap();
    assert_eq!(outcome.items.len(), 1);
    assert!(outcome.exhausted);
    assert_eq!(
        pager.container().markup(),
        "<a class=\"non-watchable_film_item\" href=\"watch?v=42\"><img src=\"foo.jpg\"><div><p><b>Demo</b></p><p></p></div></a>"
    );
    assert_eq!(range_of(&fetcher.seen()[0]), (24, 48));
}

#[tokio::test]
async fn exhausted_pager_sends_nothing_more() {
    let url = Url::parse("http://localhost:8042/results").unwrap();
    let mut pager = ResultsPager::new(url, SchemaFlavor::Film.schema());
    let fetcher = ScriptedFetcher::new(vec![Ok(FetchedPage::ok(films_xml(9..10)))]);

    pager.load_more(&fetcher).await.unwrap();
    assert_eq!(pager.state(), &PagerState::Exhausted);
    assert!(matches!(
        pager.load_more(&fetcher).await,
        Err(PagerError::Exhausted { next: 18 })
    ));
    assert_eq!(fetcher.seen().len(), 1);
}

#[test]
fn second_load_while_in_flight_is_rejected() {
    let url = Url::parse("http://localhost:8042/results").unwrap();
    let mut pager = ResultsPager::new(url, SchemaFlavor::Film.schema());

    let request = pager.begin_load_more().unwrap();
    assert!(matches!(
        pager.begin_load_more(),
        Err(PagerError::RequestInFlight { window }) if window == request.window
    ));

    let stale = PageWindow { first: 0, last: 9 };
    assert!(matches!(
        pager.on_response(stale, Ok(FetchedPage::ok(films_xml(0..9)))),
        Err(PagerError::StaleResponse { .. })
    ));
    assert_eq!(pager.container().appended(), 0);

    let outcome = pager
        .on_response(request.window, Ok(FetchedPage::ok(films_xml(9..18))))
        .unwrap();
    assert_eq!(outcome.items.len(), 9);
    assert_eq!(pager.cursor().window_start(), 18);
}

#[tokio::test]
async fn truncated_body_appends_nothing_and_is_retried() {
    let url = Url::parse("http://localhost:8042/results?q=alien").unwrap();
    let mut pager = ResultsPager::new(url, SchemaFlavor::Film.schema());
    let full = films_xml(9..18);
    let cut = &full[..full.find("<film watchable=\"true\"><id>10</id>").unwrap() + 40];
    let fetcher = ScriptedFetcher::new(vec![
        Ok(FetchedPage::ok(cut)),
        Ok(FetchedPage::ok(full.clone())),
    ]);

    assert!(matches!(pager.load_more(&fetcher).await, Err(PagerError::Parse { .. })));
    assert_eq!(pager.container().appended(), 0);
    assert!(matches!(pager.state(), PagerState::Failed { .. }));

    let outcome = pager.load_more(&fetcher).await.unwrap();
    assert_eq!(outcome.items.len(), 9);
    assert!(!outcome.exhausted);
    let seen = fetcher.seen();
    assert_eq!(range_of(&seen[0]), range_of(&seen[1]));
}

#[test]
fn runner_rejects_start_without_room_for_a_window() {
    let start = (usize::MAX / 9) * 9;
    assert!(matches!(
        Runner::new(Options {
            start: Some(start),
            ..film_options(1, 0)
        }),
        Err(RunnerError::InvalidStart { window_size: 9, .. })
    ));
}

#[test]
fn injected_markup_is_escaped_end_to_end() {
    let url = Url::parse("http://localhost:8042/results").unwrap();
    let mut pager = ResultsPager::new(url, SchemaFlavor::Card.schema());
    let request = pager.begin_load_more().unwrap();
    let xml = "<cards><card watchable=\"true\"><id>1</id><picture></picture><title>&lt;script&gt;alert(1)&lt;/script&gt;</title><text>&lt;b&gt;x</text></card></cards>";
    pager
        .on_response(request.window, Ok(FetchedPage::ok(xml)))
        .unwrap();

    let markup = pager.container().markup();
    assert!(!markup.contains("<script>"));
    assert!(markup.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(markup.contains("<p>&lt;b&gt;x</p>"));
    assert!(!markup.contains("<img"));
    assert!(markup.starts_with("<a class=\"watchable_film_item\""));
}

#[test]
fn query_round_trips_reserved_characters() {
    let page = Url::parse("http://localhost:8042/results?q=old").unwrap();
    for raw in ["a&b=c", "50% off?", "#1 + #2", "caf\u{e9} / na\u{ef}ve", "  spaced  "] {
        let nav = crate::search::submit_query(&page, &crate::search::SearchTarget::CurrentPage, raw)
            .unwrap();
        assert_eq!(crate::search::query_of(&nav.url).as_deref(), Some(raw));
        assert_eq!(nav.url.query_pairs().count(), 1);
    }
}

#[tokio::test]
async fn html_output_wraps_the_container() {
    let fetcher = ScriptedFetcher::new(vec![Ok(FetchedPage::ok(films_xml(9..12)))]);
    let runner = Runner::new(film_options(1, 0)).unwrap();
    let result = runner
        .run_with(&fetcher, &ProgressBar::hidden())
        .await
        .unwrap();

    let html = String::from_utf8(crate::output::render(
        crate::output::OutputFormat::Html,
        &result,
    ))
    .unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(&result.container.to_html()));
    assert!(html.contains("end of results"));

    let text = String::from_utf8(crate::output::render(
        crate::output::OutputFormat::Text,
        &result,
    ))
    .unwrap();
    assert_eq!(text.lines().count(), 3);
    assert_eq!(text.lines().next(), Some("9\tFilm 9"));
}
