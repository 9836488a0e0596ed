//! Page loop: fetch, parse, extract, persist, follow the next link.

use std::collections::HashSet;

use reqwest::Client;
use scraper::Html;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{CrawlError, ItemError};
use crate::matcher::{attr_value, find_all_by_class, find_first_by_attr, MatchError};
use crate::pipeline::{extract_item, ItemPipeline, ItemRecord};

const ITEM_TAG: &str = "li";
const ITEM_CLASS: &str = "s-item";
const NEXT_PAGE_CLASS: &str = "pagination__next icon-link";

/// Cursor threaded through the page loop.
#[derive(Debug, Clone)]
pub struct CrawlState {
    pub current_url: Url,
    pub has_more_pages: bool,
    pages: usize,
    visited: HashSet<String>,
}

impl CrawlState {
    pub fn new(start_url: Url) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start_url.as_str().to_owned());

        Self {
            current_url: start_url,
            has_more_pages: true,
            pages: 0,
            visited,
        }
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Record the page just processed and move to `next`, if any.
    pub fn advance(&mut self, next: Option<Url>, max_pages: Option<usize>) {
        self.pages += 1;

        let Some(next) = next else {
            debug!(url = %self.current_url, "no next page link, last page reached");
            self.has_more_pages = false;
            return;
        };

        if max_pages.is_some_and(|max| self.pages >= max) {
            info!(pages = self.pages, "reached max pages limit, stopping crawl");
            self.has_more_pages = false;
            return;
        }

        if !self.visited.insert(next.as_str().to_owned()) {
            warn!(url = %next, "next page was already visited, stopping crawl");
            self.has_more_pages = false;
            return;
        }

        self.current_url = next;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages: usize,
    pub persisted: usize,
    pub skipped: usize,
}

/// What one parsed page yields. Owns everything, so the tree can be dropped
/// before any await point.
#[derive(Debug)]
pub struct PageScan {
    pub items: Vec<Result<ItemRecord, ItemError>>,
    /// `None` on the last page, otherwise the next anchor's href.
    pub next_page: Option<Result<String, MatchError>>,
}

/// Parse a result page, extract every item and locate the next-page link.
pub fn scan_page(body: &str, url: &Url) -> Result<PageScan, CrawlError> {
    let document = Html::parse_document(body);
    if !document.errors.is_empty() {
        debug!(url = %url, errors = document.errors.len(), "page parsed with recoverable errors");
    }

    let root = document.tree.root();
    let nodes = find_all_by_class(root, ITEM_TAG, ITEM_CLASS);
    if nodes.is_empty() {
        return Err(CrawlError::NoItems {
            url: url.to_string(),
        });
    }

    let next_page =
        find_first_by_attr(root, "a", "class", NEXT_PAGE_CLASS).map(|anchor| attr_value(anchor, "href"));

    Ok(PageScan {
        items: nodes.into_iter().map(extract_item).collect(),
        next_page,
    })
}

/// Resolve the next anchor's href against the page it was found on.
pub fn resolve_next(current: &Url, href: Result<String, MatchError>) -> Result<Url, CrawlError> {
    let href = href.map_err(|source| CrawlError::NextPageHref {
        url: current.to_string(),
        source,
    })?;

    current.join(&href).map_err(|source| CrawlError::InvalidUrl { url: href, source })
}

#[derive(Debug, Default)]
struct PageOutcome {
    persisted: usize,
    skipped: usize,
}

pub struct Crawler {
    client: Client,
    pipeline: ItemPipeline,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: CrawlConfig) -> Self {
        let pipeline = ItemPipeline::new(config.output_dir.clone());
        Self {
            client,
            pipeline,
            config,
        }
    }

    /// Crawl from the start url until no next page remains.
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        self.pipeline.ensure_output_dir().await?;

        let mut state = CrawlState::new(self.config.start_url.clone());
        let mut summary = CrawlSummary::default();

        while state.has_more_pages {
            let url = state.current_url.clone();
            info!(page = state.pages() + 1, url = %url, "fetching page");

            let body = self.fetch(&url).await?;
            let scan = scan_page(&body, &url)?;
            info!(url = %url, items = scan.items.len(), "found items");

            let outcome = self.dispatch(scan.items).await;
            summary.pages += 1;
            summary.persisted += outcome.persisted;
            summary.skipped += outcome.skipped;

            let next = scan
                .next_page
                .map(|href| resolve_next(&url, href))
                .transpose()?;
            state.advance(next, self.config.max_pages);
        }

        info!(
            pages = summary.pages,
            persisted = summary.persisted,
            skipped = summary.skipped,
            "crawl complete"
        );
        Ok(summary)
    }

    async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CrawlError::Request {
                url: url.to_string(),
                source,
            })?;

        response.text().await.map_err(|source| CrawlError::Body {
            url: url.to_string(),
            source,
        })
    }

    /// One task per extracted record; returns once every task has finished.
    async fn dispatch(&self, items: Vec<Result<ItemRecord, ItemError>>) -> PageOutcome {
        let mut outcome = PageOutcome::default();
        let mut tasks = JoinSet::new();

        for item in items {
            match item {
                Ok(record) => {
                    let pipeline = self.pipeline.clone();
                    tasks.spawn(async move {
                        let saved = pipeline.persist(&record).await;
                        (record.id, saved)
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed processing item");
                    outcome.skipped += 1;
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => outcome.persisted += 1,
                Ok((item_id, Err(e))) => {
                    error!(item_id = %item_id, error = %e, "failed saving item");
                    outcome.skipped += 1;
                }
                Err(e) => {
                    error!(error = %e, "item task panicked or was cancelled");
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    const PAGE: &str = r#"
        <ul class="srp-results">
          <li class="s-item" id="a1">
            <a class="s-item__link" href="https://www.ebay.com/itm/111?h=1">
              <div class="s-item__title"><span role="heading">First</span></div>
            </a>
            <span class="s-item__price">$10.00</span>
          </li>
          <li class="s-item" id="a2">
            <a class="s-item__link" href="https://www.ebay.com/itm/222?h=2">
              <div class="s-item__title"><span role="heading">Second</span></div>
            </a>
          </li>
        </ul>
        <a class="pagination__next icon-link" href="?_pgn=2">Next</a>
    "#;

    #[test]
    fn scan_keeps_per_item_results_and_next_link() {
        let scan = scan_page(PAGE, &url("https://www.ebay.com/sch/m.html")).unwrap();

        assert_eq!(scan.items.len(), 2);
        assert_eq!(scan.items[0].as_ref().unwrap().title, "First");
        assert!(scan.items[1].is_err());
        assert_eq!(scan.next_page, Some(Ok("?_pgn=2".to_owned())));
    }

    #[test]
    fn scan_without_items_is_fatal() {
        let err = scan_page("<ul><li class=\"s-item\">no id</li></ul>", &url("https://x.test/"))
            .unwrap_err();
        assert!(matches!(err, CrawlError::NoItems { .. }));
    }

    #[test]
    fn relative_next_link_is_resolved() {
        let current = url("https://www.ebay.com/sch/m.html?LH_ItemCondition=3");
        let next = resolve_next(&current, Ok("?_pgn=2".to_owned())).unwrap();
        assert_eq!(next.as_str(), "https://www.ebay.com/sch/m.html?_pgn=2");
    }

    #[test]
    fn next_link_without_href_is_fatal() {
        let err = resolve_next(
            &url("https://x.test/"),
            Err(MatchError::AttributeNotFound("href".to_owned())),
        )
        .unwrap_err();
        assert!(matches!(err, CrawlError::NextPageHref { .. }));
    }

    #[test]
    fn state_stops_without_next_page() {
        let mut state = CrawlState::new(url("https://x.test/1"));
        state.advance(Some(url("https://x.test/2")), None);
        assert!(state.has_more_pages);
        assert_eq!(state.current_url.as_str(), "https://x.test/2");

        state.advance(None, None);
        assert!(!state.has_more_pages);
        assert_eq!(state.pages(), 2);
    }

    #[test]
    fn state_stops_on_revisit_and_page_limit() {
        let mut state = CrawlState::new(url("https://x.test/1"));
        state.advance(Some(url("https://x.test/1")), None);
        assert!(!state.has_more_pages);

        let mut state = CrawlState::new(url("https://x.test/1"));
        state.advance(Some(url("https://x.test/2")), Some(1));
        assert!(!state.has_more_pages);
        assert_eq!(state.current_url.as_str(), "https://x.test/1");
    }
}
