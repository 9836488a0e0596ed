use std::path::PathBuf;

use url::Url;

use crate::error::CrawlError;

pub const DEFAULT_BASE_URL: &str = "https://www.ebay.com/sch/garlandcomputer/m.html";
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Query key of the item condition filter.
pub const CONDITION_PARAM: &str = "LH_ItemCondition";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: Url,
    pub output_dir: PathBuf,
    /// `None` follows next-page links until they run out.
    pub max_pages: Option<usize>,
}

impl CrawlConfig {
    pub fn new(base_url: &str, condition: Option<i64>) -> Result<Self, CrawlError> {
        let mut start_url = Url::parse(base_url).map_err(|source| CrawlError::InvalidUrl {
            url: base_url.to_owned(),
            source,
        })?;

        if let Some(condition) = condition {
            start_url
                .query_pairs_mut()
                .append_pair(CONDITION_PARAM, &condition.to_string());
        }

        Ok(Self {
            start_url,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_pages: None,
        })
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }
}
