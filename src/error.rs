use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::matcher::MatchError;

/// Fields pulled out of an item node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Title,
    Price,
    Condition,
    ProductUrl,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Id => "id",
            Field::Title => "title",
            Field::Price => "price",
            Field::Condition => "condition",
            Field::ProductUrl => "product_url",
        };
        f.write_str(name)
    }
}

/// Failure of a single item. Never aborts the crawl.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{field} missing: {reason}")]
    FieldMissing { field: Field, reason: String },

    #[error("failed to serialize item {id}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ItemError {
    pub(crate) fn missing(field: Field, reason: impl Into<String>) -> Self {
        ItemError::FieldMissing {
            field,
            reason: reason.into(),
        }
    }

    /// The field whose extraction failed, if this is an extraction failure.
    pub fn field(&self) -> Option<Field> {
        match self {
            ItemError::FieldMissing { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Failures that end the crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no items found on {url}, the page layout may have changed")]
    NoItems { url: String },

    #[error("next page link on {url} has no usable href: {source}")]
    NextPageHref {
        url: String,
        #[source]
        source: MatchError,
    },

    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
