use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, warn};

use crate::error::{CrawlError, ItemError};
use crate::extract;
use crate::matcher::MarkupNode;

/// One listing entry as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub condition: String,
    pub price: String,
    pub product_url: String,
}

impl ItemRecord {
    /// Pretty JSON, tab indented.
    pub fn to_json(&self) -> Result<Vec<u8>, ItemError> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
        self.serialize(&mut ser).map_err(|source| ItemError::Serialize {
            id: self.id.clone(),
            source,
        })?;
        Ok(buf)
    }
}

/// Build a record from one item node. A missing subtitle container is
/// tolerated and leaves the condition empty.
pub fn extract_item(item: MarkupNode<'_>) -> Result<ItemRecord, ItemError> {
    let link = extract::link(item)?;
    let price = extract::price(item)?;
    let title = extract::title(item)?;

    let condition = match extract::condition(item)? {
        Some(condition) => condition,
        None => {
            warn!(item_id = %link.id, "condition container not found");
            String::new()
        }
    };

    Ok(ItemRecord {
        id: link.id,
        title,
        condition,
        price,
        product_url: link.href,
    })
}

/// Writes records as `<output_dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct ItemPipeline {
    output_dir: PathBuf,
}

impl ItemPipeline {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}.json"))
    }

    pub async fn ensure_output_dir(&self) -> Result<(), CrawlError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| CrawlError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })
    }

    /// Overwrites any earlier file for the same id.
    pub async fn persist(&self, record: &ItemRecord) -> Result<PathBuf, ItemError> {
        let path = self.path_for(&record.id);
        let json = record.to_json()?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|source| ItemError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(item_id = %record.id, path = %path.display(), "item saved");
        Ok(path)
    }
}
