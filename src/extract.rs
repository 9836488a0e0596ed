//! Per-field extraction recipes for one listing entry.
//!
//! Each recipe locates its node with the matcher and normalizes the text it
//! finds. Mandatory fields fail with [`ItemError::FieldMissing`]; the condition
//! is optional as long as its container is absent.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Field, ItemError};
use crate::matcher::{attr_value, find_first_by_attr, first_text_value, MarkupNode};

static ITEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"itm/([0-9]+)\?").expect("item id pattern"));

static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]+\d+)*").expect("price pattern"));

/// The item link: its href doubles as the product url and carries the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLink {
    pub id: String,
    pub href: String,
}

pub fn link(item: MarkupNode<'_>) -> Result<ItemLink, ItemError> {
    let anchor = find_first_by_attr(item, "a", "class", "s-item__link")
        .ok_or_else(|| ItemError::missing(Field::ProductUrl, "item link node not found"))?;

    let href = attr_value(anchor, "href")
        .map_err(|e| ItemError::missing(Field::ProductUrl, e.to_string()))?;

    let id = item_id(&href)
        .ok_or_else(|| ItemError::missing(Field::Id, format!("no item id in `{href}`")))?;

    Ok(ItemLink { id, href })
}

pub fn price(item: MarkupNode<'_>) -> Result<String, ItemError> {
    let node = find_first_by_attr(item, "span", "class", "s-item__price")
        .ok_or_else(|| ItemError::missing(Field::Price, "price node not found"))?;

    let raw = first_text_value(node)
        .ok_or_else(|| ItemError::missing(Field::Price, "price value not found"))?;

    normalize_price(&raw)
        .ok_or_else(|| ItemError::missing(Field::Price, format!("cannot parse `{}`", raw.trim())))
}

pub fn title(item: MarkupNode<'_>) -> Result<String, ItemError> {
    let container = find_first_by_attr(item, "div", "class", "s-item__title")
        .ok_or_else(|| ItemError::missing(Field::Title, "title container not found"))?;

    let heading = find_first_by_attr(container, "span", "role", "heading")
        .ok_or_else(|| ItemError::missing(Field::Title, "heading span not found"))?;

    first_text_value(heading)
        .ok_or_else(|| ItemError::missing(Field::Title, "title value not found"))
}

/// `Ok(None)` when the item has no subtitle container at all.
pub fn condition(item: MarkupNode<'_>) -> Result<Option<String>, ItemError> {
    let Some(subtitle) = find_first_by_attr(item, "div", "class", "s-item__subtitle") else {
        return Ok(None);
    };

    let node = find_first_by_attr(subtitle, "span", "class", "SECONDARY_INFO")
        .ok_or_else(|| ItemError::missing(Field::Condition, "condition span not found"))?;

    first_text_value(node)
        .map(Some)
        .ok_or_else(|| ItemError::missing(Field::Condition, "condition value not found"))
}

pub fn item_id(href: &str) -> Option<String> {
    ITEM_ID
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// First numeric token, keeping thousands and decimal separators.
pub fn normalize_price(raw: &str) -> Option<String> {
    PRICE.find(raw).map(|m| m.as_str().to_owned())
}
