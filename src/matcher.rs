//! Tag/attribute search over a parsed markup tree.
//!
//! Class matching is substring based, so `"s-item__price"` matches an element
//! carrying `class="s-item__price is-bold"`.

use ego_tree::NodeRef;
use scraper::Node;
use thiserror::Error;

/// A node of the tree produced by [`scraper::Html`].
pub type MarkupNode<'a> = NodeRef<'a, Node>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("node is not an element")]
    NotAnElement,

    #[error("attribute `{0}` not found")]
    AttributeNotFound(String),
}

/// Collect every `tag` element under `root` (inclusive, pre-order) whose
/// `class` contains `class_substring` and which carries a non-empty `id`.
///
/// Matching elements are descended into as well, so nested matches are
/// returned after their ancestor.
pub fn find_all_by_class<'a>(
    root: MarkupNode<'a>,
    tag: &str,
    class_substring: &str,
) -> Vec<MarkupNode<'a>> {
    let mut found = Vec::new();
    collect_by_class(root, tag, class_substring, &mut found);
    found
}

fn collect_by_class<'a>(
    node: MarkupNode<'a>,
    tag: &str,
    class_substring: &str,
    found: &mut Vec<MarkupNode<'a>>,
) {
    if let Some(element) = node.value().as_element() {
        if element.name() == tag {
            let mut has_class = false;
            let mut has_id = false;

            for (key, value) in element.attrs() {
                if key == "class" && value.contains(class_substring) {
                    has_class = true;
                } else if key == "id" && !value.is_empty() {
                    has_id = true;
                }

                if has_class && has_id {
                    found.push(node);
                    break;
                }
            }
        }
    }

    for child in node.children() {
        collect_by_class(child, tag, class_substring, found);
    }
}

/// First `tag` element under `root` (inclusive, pre-order) that has an
/// attribute `attr_name` whose value contains `value_substring`.
pub fn find_first_by_attr<'a>(
    root: MarkupNode<'a>,
    tag: &str,
    attr_name: &str,
    value_substring: &str,
) -> Option<MarkupNode<'a>> {
    if let Some(element) = root.value().as_element() {
        if element.name() == tag
            && element
                .attrs()
                .any(|(key, value)| key == attr_name && value.contains(value_substring))
        {
            return Some(root);
        }
    }

    root.children()
        .filter(|child| child.value().is_element())
        .find_map(|child| find_first_by_attr(child, tag, attr_name, value_substring))
}

/// Raw text of the first direct text child of `node`.
pub fn first_text_value(node: MarkupNode<'_>) -> Option<String> {
    node.children().find_map(|child| match child.value() {
        Node::Text(text) => {
            let raw: &str = text;
            Some(raw.to_owned())
        }
        _ => None,
    })
}

/// Value of the attribute named exactly `attr_name`.
pub fn attr_value(node: MarkupNode<'_>, attr_name: &str) -> Result<String, MatchError> {
    let element = node.value().as_element().ok_or(MatchError::NotAnElement)?;

    element
        .attrs()
        .find(|(key, _)| *key == attr_name)
        .map(|(_, value)| value.to_owned())
        .ok_or_else(|| MatchError::AttributeNotFound(attr_name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const LISTING: &str = r#"
        <html><body>
          <ul>
            <li class="s-item s-item__pl-on-bottom" id="item1">
              <span class="s-item__price">$10.00</span>
            </li>
            <li class="s-item">no id here</li>
            <li class="s-item__wrapper" id="">empty id</li>
            <li id="item2" class="s-item">
              <ul><li class="s-item nested" id="item3">inner</li></ul>
            </li>
            <li class="other" id="item4">other</li>
          </ul>
          <div class="pagination">
            <a class="pagination__next icon-link" href="/page/2">Next</a>
          </div>
        </body></html>
    "#;

    fn ids(nodes: &[MarkupNode<'_>]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| attr_value(*n, "id").unwrap())
            .collect()
    }

    #[test]
    fn find_all_requires_class_and_id_in_document_order() {
        let html = Html::parse_document(LISTING);
        let items = find_all_by_class(html.tree.root(), "li", "s-item");

        assert_eq!(ids(&items), vec!["item1", "item2", "item3"]);
        for item in &items {
            let class = attr_value(*item, "class").unwrap();
            assert!(class.contains("s-item"));
        }
    }

    #[test]
    fn find_all_returns_empty_when_nothing_matches() {
        let html = Html::parse_document(LISTING);
        assert!(find_all_by_class(html.tree.root(), "article", "s-item").is_empty());
        assert!(find_all_by_class(html.tree.root(), "li", "missing").is_empty());
    }

    #[test]
    fn find_first_matches_attribute_substring() {
        let html = Html::parse_document(LISTING);
        let next = find_first_by_attr(html.tree.root(), "a", "class", "pagination__next icon-link")
            .expect("next anchor");

        assert_eq!(attr_value(next, "href").unwrap(), "/page/2");
    }

    #[test]
    fn find_first_checks_node_before_descendants() {
        let html = Html::parse_document(LISTING);
        let first = find_first_by_attr(html.tree.root(), "li", "class", "s-item").unwrap();
        assert_eq!(attr_value(first, "id").unwrap(), "item1");

        let outer = find_first_by_attr(html.tree.root(), "li", "id", "item2").unwrap();
        let from_outer = find_first_by_attr(outer, "li", "class", "s-item").unwrap();
        assert_eq!(attr_value(from_outer, "id").unwrap(), "item2");
    }

    #[test]
    fn find_first_is_none_without_a_match() {
        let html = Html::parse_document(LISTING);
        assert!(find_first_by_attr(html.tree.root(), "a", "class", "pagination__prev").is_none());
        assert!(find_first_by_attr(html.tree.root(), "a", "rel", "next").is_none());
    }

    #[test]
    fn first_text_value_only_looks_at_direct_children() {
        let html = Html::parse_document(
            r#"<div id="a"><span>nested only</span></div><p id="b"><span>x</span>direct</p>"#,
        );
        let a = find_first_by_attr(html.tree.root(), "div", "id", "a").unwrap();
        let b = find_first_by_attr(html.tree.root(), "p", "id", "b").unwrap();

        assert_eq!(first_text_value(a), None);
        assert_eq!(first_text_value(b).as_deref(), Some("direct"));
    }

    #[test]
    fn attr_value_reports_missing_attribute_and_non_elements() {
        let html = Html::parse_document(r#"<p id="para">text</p>"#);
        let p = find_first_by_attr(html.tree.root(), "p", "id", "para").unwrap();

        assert_eq!(
            attr_value(p, "href"),
            Err(MatchError::AttributeNotFound("href".to_owned()))
        );

        let text = p.first_child().unwrap();
        assert_eq!(attr_value(text, "id"), Err(MatchError::NotAnElement));
    }
}
