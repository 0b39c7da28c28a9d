//! Anchor extraction from directory-listing HTML.

use std::sync::LazyLock;

use scraper::{Html, Selector};

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Selector::parse("a").expect("BUG: hardcoded CSS selector 'a' is invalid")
});

/// One anchor from a listing page, classified by its href shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLink {
    /// Href ends in a path separator: a sub-directory listing to recurse into.
    SubListing(String),
    /// Any other href: a downloadable leaf.
    Leaf(String),
}

/// Extracts classified hrefs from listing HTML, in document order.
///
/// Rules, per anchor:
/// - anchors without an `href` attribute are skipped;
/// - hrefs starting with `..` are skipped — this blocks upward traversal out
///   of the listing tree and is the crawl's only loop guard;
/// - hrefs ending in `/` are sub-listings, everything else is a leaf.
///
/// Malformed HTML never fails: the parser is lenient, and a page with zero
/// usable anchors yields an empty list.
#[must_use]
pub fn listing_links(html: &str) -> Vec<ListingLink> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| !href.is_empty() && !href.starts_with(".."))
        .map(|href| {
            if href.ends_with('/') {
                ListingLink::SubListing(href.to_string())
            } else {
                ListingLink::Leaf(href.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_sublistings_and_leaves() {
        let html = r#"<html><body>
            <a href="/files/sub/">sub</a>
            <a href="/files/a.zip">a.zip</a>
            <a href="/files/b.zip">b.zip</a>
        </body></html>"#;

        assert_eq!(
            listing_links(html),
            vec![
                ListingLink::SubListing("/files/sub/".to_string()),
                ListingLink::Leaf("/files/a.zip".to_string()),
                ListingLink::Leaf("/files/b.zip".to_string()),
            ]
        );
    }

    #[test]
    fn test_parent_directory_hrefs_are_skipped() {
        let html = r#"<a href="../">up</a><a href="..">up</a><a href="/files/a.zip">a</a>"#;
        assert_eq!(
            listing_links(html),
            vec![ListingLink::Leaf("/files/a.zip".to_string())]
        );
    }

    #[test]
    fn test_anchor_without_href_is_skipped() {
        let html = r#"<a name="top">anchor</a><a href="/files/a.zip">a</a>"#;
        assert_eq!(
            listing_links(html),
            vec![ListingLink::Leaf("/files/a.zip".to_string())]
        );
    }

    #[test]
    fn test_empty_href_is_skipped() {
        let html = r#"<a href="">blank</a>"#;
        assert!(listing_links(html).is_empty());
    }

    #[test]
    fn test_page_with_no_anchors_yields_nothing() {
        assert!(listing_links("<html><body><p>empty dir</p></body></html>").is_empty());
    }

    #[test]
    fn test_malformed_html_does_not_fail() {
        let html = r#"<html><a href="/files/a.zip">a<div><a href="/files/sub/"#;
        let links = listing_links(html);
        assert!(
            links.contains(&ListingLink::Leaf("/files/a.zip".to_string())),
            "leaf must survive malformed markup: {links:?}"
        );
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(listing_links("").is_empty());
    }

    #[test]
    fn test_document_order_is_preserved() {
        let html = r#"
            <a href="/z.zip">z</a>
            <a href="/a/">a</a>
            <a href="/m.zip">m</a>
        "#;
        assert_eq!(
            listing_links(html),
            vec![
                ListingLink::Leaf("/z.zip".to_string()),
                ListingLink::SubListing("/a/".to_string()),
                ListingLink::Leaf("/m.zip".to_string()),
            ]
        );
    }
}
