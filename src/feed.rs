//! Product feed parsing.
//!
//! The feed is an RSS-ish XML document listing the products worth monitoring.
//! Item blocks are scanned locally with tolerant patterns rather than a full
//! XML parse: feeds in the wild carry namespace prefixes, attribute noise,
//! and the occasional malformed block, and one bad entry must not discard
//! the rest.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ITEM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)<item\b[^>]*>(.*?)</item>").unwrap());
static PRODUCT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)<product\b[^>]*>(.*?)</product>").unwrap());
static ID_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?si)<id[^>]*>(.*?)</id>").unwrap());
static NS_ID_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)<g:id[^>]*>(.*?)</g:id>").unwrap());
static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)<title[^>]*>(.*?)</title>").unwrap());
static NS_TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)<g:title[^>]*>(.*?)</g:title>").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedProduct {
    pub id: String,
    pub title: String,
}

/// Extract up to `limit` products from a feed document.
///
/// `<item>` blocks are preferred; `<product>` blocks are the fallback when a
/// feed omits them entirely. Entries with neither id nor title are skipped.
pub fn parse_feed(xml: &str, limit: usize) -> Vec<FeedProduct> {
    let blocks: Vec<&str> = {
        let items: Vec<&str> = ITEM_BLOCK
            .captures_iter(xml)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        if items.is_empty() {
            PRODUCT_BLOCK
                .captures_iter(xml)
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect()
        } else {
            items
        }
    };

    let mut products = Vec::new();
    for block in blocks {
        let id = tag_text(block, &ID_TAG).or_else(|| tag_text(block, &NS_ID_TAG));
        let title = tag_text(block, &TITLE_TAG).or_else(|| tag_text(block, &NS_TITLE_TAG));

        if id.is_none() && title.is_none() {
            continue;
        }
        products.push(FeedProduct {
            id: id.unwrap_or_default(),
            title: title.unwrap_or_default(),
        });
        if products.len() >= limit {
            break;
        }
    }
    products
}

fn tag_text(block: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| unescape_entities(m.as_str().trim()))
        .filter(|s| !s.is_empty())
}

fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss xmlns:g="http://base.google.com/ns/1.0">
  <channel>
    <item>
      <g:id>10001</g:id>
      <title>Eau de Parfum 50ml</title>
    </item>
    <item>
      <id>10002</id>
      <g:title>Body Lotion &amp; Soap</g:title>
    </item>
    <item>
      <link>https://example.test/no-id-no-title</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items_with_mixed_namespaces() {
        let products = parse_feed(FEED, 500);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0], FeedProduct {
            id: "10001".to_string(),
            title: "Eau de Parfum 50ml".to_string(),
        });
        assert_eq!(products[1].id, "10002");
        assert_eq!(products[1].title, "Body Lotion & Soap");
    }

    #[test]
    fn falls_back_to_product_blocks() {
        let xml = "<catalog><product><id>A1</id><title>Thing</title></product></catalog>";
        let products = parse_feed(xml, 500);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "A1");
    }

    #[test]
    fn respects_the_product_limit() {
        let mut xml = String::from("<rss>");
        for i in 0..10 {
            xml.push_str(&format!("<item><id>{}</id><title>P{}</title></item>", i, i));
        }
        xml.push_str("</rss>");
        assert_eq!(parse_feed(&xml, 3).len(), 3);
    }

    #[test]
    fn empty_feed_yields_nothing() {
        assert!(parse_feed("", 500).is_empty());
        assert!(parse_feed("<rss><channel></channel></rss>", 500).is_empty());
    }
}
