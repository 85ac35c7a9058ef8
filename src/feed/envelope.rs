use serde::Deserialize;

use crate::extract;
use crate::models::{Review, UNKNOWN_VERSION};

/// Top-level wrapper of a feed response. A body without the `feed` key is a
/// malformed response and fails to parse.
#[derive(Debug, Deserialize)]
pub struct FeedDocument {
    pub feed: FeedEnvelope,
}

/// Transient parsed form of one response body; never persisted.
#[derive(Debug, Default, Deserialize)]
pub struct FeedEnvelope {
    #[serde(default)]
    pub link: Vec<Link>,
    #[serde(default)]
    pub entry: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub attributes: LinkAttributes,
}

#[derive(Debug, Deserialize)]
pub struct LinkAttributes {
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub href: String,
}

/// Leaf values in the feed all arrive as `{"label": "..."}` wrappers.
#[derive(Debug, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Author {
    pub name: Option<Label>,
    pub uri: Option<Label>,
}

/// One feed item. Every field is optional at the wire level; validation
/// happens in `to_review` so a single malformed item is skipped instead of
/// failing the whole page.
#[derive(Debug, Default, Deserialize)]
pub struct FeedItem {
    pub id: Option<Label>,
    #[serde(rename = "im:version")]
    pub version: Option<Label>,
    #[serde(rename = "im:rating")]
    pub rating: Option<Label>,
    pub author: Option<Author>,
    pub title: Option<Label>,
    pub content: Option<Label>,
    pub rights: Option<Label>,
}

pub fn parse_feed(body: &[u8]) -> Result<FeedEnvelope, serde_json::Error> {
    let doc: FeedDocument = serde_json::from_slice(body)?;
    Ok(doc.feed)
}

impl FeedEnvelope {
    /// Page count encoded in the pagination link tagged `last`; 1 when no
    /// such link exists or it carries no extractable page number. The last
    /// matching link wins when several are present.
    pub fn last_page_number(&self) -> i64 {
        let href = self
            .link
            .iter()
            .rev()
            .find(|l| l.attributes.rel == "last")
            .map(|l| l.attributes.href.as_str());
        match href {
            Some(href) if !href.is_empty() => extract::page_from_url(href).unwrap_or(1),
            _ => 1,
        }
    }
}

impl FeedItem {
    /// Items carrying a `rights` marker are removed or inaccessible reviews
    /// and must not be persisted.
    pub fn is_restricted(&self) -> bool {
        self.rights.is_some()
    }

    /// Build a normalized review, or `None` when a required field is absent
    /// or unparsable. The version label defaults to `UNKNOWN` when the feed
    /// omits it.
    pub fn to_review(&self, app_id: i64) -> Option<Review> {
        let review_id: i64 = self.id.as_ref()?.label.parse().ok()?;
        let rating: i64 = self.rating.as_ref()?.label.parse().ok()?;
        let author = self.author.as_ref()?;
        let author_name = author.name.as_ref()?.label.clone();
        let author_id = extract::author_id_from_uri(&author.uri.as_ref()?.label)?;

        Some(Review {
            review_id,
            app_id,
            app_version: self
                .version
                .as_ref()
                .map(|v| v.label.clone())
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            author_id,
            author_name,
            rating,
            title: self.title.as_ref()?.label.clone(),
            content: self.content.as_ref()?.label.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_json(review_id: i64, rights: bool, version: Option<&str>) -> String {
        let rights_part = if rights {
            r#""rights": {"label": "restricted"},"#
        } else {
            ""
        };
        let version_part = version
            .map(|v| format!(r#""im:version": {{"label": "{v}"}},"#))
            .unwrap_or_default();
        format!(
            r#"{{
                "id": {{"label": "{review_id}"}},
                {rights_part}
                {version_part}
                "im:rating": {{"label": "4"}},
                "author": {{
                    "name": {{"label": "reviewer"}},
                    "uri": {{"label": "https://itunes.apple.com/us/reviews/id52340561"}}
                }},
                "title": {{"label": "Great"}},
                "content": {{"label": "Works well."}}
            }}"#
        )
    }

    fn feed_json(last_href: Option<&str>, items: &[String]) -> String {
        let link = match last_href {
            Some(href) => format!(
                r#"[{{"attributes": {{"rel": "first", "href": ""}}}},
                    {{"attributes": {{"rel": "last", "href": "{href}"}}}}]"#
            ),
            None => "[]".to_string(),
        };
        format!(
            r#"{{"feed": {{"link": {link}, "entry": [{}]}}}}"#,
            items.join(",")
        )
    }

    #[test]
    fn missing_feed_wrapper_is_malformed() {
        assert!(parse_feed(br#"{"not_feed": {}}"#).is_err());
    }

    #[test]
    fn last_link_encodes_page_count() {
        let json = feed_json(
            Some("https://itunes.apple.com/us/rss/customerreviews/page=3/id=42/sortby=mostrecent/json"),
            &[],
        );
        let feed = parse_feed(json.as_bytes()).unwrap();
        assert_eq!(feed.last_page_number(), 3);
    }

    #[test]
    fn absent_last_link_means_one_page() {
        let feed = parse_feed(feed_json(None, &[]).as_bytes()).unwrap();
        assert_eq!(feed.last_page_number(), 1);
    }

    #[test]
    fn unextractable_last_link_defaults_to_one_page() {
        let feed = parse_feed(
            feed_json(Some("https://example.com/no-page-marker"), &[]).as_bytes(),
        )
        .unwrap();
        assert_eq!(feed.last_page_number(), 1);
    }

    #[test]
    fn item_converts_to_review() {
        let json = feed_json(None, &[item_json(1001, false, Some("2.3"))]);
        let feed = parse_feed(json.as_bytes()).unwrap();
        let review = feed.entry[0].to_review(42).unwrap();
        assert_eq!(review.review_id, 1001);
        assert_eq!(review.app_id, 42);
        assert_eq!(review.app_version, "2.3");
        assert_eq!(review.author_id, 52340561);
        assert_eq!(review.rating, 4);
    }

    #[test]
    fn missing_version_defaults_to_unknown() {
        let json = feed_json(None, &[item_json(1001, false, None)]);
        let feed = parse_feed(json.as_bytes()).unwrap();
        let review = feed.entry[0].to_review(42).unwrap();
        assert_eq!(review.app_version, UNKNOWN_VERSION);
    }

    #[test]
    fn restricted_item_is_flagged() {
        let json = feed_json(None, &[item_json(1001, true, Some("1.0"))]);
        let feed = parse_feed(json.as_bytes()).unwrap();
        assert!(feed.entry[0].is_restricted());
    }

    #[test]
    fn item_without_author_uri_is_rejected() {
        let json = r#"{"feed": {"entry": [{
            "id": {"label": "1"},
            "im:rating": {"label": "5"},
            "author": {"name": {"label": "reviewer"}},
            "title": {"label": "t"},
            "content": {"label": "c"}
        }]}}"#;
        let feed = parse_feed(json.as_bytes()).unwrap();
        assert!(feed.entry[0].to_review(42).is_none());
    }
}
