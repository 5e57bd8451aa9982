use chrono::{DateTime, SecondsFormat, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Metadata read from a page, used to prefill the bookmark form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub twitter_image_url: Option<String>,
    /// Publish time as found on the page, or the capture time (RFC 3339).
    pub publish_date: String,
}

fn first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(css).ok()?;
    doc.select(&sel).next()
}

fn attr(doc: &Html, css: &str, name: &str) -> Option<String> {
    first(doc, css)
        .and_then(|el| el.value().attr(name))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn resolve(page_url: &str, href: &str) -> String {
    match Url::parse(page_url).and_then(|base| base.join(href)) {
        Ok(u) => u.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Reads title, description, favicon, twitter image and publish date from `html`.
///
/// Missing fields come back as `None`; a missing publish date becomes `now`.
pub fn extract_metadata(html: &str, page_url: &str, now: DateTime<Utc>) -> PageMetadata {
    let doc = Html::parse_document(html);

    let title = first(&doc, "title")
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let description = attr(&doc, r#"meta[name="description"]"#, "content");
    let favicon_url = attr(&doc, r#"link[rel*="icon"]"#, "href").map(|href| resolve(page_url, &href));
    let twitter_image_url = attr(&doc, r#"meta[name="twitter:image"]"#, "content");
    let publish_date = attr(&doc, r#"meta[property="article:published_time"]"#, "content")
        .or_else(|| attr(&doc, r#"meta[property="og:published_time"]"#, "content"))
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

    PageMetadata {
        url: page_url.to_string(),
        title,
        description,
        favicon_url,
        twitter_image_url,
        publish_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"<!doctype html>
<html><head>
  <title>
    Rust  async
    in practice
  </title>
  <meta name="description" content="Notes on tokio">
  <link rel="shortcut icon" href="/static/fav.ico">
  <meta name="twitter:image" content="https://cdn.example.com/card.png">
  <meta property="og:published_time" content="2023-05-01T09:00:00Z">
  <meta property="article:published_time" content="2024-02-03T10:20:30+09:00">
</head><body><p>hi</p></body></html>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn extracts_all_fields() {
        let m = extract_metadata(PAGE, "https://blog.example.com/posts/1", now());
        assert_eq!(m.title, "Rust async in practice");
        assert_eq!(m.description.as_deref(), Some("Notes on tokio"));
        assert_eq!(m.favicon_url.as_deref(), Some("https://blog.example.com/static/fav.ico"));
        assert_eq!(m.twitter_image_url.as_deref(), Some("https://cdn.example.com/card.png"));
        assert_eq!(m.publish_date, "2024-02-03T10:20:30+09:00");
        assert_eq!(m.url, "https://blog.example.com/posts/1");
    }

    #[test]
    fn og_time_used_when_article_time_missing() {
        let html = r#"<html><head><meta property="og:published_time" content="2023-05-01T09:00:00Z"></head></html>"#;
        let m = extract_metadata(html, "https://example.com/", now());
        assert_eq!(m.publish_date, "2023-05-01T09:00:00Z");
    }

    #[test]
    fn missing_fields_are_none_and_date_defaults_to_now() {
        let m = extract_metadata("<html><body>bare</body></html>", "https://example.com/", now());
        assert_eq!(m.title, "");
        assert_eq!(m.description, None);
        assert_eq!(m.favicon_url, None);
        assert_eq!(m.twitter_image_url, None);
        assert_eq!(m.publish_date, "2024-06-01T12:00:00.000Z");
    }

    #[test]
    fn empty_meta_content_is_none() {
        let html = r#"<html><head><meta name="description" content="  "></head></html>"#;
        assert_eq!(extract_metadata(html, "https://example.com/", now()).description, None);
    }
}
