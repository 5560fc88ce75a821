//! Title, author, date and source resolution.
//!
//! Every field is resolved independently from the unsanitized document, with
//! a fixed precedence per field. Nothing here fails: malformed JSON-LD is
//! skipped and absent fields fall back to sentinels or `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::Document;

/// Title used when no title source is present.
pub const NO_TITLE: &str = "No Title Found";

/// Author placeholder for display when no author source is present.
pub const NO_AUTHOR: &str = "No Author Found";

/// JSON-LD `@type` values treated as the article node
const ARTICLE_TYPES: &[&str] = &["NewsArticle", "Article", "ReportageNewsArticle", "BlogPosting", "AnalysisNewsArticle"];

/// Resolved document metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub author: Option<String>,
    pub publish_date: Option<String>,
    pub site_name: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self { title: NO_TITLE.to_string(), author: None, publish_date: None, site_name: None }
    }
}

impl Metadata {
    /// The author, or the "No Author Found" placeholder.
    pub fn author_or_sentinel(&self) -> &str {
        self.author.as_deref().unwrap_or(NO_AUTHOR)
    }
}

impl Document {
    /// Resolve every metadata field.
    pub fn resolve_metadata(&self) -> Metadata {
        let json_ld = self.json_ld_article();

        Metadata {
            title: self.resolve_title().unwrap_or_else(|| NO_TITLE.to_string()),
            author: self
                .meta_content("article:author")
                .or_else(|| json_ld.as_ref().and_then(|node| node.get("author")).and_then(author_name)),
            publish_date: self.meta_content("article:published_time").or_else(|| {
                json_ld
                    .as_ref()
                    .and_then(|node| node.get("datePublished"))
                    .and_then(non_empty_str)
            }),
            site_name: self.meta_content("og:site_name").or_else(|| {
                json_ld
                    .as_ref()
                    .and_then(|node| node.get("publisher"))
                    .and_then(|publisher| first_of(publisher).get("name"))
                    .and_then(non_empty_str)
            }),
        }
    }

    /// Title with priority fallback:
    /// 1. First `<h1>` (its nested `<span>` when present)
    /// 2. Open Graph `og:title`
    /// 3. `<title>` element
    pub fn resolve_title(&self) -> Option<String> {
        if let Some(h1) = self.first("h1") {
            let span = h1
                .select("span")
                .unwrap_or_default()
                .iter()
                .map(|s| s.inline_text())
                .find(|t| !t.is_empty());
            let text = span.unwrap_or_else(|| h1.inline_text());
            if !text.is_empty() {
                return Some(text);
            }
        }

        if let Some(title) = self.meta_content("og:title") {
            return Some(title);
        }

        self.title()
    }

    /// Every JSON-LD object on the page, with arrays and `@graph` flattened.
    ///
    /// Script blocks that fail to parse are skipped.
    pub fn json_ld_nodes(&self) -> Vec<Value> {
        let mut nodes = Vec::new();

        for script in self.select("script[type=\"application/ld+json\"]").unwrap_or_default() {
            let text = script.text();
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(value) => flatten_nodes(value, &mut nodes),
                Err(e) => debug!(error = %e, "skipping malformed JSON-LD block"),
            }
        }

        nodes
    }

    /// The JSON-LD node describing the article.
    ///
    /// Prefers a node typed as an article; otherwise the first object.
    pub fn json_ld_article(&self) -> Option<Value> {
        let mut nodes = self.json_ld_nodes();
        let index = nodes.iter().position(is_article_node).unwrap_or(0);
        if nodes.is_empty() { None } else { Some(nodes.swap_remove(index)) }
    }
}

/// JSON-LD `articleBody` of the article node, if present and non-empty.
pub fn json_ld_article_body(doc: &Document) -> Option<String> {
    doc.json_ld_article()?.get("articleBody").and_then(non_empty_str)
}

/// Resolve metadata from a document.
pub fn resolve_metadata(doc: &Document) -> Metadata {
    doc.resolve_metadata()
}

/// Count whitespace-separated words containing at least one alphanumeric character.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

fn flatten_nodes(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten_nodes(item, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_nodes(graph, out);
            }
            if !map.is_empty() {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

fn is_article_node(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(kind)) => ARTICLE_TYPES.contains(&kind.as_str()),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| ARTICLE_TYPES.contains(&kind)),
        _ => false,
    }
}

/// Author as a string, an object with `name`, or the first of an array.
fn author_name(author: &Value) -> Option<String> {
    match author {
        Value::String(_) => non_empty_str(author),
        Value::Object(map) => map.get("name").and_then(non_empty_str),
        Value::Array(items) => items.first().and_then(author_name),
        _ => None,
    }
}

fn first_of(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        _ => value,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML_WITH_META: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Page Title | Daily Planet</title>
            <meta property="og:title" content="OG Title">
            <meta property="og:site_name" content="Daily Planet">
            <meta property="article:author" content="Lois Lane">
            <meta property="article:published_time" content="2024-03-01T08:00:00Z">
            <script type="application/ld+json">
            {"@type": "NewsArticle", "author": {"name": "Jimmy Olsen"}, "datePublished": "2020-01-01"}
            </script>
        </head>
        <body><h1>Heading <span>Span Headline</span></h1></body>
        </html>
    "#;

    const HTML_JSON_LD_ONLY: &str = r#"
        <html><head>
            <script type="application/ld+json">{ not valid json </script>
            <script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
                {"@type": "WebSite", "name": "Site"},
                {"@type": ["NewsArticle"], "author": [{"name": "Clark Kent"}, {"name": "Other"}],
                 "datePublished": "2024-05-05", "publisher": {"name": "Planet Media"},
                 "articleBody": "Structured body"}
            ]}
            </script>
        </head><body><p>Text</p></body></html>
    "#;

    #[test]
    fn test_meta_tags_win() {
        let doc = Document::parse(HTML_WITH_META).unwrap();
        let metadata = doc.resolve_metadata();

        assert_eq!(metadata.title, "Span Headline");
        assert_eq!(metadata.author, Some("Lois Lane".to_string()));
        assert_eq!(metadata.publish_date, Some("2024-03-01T08:00:00Z".to_string()));
        assert_eq!(metadata.site_name, Some("Daily Planet".to_string()));
    }

    #[test]
    fn test_json_ld_fallback() {
        let doc = Document::parse(HTML_JSON_LD_ONLY).unwrap();
        let metadata = doc.resolve_metadata();

        assert_eq!(metadata.title, NO_TITLE);
        assert_eq!(metadata.author, Some("Clark Kent".to_string()));
        assert_eq!(metadata.publish_date, Some("2024-05-05".to_string()));
        assert_eq!(metadata.site_name, Some("Planet Media".to_string()));
        assert_eq!(json_ld_article_body(&doc), Some("Structured body".to_string()));
    }

    #[test]
    fn test_title_fallback_chain() {
        let doc = Document::parse(r#"<head><meta property="og:title" content="OG"><title>T</title></head>"#).unwrap();
        assert_eq!(doc.resolve_title(), Some("OG".to_string()));

        let doc = Document::parse("<head><title> Only Title </title></head><h1>  </h1>").unwrap();
        assert_eq!(doc.resolve_title(), Some("Only Title".to_string()));

        let doc = Document::parse("<h1>Plain   heading</h1>").unwrap();
        assert_eq!(doc.resolve_title(), Some("Plain heading".to_string()));
    }

    #[test]
    fn test_missing_everything() {
        let doc = Document::parse("<html><body></body></html>").unwrap();
        let metadata = doc.resolve_metadata();

        assert_eq!(metadata, Metadata::default());
        assert_eq!(metadata.author_or_sentinel(), NO_AUTHOR);
    }

    #[test]
    fn test_author_shapes() {
        assert_eq!(author_name(&serde_json::json!("Plain")), Some("Plain".to_string()));
        assert_eq!(author_name(&serde_json::json!({"name": "Obj"})), Some("Obj".to_string()));
        assert_eq!(author_name(&serde_json::json!([{"name": "First"}, "Second"])), Some("First".to_string()));
        assert_eq!(author_name(&serde_json::json!(42)), None);
        assert_eq!(author_name(&serde_json::json!([])), None);
    }

    #[test]
    fn test_untyped_json_ld_uses_first_object() {
        let html = r#"<script type="application/ld+json">[{"author": "Anon", "datePublished": ""}]</script>"#;
        let doc = Document::parse(html).unwrap();
        let metadata = doc.resolve_metadata();

        assert_eq!(metadata.author, Some("Anon".to_string()));
        assert_eq!(metadata.publish_date, None);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("One two, three — four."), 4);
        assert_eq!(count_words(""), 0);
    }
}
