//! Removal of non-content subtrees before extraction.
//!
//! Every extraction strategy assumes a sanitized tree. Sanitizing is
//! idempotent: a second pass finds nothing to remove and the streaming
//! rewriter passes the markup through byte for byte.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::parse::Document;

/// Configuration for sanitizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Tags whose whole subtree is dropped
    pub remove_tags: Vec<String>,
    /// Whether to drop HTML comments
    pub remove_comments: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            remove_tags: [
                "script", "style", "header", "footer", "nav", "aside", "form", "noscript", "iframe", "svg", "canvas",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            remove_comments: true,
        }
    }
}

impl Document {
    /// Returns a sanitized copy of this document.
    pub fn sanitize(&self, config: &SanitizeConfig) -> Document {
        sanitize_document(self, config)
    }
}

/// Sanitize a parsed document, producing a derived copy.
pub fn sanitize_document(doc: &Document, config: &SanitizeConfig) -> Document {
    Document::from_markup(&sanitize_html(&doc.as_string(), config))
}

/// Remove every subtree rooted at one of the configured tags.
///
/// On rewriter failure the input is returned unchanged.
pub fn sanitize_html(html: &str, config: &SanitizeConfig) -> String {
    let tags: Vec<&str> = config
        .remove_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| is_tag_name(t))
        .collect();

    if tags.len() != config.remove_tags.len() {
        warn!("ignoring malformed tag names in sanitize config");
    }

    let mut output: Vec<u8> = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: tags
                .iter()
                .map(|tag| {
                    lol_html::element!(tag, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            document_content_handlers: if config.remove_comments {
                vec![lol_html::doc_comments!(|c| {
                    c.remove();
                    Ok(())
                })]
            } else {
                Vec::new()
            },
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    // Chunk boundaries may split multi-byte characters, so decode once at the end.
    String::from_utf8(output).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn is_tag_name(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
