use serde::{Deserialize, Serialize};

use crate::parse::Element;

/// Weights for the block density score
///
/// `score = text_length + paragraph × paragraphs + link × links + image × images`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityWeights {
    /// Reward per `<p>` descendant
    pub paragraph: i64,
    /// Penalty per `<a>` descendant (negative)
    pub link: i64,
    /// Penalty per `<img>` descendant (negative)
    pub image: i64,
}

impl Default for DensityWeights {
    fn default() -> Self {
        Self { paragraph: 20, link: -10, image: -10 }
    }
}

/// Result of scoring a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockScore {
    /// The element's tag name
    pub tag_name: String,
    /// The element's class attribute (if present)
    pub class: Option<String>,
    /// Characters of rendered text
    pub text_length: usize,
    /// Number of `<p>` descendants
    pub paragraphs: usize,
    /// Number of `<a>` descendants
    pub links: usize,
    /// Number of `<img>` descendants
    pub images: usize,
    /// Final density score
    pub score: i64,
}

/// Score a block by prose density.
///
/// Long text and many paragraphs raise the score; link farms and image
/// galleries lower it.
pub fn score_block(element: &Element<'_>, weights: &DensityWeights) -> BlockScore {
    let text_length = element.block_text().chars().count();
    let paragraphs = element.count("p");
    let links = element.count("a");
    let images = element.count("img");

    let score = text_length as i64
        + weights.paragraph * paragraphs as i64
        + weights.link * links as i64
        + weights.image * images as i64;

    BlockScore {
        tag_name: element.tag_name(),
        class: element.attr("class").map(|s| s.to_string()),
        text_length,
        paragraphs,
        links,
        images,
        score,
    }
}

/// Link density: share of text characters that sit inside links (0.0 to 1.0).
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.inline_text().chars().count();

    if text_length == 0 {
        return 0.0;
    }

    let link_text_length = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.inline_text().chars().count())
        .sum::<usize>();

    (link_text_length as f64 / text_length as f64).min(1.0)
}
