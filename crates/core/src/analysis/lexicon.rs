//! Offline lexicon analyzer.
//!
//! Sentiment follows the valence-lexicon approach: each known word carries a
//! valence in `[-4, 4]`, adjusted by preceding intensifiers and negations and
//! by a contrastive "but". The sum is normalized into `[-1, 1]` with
//! `x / sqrt(x² + 15)`.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{AnalysisResult, Analyzer, Category};
use crate::Result;

/// Normalization constant for the compound score
const ALPHA: f64 = 15.0;

/// Intensifier increment
const BOOST: f64 = 0.293;

/// Valence multiplier for negated words
const NEGATION_SCALAR: f64 = -0.74;

/// How many preceding tokens can negate or intensify a word
const WINDOW: usize = 3;

const VALENCE: &[(&str, f64)] = &[
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("wonderful", 2.7),
    ("happy", 2.7),
    ("love", 3.2),
    ("loved", 2.9),
    ("best", 3.2),
    ("better", 1.9),
    ("nice", 1.8),
    ("win", 2.8),
    ("wins", 2.7),
    ("won", 2.7),
    ("victory", 2.8),
    ("success", 2.7),
    ("successful", 2.8),
    ("celebrate", 2.7),
    ("celebrated", 2.7),
    ("hope", 1.9),
    ("hopeful", 2.3),
    ("promise", 1.3),
    ("promising", 1.7),
    ("improve", 1.9),
    ("improved", 2.1),
    ("benefit", 2.0),
    ("benefits", 1.6),
    ("support", 1.7),
    ("supported", 1.8),
    ("agree", 1.5),
    ("agreed", 1.1),
    ("praise", 2.6),
    ("praised", 2.2),
    ("breakthrough", 2.0),
    ("groundbreaking", 2.2),
    ("safe", 1.9),
    ("safety", 1.8),
    ("help", 1.7),
    ("helped", 1.7),
    ("growth", 1.6),
    ("gain", 2.0),
    ("gains", 1.8),
    ("positive", 2.6),
    ("strong", 2.3),
    ("fair", 1.3),
    ("peace", 2.5),
    ("free", 2.3),
    ("innovative", 1.9),
    ("recovery", 1.4),
    ("rescued", 1.5),
    ("thrilled", 2.9),
    ("excited", 1.4),
    ("fortunate", 1.9),
    ("quickly", 0.6),
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("horrible", -2.5),
    ("worst", -3.1),
    ("worse", -2.1),
    ("hate", -2.7),
    ("sad", -2.1),
    ("angry", -2.3),
    ("fear", -2.2),
    ("afraid", -2.2),
    ("crisis", -3.1),
    ("disaster", -3.1),
    ("death", -2.9),
    ("dead", -3.3),
    ("killed", -3.5),
    ("kill", -3.7),
    ("attack", -2.1),
    ("attacked", -2.0),
    ("war", -2.9),
    ("violence", -3.1),
    ("crash", -1.7),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("loss", -1.3),
    ("lost", -1.3),
    ("lose", -1.7),
    ("problem", -1.7),
    ("problems", -1.7),
    ("risk", -1.1),
    ("threat", -2.4),
    ("warning", -1.4),
    ("warnings", -1.2),
    ("concern", -1.2),
    ("concerns", -1.3),
    ("damage", -2.2),
    ("hurt", -2.4),
    ("injured", -1.7),
    ("pain", -2.3),
    ("corrupt", -3.0),
    ("corruption", -1.9),
    ("scandal", -1.9),
    ("fraud", -2.8),
    ("guilty", -1.8),
    ("criminal", -2.4),
    ("disappointed", -1.9),
    ("canceled", -1.0),
    ("cancelled", -1.0),
    ("slammed", -1.6),
    ("critics", -1.4),
    ("delays", -1.1),
    ("delay", -1.3),
    ("decline", -1.1),
    ("collapse", -2.2),
    ("poor", -2.1),
    ("wrong", -2.1),
    ("weak", -1.9),
    ("danger", -2.4),
    ("dangerous", -2.1),
    ("waste", -1.8),
    ("pollution", -1.8),
    ("toxic", -2.2),
    ("victim", -2.0),
    ("arrested", -2.1),
    ("accused", -1.8),
    ("dispute", -1.7),
    ("worried", -1.2),
];

const BOOSTERS: &[&str] = &[
    "absolutely",
    "completely",
    "deeply",
    "especially",
    "extremely",
    "highly",
    "hugely",
    "incredibly",
    "particularly",
    "really",
    "remarkably",
    "so",
    "totally",
    "very",
];

const DAMPENERS: &[&str] = &["barely", "hardly", "marginally", "partly", "scarcely", "slightly", "somewhat"];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "nowhere", "cannot", "without", "isnt",
    "arent", "wasnt", "werent", "dont", "doesnt", "didnt", "wont", "cant", "couldnt", "shouldnt", "wouldnt",
    "hasnt", "havent", "hadnt",
];

/// English stop words excluded from keywords
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself", "they", "them", "their",
    "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for", "with", "about",
    "against", "between", "into", "through", "during", "before", "after", "above", "below", "to", "from", "up",
    "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once", "here", "there", "when",
    "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor",
    "not", "only", "own", "same", "so", "than", "too", "very", "can", "will", "just", "don", "should", "now", "said",
    "says", "also", "would", "could", "one", "two", "new", "like", "its", "dont", "didnt", "doesnt", "isnt", "wasnt",
];

const CATEGORY_CUES: &[(Category, &[&str])] = &[
    (
        Category::Politics,
        &[
            "election", "senate", "congress", "president", "lawmakers", "government", "policy", "vote", "voters",
            "campaign", "parliament", "minister", "democrats", "republicans", "legislation", "governor", "political",
        ],
    ),
    (
        Category::Technology,
        &[
            "technology", "software", "ai", "app", "apps", "startup", "internet", "computer", "chip", "chips",
            "smartphone", "cyber", "digital", "tech", "robot", "algorithm",
        ],
    ),
    (
        Category::Sports,
        &[
            "game", "team", "season", "league", "coach", "players", "player", "championship", "football", "soccer",
            "basketball", "baseball", "tennis", "olympic", "olympics", "tournament", "match", "stadium",
        ],
    ),
    (
        Category::Business,
        &[
            "market", "markets", "stock", "stocks", "company", "companies", "economy", "economic", "investors",
            "shares", "revenue", "profit", "earnings", "bank", "trade", "inflation", "ceo", "business", "sales",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "film", "movie", "music", "album", "actor", "actress", "celebrity", "festival", "television", "series",
            "concert", "hollywood", "singer", "netflix", "box",
        ],
    ),
    (
        Category::Science,
        &[
            "scientists", "research", "researchers", "study", "space", "nasa", "climate", "species", "physics",
            "experiment", "discovery", "planet", "telescope", "fossil",
        ],
    ),
    (
        Category::Health,
        &[
            "health", "hospital", "patients", "doctors", "disease", "cancer", "vaccine", "covid", "virus", "medical",
            "treatment", "drug", "mental", "clinical",
        ],
    ),
    (
        Category::WorldNews,
        &[
            "international", "foreign", "nations", "war", "ukraine", "russia", "china", "israel", "gaza", "embassy",
            "diplomats", "border", "refugees", "nato", "global",
        ],
    ),
    (
        Category::Lifestyle,
        &[
            "food", "travel", "fashion", "recipe", "home", "style", "wellness", "family", "restaurant", "garden",
            "design", "wedding",
        ],
    ),
    (
        Category::Crime,
        &[
            "police", "arrested", "crime", "murder", "shooting", "suspect", "court", "charged", "prison",
            "investigation", "robbery", "fraud", "trial", "jury",
        ],
    ),
];

/// Lexicon-based analyzer; deterministic and offline.
///
/// # Example
///
/// ```rust
/// use echoscape_core::analysis::LexiconAnalyzer;
///
/// let analyzer = LexiconAnalyzer::default();
/// assert!(analyzer.sentiment("What a wonderful, happy day") > 0.5);
/// assert!(analyzer.sentiment("A terrible, tragic disaster") < -0.5);
/// ```
#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    valence: HashMap<&'static str, f64>,
    keyword_cap: usize,
}

impl LexiconAnalyzer {
    pub fn new(keyword_cap: usize) -> Self {
        Self { valence: VALENCE.iter().copied().collect(), keyword_cap }
    }

    /// Compound sentiment in `[-1, 1]`.
    pub fn sentiment(&self, text: &str) -> f64 {
        let tokens = sentiment_tokens(text);
        let mut valences: Vec<f64> = Vec::with_capacity(tokens.len());

        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.valence.get(token.as_str()) else {
                valences.push(0.0);
                continue;
            };

            let mut valence = base;
            let preceding = tokens[i.saturating_sub(WINDOW)..i].iter().rev();
            for (distance, previous) in preceding.enumerate() {
                let decay = 1.0 - 0.05 * distance as f64;
                let scalar = if BOOSTERS.contains(&previous.as_str()) {
                    BOOST
                } else if DAMPENERS.contains(&previous.as_str()) {
                    -BOOST
                } else {
                    0.0
                };
                valence += scalar * decay * valence.signum();
            }

            if tokens[i.saturating_sub(WINDOW)..i].iter().any(|t| is_negation(t)) {
                valence *= NEGATION_SCALAR;
            }

            valences.push(valence);
        }

        // Contrast: "but" shifts weight to the clause that follows it.
        if let Some(pivot) = tokens.iter().position(|t| t == "but") {
            for (i, valence) in valences.iter_mut().enumerate() {
                if i < pivot {
                    *valence *= 0.5;
                } else if i > pivot {
                    *valence *= 1.5;
                }
            }
        }

        normalize(valences.iter().sum())
    }

    /// Most frequent non-stop-words longer than two characters.
    ///
    /// Ties keep first-occurrence order.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        for (position, word) in keyword_tokens(text).enumerate() {
            if word.chars().count() <= 2 || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            counts.entry(word).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        });

        ranked.into_iter().take(self.keyword_cap).map(|(word, _)| word).collect()
    }

    /// Category with the most cue words; `Other` when none match.
    pub fn categorize(&self, text: &str) -> Category {
        let tokens: Vec<String> = keyword_tokens(text).collect();

        let mut best = (Category::Other, 0usize);
        for (category, cues) in CATEGORY_CUES {
            let hits = tokens.iter().filter(|t| cues.contains(&t.as_str())).count();
            if hits > best.1 {
                best = (*category, hits);
            }
        }
        best.0
    }
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl Analyzer for LexiconAnalyzer {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        Ok(AnalysisResult::new(self.sentiment(text), self.keywords(text), self.categorize(text), self.keyword_cap))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

fn normalize(sum: f64) -> f64 {
    (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

/// Lowercase words, apostrophes kept so contractions stay intact.
fn sentiment_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '’').replace('’', "'").to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Lowercase words with punctuation removed.
fn keyword_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_and_negative() {
        let analyzer = LexiconAnalyzer::default();
        assert!(analyzer.sentiment("The rescue was a great success and everyone was happy.") > 0.05);
        assert!(analyzer.sentiment("The festival was canceled, leaving thousands of fans disappointed.") < -0.05);
        assert_eq!(analyzer.sentiment("The committee met on Tuesday."), 0.0);
    }

    #[test]
    fn test_negation_flips() {
        let analyzer = LexiconAnalyzer::default();
        assert!(analyzer.sentiment("The results were good.") > 0.0);
        assert!(analyzer.sentiment("The results were not good.") < 0.0);
        assert!(analyzer.sentiment("The results weren't good.") < 0.0);
    }

    #[test]
    fn test_booster_intensifies() {
        let analyzer = LexiconAnalyzer::default();
        assert!(analyzer.sentiment("a very good plan") > analyzer.sentiment("a good plan"));
        assert!(analyzer.sentiment("a slightly good plan") < analyzer.sentiment("a good plan"));
    }

    #[test]
    fn test_but_shifts_weight() {
        let analyzer = LexiconAnalyzer::default();
        assert!(analyzer.sentiment("The food was good but the service was terrible.") < 0.0);
    }

    #[test]
    fn test_compound_bounded() {
        let analyzer = LexiconAnalyzer::default();
        let text = "great ".repeat(500);
        let score = analyzer.sentiment(&text);
        assert!(score > 0.99 && score <= 1.0);
    }

    #[test]
    fn test_keywords_frequency_order() {
        let analyzer = LexiconAnalyzer::new(3);
        let keywords = analyzer.keywords("Budget budget senate. The senate voted; budget! It is an ox.");
        assert_eq!(keywords, vec!["budget", "senate", "voted"]);
    }

    #[test]
    fn test_keywords_tie_keeps_first_occurrence() {
        let analyzer = LexiconAnalyzer::default();
        assert_eq!(analyzer.keywords("zebra apple mango"), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_categorize() {
        let analyzer = LexiconAnalyzer::default();
        let crime = "Police arrested a suspect after the shooting. The suspect was charged in court.";
        assert_eq!(analyzer.categorize(crime), Category::Crime);
        assert_eq!(analyzer.categorize("The senate passed the bill after the election."), Category::Politics);
        assert_eq!(analyzer.categorize("Nothing to see."), Category::Other);
    }

    #[tokio::test]
    async fn test_analyze() {
        let analyzer = LexiconAnalyzer::default();
        let result = analyzer.analyze("Investors cheered as the stock market posted strong gains.").await.unwrap();

        assert!(result.sentiment_score > 0.0);
        assert_eq!(result.category, Category::Business);
        assert!(result.keywords.contains(&"market".to_string()));
        assert!(result.keywords.len() <= 10);
    }
}
