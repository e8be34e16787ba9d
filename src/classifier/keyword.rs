use async_trait::async_trait;
use std::collections::HashMap;

use super::{Classifier, ClassifierError};

const FALLBACK_LABEL: &str = "unknown file";

/// Offline ranker: counts keyword hits per label. Labels without built-in
/// keywords are matched on their own words. Deterministic, so the same text
/// always gets the same label.
pub struct KeywordClassifier {
    keywords: HashMap<String, Vec<String>>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        let table: [(&str, &[&str]); 6] = [
            ("invoice", &["invoice", "amount due", "total due", "bill to", "vat", "payment terms", "invoice number"]),
            ("bank statement", &["statement", "account number", "opening balance", "closing balance", "sort code", "iban", "transactions"]),
            ("drivers license", &["driver", "drivers", "driving licence", "driving license", "license no", "licence number", "class", "dvla"]),
            ("passport", &["passport", "nationality", "place of birth", "date of expiry", "issuing authority", "p<"]),
            ("credit note", &["credit note", "credit memo", "refund", "credited", "amount credited"]),
            ("cv", &["curriculum vitae", "resume", "work experience", "education", "skills", "references", "employment history"]),
        ];

        let keywords = table
            .iter()
            .map(|(label, words)| {
                (
                    label.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                )
            })
            .collect();
        Self { keywords }
    }

    fn score(&self, haystack: &str, label: &str) -> usize {
        let own_words;
        let words: &[String] = match self.keywords.get(label) {
            Some(words) => words,
            None => {
                own_words = label
                    .split_whitespace()
                    .map(|w| w.to_lowercase())
                    .collect::<Vec<_>>();
                &own_words
            }
        };
        words.iter().map(|w| count_word_matches(haystack, w)).sum()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Occurrences of `needle` not glued to surrounding letters or digits, so
/// `vat` does not hit `private`. Edges of `needle` that are punctuation
/// (the `<` in `p<`) need no boundary.
fn count_word_matches(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack
        .match_indices(needle)
        .filter(|(start, _)| {
            let end = start + needle.len();
            let open = !needle.starts_with(is_word_char)
                || !haystack[..*start].chars().next_back().is_some_and(is_word_char);
            let close = !needle.ends_with(is_word_char)
                || !haystack[end..].chars().next().is_some_and(is_word_char);
            open && close
        })
        .count()
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<String>, ClassifierError> {
        let haystack = text.to_lowercase();
        let mut scored: Vec<(usize, &String)> = labels
            .iter()
            .map(|label| (self.score(&haystack, &label.to_lowercase()), label))
            .collect();

        // stable: equal scores keep the caller's label order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if scored.first().map(|(score, _)| *score == 0).unwrap_or(false) {
            if let Some(pos) = scored.iter().position(|(_, l)| l.as_str() == FALLBACK_LABEL) {
                let fallback = scored.remove(pos);
                scored.insert(0, fallback);
            }
        }

        Ok(scored.into_iter().map(|(_, label)| label.clone()).collect())
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
