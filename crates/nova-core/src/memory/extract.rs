//! ============================================================================
//! Fact Extraction - Keyword and pattern matching over raw utterances
//! ============================================================================
//! Derives candidate (key, value) facts from a single user message. Pure and
//! deterministic: same input always yields the same facts, in the same order
//! (name, then location, then preferences).
//! ============================================================================

use super::types::{Fact, FactKey};

// Trigger phrase and the byte offset past it where the name starts.
const NAME_TRIGGERS: &[(&str, usize)] = &[("my name is ", 11), ("i'm ", 4), ("i am ", 5)];

const LOCATION_TRIGGERS: &[&str] = &["from", "live in", "located"];

// Closed gazetteer; values are emitted in this lowercase form.
const LOCATIONS: &[&str] = &[
    "delhi",
    "mumbai",
    "bangalore",
    "chennai",
    "kolkata",
    "london",
    "new york",
];

const PREFERENCE_CATEGORIES: &[(&str, &[&str])] = &[
    ("anime", &["anime", "naruto", "one piece", "attack on titan"]),
    ("football", &["football", "soccer", "premier league", "fifa"]),
    ("backend", &["backend", "server", "api", "node.js", "database"]),
    ("frontend", &["frontend", "react", "javascript", "ui"]),
    ("music", &["music", "song", "band", "artist"]),
    ("movies", &["movie", "film", "cinema", "netflix"]),
];

/// Extract candidate facts from an utterance. May be empty; may contain
/// several preference facts (one per matching category).
pub fn extract(utterance: &str) -> Vec<Fact> {
    let mut facts = Vec::new();
    let lower = utterance.to_lowercase();

    if let Some(name) = extract_name(utterance, &lower) {
        facts.push(Fact::new(FactKey::Name, name));
    }

    if let Some(location) = extract_location(&lower) {
        facts.push(Fact::new(FactKey::Location, location));
    }

    for category in extract_preferences(&lower) {
        facts.push(Fact::new(FactKey::Preference, category));
    }

    facts
}

// Capitalized word sequence (1-2 words) immediately after a trigger phrase,
// captured in original casing.
fn extract_name(utterance: &str, lower: &str) -> Option<String> {
    for (trigger, offset) in NAME_TRIGGERS {
        let Some(pos) = lower.find(trigger) else {
            continue;
        };
        let start = pos + offset;
        if start >= utterance.len() || !utterance.is_char_boundary(start) {
            continue;
        }

        let words: Vec<&str> = utterance[start..]
            .split_whitespace()
            .take(2)
            .take_while(|w| {
                w.chars()
                    .next()
                    .map(|c| c.is_alphabetic() && c.is_uppercase())
                    .unwrap_or(false)
            })
            .map(|w| w.trim_end_matches(|c: char| !c.is_alphabetic()))
            .collect();

        if !words.is_empty() {
            return Some(words.join(" "));
        }
    }
    None
}

// First gazetteer hit wins; later matches in the same utterance are ignored.
fn extract_location(lower: &str) -> Option<String> {
    let triggered = LOCATION_TRIGGERS.iter().any(|t| lower.contains(t));
    if !triggered {
        return None;
    }

    LOCATIONS
        .iter()
        .find(|loc| lower.contains(*loc))
        .map(|loc| loc.to_string())
}

// One category per match; the first keyword hit within a category suffices.
fn extract_preferences(lower: &str) -> Vec<String> {
    let mut categories = Vec::new();
    for (category, keywords) in PREFERENCE_CATEGORIES {
        if keywords.iter().any(|k| lower.contains(k)) {
            categories.push(category.to_string());
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_name() {
        let facts = extract("my name is Alice");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0], Fact::new(FactKey::Name, "Alice"));

        let facts = extract("I'm Bob and I work here");
        assert_eq!(facts[0], Fact::new(FactKey::Name, "Bob"));
    }

    #[test]
    fn test_extract_two_word_name() {
        let facts = extract("my name is Alice Johnson");
        assert_eq!(facts[0], Fact::new(FactKey::Name, "Alice Johnson"));
    }

    #[test]
    fn test_name_requires_capitalization() {
        assert!(extract("my name is alice").is_empty());
        assert!(extract("Hello there").is_empty());
    }

    #[test]
    fn test_name_strips_trailing_punctuation() {
        let facts = extract("I am Sam!");
        assert_eq!(facts[0], Fact::new(FactKey::Name, "Sam"));
    }

    #[test]
    fn test_extract_location_and_preference() {
        let facts = extract("I live in Mumbai and love anime");
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0], Fact::new(FactKey::Location, "mumbai"));
        assert_eq!(facts[1], Fact::new(FactKey::Preference, "anime"));
    }

    #[test]
    fn test_location_first_match_wins() {
        let facts = extract("I moved from Delhi to London");
        let locations: Vec<_> = facts
            .iter()
            .filter(|f| f.key == FactKey::Location)
            .collect();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].value, "delhi");
    }

    #[test]
    fn test_location_needs_trigger_word() {
        // Gazetteer hit without a trigger word emits nothing
        assert!(extract("Mumbai is a big city").is_empty());
    }

    #[test]
    fn test_multiple_preference_categories() {
        let facts = extract("I watch naruto and play football");
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0], Fact::new(FactKey::Preference, "anime"));
        assert_eq!(facts[1], Fact::new(FactKey::Preference, "football"));
    }

    #[test]
    fn test_one_fact_per_category() {
        // Two keywords of the same category yield a single fact
        let facts = extract("naruto and one piece marathon tonight");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0], Fact::new(FactKey::Preference, "anime"));
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(extract("what a lovely day").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let input = "I'm Dana, I live in London and love music";
        assert_eq!(extract(input), extract(input));
    }
}
