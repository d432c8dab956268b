//! Hashtag extraction from post content.

use regex::Regex;
use std::{collections::HashSet, sync::LazyLock};

static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("Invalid hashtag regex"));

/// Extracts hashtag names from post content: every `#` followed by one or
/// more word characters, in left-to-right order, leading `#` stripped.
/// Case is preserved and duplicates are returned verbatim.
#[must_use]
pub fn extract(content: &str) -> Vec<String> {
    HASHTAG_REGEX
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_owned()))
        .collect()
}

/// Deduplicates extracted tag names before bookkeeping, first occurrence
/// winning and order preserved. One post mentioning `#gm` three times still
/// counts once toward the tag's usage counter.
#[must_use]
pub fn unique(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter().filter(|tag| seen.insert(tag.clone())).collect()
}

#[cfg(test)]
mod tests {
    use crate::hashtag::{extract, unique};

    #[test]
    fn extracts_in_order_with_duplicates() {
        assert_eq!(
            extract("Just shipped #DeFi tooling, more #DeFi and #DAOs soon"),
            vec!["DeFi", "DeFi", "DAOs"]
        );
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(extract("Hello #Web3 and #web3!"), vec!["Web3", "web3"]);
    }

    #[test]
    fn word_characters_only() {
        assert_eq!(extract("#snake_case_2 works"), vec!["snake_case_2"]);
        assert_eq!(extract("#tag!stop and #a-b"), vec!["tag", "a"]);
        assert_eq!(extract("a lone # matches nothing"), Vec::<String>::new());
    }

    #[test]
    fn no_matches_is_empty() {
        assert_eq!(extract(""), Vec::<String>::new());
        assert_eq!(extract("plain text"), Vec::<String>::new());
    }

    #[test]
    fn unique_keeps_first_occurrence_order() {
        let tags = vec!["Web3", "web3", "Web3", "DAOs"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        assert_eq!(unique(tags), vec!["Web3", "web3", "DAOs"]);
    }
}
