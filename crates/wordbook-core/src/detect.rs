//! Near-duplicate detection for newly entered words.

use crate::models::Entry;

/// Find an existing entry the candidate word likely duplicates.
///
/// Case-insensitive and bidirectional: "cat" matches an existing "cats"
/// and "cats" matches an existing "cat". This is a heuristic that trades
/// false positives on short words for catching plural and inflected
/// near-duplicates. The first match in `entries` wins; there is no
/// ranking among multiple hits.
#[must_use]
pub fn find_match<'a>(candidate: &str, entries: &'a [Entry]) -> Option<&'a Entry> {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return None;
    }

    entries.iter().find(|entry| {
        let word = entry.word.to_lowercase();
        word.contains(&candidate) || candidate.contains(&word)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryId;
    use pretty_assertions::assert_eq;

    fn entries(words: &[&str]) -> Vec<Entry> {
        words
            .iter()
            .enumerate()
            .map(|(index, word)| Entry {
                id: EntryId::new(i64::try_from(index).unwrap() + 1),
                remote_id: None,
                word: (*word).to_string(),
                description: format!("meaning of {word}"),
                updated_at: 0,
            })
            .collect()
    }

    #[test]
    fn candidate_contained_in_existing_word_matches() {
        let existing = entries(&["cats"]);
        let found = find_match("cat", &existing);
        assert_eq!(found.map(|entry| entry.word.as_str()), Some("cats"));
    }

    #[test]
    fn existing_word_contained_in_candidate_matches() {
        let existing = entries(&["cat"]);
        let found = find_match("cats", &existing);
        assert_eq!(found.map(|entry| entry.word.as_str()), Some("cat"));
    }

    #[test]
    fn unrelated_words_do_not_match() {
        let existing = entries(&["cats"]);
        assert!(find_match("xyz", &existing).is_none());
    }

    #[test]
    fn matching_ignores_case() {
        let existing = entries(&["Schadenfreude"]);
        let found = find_match("schadenfreude", &existing);
        assert!(found.is_some());
    }

    #[test]
    fn first_match_wins() {
        let existing = entries(&["cats", "cat", "category"]);
        let found = find_match("cat", &existing);
        assert_eq!(found.map(|entry| entry.id), Some(EntryId::new(1)));
    }

    #[test]
    fn blank_candidate_never_matches() {
        let existing = entries(&["cat"]);
        assert!(find_match("", &existing).is_none());
        assert!(find_match("   ", &existing).is_none());
    }
}
