use std::sync::Arc;

use once_cell::sync::Lazy;

/// Author names bundled with the binary, one per line.
///
/// PoetryDB's author set changes rarely enough that shipping it avoids a
/// network round trip on every keystroke of author-mode search.
static BUNDLED_AUTHORS: &str = include_str!("../data/authors.txt");

static BUNDLED_INDEX: Lazy<Arc<AuthorIndex>> = Lazy::new(|| {
    Arc::new(AuthorIndex::new(
        BUNDLED_AUTHORS
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    ))
});

/// Immutable, ordered table of known author names.
///
/// Constructed once and injected wherever author-mode filtering is needed,
/// so tests can substitute a fixture list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIndex {
    names: Vec<String>,
}

impl AuthorIndex {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// The list shipped in `data/authors.txt`.
    pub fn bundled() -> Arc<AuthorIndex> {
        Arc::clone(&BUNDLED_INDEX)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Case-insensitive substring filter, preserving index order.
    ///
    /// Returns at most `limit` names. Pure and synchronous; there is no
    /// failure path.
    pub fn filter<'a>(&'a self, query: &str, limit: usize) -> Vec<&'a str> {
        let needle = query.to_lowercase();
        self.names
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> AuthorIndex {
        AuthorIndex::new(
            ["Robert Frost", "William Shakespeare", "Frost (anonymous)"]
                .into_iter()
                .map(String::from),
        )
    }

    #[test]
    fn substring_filter_is_case_insensitive_and_ordered() {
        let index = fixture();
        assert_eq!(
            index.filter("fr", 5),
            vec!["Robert Frost", "Frost (anonymous)"]
        );
    }

    #[test]
    fn filter_truncates_to_limit() {
        let index = AuthorIndex::new((0..10).map(|i| format!("Poet {i}")));
        assert_eq!(index.filter("poet", 5).len(), 5);
    }

    #[test]
    fn filter_with_no_match_is_empty() {
        assert!(fixture().filter("zzz", 5).is_empty());
    }

    #[test]
    fn bundled_list_is_parsed_and_nonempty() {
        let index = AuthorIndex::bundled();
        assert!(index.len() > 100);
        assert!(index.iter().any(|name| name == "Emily Dickinson"));
        // No stray blank entries from trailing newlines.
        assert!(index.iter().all(|name| !name.trim().is_empty()));
    }
}
