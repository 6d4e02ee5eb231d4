use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A poem record as PoetryDB serialises it.
///
/// Field projections (`/author,title`, `/author,title,lines`) omit fields,
/// so everything beyond `title` and `author` is optional. `linecount` is
/// kept as the wire string; use [`Poem::line_count`] for the parsed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poem {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linecount: Option<String>,
}

impl Poem {
    /// Line count as reported upstream, falling back to the lines we hold.
    pub fn line_count(&self) -> usize {
        self.linecount
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(self.lines.len())
    }

    /// Lines whose text contains `query`, case-insensitively.
    pub fn matching_line_indices(&self, query: &str) -> Vec<usize> {
        let needle = query.to_lowercase();
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Which index a search query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Author,
    Title,
    Lines,
}

impl SearchMode {
    pub const ALL: [SearchMode; 3] = [SearchMode::Author, SearchMode::Title, SearchMode::Lines];

    /// Wire name, as used in `/search?type=` parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Author => "author",
            SearchMode::Title => "title",
            SearchMode::Lines => "lines",
        }
    }

    /// Human-facing tab label.
    pub fn label(self) -> &'static str {
        match self {
            SearchMode::Author => "Author",
            SearchMode::Title => "Title",
            SearchMode::Lines => "Content",
        }
    }

    /// Guidance shown while the query is still too short.
    pub fn example_hint(self) -> &'static str {
        match self {
            SearchMode::Author => "Try \"Shakespeare\" or \"Frost\"",
            SearchMode::Title => "Try \"Ozymandias\" or \"Hope\"",
            SearchMode::Lines => "Try \"love\" or \"dream\"",
        }
    }

    /// Guidance shown on a legitimate empty result.
    pub fn no_results_hint(self) -> &'static str {
        match self {
            SearchMode::Author => "Try searching for a different poet or check your spelling",
            SearchMode::Title => "Try searching for a different poem title or check your spelling",
            SearchMode::Lines => "Try searching for different words or phrases",
        }
    }

    pub fn next(self) -> SearchMode {
        match self {
            SearchMode::Author => SearchMode::Title,
            SearchMode::Title => SearchMode::Lines,
            SearchMode::Lines => SearchMode::Author,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = UnknownSearchMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "author" => Ok(SearchMode::Author),
            "title" => Ok(SearchMode::Title),
            "lines" | "content" => Ok(SearchMode::Lines),
            other => Err(UnknownSearchMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSearchMode(pub String);

impl fmt::Display for UnknownSearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown search mode {:?} (expected author, title or lines)", self.0)
    }
}

impl std::error::Error for UnknownSearchMode {}

/// One entry in the search preview list.
///
/// The two variants are intentionally explicit rather than a bag of
/// optional fields: author-mode results never carry a title, poem results
/// always carry both author and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Author {
        name: String,
        /// Sample poem titles for the author. The bundled author list
        /// carries no titles, so this is empty today; the renderer still
        /// handles the populated case.
        poems: Vec<String>,
    },
    Poem {
        author: String,
        title: String,
        lines: Option<Vec<String>>,
    },
}

impl SearchResult {
    pub fn author_entry(name: impl Into<String>) -> Self {
        SearchResult::Author {
            name: name.into(),
            poems: Vec::new(),
        }
    }

    /// Coerces an API poem record into a poem-mode result.
    pub fn from_poem(poem: Poem) -> Self {
        SearchResult::Poem {
            author: poem.author,
            title: poem.title,
            lines: if poem.lines.is_empty() {
                None
            } else {
                Some(poem.lines)
            },
        }
    }

    /// Single character drawn in the letter avatar.
    pub fn avatar(&self) -> char {
        match self {
            SearchResult::Author { name, .. } => name.chars().next().unwrap_or('?'),
            SearchResult::Poem { title, .. } => title.chars().next().unwrap_or('A'),
        }
    }

    /// Primary display line (author name or poem title).
    pub fn headline(&self) -> &str {
        match self {
            SearchResult::Author { name, .. } => name,
            SearchResult::Poem { title, .. } => title,
        }
    }

    /// Secondary display line.
    pub fn byline(&self) -> String {
        match self {
            SearchResult::Author { poems, .. } if poems.is_empty() => "Poet".to_string(),
            SearchResult::Author { poems, .. } => {
                let shown: Vec<&str> = poems.iter().take(2).map(String::as_str).collect();
                let rest = poems.len().saturating_sub(2);
                let mut text = shown.join(", ");
                if rest > 0 {
                    text.push_str(&format!(" (+{rest} more poems)"));
                }
                text
            }
            SearchResult::Poem { author, .. } if author.is_empty() => "by Unknown".to_string(),
            SearchResult::Poem { author, .. } => format!("by {author}"),
        }
    }
}

/// Groups poems by author, preserving first-seen order — the display
/// order of the full search-results view.
pub fn group_by_author(poems: &[Poem]) -> Vec<(&str, Vec<&Poem>)> {
    let mut groups: Vec<(&str, Vec<&Poem>)> = Vec::new();
    for poem in poems {
        match groups.iter_mut().find(|(author, _)| *author == poem.author) {
            Some((_, members)) => members.push(poem),
            None => groups.push((&poem.author, vec![poem])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poem_decodes_full_record() {
        let poem: Poem = serde_json::from_str(
            r#"{"title":"Fire and Ice","author":"Robert Frost",
                "lines":["Some say the world will end in fire,"],
                "linecount":"9"}"#,
        )
        .unwrap();
        assert_eq!(poem.line_count(), 9);
        assert_eq!(poem.lines.len(), 1);
    }

    #[test]
    fn poem_decodes_author_title_projection() {
        let poem: Poem =
            serde_json::from_str(r#"{"title":"Ozymandias","author":"Percy Bysshe Shelley"}"#)
                .unwrap();
        assert!(poem.lines.is_empty());
        assert_eq!(poem.line_count(), 0);
    }

    #[test]
    fn matching_lines_are_case_insensitive() {
        let poem = Poem {
            title: "T".into(),
            author: "A".into(),
            lines: vec!["And miles to go".into(), "LOVE in idleness".into()],
            linecount: None,
        };
        assert_eq!(poem.matching_line_indices("love"), vec![1]);
    }

    #[test]
    fn mode_round_trips_through_wire_name() {
        for mode in SearchMode::ALL {
            assert_eq!(mode.as_str().parse::<SearchMode>().unwrap(), mode);
        }
        assert!("poet".parse::<SearchMode>().is_err());
    }

    #[test]
    fn author_result_byline_falls_back_to_poet() {
        let result = SearchResult::author_entry("Robert Frost");
        assert_eq!(result.byline(), "Poet");
        assert_eq!(result.avatar(), 'R');
    }

    #[test]
    fn author_result_byline_previews_two_poems_and_counts_the_rest() {
        let result = SearchResult::Author {
            name: "Robert Frost".into(),
            poems: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        };
        assert_eq!(result.byline(), "A, B (+2 more poems)");
    }

    #[test]
    fn poem_result_byline_handles_missing_author() {
        let result = SearchResult::Poem {
            author: String::new(),
            title: "Untitled".into(),
            lines: None,
        };
        assert_eq!(result.byline(), "by Unknown");
    }

    #[test]
    fn grouping_preserves_first_seen_author_order() {
        let poem = |author: &str, title: &str| Poem {
            title: title.into(),
            author: author.into(),
            lines: vec![],
            linecount: None,
        };
        let poems = vec![
            poem("Frost", "A"),
            poem("Shelley", "B"),
            poem("Frost", "C"),
        ];
        let groups = group_by_author(&poems);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Frost");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "Shelley");
    }
}
