use std::borrow::Cow;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::model::{SearchMode, SearchResult};

/// `encodeURIComponent`-compatible set: everything except ASCII
/// alphanumerics and `- _ . ! ~ * ' ( )` is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes one path segment or query value.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

fn decode_component(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

/// A navigable view, mirroring the original site's path layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Author listing, `/`.
    Home,
    /// All poems by one author, `/author/{name}`.
    Author { name: String },
    /// A single poem, `/poem/{author}/{title}`.
    Poem { author: String, title: String },
    /// Full search results, `/search?q=&type=`.
    Search { query: String, mode: SearchMode },
    /// Random-poem display, `/surprise`.
    Surprise,
}

impl Route {
    /// The route a selected preview result leads to.
    ///
    /// Author results open the author's listing; poem results open the
    /// poem itself when both author and title are present. Selection is
    /// driven by the result variant, so a malformed poem record (missing
    /// author or title) simply goes nowhere.
    pub fn for_result(result: &SearchResult) -> Option<Route> {
        match result {
            SearchResult::Author { name, .. } => Some(Route::Author { name: name.clone() }),
            SearchResult::Poem { author, title, .. } if !author.is_empty() && !title.is_empty() => {
                Some(Route::Poem {
                    author: author.clone(),
                    title: title.clone(),
                })
            }
            SearchResult::Poem { .. } => None,
        }
    }

    /// The "view all results" target for a query, independent of the
    /// preview's 5-item cap.
    pub fn view_all(query: &str, mode: SearchMode) -> Route {
        Route::Search {
            query: query.to_string(),
            mode,
        }
    }

    /// Renders the route as a percent-encoded path.
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Author { name } => format!("/author/{}", encode_component(name)),
            Route::Poem { author, title } => format!(
                "/poem/{}/{}",
                encode_component(author),
                encode_component(title)
            ),
            Route::Search { query, mode } => {
                format!("/search?q={}&type={mode}", encode_component(query))
            }
            Route::Surprise => "/surprise".to_string(),
        }
    }

    /// Parses a percent-encoded path back into a route.
    pub fn parse(path: &str) -> Option<Route> {
        let (path, query_string) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [""] => Some(Route::Home),
            ["surprise"] => Some(Route::Surprise),
            ["author", name] => Some(Route::Author {
                name: decode_component(name)?,
            }),
            ["poem", author, title] => Some(Route::Poem {
                author: decode_component(author)?,
                title: decode_component(title)?,
            }),
            ["search"] => {
                let mut query = String::new();
                let mut mode = SearchMode::default();
                for pair in query_string.unwrap_or_default().split('&') {
                    match pair.split_once('=') {
                        Some(("q", value)) => query = decode_component(value)?,
                        Some(("type", value)) => mode = value.parse().ok()?,
                        _ => {}
                    }
                }
                Some(Route::Search { query, mode })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_selection_encodes_spaces() {
        let result = SearchResult::author_entry("Robert Frost");
        let route = Route::for_result(&result).unwrap();
        assert_eq!(route.path(), "/author/Robert%20Frost");
    }

    #[test]
    fn poem_selection_encodes_both_segments() {
        let result = SearchResult::Poem {
            author: "Robert Frost".into(),
            title: "Fire and Ice".into(),
            lines: None,
        };
        let route = Route::for_result(&result).unwrap();
        assert_eq!(route.path(), "/poem/Robert%20Frost/Fire%20and%20Ice");
    }

    #[test]
    fn poem_result_without_author_goes_nowhere() {
        let result = SearchResult::Poem {
            author: String::new(),
            title: "Untitled".into(),
            lines: None,
        };
        assert_eq!(Route::for_result(&result), None);
    }

    #[test]
    fn search_route_carries_query_and_mode() {
        let route = Route::view_all("summer's day", SearchMode::Lines);
        assert_eq!(route.path(), "/search?q=summer's%20day&type=lines");
    }

    #[test]
    fn paths_round_trip() {
        let routes = [
            Route::Home,
            Route::Surprise,
            Route::Author {
                name: "George Gordon, Lord Byron".into(),
            },
            Route::Poem {
                author: "Emily Dickinson".into(),
                title: "\"Hope\" is the thing with feathers".into(),
            },
            Route::Search {
                query: "love & death".into(),
                mode: SearchMode::Title,
            },
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn unknown_paths_are_rejected() {
        assert_eq!(Route::parse("/nope"), None);
        assert_eq!(Route::parse("/poem/only-author"), None);
    }
}
