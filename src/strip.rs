//! The "newspaper strip" layout used by the random-poem view.

use chrono::Local;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::model::Poem;

const MASTHEAD_QUOTE: &str = "THE DAILY VERSE";
const PUBLISHER: &str = "POETRY DB API";
const VOLUME: &str = "VOL. 1... NO.1";
const ISSUE_CODE: &str = "POEM-X1";

/// Decorative dividers; one is chosen per strip, the way the original
/// rotated through a handful of background images.
const ORNAMENTS: [&str; 7] = [
    "~ * ~ * ~",
    ". . . oOo . . .",
    "-- =====[]===== --",
    "* ~ . ~ *",
    "::  ::  ::",
    "~~~ ( ) ~~~",
    "+ . + . +",
];

/// A front-page-style rendering of one poem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewspaperStrip {
    pub main_title: String,
    pub publisher: String,
    pub date: String,
    pub headline: String,
    pub quote: String,
    pub ornament: &'static str,
    pub columns: Vec<String>,
    pub volume: String,
    pub issue_code: String,
}

impl NewspaperStrip {
    /// Lays the poem out as the day's edition, dated now.
    pub fn for_poem(poem: &Poem) -> Self {
        let mut rng = SmallRng::from_entropy();
        Self::compose(poem, Local::now().format("%d %b %Y").to_string(), &mut rng)
    }

    /// Deterministic variant for tests: caller supplies date and rng.
    pub fn compose(poem: &Poem, date: String, rng: &mut impl Rng) -> Self {
        let author = if poem.author.is_empty() {
            "Unknown Author".to_string()
        } else {
            poem.author.clone()
        };
        let headline = if poem.title.is_empty() {
            "Untitled".to_string()
        } else {
            poem.title.clone()
        };
        NewspaperStrip {
            main_title: author,
            publisher: PUBLISHER.to_string(),
            date,
            headline,
            quote: MASTHEAD_QUOTE.to_string(),
            ornament: ORNAMENTS[rng.gen_range(0..ORNAMENTS.len())],
            columns: vec![poem.lines.join("\n")],
            volume: VOLUME.to_string(),
            issue_code: ISSUE_CODE.to_string(),
        }
    }

    /// Renders the strip as framed plain text, `width` columns wide.
    pub fn render_plain(&self, width: usize) -> String {
        let width = width.clamp(32, 100);
        let inner = width - 2;
        let rule = format!("+{}+\n", "=".repeat(inner));
        let thin = format!("+{}+\n", "-".repeat(inner));
        let mut out = String::new();

        out.push_str(&rule);
        push_row(&mut out, "SPECIAL EDITION", inner);
        push_row(&mut out, &self.main_title.to_uppercase(), inner);
        push_row(&mut out, "DAILY REPORT", inner);
        out.push_str(&thin);
        push_row(&mut out, &format!("{}  *  {}", self.publisher, self.date), inner);
        out.push_str(&thin);
        for part in wrap(&self.headline.to_uppercase(), inner.saturating_sub(4)) {
            push_row(&mut out, &part, inner);
        }
        out.push_str(&thin);
        push_row(&mut out, &format!("\"{}\"", self.quote), inner);
        push_row(&mut out, self.ornament, inner);
        out.push_str(&thin);
        for column in &self.columns {
            for line in column.split('\n') {
                if line.trim().is_empty() {
                    push_row(&mut out, "", inner);
                    continue;
                }
                for part in wrap(line, inner.saturating_sub(4)) {
                    push_row(&mut out, &part, inner);
                }
            }
        }
        out.push_str(&thin);
        push_row(
            &mut out,
            &format!("{}  *  {}  *  {}", self.volume, self.issue_code, self.date),
            inner,
        );
        out.push_str(&rule);
        out
    }
}

fn push_row(out: &mut String, text: &str, inner: usize) {
    out.push('|');
    out.push_str(&center(text, inner));
    out.push_str("|\n");
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(8);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn poem() -> Poem {
        Poem {
            title: "Fire and Ice".into(),
            author: "Robert Frost".into(),
            lines: vec![
                "Some say the world will end in fire,".into(),
                "Some say in ice.".into(),
            ],
            linecount: Some("9".into()),
        }
    }

    #[test]
    fn strip_carries_masthead_fields() {
        let mut rng = SmallRng::seed_from_u64(7);
        let strip = NewspaperStrip::compose(&poem(), "06 Aug 2026".into(), &mut rng);
        assert_eq!(strip.main_title, "Robert Frost");
        assert_eq!(strip.headline, "Fire and Ice");
        assert_eq!(strip.quote, "THE DAILY VERSE");
        assert_eq!(strip.columns.len(), 1);
    }

    #[test]
    fn missing_fields_fall_back() {
        let mut rng = SmallRng::seed_from_u64(7);
        let bare = Poem {
            title: String::new(),
            author: String::new(),
            lines: vec![],
            linecount: None,
        };
        let strip = NewspaperStrip::compose(&bare, "06 Aug 2026".into(), &mut rng);
        assert_eq!(strip.main_title, "Unknown Author");
        assert_eq!(strip.headline, "Untitled");
    }

    #[test]
    fn plain_rendering_is_framed_and_contains_the_poem() {
        let mut rng = SmallRng::seed_from_u64(7);
        let strip = NewspaperStrip::compose(&poem(), "06 Aug 2026".into(), &mut rng);
        let text = strip.render_plain(60);
        assert!(text.starts_with("+"));
        assert!(text.contains("FIRE AND ICE"));
        assert!(text.contains("Some say in ice."));
        for line in text.lines() {
            assert_eq!(line.chars().count(), 60, "ragged frame line: {line:?}");
        }
    }
}
