use std::error::Error;

use atty::Stream;
use clap::{Parser, Subcommand};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

use versewalk::api::{DEFAULT_BASE_URL, PoetryDb};
use versewalk::model::{Poem, SearchMode};
use versewalk::strip::NewspaperStrip;

#[derive(Parser, Debug)]
#[command(name = "versewalk", about = "Browse the PoetryDB archive", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Base URL of the PoetryDB instance to talk to.
    #[arg(long, global = true, env = "POETRYDB_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every author in the archive.
    Authors,
    /// Show the poems of one author.
    Author {
        /// Author name, exactly as the archive spells it.
        name: String,
        /// Print the full text of every poem, not just the titles.
        #[arg(long)]
        full: bool,
    },
    /// Show a single poem by exact author and title.
    Poem {
        author: String,
        title: String,
    },
    /// Search the archive by author, title or content.
    Search {
        /// Text to look for (case-insensitive substring).
        query: String,
        /// Which field to search: author, title or lines.
        #[arg(short, long, default_value = "author", value_parser = parse_mode)]
        by: SearchMode,
    },
    /// Pull a random poem, laid out as the day's front page.
    Random,
    /// Interactive browser with incremental search.
    #[cfg(feature = "tui")]
    Browse,
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    let client = PoetryDb::new(&cli.api_url)?;
    match cli.command {
        Command::Authors => handle_authors(&client, cli.json).await,
        Command::Author { name, full } => handle_author(&client, &name, full, cli.json).await,
        Command::Poem { author, title } => handle_poem(&client, &author, &title, cli.json).await,
        Command::Search { query, by } => handle_search(&client, &query, by, cli.json).await,
        Command::Random => handle_random(&client, cli.json).await,
        #[cfg(feature = "tui")]
        Command::Browse => versewalk::tui::run(client).await.map_err(Into::into),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_mode(raw: &str) -> Result<SearchMode, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

async fn handle_authors(client: &PoetryDb, as_json: bool) -> Result<(), Box<dyn Error>> {
    let authors = client.authors().await?;

    if as_json {
        let payload = json!({ "count": authors.len(), "authors": authors });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("AUTHOR");
        println!("------");
        for name in &authors {
            println!("{name}");
        }
        println!();
        println!(
            "{} author{} in the archive.",
            authors.len(),
            if authors.len() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

async fn handle_author(
    client: &PoetryDb,
    name: &str,
    full: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let poems = client.poems_by_author(name).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&poems)?);
        return Ok(());
    }
    if poems.is_empty() {
        println!("No poems found for \"{name}\".");
        println!("Try searching for a different poet or check your spelling");
        return Ok(());
    }

    println!(
        "{name} — {} poem{}",
        poems.len(),
        if poems.len() == 1 { "" } else { "s" }
    );
    println!();
    if full {
        for poem in &poems {
            print_poem(poem);
            println!();
        }
    } else {
        print_title_table(&poems);
    }
    Ok(())
}

async fn handle_poem(
    client: &PoetryDb,
    author: &str,
    title: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let poem = client
        .poem(author, title)
        .await?
        .ok_or_else(|| format!("No poem found for {author:?} titled {title:?}"))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&poem)?);
    } else {
        print_poem(&poem);
    }
    Ok(())
}

async fn handle_search(
    client: &PoetryDb,
    query: &str,
    mode: SearchMode,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if query.trim().is_empty() {
        return Err("Search query cannot be empty".into());
    }
    let results = match mode {
        SearchMode::Author => client.search_authors(query).await?,
        SearchMode::Title => client.search_titles(query).await?,
        SearchMode::Lines => client.search_lines(query).await?,
    };

    if as_json {
        let payload = json!({
            "query": query,
            "type": mode.as_str(),
            "count": results.len(),
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No results found for \"{query}\"");
        println!("{}", mode.no_results_hint());
        return Ok(());
    }

    let markdown = match mode {
        SearchMode::Lines => lines_results_markdown(query, &results),
        SearchMode::Author | SearchMode::Title => grouped_results_markdown(query, mode, &results),
    };
    render_markdown_block(&markdown);
    Ok(())
}

async fn handle_random(client: &PoetryDb, as_json: bool) -> Result<(), Box<dyn Error>> {
    let poem = client
        .random()
        .await?
        .ok_or("The archive returned no poem. Please try again.")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&poem)?);
        return Ok(());
    }
    let strip = NewspaperStrip::for_poem(&poem);
    print!("{}", strip.render_plain(strip_width()));
    Ok(())
}

/// Author/title results grouped by author, as the search page shows them.
fn grouped_results_markdown(query: &str, mode: SearchMode, results: &[Poem]) -> String {
    let groups = versewalk::model::group_by_author(results);

    let mut md = format!(
        "# {} results for \"{}\"\n\n",
        mode.label(),
        query
    );
    for (author, poems) in &groups {
        md.push_str(&format!(
            "## {author} — {} poem{}\n\n",
            poems.len(),
            if poems.len() == 1 { "" } else { "s" }
        ));
        for poem in poems.iter().take(6) {
            md.push_str(&format!("* {} ({} lines)\n", poem.title, poem.line_count()));
        }
        if poems.len() > 6 {
            md.push_str(&format!("* ... and {} more poems\n", poems.len() - 6));
        }
        md.push('\n');
    }
    md
}

/// Lines-mode results: matching lines with one line of context on each
/// side, match emphasised, capped at three matches per poem.
fn lines_results_markdown(query: &str, results: &[Poem]) -> String {
    let mut md = format!("# Lines containing \"{query}\"\n\n");
    for poem in results {
        let author = if poem.author.is_empty() {
            "Unknown"
        } else {
            poem.author.as_str()
        };
        md.push_str(&format!("## {} — by {author}\n\n", poem.title));

        let matches = poem.matching_line_indices(query);
        if matches.is_empty() {
            md.push_str("*No preview available*\n\n");
            continue;
        }
        for &idx in matches.iter().take(3) {
            if idx > 0 {
                md.push_str(&format!("> {}\n", poem.lines[idx - 1]));
            }
            md.push_str(&format!("> {}\n", emphasise(&poem.lines[idx], query)));
            if idx + 1 < poem.lines.len() {
                md.push_str(&format!("> {}\n", poem.lines[idx + 1]));
            }
            md.push('\n');
        }
        if matches.len() > 3 {
            md.push_str(&format!("{} more matching lines\n\n", matches.len() - 3));
        }
    }
    md
}

/// Wraps the first case-insensitive occurrence of `query` in bold markup.
fn emphasise(line: &str, query: &str) -> String {
    let lower = line.to_lowercase();
    let needle = query.to_lowercase();
    if lower.len() == line.len() {
        if let Some(pos) = lower.find(&needle) {
            let end = pos + needle.len();
            if line.is_char_boundary(pos) && line.is_char_boundary(end) {
                return format!("{}**{}**{}", &line[..pos], &line[pos..end], &line[end..]);
            }
        }
    }
    line.to_string()
}

fn print_title_table(poems: &[Poem]) {
    let width = poems
        .iter()
        .map(|poem| poem.title.chars().count())
        .max()
        .unwrap_or(5)
        .max("TITLE".len());
    println!("{:<width$}  {}", "TITLE", "LINES", width = width);
    println!("{:-<width$}  {}", "", "-----", width = width);
    for poem in poems {
        println!(
            "{:<width$}  {}",
            poem.title,
            poem.line_count(),
            width = width
        );
    }
}

fn print_poem(poem: &Poem) {
    println!("{}", poem.title);
    if poem.author.is_empty() {
        println!("by Unknown");
    } else {
        println!("by {}", poem.author);
    }
    println!();
    for line in &poem.lines {
        println!("  {line}");
    }
    println!();
    println!("{} lines", poem.line_count());
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn strip_width() -> usize {
    markdown_width().min(72)
}

fn render_markdown_block(body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
