//! Interactive terminal browser.
//!
//! One page is visible at a time, mirroring the site's routes; `/` opens
//! the incremental search overlay on top of whatever page is showing.
//! Every page owns its own fetch: responses are tagged with a navigation
//! generation and stale generations are dropped, so racing fetches can
//! never paint a page the user already left.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use crate::api::{ApiError, PoetryDb};
use crate::authors::AuthorIndex;
use crate::model::{Poem, SearchMode, SearchResult, group_by_author};
use crate::routes::Route;
use crate::search::{self, SearchJob, SearchSession};
use crate::strip::NewspaperStrip;

const TICK: Duration = Duration::from_millis(100);

/// Runs the browser until the user quits.
pub async fn run(client: PoetryDb) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = App::new(client).run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// A page-local fetch lifecycle.
enum Fetch<T> {
    Loading,
    Ready(T),
    Failed(String),
}

enum Page {
    Home {
        authors: Fetch<Vec<String>>,
        list: ListState,
    },
    Author {
        name: String,
        poems: Fetch<Vec<Poem>>,
        list: ListState,
    },
    Poem {
        author: String,
        title: String,
        poem: Fetch<Option<Poem>>,
        scroll: u16,
    },
    Results {
        query: String,
        mode: SearchMode,
        results: Fetch<Vec<Poem>>,
        scroll: u16,
    },
    Surprise {
        strip: Fetch<Option<NewspaperStrip>>,
        scroll: u16,
    },
}

impl Page {
    fn for_route(route: &Route) -> Page {
        match route {
            Route::Home => Page::Home {
                authors: Fetch::Loading,
                list: ListState::default(),
            },
            Route::Author { name } => Page::Author {
                name: name.clone(),
                poems: Fetch::Loading,
                list: ListState::default(),
            },
            Route::Poem { author, title } => Page::Poem {
                author: author.clone(),
                title: title.clone(),
                poem: Fetch::Loading,
                scroll: 0,
            },
            Route::Search { query, mode } => Page::Results {
                query: query.clone(),
                mode: *mode,
                results: Fetch::Loading,
                scroll: 0,
            },
            Route::Surprise => Page::Surprise {
                strip: Fetch::Loading,
                scroll: 0,
            },
        }
    }

    fn route(&self) -> Route {
        match self {
            Page::Home { .. } => Route::Home,
            Page::Author { name, .. } => Route::Author { name: name.clone() },
            Page::Poem { author, title, .. } => Route::Poem {
                author: author.clone(),
                title: title.clone(),
            },
            Page::Results { query, mode, .. } => Route::Search {
                query: query.clone(),
                mode: *mode,
            },
            Page::Surprise { .. } => Route::Surprise,
        }
    }
}

enum PageData {
    Authors(Result<Vec<String>, String>),
    AuthorPoems(Result<Vec<Poem>, String>),
    Poem(Result<Option<Poem>, String>),
    Results(Result<Vec<Poem>, String>),
    Random(Result<Option<Poem>, String>),
}

enum Msg {
    Page { generation: u64, data: PageData },
    Search {
        seq: u64,
        outcome: Result<Vec<SearchResult>, String>,
    },
}

/// The search widget floating over the current page.
struct Overlay {
    open: bool,
    session: SearchSession,
    list: ListState,
}

struct App {
    client: Arc<PoetryDb>,
    tx: UnboundedSender<Msg>,
    rx: UnboundedReceiver<Msg>,
    page: Page,
    back_stack: Vec<Route>,
    generation: u64,
    overlay: Overlay,
    should_quit: bool,
}

impl App {
    fn new(client: PoetryDb) -> App {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App {
            client: Arc::new(client),
            tx,
            rx,
            page: Page::for_route(&Route::Home),
            back_stack: Vec::new(),
            generation: 0,
            overlay: Overlay {
                open: false,
                session: SearchSession::new(AuthorIndex::bundled()),
                list: ListState::default(),
            },
            should_quit: false,
        };
        app.spawn_page_fetch(Route::Home);
        app
    }

    async fn run(
        mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;

            while let Ok(msg) = self.rx.try_recv() {
                self.handle_msg(msg);
            }
            let now = Instant::now();
            if let Some(job) = self.overlay.session.poll(now) {
                self.spawn_search(job);
            }
            if self.should_quit {
                return Ok(());
            }

            // Wake up for the debounce deadline if it lands inside the tick.
            let timeout = self
                .overlay
                .session
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(now))
                .unwrap_or(TICK)
                .min(TICK);
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.on_key(key);
                    }
                }
            }
        }
    }

    // ── navigation ─────────────────────────────────────────────────────

    fn navigate(&mut self, route: Route) {
        self.back_stack.push(self.page.route());
        self.enter(route);
    }

    fn go_back(&mut self) {
        if let Some(route) = self.back_stack.pop() {
            self.enter(route);
        }
    }

    fn enter(&mut self, route: Route) {
        self.generation += 1;
        self.page = Page::for_route(&route);
        self.spawn_page_fetch(route);
    }

    /// Re-runs the current page's fetch ("Another Verse" on the random
    /// page; manual resubmit elsewhere — failures are never retried
    /// automatically).
    fn refresh(&mut self) {
        let route = self.page.route();
        self.enter(route);
    }

    fn spawn_page_fetch(&self, route: Route) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let data = match route {
                Route::Home => PageData::Authors(client.authors().await.map_err(user_message)),
                Route::Author { name } => PageData::AuthorPoems(
                    client.poems_by_author(&name).await.map_err(user_message),
                ),
                Route::Poem { author, title } => {
                    PageData::Poem(client.poem(&author, &title).await.map_err(user_message))
                }
                Route::Search { query, mode } => {
                    let outcome = match mode {
                        SearchMode::Author => client.search_authors(&query).await,
                        SearchMode::Title => client.search_titles(&query).await,
                        SearchMode::Lines => client.search_lines(&query).await,
                    };
                    PageData::Results(outcome.map_err(user_message))
                }
                Route::Surprise => PageData::Random(client.random().await.map_err(user_message)),
            };
            let _ = tx.send(Msg::Page { generation, data });
        });
    }

    fn spawn_search(&self, job: SearchJob) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = search::run_search_job(&client, &job)
                .await
                .map_err(user_message);
            let _ = tx.send(Msg::Search {
                seq: job.seq,
                outcome,
            });
        });
    }

    // ── message handling ───────────────────────────────────────────────

    fn handle_msg(&mut self, msg: Msg) {
        match msg {
            Msg::Page { generation, data } => {
                if generation != self.generation {
                    // Response for a page the user already left.
                    return;
                }
                self.apply_page_data(data);
            }
            Msg::Search { seq, outcome } => {
                self.overlay.session.apply(seq, outcome);
                let len = self.overlay.session.results().len();
                self.overlay.list.select(if len == 0 { None } else { Some(0) });
            }
        }
    }

    fn apply_page_data(&mut self, data: PageData) {
        match (&mut self.page, data) {
            (Page::Home { authors, list }, PageData::Authors(outcome)) => {
                *authors = into_fetch(outcome);
                if let Fetch::Ready(names) = authors {
                    list.select(if names.is_empty() { None } else { Some(0) });
                }
            }
            (Page::Author { poems, list, .. }, PageData::AuthorPoems(outcome)) => {
                *poems = into_fetch(outcome);
                if let Fetch::Ready(records) = poems {
                    list.select(if records.is_empty() { None } else { Some(0) });
                }
            }
            (Page::Poem { poem, .. }, PageData::Poem(outcome)) => {
                *poem = into_fetch(outcome);
            }
            (Page::Results { results, .. }, PageData::Results(outcome)) => {
                *results = into_fetch(outcome);
            }
            (Page::Surprise { strip, .. }, PageData::Random(outcome)) => {
                *strip = match outcome {
                    Ok(Some(poem)) => Fetch::Ready(Some(NewspaperStrip::for_poem(&poem))),
                    Ok(None) => Fetch::Ready(None),
                    Err(message) => Fetch::Failed(message),
                };
            }
            // A generation check already passed, so a variant mismatch
            // cannot happen; ignore rather than panic.
            _ => {}
        }
    }

    // ── input ──────────────────────────────────────────────────────────

    fn on_key(&mut self, key: KeyEvent) {
        if self.overlay.open {
            self.on_search_key(key);
        } else {
            self.on_page_key(key);
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Esc => self.close_overlay(),
            KeyCode::Tab => {
                let next = self.overlay.session.mode().next();
                self.overlay.session.set_mode(next, now);
                self.overlay.list.select(None);
            }
            KeyCode::Down => self.move_overlay_selection(1),
            KeyCode::Up => self.move_overlay_selection(-1),
            KeyCode::Enter => {
                let selected = self
                    .overlay
                    .list
                    .selected()
                    .and_then(|i| self.overlay.session.results().get(i))
                    .and_then(Route::for_result);
                if let Some(route) = selected {
                    self.close_overlay();
                    self.navigate(route);
                } else if self.overlay.session.can_view_all() {
                    self.view_all();
                }
            }
            KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.overlay.session.can_view_all() {
                    self.view_all();
                }
            }
            KeyCode::Backspace => {
                self.overlay.session.backspace(now);
                self.overlay.list.select(None);
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.overlay.session.push_char(ch, now);
                self.overlay.list.select(None);
            }
            _ => {}
        }
    }

    fn view_all(&mut self) {
        let route = Route::view_all(
            self.overlay.session.query(),
            self.overlay.session.mode(),
        );
        self.close_overlay();
        self.navigate(route);
    }

    fn close_overlay(&mut self) {
        self.overlay.open = false;
        self.overlay.session.reset();
        self.overlay.list.select(None);
    }

    fn move_overlay_selection(&mut self, delta: i32) {
        let len = self.overlay.session.results().len();
        if len == 0 {
            return;
        }
        let current = self.overlay.list.selected().unwrap_or(0) as i32;
        let next = (current + delta).rem_euclid(len as i32) as usize;
        self.overlay.list.select(Some(next));
    }

    fn on_page_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => {
                // Opening always starts from a clean slate.
                self.overlay.session.reset();
                self.overlay.list.select(None);
                self.overlay.open = true;
            }
            KeyCode::Char('s') => {
                if !matches!(self.page, Page::Surprise { .. }) {
                    self.navigate(Route::Surprise);
                }
            }
            KeyCode::Char('r') => {
                if matches!(self.page, Page::Surprise { .. }) {
                    self.refresh();
                }
            }
            KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.go_back(),
            KeyCode::Down | KeyCode::Char('j') => self.move_page(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_page(-1),
            KeyCode::Enter => self.open_selected(),
            _ => {}
        }
    }

    fn move_page(&mut self, delta: i32) {
        match &mut self.page {
            Page::Home {
                authors: Fetch::Ready(names),
                list,
            } => move_selection(list, names.len(), delta),
            Page::Author {
                poems: Fetch::Ready(records),
                list,
                ..
            } => move_selection(list, records.len(), delta),
            Page::Poem { scroll, .. }
            | Page::Results { scroll, .. }
            | Page::Surprise { scroll, .. } => {
                *scroll = scroll.saturating_add_signed(delta as i16);
            }
            _ => {}
        }
    }

    fn open_selected(&mut self) {
        let route = match &self.page {
            Page::Home {
                authors: Fetch::Ready(names),
                list,
            } => list.selected().and_then(|i| names.get(i)).map(|name| {
                Route::Author { name: name.clone() }
            }),
            Page::Author {
                poems: Fetch::Ready(records),
                list,
                ..
            } => list.selected().and_then(|i| records.get(i)).map(|poem| {
                Route::Poem {
                    author: poem.author.clone(),
                    title: poem.title.clone(),
                }
            }),
            _ => None,
        };
        if let Some(route) = route {
            self.navigate(route);
        }
    }

    // ── rendering ──────────────────────────────────────────────────────

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_page(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);

        if self.overlay.open {
            self.render_overlay(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = Line::from(vec![
            Span::styled(
                " versewalk ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(self.page.route().path(), Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hint = if self.overlay.open {
            "type to search · Tab mode · ↑/↓ select · Enter open · ^V view all · Esc close"
        } else {
            match self.page {
                Page::Surprise { .. } => "r another verse · / search · Esc back · q quit",
                Page::Home { .. } => "↑/↓ choose author · Enter open · / search · s surprise · q quit",
                _ => "↑/↓ move · Enter open · / search · s surprise · Esc back · q quit",
            }
        };
        frame.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }

    fn render_page(&mut self, frame: &mut Frame, area: Rect) {
        match &mut self.page {
            Page::Home { authors, list } => render_home(frame, area, authors, list),
            Page::Author { name, poems, list } => render_author(frame, area, name, poems, list),
            Page::Poem {
                author,
                poem,
                scroll,
                ..
            } => render_poem(frame, area, author, poem, *scroll),
            Page::Results {
                query,
                mode,
                results,
                scroll,
            } => render_results(frame, area, query, *mode, results, *scroll),
            Page::Surprise { strip, scroll } => render_surprise(frame, area, strip, *scroll),
        }
    }

    fn render_overlay(&mut self, frame: &mut Frame) {
        let area = centered_rect(64, 70, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        // Mode tabs.
        let mut tabs: Vec<Span> = Vec::new();
        for mode in SearchMode::ALL {
            let style = if mode == self.overlay.session.mode() {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            tabs.push(Span::styled(format!(" {} ", mode.label()), style));
            tabs.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(tabs)), rows[0]);

        // Input line.
        let input = Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(self.overlay.session.query().to_string()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]);
        frame.render_widget(Paragraph::new(input), rows[1]);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("Search by {}…", self.overlay.session.mode().as_str()),
                Style::default().fg(Color::DarkGray),
            ))),
            rows[2],
        );

        self.render_overlay_body(frame, rows[3]);

        let footer = if self.overlay.session.can_view_all() {
            "Powered by PoetryDB · ^V view all results"
        } else {
            "Powered by PoetryDB"
        };
        frame.render_widget(
            Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
            rows[4],
        );
    }

    fn render_overlay_body(&mut self, frame: &mut Frame, area: Rect) {
        use crate::search::Phase;

        match self.overlay.session.phase() {
            Phase::Loading => {
                frame.render_widget(centered_note(vec!["Searching…".to_string()]), area);
            }
            Phase::Errored => {
                let message = self
                    .overlay
                    .session
                    .error()
                    .unwrap_or("Something went wrong with the search. Please try again.")
                    .to_string();
                frame.render_widget(
                    Paragraph::new(message)
                        .style(Style::default().fg(Color::Red))
                        .wrap(Wrap { trim: true }),
                    area,
                );
            }
            Phase::NoResults => {
                frame.render_widget(
                    centered_note(vec![
                        "No results found".to_string(),
                        "Try a different search term".to_string(),
                    ]),
                    area,
                );
            }
            Phase::Idle => {
                frame.render_widget(
                    centered_note(vec![
                        "Type at least 2 characters to search".to_string(),
                        self.overlay.session.mode().example_hint().to_string(),
                    ]),
                    area,
                );
            }
            Phase::Shown => {
                let width = area.width.saturating_sub(6) as usize;
                let items: Vec<ListItem> = self
                    .overlay
                    .session
                    .results()
                    .iter()
                    .map(|result| {
                        let header = Line::from(vec![
                            Span::styled(
                                format!("({}) ", result.avatar()),
                                Style::default()
                                    .fg(Color::Yellow)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                truncate_width(result.headline(), width),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                        ]);
                        let byline = Line::from(Span::styled(
                            format!("    {}", truncate_width(&result.byline(), width)),
                            Style::default().fg(Color::DarkGray),
                        ));
                        ListItem::new(vec![header, byline])
                    })
                    .collect();
                let list = List::new(items)
                    .highlight_style(Style::default().bg(Color::Rgb(60, 60, 30)))
                    .highlight_symbol("» ");
                frame.render_stateful_widget(list, area, &mut self.overlay.list);
            }
        }
    }
}

fn user_message(err: ApiError) -> String {
    warn!(error = %err, "poetrydb request failed");
    err.user_message().to_string()
}

fn into_fetch<T>(outcome: Result<T, String>) -> Fetch<T> {
    match outcome {
        Ok(value) => Fetch::Ready(value),
        Err(message) => Fetch::Failed(message),
    }
}

fn move_selection(list: &mut ListState, len: usize, delta: i32) {
    if len == 0 {
        return;
    }
    let current = list.selected().unwrap_or(0) as i32;
    let next = (current + delta).clamp(0, len as i32 - 1) as usize;
    list.select(Some(next));
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn centered_note(lines: Vec<String>) -> Paragraph<'static> {
    let mut text: Vec<Line> = vec![Line::from("")];
    let mut first = true;
    for line in lines {
        let style = if first {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        first = false;
        text.push(Line::from(Span::styled(line, style)));
    }
    Paragraph::new(text).alignment(Alignment::Center)
}

fn truncate_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if out.width() + 2 > max {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

fn loading_widget() -> Paragraph<'static> {
    Paragraph::new("Loading…").style(Style::default().fg(Color::DarkGray))
}

fn failure_widget(message: &str) -> Paragraph<'static> {
    Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
}

fn render_home(frame: &mut Frame, area: Rect, authors: &Fetch<Vec<String>>, list: &mut ListState) {
    let block = Block::default().title(" Authors ").borders(Borders::ALL);
    match authors {
        Fetch::Loading => frame.render_widget(loading_widget().block(block), area),
        Fetch::Failed(message) => frame.render_widget(failure_widget(message).block(block), area),
        Fetch::Ready(names) => {
            let block = Block::default()
                .title(format!(" Authors ({}) ", names.len()))
                .borders(Borders::ALL);
            let items: Vec<ListItem> = names
                .iter()
                .map(|name| ListItem::new(name.as_str()))
                .collect();
            let widget = List::new(items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("» ");
            frame.render_stateful_widget(widget, area, list);
        }
    }
}

fn render_author(
    frame: &mut Frame,
    area: Rect,
    name: &str,
    poems: &Fetch<Vec<Poem>>,
    list: &mut ListState,
) {
    let title = format!(" {name} ");
    match poems {
        Fetch::Loading => frame.render_widget(
            loading_widget().block(Block::default().title(title).borders(Borders::ALL)),
            area,
        ),
        Fetch::Failed(message) => frame.render_widget(
            failure_widget(message).block(Block::default().title(title).borders(Borders::ALL)),
            area,
        ),
        Fetch::Ready(records) if records.is_empty() => frame.render_widget(
            Paragraph::new(format!("No poems found for \"{name}\"."))
                .block(Block::default().title(title).borders(Borders::ALL)),
            area,
        ),
        Fetch::Ready(records) => {
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
                .split(area);

            let items: Vec<ListItem> = records
                .iter()
                .map(|poem| ListItem::new(poem.title.as_str()))
                .collect();
            let sidebar = List::new(items)
                .block(
                    Block::default()
                        .title(format!(" {name} — {} poems ", records.len()))
                        .borders(Borders::ALL),
                )
                .highlight_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("» ");
            frame.render_stateful_widget(sidebar, panes[0], list);

            let reading = list.selected().and_then(|i| records.get(i));
            let body = match reading {
                Some(poem) => poem_text(poem),
                None => vec![Line::from("Select a poem to read")],
            };
            frame.render_widget(
                Paragraph::new(body)
                    .block(Block::default().borders(Borders::ALL))
                    .wrap(Wrap { trim: false }),
                panes[1],
            );
        }
    }
}

fn render_poem(
    frame: &mut Frame,
    area: Rect,
    author: &str,
    poem: &Fetch<Option<Poem>>,
    scroll: u16,
) {
    let block = Block::default()
        .title(format!(" {author} "))
        .borders(Borders::ALL);
    match poem {
        Fetch::Loading => frame.render_widget(loading_widget().block(block), area),
        Fetch::Failed(message) => frame.render_widget(failure_widget(message).block(block), area),
        Fetch::Ready(None) => {
            frame.render_widget(Paragraph::new("Poem not found").block(block), area)
        }
        Fetch::Ready(Some(poem)) => {
            frame.render_widget(
                Paragraph::new(poem_text(poem))
                    .block(block)
                    .wrap(Wrap { trim: false })
                    .scroll((scroll, 0)),
                area,
            );
        }
    }
}

fn poem_text(poem: &Poem) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            poem.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            if poem.author.is_empty() {
                "by Unknown".to_string()
            } else {
                format!("by {}", poem.author)
            },
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];
    for line in &poem.lines {
        lines.push(Line::from(line.clone()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{} lines", poem.line_count()),
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

fn render_results(
    frame: &mut Frame,
    area: Rect,
    query: &str,
    mode: SearchMode,
    results: &Fetch<Vec<Poem>>,
    scroll: u16,
) {
    let block = Block::default()
        .title(format!(" Search: \"{query}\" ({}) ", mode.label()))
        .borders(Borders::ALL);
    match results {
        Fetch::Loading => frame.render_widget(loading_widget().block(block), area),
        Fetch::Failed(message) => frame.render_widget(failure_widget(message).block(block), area),
        Fetch::Ready(poems) if poems.is_empty() => {
            let body = vec![
                Line::from(format!("No results found for \"{query}\"")),
                Line::from(Span::styled(
                    mode.no_results_hint(),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            frame.render_widget(Paragraph::new(body).block(block), area);
        }
        Fetch::Ready(poems) => {
            let body = match mode {
                SearchMode::Lines => lines_result_text(query, poems),
                SearchMode::Author | SearchMode::Title => grouped_result_text(poems),
            };
            frame.render_widget(
                Paragraph::new(body)
                    .block(block)
                    .wrap(Wrap { trim: false })
                    .scroll((scroll, 0)),
                area,
            );
        }
    }
}

fn grouped_result_text(poems: &[Poem]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (author, members) in group_by_author(poems) {
        lines.push(Line::from(Span::styled(
            format!(
                "{author} — {} poem{}",
                members.len(),
                if members.len() == 1 { "" } else { "s" }
            ),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        for poem in members.iter().take(6) {
            lines.push(Line::from(format!(
                "  • {} ({} lines)",
                poem.title,
                poem.line_count()
            )));
        }
        if members.len() > 6 {
            lines.push(Line::from(Span::styled(
                format!("  … and {} more poems", members.len() - 6),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
    }
    lines
}

fn lines_result_text(query: &str, poems: &[Poem]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for poem in poems {
        lines.push(Line::from(vec![
            Span::styled(
                poem.title.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  by {}",
                    if poem.author.is_empty() {
                        "Unknown"
                    } else {
                        poem.author.as_str()
                    }
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        let matches = poem.matching_line_indices(query);
        if matches.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No preview available",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for &idx in matches.iter().take(3) {
            if idx > 0 {
                lines.push(Line::from(Span::styled(
                    format!("  │ {}", poem.lines[idx - 1]),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(highlighted_line(&poem.lines[idx], query));
            if idx + 1 < poem.lines.len() {
                lines.push(Line::from(Span::styled(
                    format!("  │ {}", poem.lines[idx + 1]),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        if matches.len() > 3 {
            lines.push(Line::from(Span::styled(
                format!("  {} more matching lines", matches.len() - 3),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Builds a line with the first case-insensitive match of `query` marked.
fn highlighted_line(line: &str, query: &str) -> Line<'static> {
    let lower = line.to_lowercase();
    let needle = query.to_lowercase();
    if lower.len() == line.len() {
        if let Some(pos) = lower.find(&needle) {
            let end = pos + needle.len();
            if line.is_char_boundary(pos) && line.is_char_boundary(end) {
                return Line::from(vec![
                    Span::raw(format!("  │ {}", &line[..pos])),
                    Span::styled(
                        line[pos..end].to_string(),
                        Style::default()
                            .fg(Color::Black)
                            .bg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(line[end..].to_string()),
                ]);
            }
        }
    }
    Line::from(format!("  │ {line}"))
}

fn render_surprise(
    frame: &mut Frame,
    area: Rect,
    strip: &Fetch<Option<NewspaperStrip>>,
    scroll: u16,
) {
    let block = Block::default()
        .title(" The Daily Verse ")
        .borders(Borders::ALL);
    match strip {
        Fetch::Loading => frame.render_widget(loading_widget().block(block), area),
        Fetch::Failed(message) => frame.render_widget(failure_widget(message).block(block), area),
        Fetch::Ready(None) => frame.render_widget(
            Paragraph::new("The archive returned no poem. Press r to try again.").block(block),
            area,
        ),
        Fetch::Ready(Some(strip)) => {
            let width = area.width.saturating_sub(4).max(32) as usize;
            let text: Vec<Line> = strip
                .render_plain(width.min(72))
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect();
            frame.render_widget(
                Paragraph::new(text)
                    .block(block)
                    .alignment(Alignment::Center)
                    .scroll((scroll, 0)),
                area,
            );
        }
    }
}
