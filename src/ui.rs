use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use payment_tracker::{
    tracker::validate_name, view::EMPTY_GRID_MESSAGE, year_options, DeleteOutcome,
    DirectoryExportSink, ExportSink, GridView, LedgerStore, Month, SummaryView, Tracker,
    TrackerError, UserPrompt,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Typing a new person name
    AddPerson(String),
    /// Waiting for y/n before deleting this person
    ConfirmDelete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Answer collected by the y/n modal, handed to the tracker as its prompt
struct ModalAnswer(bool);

impl UserPrompt for ModalAnswer {
    fn confirm(&mut self, _message: &str) -> bool {
        self.0
    }

    // The status bar shows outcomes
    fn notify(&mut self, _message: &str) {}
}

pub struct App<'a, S: LedgerStore> {
    pub tracker: &'a mut Tracker<S>,
    pub today: NaiveDate,
    pub state: TableState,
    pub selected_month: Month,
    pub mode: Mode,
    pub notice: Option<(String, NoticeKind)>,
    sink: DirectoryExportSink,
}

impl<'a, S: LedgerStore> App<'a, S> {
    pub fn new(tracker: &'a mut Tracker<S>, today: NaiveDate, sink: DirectoryExportSink) -> Self {
        let mut app = Self {
            tracker,
            today,
            state: TableState::default(),
            selected_month: Month::from_chrono(&today),
            mode: Mode::Normal,
            notice: None,
            sink,
        };
        app.clamp_selection();
        app
    }

    fn person_names(&self) -> Vec<String> {
        self.tracker
            .ledger()
            .year(self.tracker.selected_year())
            .map(|record| record.names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn selected_person(&self) -> Option<String> {
        let names = self.person_names();
        self.state.selected().and_then(|i| names.get(i).cloned())
    }

    fn clamp_selection(&mut self) {
        let len = self.person_names().len();
        if len == 0 {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(i));
        }
    }

    fn info(&mut self, message: impl Into<String>) {
        self.notice = Some((message.into(), NoticeKind::Info));
    }

    fn report(&mut self, err: TrackerError) {
        self.notice = Some((err.to_string(), NoticeKind::Error));
    }

    pub fn next(&mut self) {
        let len = self.person_names().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i < len - 1 => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.person_names().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn next_month(&mut self) {
        self.selected_month = self.selected_month.next();
    }

    pub fn previous_month(&mut self) {
        self.selected_month = self.selected_month.previous();
    }

    pub fn toggle_selected(&mut self) {
        let Some(name) = self.selected_person() else {
            return;
        };
        match self.tracker.toggle_payment(&name, self.selected_month) {
            Ok(status) => self.info(format!("{} {}: {}", name, self.selected_month, status.label())),
            Err(e) => self.report(e),
        }
    }

    /// Move the year cursor by `delta`, staying inside the selector window
    pub fn shift_year(&mut self, delta: i32) {
        let target = self.tracker.selected_year() + delta;
        if !year_options(self.today).contains(&target) {
            return;
        }
        self.tracker.switch_year(target);
        self.state.select(Some(0));
        self.clamp_selection();
    }

    pub fn submit_new_person(&mut self, input: &str) {
        match self.tracker.add_person(input) {
            Ok(name) => {
                let index = self.person_names().iter().position(|n| *n == name);
                self.state.select(index);
                self.info(format!("Added {}", name));
            }
            Err(e) => self.report(e),
        }
    }

    pub fn resolve_delete(&mut self, name: &str, answer: bool) {
        match self.tracker.delete_person(name, &mut ModalAnswer(answer)) {
            Ok(DeleteOutcome::Deleted) => self.info(format!("Deleted {}", name)),
            Ok(DeleteOutcome::NotFound) | Ok(DeleteOutcome::Cancelled) => {}
            Err(e) => self.report(e),
        }
        self.clamp_selection();
    }

    pub fn export(&mut self) {
        match self
            .tracker
            .export()
            .and_then(|report| self.sink.deliver(&report))
        {
            Ok(path) => self.info(format!("Report written to {}", path.display())),
            Err(e) => self.report(e),
        }
    }
}

pub fn run_ui<S: LedgerStore>(app: &mut App<'_, S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: LedgerStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<'_, S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        match app.mode.clone() {
            Mode::AddPerson(mut input) => match key.code {
                KeyCode::Enter => {
                    app.mode = Mode::Normal;
                    app.submit_new_person(&input);
                }
                KeyCode::Esc => app.mode = Mode::Normal,
                KeyCode::Backspace => {
                    input.pop();
                    app.mode = Mode::AddPerson(input);
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    app.mode = Mode::AddPerson(input);
                }
                _ => {}
            },
            Mode::ConfirmDelete(name) => {
                let answer = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
                app.mode = Mode::Normal;
                app.resolve_delete(&name, answer);
            }
            Mode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Right | KeyCode::Char('l') => app.next_month(),
                KeyCode::Left | KeyCode::Char('h') => app.previous_month(),
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
                KeyCode::Char(']') => app.shift_year(1),
                KeyCode::Char('[') => app.shift_year(-1),
                KeyCode::Char('a') => {
                    app.notice = None;
                    app.mode = Mode::AddPerson(String::new());
                }
                KeyCode::Char('d') => {
                    if let Some(name) = app.selected_person() {
                        app.mode = Mode::ConfirmDelete(name);
                    }
                }
                KeyCode::Char('e') => app.export(),
                _ => {}
            },
        }
    }
}

fn ui<S: LedgerStore>(f: &mut Frame, app: &mut App<'_, S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Year selector
            Constraint::Min(0),    // Grid + summary
            Constraint::Length(3), // Status bar / input line
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(75), // Payment grid
            Constraint::Percentage(25), // Summary
        ])
        .split(chunks[1]);

    let grid = app.tracker.grid(app.today);
    let summary = app.tracker.summary();
    render_grid(f, content_chunks[0], app, &grid);
    render_summary(f, content_chunks[1], &summary);

    render_status_bar(f, chunks[2], app);
}

fn render_header<S: LedgerStore>(f: &mut Frame, area: Rect, app: &App<'_, S>) {
    let mut spans = vec![Span::styled(
        " Monthly Payment Tracker ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    spans.push(Span::raw(" │ "));

    for year in year_options(app.today) {
        let style = if year == app.tracker.selected_year() {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else if year == app.today.year() {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{}", year), style));
        spans.push(Span::raw(" "));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_grid<S: LedgerStore>(f: &mut Frame, area: Rect, app: &mut App<'_, S>, grid: &GridView) {
    let title = format!(" Payments {} ", grid.year);

    if grid.is_empty() {
        let placeholder = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", EMPTY_GRID_MESSAGE),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        );
        f.render_widget(placeholder, area);
        return;
    }

    let mut header_cells = vec![Cell::from("Person").style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )];
    header_cells.extend(grid.headers.iter().map(|h| {
        let mut style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        if h.is_current {
            style = style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
        }
        if h.month == app.selected_month {
            style = style.add_modifier(Modifier::REVERSED);
        }
        Cell::from(h.month.short_name()).style(style)
    }));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let selected_row = app.state.selected();
    let rows = grid.rows().iter().enumerate().map(|(i, row)| {
        let mut cells = vec![Cell::from(truncate(&row.person_name, 20))];
        cells.extend(row.cells.iter().map(|cell| {
            let (symbol, color) = if cell.paid {
                ("✔", Color::Green)
            } else {
                ("✘", Color::Red)
            };
            let mut style = Style::default().fg(color);
            if cell.is_current {
                style = style.bg(Color::Rgb(40, 40, 60));
            }
            if Some(i) == selected_row && cell.month == app.selected_month {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            Cell::from(format!(" {}", symbol)).style(style)
        }));
        Row::new(cells).height(1)
    });

    let mut widths = vec![Constraint::Length(22)];
    widths.extend(Month::ALL.iter().map(|_| Constraint::Length(4)));

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_summary(f: &mut Frame, area: Rect, summary: &SummaryView) {
    let content: Vec<Line> = match summary {
        SummaryView::Empty => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!(" {}", payment_tracker::view::EMPTY_SUMMARY_MESSAGE),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )),
        ],
        SummaryView::Entries(entries) => entries
            .iter()
            .map(|entry| {
                let color = match entry.paid_count {
                    12 => Color::Green,
                    0 => Color::Red,
                    _ => Color::Yellow,
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {}: ", truncate(&entry.person_name, 18)),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{} of {} months paid", entry.paid_count, Month::ALL.len()),
                        Style::default().fg(color),
                    ),
                ])
            })
            .collect(),
    };

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Summary "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar<S: LedgerStore>(f: &mut Frame, area: Rect, app: &App<'_, S>) {
    let spans = match &app.mode {
        Mode::AddPerson(input) => {
            let remaining = validate_name(input)
                .map(|name| payment_tracker::MAX_NAME_LEN as i64 - name.chars().count() as i64)
                .unwrap_or(payment_tracker::MAX_NAME_LEN as i64);
            vec![
                Span::styled(" New person: ", Style::default().fg(Color::Cyan)),
                Span::raw(input.clone()),
                Span::styled("█", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("  ({} left) Enter save | Esc cancel", remaining.max(0)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]
        }
        Mode::ConfirmDelete(name) => vec![
            Span::styled(
                format!(" Are you sure you want to delete \"{}\"? ", name),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled("y", Style::default().fg(Color::Yellow)),
            Span::raw(" yes | any other key cancels"),
        ],
        Mode::Normal => {
            let mut spans = Vec::new();
            if let Some((message, kind)) = &app.notice {
                let color = match kind {
                    NoticeKind::Info => Color::Green,
                    NoticeKind::Error => Color::Red,
                };
                spans.push(Span::styled(format!(" {} ", message), Style::default().fg(color)));
                spans.push(Span::raw("|"));
            }
            for (key, label) in [
                ("Space", "Toggle"),
                ("←/→", "Month"),
                ("↑/↓", "Person"),
                ("[/]", "Year"),
                ("a", "Add"),
                ("d", "Delete"),
                ("e", "Export"),
            ] {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
                spans.push(Span::raw(format!(" {} |", label)));
            }
            spans.push(Span::raw(" "));
            spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Quit"));
            spans
        }
    };

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment_tracker::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Alice", 20), "Alice");
        assert_eq!(truncate("ÅÅÅÅÅÅÅÅÅÅ", 6), "ÅÅÅ...");
    }

    #[test]
    fn test_add_toggle_delete_flow() {
        let mut tracker = Tracker::open(MemoryStore::new(), today()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(&mut tracker, today(), DirectoryExportSink::new(dir.path()));
        assert_eq!(app.selected_month, Month::March);
        assert_eq!(app.state.selected(), None);

        app.submit_new_person("Alice");
        assert_eq!(app.selected_person().as_deref(), Some("Alice"));

        app.toggle_selected();
        assert_eq!(app.tracker.summary().entries()[0].paid_count, 1);

        app.resolve_delete("Alice", false);
        assert_eq!(app.selected_person().as_deref(), Some("Alice"));

        app.resolve_delete("Alice", true);
        assert_eq!(app.selected_person(), None);
        assert!(app.tracker.summary().is_empty());
    }

    #[test]
    fn test_year_shift_stays_in_window() {
        let mut tracker = Tracker::open(MemoryStore::new(), today()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(&mut tracker, today(), DirectoryExportSink::new(dir.path()));

        for _ in 0..10 {
            app.shift_year(1);
        }
        assert_eq!(app.tracker.selected_year(), 2029);

        app.shift_year(-1);
        assert_eq!(app.tracker.selected_year(), 2028);
    }

    #[test]
    fn test_validation_error_becomes_notice() {
        let mut tracker = Tracker::open(MemoryStore::new(), today()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(&mut tracker, today(), DirectoryExportSink::new(dir.path()));

        app.submit_new_person("   ");
        assert!(matches!(app.notice, Some((_, NoticeKind::Error))));

        app.export();
        let (message, kind) = app.notice.clone().unwrap();
        assert_eq!(kind, NoticeKind::Error);
        assert_eq!(message, "No data available for year 2024 to download.");
    }
}
