use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use life_os_dashboard::presentation::{
    transaction_row, ActivityRow, DashboardView, DonutView, Section, TransactionRow,
};
use life_os_dashboard::{DashboardData, MoodPoint};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

/// Width of the inline bars drawn next to slices and mood points
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    MonthLedger,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::MonthLedger,
            Page::MonthLedger => Page::Overview,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::MonthLedger => "Month Ledger",
        }
    }
}

pub struct App {
    pub data: DashboardData,
    pub view: DashboardView,
    pub ledger: Vec<TransactionRow>,
    pub state: TableState,
    pub current_page: Page,
    pub recent: usize,
    pub loaded_at: DateTime<Local>,
}

impl App {
    pub fn new(data: DashboardData, recent: usize) -> Self {
        let mut app = Self {
            view: DashboardView::from_data(&data, recent),
            ledger: data.transactions.iter().map(transaction_row).collect(),
            data,
            state: TableState::default(),
            current_page: Page::Overview,
            recent,
            loaded_at: Local::now(),
        };
        app.reset_selection();
        app
    }

    /// Swap in a freshly loaded bundle, keeping the current page.
    pub fn replace(&mut self, data: DashboardData) {
        self.view = DashboardView::from_data(&data, self.recent);
        self.ledger = data.transactions.iter().map(transaction_row).collect();
        self.data = data;
        self.loaded_at = Local::now();
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        let selected = if self.ledger.is_empty() { None } else { Some(0) };
        self.state.select(selected);
    }

    pub fn next(&mut self) {
        let len = self.ledger.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.ledger.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }
}

/// Run the dashboard until the user quits; `reload` re-runs the pipeline.
pub fn run_ui<F>(app: &mut App, reload: F) -> Result<()>
where
    F: FnMut() -> DashboardData,
{
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, reload);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B, F>(terminal: &mut Terminal<B>, app: &mut App, mut reload: F) -> io::Result<()>
where
    B: ratatui::backend::Backend,
    F: FnMut() -> DashboardData,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char('r') => app.replace(reload()),
                KeyCode::Tab | KeyCode::BackTab => app.current_page = app.current_page.next(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with spend summary
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        Page::MonthLedger => render_ledger(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let burn = &app.view.burn_rate;

    let mut spans = vec![];
    for (i, page) in [Page::Overview, Page::MonthLedger].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Spent: {}", money(app.view.total_spent)),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("{}/day", money(burn.burn_rate_daily)),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Projected: {} ({} days left)", money(burn.projected_end_month), burn.days_remaining),
        Style::default().fg(Color::Magenta),
    ));

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    match &app.view.spend_breakdown {
        Section::Ready(donut) => render_spend_breakdown(f, top[0], donut),
        Section::NoData(message) => render_no_data(f, top[0], "Spending by Category", message),
    }

    match &app.view.mood {
        Section::Ready(points) => render_mood(f, top[1], points),
        Section::NoData(message) => render_no_data(f, top[1], "Mood (last 7 days)", message),
    }

    match &app.view.recent_transactions {
        Section::Ready(rows) => render_transactions(f, bottom[0], "Recent Transactions", rows, None),
        Section::NoData(message) => render_no_data(f, bottom[0], "Recent Transactions", message),
    }

    match &app.view.activities {
        Section::Ready(rows) => render_activities(f, bottom[1], rows),
        Section::NoData(message) => render_no_data(f, bottom[1], "Recent Activities", message),
    }
}

fn render_no_data(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )))
    .block(Block::default().title(title.to_string()).borders(Borders::ALL));

    f.render_widget(paragraph, area);
}

fn render_spend_breakdown(f: &mut Frame, area: Rect, donut: &DonutView) {
    let header = Row::new(["Category", "Amount", "%", ""].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }));

    let rows = donut.slices.iter().map(|slice| {
        let share = if donut.total > 0.0 { slice.value / donut.total } else { 0.0 };
        Row::new(vec![
            Cell::from(truncate(&slice.name, 20)),
            Cell::from(money(slice.value)),
            Cell::from(format!("{:.0}%", share * 100.0)),
            Cell::from(bar(share, BAR_WIDTH)).style(Style::default().fg(Color::Cyan)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Min(BAR_WIDTH as u16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!("Spending by Category ({})", money(donut.total)))
            .borders(Borders::ALL),
    );

    f.render_widget(table, area);
}

fn render_mood(f: &mut Frame, area: Rect, points: &[MoodPoint]) {
    let items: Vec<ListItem> = points
        .iter()
        .map(|point| {
            let line = match point.mood {
                Some(mood) => Line::from(vec![
                    Span::raw(format!("{:<7}", point.date)),
                    Span::styled(bar(mood / 10.0, BAR_WIDTH), Style::default().fg(mood_color(mood))),
                    Span::raw(format!(" {:.1}", mood)),
                ]),
                None => Line::from(vec![
                    Span::raw(format!("{:<7}", point.date)),
                    Span::styled("(no score)", Style::default().fg(Color::DarkGray)),
                ]),
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(Block::default().title("Mood (last 7 days)").borders(Borders::ALL));

    f.render_widget(list, area);
}

fn render_activities(f: &mut Frame, area: Rect, rows: &[ActivityRow]) {
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<12}", truncate(&row.label, 12)),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::styled(row.preview.clone(), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().title("Recent Activities").borders(Borders::ALL));

    f.render_widget(list, area);
}

fn render_transactions(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[TransactionRow],
    state: Option<&mut TableState>,
) {
    let header = Row::new(["Date", "Merchant", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray));

    let table_rows = rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.date.clone().unwrap_or_else(|| "-".to_string())),
            Cell::from(truncate(&row.merchant, 24)),
            Cell::from(truncate(&row.category, 18)),
            Cell::from(row.amount.map(money).unwrap_or_else(|| "-".to_string()))
                .style(Style::default().fg(Color::Red)),
        ])
    });

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(12),
            Constraint::Length(24),
            Constraint::Length(18),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(Block::default().title(title.to_string()).borders(Borders::ALL))
    .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
    .highlight_symbol("▶ ");

    match state {
        Some(state) => f.render_stateful_widget(table, area, state),
        None => f.render_widget(table, area),
    }
}

fn render_ledger(f: &mut Frame, area: Rect, app: &mut App) {
    if app.ledger.is_empty() {
        render_no_data(f, area, "Month Ledger", "No transactions this month");
        return;
    }

    let title = format!("Month Ledger ({} transactions)", app.ledger.len());
    render_transactions(f, area, &title, &app.ledger, Some(&mut app.state));
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" Loaded {} ", app.loaded_at.format("%H:%M:%S")),
        Style::default().fg(Color::Cyan),
    )];

    if app.current_page == Page::MonthLedger {
        let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("Row: {}/{}", selected, app.ledger.len()),
            Style::default().fg(Color::Cyan),
        ));
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Refresh | "));
    spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Page | "));
    spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Nav | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn mood_color(mood: f64) -> Color {
    if mood >= 7.0 {
        Color::Green
    } else if mood >= 4.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

/// Filled bar for a 0..=1 share; out-of-range shares are pinned to the ends.
fn bar(share: f64, width: usize) -> String {
    let filled = (share.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
