use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{info, warn};
use prodcal::layout::{
    build_gantt, lane_count, month_weeks, range_label, visible_range, GanttLayout, GanttWindow,
    LayoutCache, RowKind, ViewMode, WeekWindow,
};
use prodcal::model::{CalendarFile, LanePolicy, Span, SpanKind};
use prodcal::spans::extract_spans;
use prodcal::storage::{load_calendar, CalendarLocation};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span as TextSpan};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::collections::HashMap;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const LABEL_WIDTH: u16 = 26;
const MIN_CELL_WIDTH: usize = 4;

pub fn run(calendar: CalendarFile, location: CalendarLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(calendar, location);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    calendar: CalendarFile,
    location: CalendarLocation,
    view: ViewMode,
    offset: i64,
    today: NaiveDate,
    policy: LanePolicy,
    cache: LayoutCache,
    last_load: Instant,
    status: String,
}

impl App {
    fn new(calendar: CalendarFile, location: CalendarLocation) -> Self {
        let status = format!("Loaded calendar from {}", location.path.display());
        let policy = calendar.settings.lane_policy;
        App {
            calendar,
            location,
            view: ViewMode::Month,
            offset: 0,
            today: Local::now().date_naive(),
            policy,
            cache: LayoutCache::default(),
            last_load: Instant::now(),
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        info!(
            "layout cache: {} hits, {} misses",
            self.cache.hits(),
            self.cache.misses()
        );
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('1') => self.set_view(ViewMode::Month),
            KeyCode::Char('2') => self.set_view(ViewMode::Quarter),
            KeyCode::Char('3') => self.set_view(ViewMode::Week),
            KeyCode::Char('4') => self.set_view(ViewMode::Day),
            KeyCode::Left | KeyCode::Char('h') => self.offset = self.offset.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => self.offset = self.offset.saturating_add(1),
            KeyCode::Char('t') => {
                self.offset = 0;
                self.today = Local::now().date_naive();
            }
            KeyCode::Char('p') => {
                self.policy = self.policy.toggled();
                self.status = if self.view.is_grid() {
                    format!("Lane policy: {}", self.policy.label())
                } else {
                    format!("Lane policy: {} (month and quarter views)", self.policy.label())
                };
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.offset = 0;
            self.status = format!("{} view", view.label());
        }
    }

    fn reload(&mut self) {
        match load_calendar(&self.location) {
            Ok(calendar) => {
                self.calendar = calendar;
                self.cache.clear();
                self.last_load = Instant::now();
                self.status = format!("Reloaded {}", self.location.path.display());
            }
            Err(err) => {
                warn!("reload failed: {:#}", err);
                self.status = format!("Reload failed: {}", err);
            }
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.view {
            ViewMode::Month => self.draw_month(f, layout[1]),
            ViewMode::Quarter => self.draw_quarter(f, layout[1]),
            ViewMode::Week | ViewMode::Day => self.draw_gantt(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            TextSpan::styled(
                "prodcal ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            TextSpan::styled(
                &self.calendar.name,
                Style::default().add_modifier(Modifier::BOLD),
            ),
            TextSpan::raw("  •  "),
            TextSpan::styled(
                self.location.scope.label(),
                Style::default().fg(Color::Green),
            ),
            TextSpan::raw("  •  "),
            TextSpan::styled(
                range_label(self.view, self.offset, self.today),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            TextSpan::raw("  •  "),
            TextSpan::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
            TextSpan::raw("  •  "),
            TextSpan::styled(
                format!("loaded {}", format_elapsed(self.last_load)),
                Style::default().fg(Color::Gray),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_month(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let (first, _) = visible_range(ViewMode::Month, self.offset, self.today);
        self.draw_month_block(f, area, first);
    }

    fn draw_quarter(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let (first, _) = visible_range(ViewMode::Quarter, self.offset, self.today);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);
        let mut month = first;
        for chunk in chunks.iter() {
            self.draw_month_block(f, *chunk, month);
            month = match month.checked_add_months(chrono::Months::new(1)) {
                Some(next) => next,
                None => break,
            };
        }
    }

    fn draw_month_block(&mut self, f: &mut ratatui::Frame<'_>, area: Rect, first: NaiveDate) {
        let cell = (area.width.saturating_sub(2) as usize / 7).max(MIN_CELL_WIDTH);
        let spans = extract_spans(&self.calendar.projects);
        let colors = project_colors(&self.calendar);

        let mut lines = Vec::new();
        let headings = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
        lines.push(Line::from(
            headings
                .iter()
                .map(|h| {
                    TextSpan::styled(
                        format!("{:<width$}", h, width = cell),
                        Style::default().fg(Color::Gray),
                    )
                })
                .collect::<Vec<_>>(),
        ));
        for week in month_weeks(first.year(), first.month()) {
            lines.push(self.week_day_line(&week, cell));
            let placed = self.cache.week_lanes(&spans, &week, self.policy);
            for lane in 0..lane_count(&placed) {
                let mut segments: Vec<(usize, usize, &Span)> = placed
                    .iter()
                    .filter(|a| a.lane == lane)
                    .filter_map(|a| a.span(&spans).map(|s| (a.start_col, a.end_col, s)))
                    .collect();
                segments.sort_by_key(|(start, _, _)| *start);

                let mut text = Vec::new();
                let mut col = 0;
                for (start, end, span) in segments {
                    if start > col {
                        text.push(TextSpan::raw(" ".repeat((start - col) * cell)));
                    }
                    let width = (end - start + 1) * cell;
                    let label = format!("{:<width$}", truncate_text(&span.label, width), width = width);
                    text.push(TextSpan::styled(
                        label,
                        bar_style(span_color(span, &colors)),
                    ));
                    col = end + 1;
                }
                lines.push(Line::from(text));
            }
        }

        let block = Block::default()
            .title(TextSpan::styled(
                format!("{} {}", first.format("%B"), first.year()),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn week_day_line(&self, week: &WeekWindow, cell: usize) -> Line<'static> {
        let spans: Vec<TextSpan<'static>> = week
            .slots()
            .iter()
            .map(|slot| match slot {
                Some(date) => {
                    let mut style = Style::default().fg(Color::Gray);
                    if *date == self.today {
                        style = style
                            .bg(Color::Cyan)
                            .fg(Color::Black)
                            .add_modifier(Modifier::BOLD);
                    }
                    TextSpan::styled(format!("{:<width$}", date.day(), width = cell), style)
                }
                None => TextSpan::raw(" ".repeat(cell)),
            })
            .collect();
        Line::from(spans)
    }

    fn draw_gantt(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let (start, end) = visible_range(self.view, self.offset, self.today);
        let days = (end - start).num_days() as u32 + 1;
        let window = GanttWindow::new(start, days);
        let layout = build_gantt(&self.calendar.projects, &self.calendar.workback, &window);
        let colors = project_colors(&self.calendar);

        let inner_width = area.width.saturating_sub(2 + LABEL_WIDTH) as usize;
        let cell = (inner_width / window.days as usize).max(MIN_CELL_WIDTH);

        let mut lines = Vec::new();
        let mut header = vec![TextSpan::raw(" ".repeat(LABEL_WIDTH as usize))];
        for date in window.dates() {
            let mut style = Style::default().fg(Color::Gray);
            if date == self.today {
                style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            }
            let text = if window.days == 1 {
                date.format("%a %b %-d").to_string()
            } else {
                date.format("%a %d").to_string()
            };
            header.push(TextSpan::styled(
                format!("{:<width$}", truncate_text(&text, cell), width = cell),
                style,
            ));
        }
        lines.push(Line::from(header));

        if layout.is_empty() {
            lines.push(Line::from(TextSpan::styled(
                "Nothing scheduled in this range",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for row in &layout.rows {
            lines.push(gantt_line(&layout, row.lane, window.days as usize, cell, &colors));
        }

        let block = Block::default()
            .title(TextSpan::styled(
                format!("{} ({} rows)", self.view.label(), layout.rows.len()),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let active = self.calendar.active_projects().count();
        let detail = Paragraph::new(format!(
            "{} projects  •  lanes {}",
            active,
            self.policy.label()
        ))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(detail, bottom[1]);
    }
}

fn gantt_line(
    layout: &GanttLayout,
    lane: usize,
    days: usize,
    cell: usize,
    colors: &HashMap<String, Color>,
) -> Line<'static> {
    let row = &layout.rows[lane];
    let color = colors.get(&row.project_id).copied().unwrap_or(Color::Gray);
    let label_style = match row.kind {
        RowKind::Project => Style::default().fg(color).add_modifier(Modifier::BOLD),
        RowKind::Event => Style::default().fg(Color::LightRed),
        RowKind::SubEvent => Style::default().fg(Color::Gray),
    };
    let mut spans = vec![TextSpan::styled(
        format!(
            "{:<width$}",
            truncate_text(&row.label, LABEL_WIDTH as usize - 1),
            width = LABEL_WIDTH as usize
        ),
        label_style,
    )];

    let bar_color = match row.kind {
        RowKind::Event => Color::LightRed,
        _ => color,
    };
    for col in 0..days {
        let overlay = layout.overlays_on(lane).find(|o| o.col == col);
        let in_bar = col >= row.start_col && col < row.start_col + row.span;
        let cell_span = match (overlay, in_bar) {
            (Some(overlay), _) => {
                let mark = if overlay.done { "✓" } else { "◆" };
                TextSpan::styled(
                    format!(
                        "{:<width$}",
                        truncate_text(&format!("{} {}", mark, overlay.label), cell),
                        width = cell
                    ),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::LightYellow)
                        .add_modifier(Modifier::BOLD),
                )
            }
            (None, true) => TextSpan::styled(" ".repeat(cell), bar_style(bar_color)),
            (None, false) => TextSpan::styled(
                format!("{:<width$}", "·", width = cell),
                Style::default().fg(Color::DarkGray),
            ),
        };
        spans.push(cell_span);
    }
    Line::from(spans)
}

fn footer_help_line() -> Line<'static> {
    let key = Style::default().fg(Color::LightCyan);
    Line::from(vec![
        TextSpan::styled("1", key),
        TextSpan::raw(" month  "),
        TextSpan::styled("2", key),
        TextSpan::raw(" quarter  "),
        TextSpan::styled("3", key),
        TextSpan::raw(" week  "),
        TextSpan::styled("4", key),
        TextSpan::raw(" day  "),
        TextSpan::styled("← → / h l", key),
        TextSpan::raw(" navigate  "),
        TextSpan::styled("t", key),
        TextSpan::raw(" today  "),
        TextSpan::styled("p", key),
        TextSpan::raw(" lanes  "),
        TextSpan::styled("r", key),
        TextSpan::raw(" reload  "),
        TextSpan::styled("q", key),
        TextSpan::raw(" quit"),
    ])
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Project id → accent color, from the project's hint or the palette.
fn project_colors(calendar: &CalendarFile) -> HashMap<String, Color> {
    calendar
        .projects
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let color = p
                .color
                .as_deref()
                .and_then(parse_color)
                .unwrap_or_else(|| color_for_index(idx));
            (p.id.clone(), color)
        })
        .collect()
}

fn span_color(span: &Span, colors: &HashMap<String, Color>) -> Color {
    match span.kind {
        SpanKind::Event => Color::LightRed,
        SpanKind::Engagement | SpanKind::TourDate => colors
            .get(&span.owner_id)
            .copied()
            .unwrap_or(Color::Gray),
    }
}

fn bar_style(color: Color) -> Style {
    Style::default().bg(color).fg(Color::Black)
}

/// Accepts `#rrggbb` or a handful of color names.
fn parse_color(input: &str) -> Option<Color> {
    let trimmed = input.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "red" => Some(Color::LightRed),
        "green" => Some(Color::LightGreen),
        "blue" => Some(Color::LightBlue),
        "yellow" => Some(Color::LightYellow),
        "magenta" | "purple" => Some(Color::LightMagenta),
        "cyan" => Some(Color::Cyan),
        _ => None,
    }
}

fn color_for_index(idx: usize) -> Color {
    let palette = [
        Color::Cyan,
        Color::LightGreen,
        Color::LightMagenta,
        Color::LightBlue,
        Color::LightYellow,
    ];
    palette[idx % palette.len()]
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
