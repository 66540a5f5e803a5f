use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::Duration;

use crate::actions::AppliedJobs;
use crate::client::{ApplicationStore, BackendClient};
use crate::models::{date_only, ApplicationRecord, FieldUpdate, Status};
use crate::notify::{Notifier, ToastKind, Toasts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    ConfirmDelete(i64),
}

struct AppState {
    jobs: AppliedJobs,
    visible: Vec<(ApplicationRecord, bool)>,
    selected: usize,
    scroll_offset: u16,
    mode: Mode,
    toasts: Toasts,
}

impl AppState {
    fn new(jobs: AppliedJobs) -> Self {
        let mut state = Self {
            jobs,
            visible: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            mode: Mode::Browse,
            toasts: Toasts::default(),
        };
        state.rederive();
        state
    }

    /// Recomputes the visible list and keeps the selection on the same job when it survives.
    fn rederive(&mut self) {
        let current_id = self.current_job().map(|r| r.id);
        self.visible = self.jobs.visible_flagged(Utc::now());
        self.selected = current_id
            .and_then(|id| self.visible.iter().position(|(r, _)| r.id == id))
            .unwrap_or(0)
            .min(self.visible.len().saturating_sub(1));
    }

    fn current_job(&self) -> Option<&ApplicationRecord> {
        self.visible.get(self.selected).map(|(r, _)| r)
    }

    fn next(&mut self) {
        if !self.visible.is_empty() && self.selected < self.visible.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn push_search(&mut self, c: char) {
        self.jobs.criteria.search.push(c);
        self.rederive();
    }

    fn pop_search(&mut self) {
        self.jobs.criteria.search.pop();
        self.rederive();
    }

    fn cycle_status_filter(&mut self) {
        let known = Status::known();
        self.jobs.criteria.status = match &self.jobs.criteria.status {
            None => Some(known[0].clone()),
            Some(current) => known
                .iter()
                .position(|s| s == current)
                .and_then(|i| known.get(i + 1).cloned()),
        };
        self.rederive();
    }

    fn cycle_reminder_filter(&mut self) {
        self.jobs.criteria.reminder = self.jobs.criteria.reminder.next();
        self.rederive();
    }

    fn cycle_sort(&mut self) {
        self.jobs.criteria.sort_by = self.jobs.criteria.sort_by.next();
        if !self.jobs.options().honor_sort_by {
            self.toasts
                .info("Sort selection is ignored; list stays newest-applied first (enable honor_sort_by)");
        }
        self.rederive();
    }

    fn refresh(&mut self, store: &dyn ApplicationStore) {
        let _ = self.jobs.refresh(store, &mut self.toasts);
        self.rederive();
    }

    fn apply(&mut self, store: &dyn ApplicationStore, update: FieldUpdate) {
        let Some(id) = self.current_job().map(|r| r.id) else { return };
        let _ = self.jobs.update_field(store, &mut self.toasts, id, &update);
        self.rederive();
    }

    fn delete(&mut self, store: &dyn ApplicationStore, id: i64) {
        let _ = self.jobs.delete(store, &mut self.toasts, id);
        self.rederive();
    }
}

pub fn run_browse(client: &BackendClient, jobs: AppliedJobs) -> Result<()> {
    let mut state = AppState::new(jobs);
    state.refresh(client);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, client);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    client: &BackendClient,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        list_state.select(if state.visible.is_empty() { None } else { Some(state.selected) });
        terminal.draw(|frame| draw(frame, state, &mut list_state, client))?;

        // Poll so expired toasts disappear without a key press.
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.mode {
            Mode::Search => match key.code {
                KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Browse,
                KeyCode::Backspace => state.pop_search(),
                KeyCode::Char(c) => state.push_search(c),
                _ => {}
            },
            Mode::ConfirmDelete(id) => {
                state.mode = Mode::Browse;
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('d')) {
                    state.delete(client, id);
                }
            }
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('/') => state.mode = Mode::Search,
                KeyCode::Char('f') => state.cycle_status_filter(),
                KeyCode::Char('m') => state.cycle_reminder_filter(),
                KeyCode::Char('o') => state.cycle_sort(),
                KeyCode::Char('R') => state.refresh(client),
                KeyCode::Char('s') => {
                    if let Some(next) = state.current_job().map(|r| r.status.next()) {
                        state.apply(client, FieldUpdate::Status(next));
                    }
                }
                KeyCode::Char('r') => {
                    if let Some(on) = state.current_job().map(|r| !r.reminder) {
                        state.apply(client, FieldUpdate::Reminder(on));
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = state.current_job().map(|r| r.id) {
                        state.mode = Mode::ConfirmDelete(id);
                    }
                }
                _ => {}
            },
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState, client: &BackendClient) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    frame.render_widget(filter_bar(state), rows[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    // Left panel: applied jobs
    let items: Vec<ListItem> = state
        .visible
        .iter()
        .map(|(job, soon)| {
            let status_icon = match job.status {
                Status::Applied => "+",
                Status::Interview => "*",
                Status::Rejected => "x",
                Status::Accepted => "$",
                Status::Other(_) => "?",
            };
            let company = job.company.as_deref().unwrap_or("?");
            let title = job.title.as_deref().unwrap_or("");
            let line = format!("{} {} | {}", status_icon, truncate(company, 20), truncate(title, 28));
            let style = if *soon {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Applied Jobs ({}/{}) ",
            state.visible.len(),
            state.jobs.records().len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: job detail
    let detail = build_detail(state, client, chunks[1].width.saturating_sub(4) as usize);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    frame.render_widget(footer(state), rows[2]);
}

fn filter_bar(state: &AppState) -> Paragraph<'_> {
    let criteria = &state.jobs.criteria;
    let search_style = if state.mode == Mode::Search {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default()
    };
    let status = criteria.status.as_ref().map(|s| s.as_str()).unwrap_or("All");

    Paragraph::new(Line::from(vec![
        Span::raw(" Search: "),
        Span::styled(format!("[{}]", criteria.search), search_style),
        Span::raw(format!("  Status: {}", status)),
        Span::raw(format!("  Reminder: {}", criteria.reminder.label())),
        Span::raw(format!("  Sort: {}", criteria.sort_by.label())),
    ]))
}

fn footer(state: &AppState) -> Paragraph<'_> {
    if let Mode::ConfirmDelete(id) = state.mode {
        return Paragraph::new(format!(" Delete job #{}? y/d to confirm, any other key to cancel", id))
            .style(Style::default().fg(Color::Red));
    }
    if let Some(toast) = state.toasts.current() {
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
            ToastKind::Info => Color::Blue,
        };
        return Paragraph::new(format!(" {}", toast.message)).style(Style::default().fg(color));
    }
    let help = match state.mode {
        Mode::Search => " type to search  Backspace:delete  Enter/Esc:done",
        _ => " j/k:navigate J/K:scroll /:search f:status m:reminder o:sort  s:next status r:reminder d:delete R:refresh q:quit",
    };
    Paragraph::new(help).style(Style::default().fg(Color::DarkGray))
}

fn build_detail<'a>(state: &'a AppState, client: &BackendClient, width: usize) -> Text<'a> {
    let Some((job, soon)) = state.visible.get(state.selected) else {
        return Text::raw("No applied jobs match your filters.");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        job.company.as_deref().unwrap_or("(no company)"),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if let Some(title) = &job.title {
        lines.push(Line::from(title.as_str()));
    }
    if let Some(link) = &job.link {
        lines.push(Line::from(Span::styled(link.as_str(), Style::default().fg(Color::Blue))));
    }

    let status_style = match job.status {
        Status::Applied => Style::default().fg(Color::Cyan),
        Status::Interview => Style::default().fg(Color::Yellow),
        Status::Rejected => Style::default().fg(Color::Red),
        Status::Accepted => Style::default().fg(Color::Green),
        Status::Other(_) => Style::default(),
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(format!("Status: {}", job.status), status_style)));

    let dash = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| date_only(s).to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    lines.push(Line::from(format!("Applied On:     {}", dash(&job.applied_at))));
    lines.push(Line::from(format!("Last Date:      {}", dash(&job.deadline))));
    lines.push(Line::from(format!("Follow Up Date: {}", dash(&job.follow_up_date))));
    lines.push(Line::from(format!(
        "Reminder:       {}",
        if job.reminder { "on" } else { "off" }
    )));
    if *soon {
        lines.push(Line::from(Span::styled(
            "Upcoming Follow Up!",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }

    if let Some(ctc) = job.ctc.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(format!("CTC Offered:    {}", ctc)));
    }
    if let Some(hr) = job.hr_contact.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(format!("HR Contact:     {}", hr)));
    }
    if let Some(path) = job.resume_path.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(format!("Resume:         {}", client.resume_url(path))));
    }

    if let Some(notes) = job.notes.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Notes",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in textwrap::fill(notes, width.max(20)).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
    }

    Text::from(lines)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
