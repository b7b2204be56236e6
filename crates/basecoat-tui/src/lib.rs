// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use basecoat_app::{
    AppCommand, AppMode, AppState, Debouncer, DetailLoader, DetailOutcome, DetailRequest,
    FormulaCatalog, FormulaId, Listing, ModalState, apply_filter,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_TTL: Duration = Duration::from_secs(4);
const PAGE_ROWS: isize = 10;
const SEARCH_PENDING_MARK: &str = "…";

pub trait AppRuntime {
    fn load_catalog(&mut self) -> Result<FormulaCatalog>;
    fn fetch_formula_detail(&mut self, identifier: &FormulaId) -> Result<String>;
    /// Runs the fetch and reports back on `tx`. Implementations that can
    /// fetch off-thread should override this; the default blocks.
    fn spawn_detail_fetch(
        &mut self,
        request: DetailRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .fetch_formula_detail(&request.identifier)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::DetailLoaded { request, result })
            .map_err(|_| anyhow::anyhow!("detail event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    DetailLoaded {
        request: DetailRequest,
        result: Result<String, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuiOptions {
    pub debounce: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchUiState {
    input: String,
    applied: String,
    debouncer: Debouncer<String>,
    passes: usize,
}

impl SearchUiState {
    fn new(debounce: Duration) -> Self {
        Self {
            input: String::new(),
            applied: String::new(),
            debouncer: Debouncer::new(debounce),
            passes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    listing: Listing,
    selected: usize,
    search: SearchUiState,
    modal: ModalState,
    loader: DetailLoader,
    status_token: u64,
}

impl ViewData {
    fn new(debounce: Duration) -> Self {
        Self {
            listing: Listing::default(),
            selected: 0,
            search: SearchUiState::new(debounce),
            modal: ModalState::default(),
            loader: DetailLoader::default(),
            status_token: 0,
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: TuiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options.debounce);
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = reload_listing(state, runtime, &mut view_data, &internal_tx) {
        tracing::warn!(error = %format!("{error:#}"), "initial listing load failed");
        emit_status(
            state,
            &mut view_data,
            &internal_tx,
            format!("load failed: {error:#}; press r to retry"),
        );
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);
        flush_due_search(state, &mut view_data, &internal_tx, Instant::now());

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let timeout = view_data
            .search
            .debouncer
            .time_until_due(Instant::now())
            .map_or(POLL_INTERVAL, |due| due.min(POLL_INTERVAL));
        let has_event = event::poll(timeout).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(
                        state,
                        runtime,
                        &mut view_data,
                        &internal_tx,
                        key,
                        Instant::now(),
                    ) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::DetailLoaded { request, result } => {
                handle_detail_loaded(state, view_data, tx, request, result);
            }
        }
    }
}

fn handle_detail_loaded(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request: DetailRequest,
    result: Result<String, String>,
) {
    let outcome = view_data
        .loader
        .complete(&request, result, &mut view_data.modal);
    if outcome == DetailOutcome::Failed {
        emit_status(
            state,
            view_data,
            tx,
            format!(
                "formula {} failed to load; press enter on the row to retry",
                request.identifier
            ),
        );
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_TTL);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if state.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            state.dispatch(AppCommand::ToggleHelp);
        }
        return false;
    }

    if state.modal_visible() {
        handle_modal_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match state.mode {
        AppMode::Search => {
            handle_search_key(state, view_data, internal_tx, key, now);
            false
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_modal_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => close_modal(state, view_data),
        KeyCode::Char('j') | KeyCode::Down => {
            if move_selection(view_data, 1) {
                activate_selected(state, runtime, view_data, internal_tx);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if move_selection(view_data, -1) {
                activate_selected(state, runtime, view_data, internal_tx);
            }
        }
        _ => {}
    }
}

fn handle_search_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) {
    match key.code {
        KeyCode::Esc => {
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Enter => {
            state.dispatch(AppCommand::ExitToNav);
            if let Some(term) = view_data.search.debouncer.flush() {
                apply_search_term(state, view_data, internal_tx, term);
            }
        }
        KeyCode::Backspace => {
            if view_data.search.input.pop().is_some() {
                schedule_search(view_data, now);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !view_data.search.input.is_empty() {
                view_data.search.input.clear();
                schedule_search(view_data, now);
            }
        }
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            view_data.search.input.push(ch);
            schedule_search(view_data, now);
        }
        _ => {}
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('/'), _) => {
            state.dispatch(AppCommand::FocusSearch);
        }
        (KeyCode::Char('?'), _) => {
            state.dispatch(AppCommand::ToggleHelp);
        }
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            move_selection(view_data, 1);
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            move_selection(view_data, -1);
        }
        (KeyCode::Char('d'), KeyModifiers::CONTROL) | (KeyCode::PageDown, _) => {
            move_selection(view_data, PAGE_ROWS);
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) | (KeyCode::PageUp, _) => {
            move_selection(view_data, -PAGE_ROWS);
        }
        (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
            view_data.selected = 0;
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            view_data.selected = view_data.listing.visible_count().saturating_sub(1);
        }
        (KeyCode::Enter, _) => {
            activate_selected(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Esc, _) => {
            if !view_data.search.input.is_empty() || !view_data.search.applied.is_empty() {
                view_data.search.input.clear();
                view_data.search.debouncer.cancel();
                apply_search_term(state, view_data, internal_tx, String::new());
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            if let Err(error) = reload_listing(state, runtime, view_data, internal_tx) {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("reload failed: {error:#}"),
                );
            }
        }
        _ => {}
    }
    false
}

fn schedule_search(view_data: &mut ViewData, now: Instant) {
    let term = view_data.search.input.clone();
    view_data.search.debouncer.schedule(term, now);
}

fn flush_due_search(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    now: Instant,
) {
    if let Some(term) = view_data.search.debouncer.poll(now) {
        apply_search_term(state, view_data, internal_tx, term);
    }
}

fn apply_search_term(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    term: String,
) {
    let summary = apply_filter(&mut view_data.listing, &term);
    view_data.search.applied = term;
    view_data.search.passes = view_data.search.passes.saturating_add(1);
    clamp_selection(view_data);

    let message = if view_data.search.applied.is_empty() {
        format!("showing all {} formulas", summary.total)
    } else if summary.is_empty() {
        format!("no formulas match {:?}", view_data.search.applied)
    } else {
        format!("{} of {} formulas", summary.visible, summary.total)
    };
    emit_status(state, view_data, internal_tx, message);
}

fn reload_listing<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> Result<()> {
    let catalog = runtime.load_catalog()?;
    view_data.listing = Listing::new(catalog);
    if !view_data.search.applied.is_empty() {
        let applied = view_data.search.applied.clone();
        apply_filter(&mut view_data.listing, &applied);
    }
    clamp_selection(view_data);
    tracing::info!(
        rows = view_data.listing.len(),
        visible = view_data.listing.visible_count(),
        "listing loaded"
    );
    emit_status(
        state,
        view_data,
        internal_tx,
        format!("loaded {} formulas", view_data.listing.len()),
    );
    Ok(())
}

fn activate_selected<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(index) = selected_row_index(view_data) else {
        emit_status(state, view_data, internal_tx, "no formula selected");
        return;
    };

    let Some(request) =
        view_data
            .loader
            .on_row_activated(&view_data.listing, index, &mut view_data.modal)
    else {
        emit_status(
            state,
            view_data,
            internal_tx,
            "row has no formula id; nothing to load",
        );
        return;
    };

    state.dispatch(AppCommand::OpenModal);
    if let Err(error) = runtime.spawn_detail_fetch(request.clone(), internal_tx.clone()) {
        view_data
            .loader
            .complete(&request, Err(format!("{error:#}")), &mut view_data.modal);
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("formula {} failed to load: {error:#}", request.identifier),
        );
    }
}

fn close_modal(state: &mut AppState, view_data: &mut ViewData) {
    state.dispatch(AppCommand::CloseModal);
    view_data.loader.reset();
}

fn selected_row_index(view_data: &ViewData) -> Option<usize> {
    view_data
        .listing
        .visible_indices()
        .get(view_data.selected)
        .copied()
}

/// Returns true when the selection actually moved.
fn move_selection(view_data: &mut ViewData, delta: isize) -> bool {
    let row_count = view_data.listing.visible_count();
    if row_count == 0 {
        view_data.selected = 0;
        return false;
    }

    let current = view_data.selected;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.selected = next.min(row_count.saturating_sub(1));
    view_data.selected != current
}

fn clamp_selection(view_data: &mut ViewData) {
    let row_count = view_data.listing.visible_count();
    view_data.selected = view_data.selected.min(row_count.saturating_sub(1));
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let search_style = if state.mode == AppMode::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search = Paragraph::new(search_bar_text(state, view_data))
        .style(search_style)
        .block(Block::default().title("search").borders(Borders::ALL));
    frame.render_widget(search, layout[0]);

    render_table(frame, layout[1], view_data);

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if state.modal_visible() {
        let area = centered_rect(72, 64, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(view_data.modal.body.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(view_data.modal.title.as_str())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(modal, area);
    }

    if state.help_visible {
        let area = centered_rect(64, 40, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let listing = &view_data.listing;
    let column_count = listing.columns().len().max(1);
    let widths = vec![Constraint::Min(8); column_count];

    let header = Row::new(listing.columns().iter().map(|label| {
        Cell::from(label.as_str()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = listing
        .visible_indices()
        .into_iter()
        .enumerate()
        .filter_map(|(position, index)| {
            let row = listing.row(index)?;
            let mut style = Style::default();
            if row.id.is_none() {
                style = style.fg(Color::DarkGray);
            }
            if position == view_data.selected {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            let cells = row
                .cells
                .iter()
                .map(|cell| Cell::from(cell.as_str()))
                .collect::<Vec<_>>();
            Some(Row::new(cells).style(style))
        })
        .collect::<Vec<_>>();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(view_data))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn search_bar_text(state: &AppState, view_data: &ViewData) -> String {
    let cursor = if state.mode == AppMode::Search {
        "▏"
    } else {
        ""
    };
    let pending = if view_data.search.debouncer.is_pending() {
        format!(" {SEARCH_PENDING_MARK}")
    } else {
        String::new()
    };
    format!("/{}{cursor}{pending}", view_data.search.input)
}

fn table_title(view_data: &ViewData) -> String {
    let listing = &view_data.listing;
    let counts = format!("{}/{}", listing.visible_count(), listing.len());
    if view_data.search.applied.is_empty() {
        format!("formulas {counts}")
    } else {
        format!("formulas {counts} matching {:?}", view_data.search.applied)
    }
}

fn status_text(state: &AppState) -> String {
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
    };
    let default = match state.mode {
        AppMode::Nav if state.modal_visible() => "j/k next/prev formula | esc close",
        AppMode::Nav => "j/k g/G pg | enter open | / search | esc clear | r reload | ? help | q",
        AppMode::Search => "type to filter | enter apply | ctrl+u clear | esc nav",
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {default}"),
        None => format!("{mode} | {default}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q/ctrl+c quit\n\
nav: j/k up/down | g/G top/bottom | ctrl+d/u pgup/pgdn | enter open formula\n\
nav: / search | esc clear search | r reload listing | q quit | ? help\n\
search: type to filter (applied after a pause) | enter apply now | ctrl+u clear | esc nav\n\
formula: j/k load next/prev | esc/enter/q close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
