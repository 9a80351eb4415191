//! ratatui-based UI.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui_image::picker::Picker;
use shelftrack_application::{
    AppState, Command, Completion, CoverState, ProgressBar, ProgressVisualizer, SearchResults,
    ToastKind,
};
use shelftrack_client::Executor;
use shelftrack_core::{Rating, ReadingStatus};
use tokio::sync::mpsc::UnboundedReceiver;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

mod cover;

use cover::CoverCache;

/// Terminal rows per card in a column list.
const CARD_HEIGHT: u16 = 2;
const BURGUNDY: (u8, u8, u8) = (128, 0, 32);

/// Where each column's list was last drawn, for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
struct HitMap {
    columns: [Rect; 3],
    offsets: [usize; 3],
}

impl HitMap {
    fn column_at(&self, x: u16, y: u16) -> Option<ReadingStatus> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| rect_contains(self.columns[status.index()], x, y))
    }

    fn card_at(&self, x: u16, y: u16) -> Option<(ReadingStatus, usize)> {
        let status = self.column_at(x, y)?;
        let area = self.columns[status.index()];
        let row = usize::from((y - area.y) / CARD_HEIGHT);
        Some((status, self.offsets[status.index()] + row))
    }
}

#[derive(Debug, Clone, Copy)]
struct MouseDrag {
    moved: bool,
}

pub struct Ui {
    state: AppState,
    executor: Executor,
    completions: UnboundedReceiver<Completion>,
    progress: ProgressVisualizer,
    column_lists: [ListState; 3],
    search_list: ListState,
    hit: HitMap,
    mouse_drag: Option<MouseDrag>,
    covers: CoverCache,
}

impl Ui {
    pub fn new(
        state: AppState,
        executor: Executor,
        completions: UnboundedReceiver<Completion>,
    ) -> Self {
        let mut progress = ProgressVisualizer::default();
        progress.redraw(&state.board);
        Self {
            state,
            executor,
            completions,
            progress,
            column_lists: Default::default(),
            search_list: ListState::default(),
            hit: HitMap::default(),
            mouse_drag: None,
            covers: CoverCache::new(Picker::halfblocks()),
        }
    }

    /// Runs until the user quits and hands the final state back.
    pub fn run(mut self) -> anyhow::Result<AppState> {
        let mut terminal = setup_terminal()?;
        self.covers.set_picker(cover::pick_picker());
        terminal.clear().ok();

        let load = self.state.reload();
        self.executor.submit(load);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(self.state),
            (Ok(Err(err)), _) => Err(err),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(50);
        let mut needs_redraw = true;

        loop {
            needs_redraw |= self.pump(Instant::now());
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate)? {
                continue;
            }

            let outcome = match event::read()? {
                Event::Resize(_, _) => Ok(false),
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    self.handle_key(key)
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse).map(|()| false),
                _ => continue,
            };
            needs_redraw = true;

            match outcome {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) => self.state.report_unexpected(&err),
            }
        }
    }

    /// Applies timers and finished requests. Returns whether anything visible
    /// may have changed.
    fn pump(&mut self, now: Instant) -> bool {
        let toasts_before = self.state.feedback.toasts().count();
        let commands = self.state.tick(now);
        let mut changed = !commands.is_empty();
        self.executor.submit_all(commands);

        while let Ok(completion) = self.completions.try_recv() {
            changed = true;
            let follow_up = self.state.apply(completion);
            self.executor.submit_all(follow_up);
        }

        for event in self.state.drain_events() {
            changed = true;
            self.progress.observe(&event, &self.state.board);
        }

        changed || toasts_before != self.state.feedback.toasts().count()
    }

    fn dispatch(&mut self, command: Option<Command>) {
        if let Some(command) = command {
            self.executor.submit(command);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if self.state.pending_remove.is_some() {
            self.handle_confirm_key(key);
            Ok(false)
        } else if self.state.details.is_open() {
            self.handle_details_key(key);
            Ok(false)
        } else if self.state.search.open {
            self.handle_search_key(key);
            Ok(false)
        } else {
            self.handle_board_key(key)
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let command = self.state.confirm_remove();
                self.dispatch(command);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.state.cancel_remove(),
            _ => {}
        }
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('i')
        ) {
            self.state.details.close();
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        let len = self.state.search_list_len();
        match key.code {
            KeyCode::Esc => self.state.search.close(),
            KeyCode::Enter => {
                let command = self.state.add_selected_result();
                self.dispatch(command);
            }
            KeyCode::Up => self.state.search.move_cursor(-1, len),
            KeyCode::Down => self.state.search.move_cursor(1, len),
            KeyCode::Backspace => self.state.search.backspace(now),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.search.clear_query(now)
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.search.push_char(ch, now)
            }
            _ => {}
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if self.state.drag.is_active() {
                    self.state.drag_cancel();
                    self.mouse_drag = None;
                } else {
                    return Ok(true);
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.step_column(-1),
            KeyCode::Right | KeyCode::Char('l') => self.step_column(1),
            KeyCode::Up | KeyCode::Char('k') if !self.state.drag.is_active() => {
                self.state.select_row_delta(-1)
            }
            KeyCode::Down | KeyCode::Char('j') if !self.state.drag.is_active() => {
                self.state.select_row_delta(1)
            }
            KeyCode::Char(' ') => self.toggle_keyboard_drag(),
            KeyCode::Enter => {
                if self.state.drag.is_active() {
                    let target = self.state.drag.hover;
                    let command = self.state.drop_on(target);
                    self.dispatch(command);
                } else {
                    self.open_selected_details();
                }
            }
            KeyCode::Char('i') => self.open_selected_details(),
            KeyCode::Char(digit @ '1'..='5') => self.rate_selected(digit)?,
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.state.selected_card_id() {
                    self.state.request_remove(id);
                }
            }
            KeyCode::Char('/') | KeyCode::Char('s') => self.state.search.open(),
            KeyCode::Char('r') => {
                let command = self.state.reload();
                self.executor.submit(command);
            }
            _ => {}
        }
        Ok(false)
    }

    /// Moves the column cursor, or the drop target while a card is carried.
    fn step_column(&mut self, delta: isize) {
        let current = match self.state.drag.hover {
            Some(hover) if self.state.drag.is_active() => hover,
            _ => self.state.selection.column,
        };
        let next = if delta < 0 {
            current.prev()
        } else {
            current.next()
        };

        if self.state.drag.is_active() {
            self.state.drag_leave(current);
            self.state.drag_over(next);
        } else {
            self.state.select_column(next);
        }
    }

    fn toggle_keyboard_drag(&mut self) {
        if self.state.drag.is_active() {
            self.state.drag_cancel();
            return;
        }
        let Some(id) = self.state.selected_card_id() else {
            return;
        };
        if self.state.drag_start(&id).is_ok() {
            self.state.drag_over(self.state.selection.column);
        }
    }

    fn open_selected_details(&mut self) {
        if let Some(id) = self.state.selected_card_id() {
            let command = self.state.show_details(&id);
            self.dispatch(command);
        }
    }

    fn rate_selected(&mut self, digit: char) -> anyhow::Result<()> {
        let Some(id) = self.state.selected_card_id() else {
            return Ok(());
        };
        let visible = self
            .state
            .board
            .card(&id)
            .is_some_and(|card| card.rating_visible());
        if !visible {
            return Ok(());
        }
        let value = digit
            .to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .context("rating key is not a digit")?;
        let rating = Rating::new(value).context("rating key out of range")?;
        let command = self.state.rate_book(id, rating);
        self.dispatch(command);
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> anyhow::Result<()> {
        if self.state.pending_remove.is_some()
            || self.state.details.is_open()
            || self.state.search.open
        {
            return Ok(());
        }

        let column = self.hit.column_at(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some((status, row)) = self.hit.card_at(mouse.column, mouse.row) else {
                    return Ok(());
                };
                if row >= self.state.board.column(status).len() {
                    self.state.select_column(status);
                    return Ok(());
                }
                self.state.select(status, row);
                if let Some(id) = self.state.selected_card_id()
                    && self.state.drag_start(&id).is_ok()
                {
                    self.state.drag_over(status);
                    self.mouse_drag = Some(MouseDrag { moved: false });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(drag) = self.mouse_drag.as_mut() else {
                    return Ok(());
                };
                drag.moved = true;
                let previous = self.state.drag.hover;
                if previous != column
                    && let Some(previous) = previous
                {
                    self.state.drag_leave(previous);
                }
                if let Some(column) = column {
                    self.state.drag_over(column);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(drag) = self.mouse_drag.take() else {
                    return Ok(());
                };
                if !drag.moved || column.is_none() {
                    self.state.drag_cancel();
                } else {
                    let command = self.state.drop_on(column);
                    self.dispatch(command);
                }
            }
            MouseEventKind::ScrollUp if self.mouse_drag.is_none() => {
                if let Some(column) = column {
                    self.state.select_column(column);
                    self.state.select_row_delta(-1);
                }
            }
            MouseEventKind::ScrollDown if self.mouse_drag.is_none() => {
                if let Some(column) = column {
                    self.state.select_column(column);
                    self.state.select_row_delta(1);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn accent_color(&self) -> Color {
        Color::Yellow
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(layout[0], frame);
        self.draw_progress(layout[1], frame);
        self.draw_board(layout[2], frame);
        self.draw_footer(layout[3], frame);

        if self.state.search.open {
            self.draw_search_panel(area, frame);
        }
        if self.state.details.is_open() {
            self.draw_details(area, frame);
        }
        if self.state.pending_remove.is_some() {
            self.draw_confirm_remove(area, frame);
        }
        self.draw_toasts(area, frame);
    }

    fn draw_header(&self, area: Rect, frame: &mut ratatui::Frame) {
        let mut spans = vec![
            Span::styled(
                " Shelftrack ",
                Style::default()
                    .fg(self.accent_color())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                if self.state.board.is_empty() {
                    "empty library".to_string()
                } else {
                    format!("{} books", self.state.board.len())
                },
                Style::default().fg(Color::Gray),
            ),
        ];
        if self.state.feedback.is_loading() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                "loading…",
                Style::default()
                    .fg(self.accent_color())
                    .add_modifier(Modifier::ITALIC),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_progress(&self, area: Rect, frame: &mut ratatui::Frame) {
        let block = Block::default().borders(Borders::ALL).title("Progress");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(bar) = self.progress.bar() else {
            frame.render_widget(
                Paragraph::new("No books yet").style(Style::default().fg(Color::DarkGray)),
                inner,
            );
            return;
        };
        draw_progress_bar(bar, inner, frame);
    }

    fn draw_board(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        for status in ReadingStatus::ALL {
            self.draw_column(status, columns[status.index()], frame);
        }
    }

    fn draw_column(&mut self, status: ReadingStatus, area: Rect, frame: &mut ratatui::Frame) {
        let accent = self.accent_color();
        let selected_column = self.state.selection.column == status;
        let hovered = self.state.drag.is_active() && self.state.drag.hover == Some(status);

        let mut border = Style::default();
        if hovered {
            border = border.fg(accent).add_modifier(Modifier::BOLD);
        } else if selected_column {
            border = border.fg(Color::White);
        } else {
            border = border.fg(Color::DarkGray);
        }

        let title = format!(
            " {} ({}) ",
            status.label(),
            self.state.board.column(status).len()
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title);
        let inner = block.inner(area);
        let text_width = usize::from(inner.width.saturating_sub(2));

        let items: Vec<ListItem> = self
            .state
            .board
            .cards_in(status)
            .map(|card| {
                let carried = self.state.drag.is_dragging(&card.id);
                let mut title_style = Style::default().add_modifier(Modifier::BOLD);
                let mut title = fit_width(&card.title, text_width);
                if carried {
                    title_style = Style::default()
                        .fg(accent)
                        .add_modifier(Modifier::ITALIC | Modifier::DIM);
                    title = fit_width(&format!("⇅ {}", card.title), text_width);
                }

                let second = if card.rating_visible() {
                    let stars = card
                        .rating
                        .map(|r| stars_text(r.stars()))
                        .unwrap_or_else(|| stars_text([false; Rating::MAX as usize]));
                    Line::from(vec![
                        Span::styled(stars, Style::default().fg(Color::Yellow)),
                        Span::raw(" "),
                        Span::styled(
                            fit_width(&card.authors, text_width.saturating_sub(6)),
                            Style::default().fg(Color::Gray),
                        ),
                    ])
                } else {
                    Line::from(Span::styled(
                        fit_width(&card.authors, text_width),
                        Style::default().fg(Color::Gray),
                    ))
                };

                ListItem::new(Text::from(vec![
                    Line::from(Span::styled(title, title_style)),
                    second,
                ]))
            })
            .collect();

        let list_state = &mut self.column_lists[status.index()];
        if selected_column && !items.is_empty() {
            list_state.select(Some(self.state.selection.row));
        } else {
            list_state.select(None);
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Rgb(48, 48, 48)))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, list_state);

        self.hit.columns[status.index()] = inner;
        self.hit.offsets[status.index()] = list_state.offset();
    }

    fn draw_footer(&self, area: Rect, frame: &mut ratatui::Frame) {
        let hints = if self.state.drag.is_active() {
            "←/→ choose column · Enter drop · Esc cancel"
        } else {
            "←/→/↑/↓ move · Space pick up · Enter details · 1-5 rate · d remove · / search · r reload · q quit"
        };
        frame.render_widget(
            Paragraph::new(fit_width(hints, usize::from(area.width)))
                .style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }

    fn draw_search_panel(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let popup = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Search books ")
            .border_style(Style::default().fg(self.accent_color()));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let query = Line::from(vec![
            Span::styled("Query: ", Style::default().fg(Color::Gray)),
            Span::raw(self.state.search.query.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]);
        frame.render_widget(Paragraph::new(query), rows[0]);

        let status = if self.state.search.is_pending() {
            "Searching…".to_string()
        } else {
            match &self.state.search.results {
                SearchResults::Idle if self.state.recommendations.is_empty() => {
                    format!(
                        "Type at least {} characters",
                        self.state.settings.min_query_chars
                    )
                }
                SearchResults::Idle => "Recommended for you".to_string(),
                SearchResults::Items(items) => format!("{} results", items.len()),
                SearchResults::NoBooksFound => String::new(),
            }
        };
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
            rows[1],
        );

        let width = usize::from(rows[2].width.saturating_sub(2));
        let items: Vec<ListItem> = match &self.state.search.results {
            SearchResults::NoBooksFound => {
                frame.render_widget(
                    Paragraph::new("No books found")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(Color::Gray)),
                    rows[2],
                );
                Vec::new()
            }
            SearchResults::Items(items) => items
                .iter()
                .map(|item| result_item(&item.title, &item.authors, width))
                .collect(),
            SearchResults::Idle => self
                .state
                .recommendations
                .iter()
                .map(|rec| result_item(&rec.title, &rec.authors, width))
                .collect(),
        };

        if !items.is_empty() {
            self.search_list.select(Some(self.state.search.cursor));
            let list = List::new(items)
                .highlight_style(
                    Style::default()
                        .fg(self.accent_color())
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, rows[2], &mut self.search_list);
        }

        frame.render_widget(
            Paragraph::new("Enter add to Want to Read · ↑/↓ select · Ctrl+U clear · Esc close")
                .style(Style::default().fg(Color::DarkGray)),
            rows[3],
        );
    }

    fn draw_details(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let Some(view) = self.state.details.view().cloned() else {
            return;
        };
        let popup = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Book details ")
            .border_style(Style::default().fg(self.accent_color()));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(inner);

        let cover_note = match (self.state.details.cover(), view.cover_url.as_deref()) {
            (CoverState::Loaded(bytes), Some(url)) => {
                let bytes = bytes.clone();
                if self.covers.render(url, &bytes, cols[0], frame) {
                    None
                } else {
                    Some("Cover unavailable")
                }
            }
            (CoverState::Loading, _) => Some("Loading cover…"),
            _ => Some("No cover"),
        };
        if let Some(note) = cover_note {
            frame.render_widget(
                Paragraph::new(note)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray)),
                cols[0],
            );
        }

        let mut lines = vec![
            Line::from(Span::styled(
                view.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                view.authors.clone(),
                Style::default().fg(Color::Gray),
            )),
        ];
        if let Some(stars) = view.stars {
            lines.push(Line::from(Span::styled(
                stars_text(stars),
                Style::default().fg(Color::Yellow),
            )));
        }
        lines.push(Line::raw(""));
        lines.push(Line::raw(view.description.clone()));

        frame.render_widget(
            Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true }),
            cols[1].inner(ratatui::layout::Margin::new(1, 0)),
        );
    }

    fn draw_confirm_remove(&self, area: Rect, frame: &mut ratatui::Frame) {
        let title = self
            .state
            .pending_remove
            .as_ref()
            .and_then(|id| self.state.board.card(id))
            .map(|card| card.title.clone())
            .unwrap_or_default();

        let popup = centered_rect(50, 20, area);
        frame.render_widget(Clear, popup);
        let text = Text::from(vec![
            Line::raw("Are you sure you want to delete this book from your library?"),
            Line::from(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
            Line::from(Span::styled(
                "y confirm · n cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Remove book ")
                        .border_style(Style::default().fg(Color::Red)),
                ),
            popup,
        );
    }

    fn draw_toasts(&self, area: Rect, frame: &mut ratatui::Frame) {
        let width = area.width.min(48);
        let mut bottom = area.bottom().saturating_sub(1);
        let toasts: Vec<_> = self.state.feedback.toasts().collect();
        for toast in toasts.into_iter().rev() {
            if bottom < area.y + 3 {
                break;
            }
            let rect = Rect::new(area.right().saturating_sub(width), bottom - 3, width, 3);
            let color = match toast.kind {
                ToastKind::Success => Color::Green,
                ToastKind::Danger => Color::Red,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(fit_width(&toast.message, usize::from(width.saturating_sub(2))))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(color)),
                    ),
                rect,
            );
            bottom -= 3;
        }
    }
}

fn draw_progress_bar(bar: &ProgressBar, area: Rect, frame: &mut ratatui::Frame) {
    let widths = bar.layout(area.width);
    let mut x = area.x;
    for (segment, width) in bar.segments.iter().zip(widths) {
        if width == 0 {
            continue;
        }
        let rect = Rect::new(x, area.y, width, area.height.min(1));
        x += width;

        let fg = if segment.opacity >= 0.6 {
            Color::White
        } else {
            Color::Black
        };
        let label = segment
            .label
            .as_deref()
            .map(|label| fit_width(label, usize::from(width)))
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(label)
                .alignment(Alignment::Center)
                .style(Style::default().bg(burgundy(segment.opacity)).fg(fg)),
            rect,
        );
    }
}

fn result_item(title: &str, authors: &str, width: usize) -> ListItem<'static> {
    ListItem::new(Text::from(vec![
        Line::from(Span::styled(
            fit_width(title, width),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            fit_width(authors, width),
            Style::default().fg(Color::Gray),
        )),
    ]))
}

/// Burgundy at `opacity` over a white canvas.
fn burgundy(opacity: f32) -> Color {
    let alpha = opacity.clamp(0.0, 1.0);
    let mix = |channel: u8| -> u8 {
        let blended = f32::from(channel) * alpha + 255.0 * (1.0 - alpha);
        blended.round() as u8
    };
    Color::Rgb(mix(BURGUNDY.0), mix(BURGUNDY.1), mix(BURGUNDY.2))
}

fn stars_text(stars: [bool; Rating::MAX as usize]) -> String {
    stars
        .iter()
        .map(|filled| if *filled { '★' } else { '☆' })
        .collect()
}

fn fit_width(text: &str, max: usize) -> String {
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn rect_contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .context("leave alt screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_width_truncates_with_ellipsis() {
        assert_eq!(fit_width("Dune", 10), "Dune");
        assert_eq!(fit_width("Dune Messiah", 6), "Dune …");
        assert_eq!(fit_width("Dune", 0), "");
    }

    #[test]
    fn stars_render_filled_then_empty() {
        let rating = Rating::new(3).unwrap();
        assert_eq!(stars_text(rating.stars()), "★★★☆☆");
    }

    #[test]
    fn burgundy_deepens_with_opacity() {
        assert_eq!(burgundy(1.0), Color::Rgb(128, 0, 32));
        assert_eq!(burgundy(0.0), Color::Rgb(255, 255, 255));
        let Color::Rgb(light, _, _) = burgundy(0.3) else {
            panic!("expected rgb");
        };
        let Color::Rgb(dark, _, _) = burgundy(0.9) else {
            panic!("expected rgb");
        };
        assert!(light > dark);
    }

    #[test]
    fn hit_map_maps_rows_to_cards() {
        let mut hit = HitMap::default();
        hit.columns[ReadingStatus::Reading.index()] = Rect::new(20, 5, 18, 10);
        hit.offsets[ReadingStatus::Reading.index()] = 2;

        assert_eq!(hit.column_at(25, 6), Some(ReadingStatus::Reading));
        assert_eq!(hit.column_at(25, 15), None);
        assert_eq!(hit.card_at(25, 5), Some((ReadingStatus::Reading, 2)));
        assert_eq!(hit.card_at(25, 8), Some((ReadingStatus::Reading, 3)));
    }

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 50, outer);
        assert!(rect_contains(outer, inner.x, inner.y));
        assert_eq!(inner.width, 50);
    }
}
