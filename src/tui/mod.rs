//! TUI module - map dashboard with ratatui

mod form;
mod list;
mod map;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io::{Stdout, stdout};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::info;

use crate::app::{AppController, AppEvent, AppState, EntryForm};
use crate::config::Config;
use crate::db::Database;
use crate::map::MapController;
use crate::position::{Geolocation, PositionResult, poll_position};
use crate::store::WorkoutStore;
use crate::workout::Coords;

pub use form::{Field, TerminalForm};
pub use list::TerminalList;
pub use map::TerminalMap;

type Tui = Terminal<CrosstermBackend<Stdout>>;
type Controller = AppController<TerminalMap, TerminalForm, TerminalList, Database>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Map,
    Form,
    List,
}

/// App state for TUI
pub struct App {
    controller: Controller,
    position: Option<oneshot::Receiver<PositionResult>>,
    focus: Focus,
    should_quit: bool,
}

impl App {
    /// Restore stored workouts and ask for the position; the answer is
    /// picked up by the event loop.
    pub fn new(db: Database, config: &Config, geolocation: &mut impl Geolocation) -> Self {
        let mut controller = AppController::new(
            MapController::new(TerminalMap::default(), config.zoom),
            TerminalForm::default(),
            TerminalList::default(),
            WorkoutStore::new(db),
        );
        controller.start();

        Self {
            controller,
            position: Some(geolocation.request_once()),
            focus: Focus::Map,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal()?;
        info!(workouts = self.controller.workouts().len(), "TUI closed");
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            self.poll_position();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn poll_position(&mut self) {
        if let Some(rx) = self.position.as_mut()
            && let Some(result) = poll_position(rx)
        {
            self.position = None;
            self.controller.handle(AppEvent::Position(result));
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(3)])
            .split(frame.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
            .split(rows[0]);
        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(6), Constraint::Min(4)])
            .split(columns[0]);

        let header = Paragraph::new("stridelog - runs & rides")
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, sidebar[0]);

        let focus = self.focus;
        self.controller.form().draw(frame, sidebar[1], focus == Focus::Form);
        self.controller.view_mut().draw(frame, sidebar[2], focus == Focus::List);
        self.controller
            .map_mut()
            .surface_mut()
            .draw(frame, columns[1], focus == Focus::Map);

        let (text, style) = match self.controller.view().notice() {
            Some(notice) => (notice.to_string(), Style::default().fg(Color::Yellow)),
            None => (self.help_text().to_string(), Style::default().fg(Color::DarkGray)),
        };
        let footer = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, rows[1]);
    }

    fn help_text(&self) -> &'static str {
        match (self.focus, self.controller.state()) {
            (_, AppState::AwaitingPosition) => "Locating... | Tab: list | q: quit",
            (Focus::Form, _) => "Enter: save | Tab/↑↓: field | ←→/space: type | Esc: back to map",
            (Focus::List, _) => "↑↓: select | Enter: show on map | Esc: map | q: quit",
            (Focus::Map, AppState::MapUnavailable) => "No map available | Tab: list | q: quit",
            (Focus::Map, _) => "Arrows: move | Enter/click: log workout here | +/-: zoom | Tab: list | q: quit",
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if !event::poll(Duration::from_millis(100))? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.on_mouse_click(mouse.column, mouse.row)
            }
            _ => {}
        }
        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.focus {
            Focus::Map => self.on_map_key(key.code),
            Focus::Form => self.on_form_key(key.code),
            Focus::List => self.on_list_key(key.code),
        }
    }

    fn on_map_key(&mut self, code: KeyCode) {
        let surface = self.controller.map_mut().surface_mut();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left => surface.move_cursor(-1, 0),
            KeyCode::Right => surface.move_cursor(1, 0),
            KeyCode::Up => surface.move_cursor(0, 1),
            KeyCode::Down => surface.move_cursor(0, -1),
            KeyCode::Char('+') | KeyCode::Char('=') => surface.zoom_by(1.0),
            KeyCode::Char('-') => surface.zoom_by(-1.0),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(cursor) = surface.cursor() {
                    self.click_map(cursor);
                }
            }
            KeyCode::Tab | KeyCode::Char('l') => self.focus = Focus::List,
            KeyCode::Esc if self.controller.form().is_visible() => self.focus = Focus::Form,
            _ => {}
        }
    }

    fn on_form_key(&mut self, code: KeyCode) {
        let form = self.controller.form_mut();
        match code {
            KeyCode::Esc => self.focus = Focus::Map,
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left | KeyCode::Right if form.focus() == Some(Field::Type) => form.toggle_kind(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.input(c),
            _ => {}
        }
    }

    fn on_list_key(&mut self, code: KeyCode) {
        let list = self.controller.view_mut();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => list.select_next(),
            KeyCode::Up | KeyCode::Char('k') => list.select_prev(),
            KeyCode::Enter => {
                let id = list.selected_id();
                self.controller.handle(AppEvent::ListItemActivated(id));
            }
            KeyCode::Esc | KeyCode::Tab | KeyCode::Char('m') => self.focus = Focus::Map,
            _ => {}
        }
    }

    fn on_mouse_click(&mut self, column: u16, row: u16) {
        if let Some(coords) = self.controller.map().surface().coords_at(column, row) {
            self.focus = Focus::Map;
            self.click_map(coords);
        } else if self.controller.view().contains(column, row) {
            self.focus = Focus::List;
            let id = self.controller.view_mut().pick(column, row);
            self.controller.handle(AppEvent::ListItemActivated(id));
        }
    }

    fn click_map(&mut self, coords: Coords) {
        self.controller.handle(AppEvent::MapClicked(coords));
        if self.controller.form().is_visible() {
            self.focus = Focus::Form;
        }
    }

    fn submit(&mut self) {
        self.controller.handle(AppEvent::FormSubmitted);
        if !self.controller.form().is_visible() {
            self.focus = Focus::Map;
        }
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
