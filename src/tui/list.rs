//! Workout list panel

use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::app::{ListEntry, WorkoutView};
use crate::console::format_entry;
use crate::workout::{WorkoutId, WorkoutType};

/// How long a notice stays in the footer
const NOTICE_TTL: Duration = Duration::from_secs(5);
/// Terminal rows per list item
const ITEM_HEIGHT: u16 = 2;

/// Newest workout first
#[derive(Default)]
pub struct TerminalList {
    entries: Vec<ListEntry>,
    state: ListState,
    notice: Option<(String, Instant)>,
    area: Rect,
}

impl WorkoutView for TerminalList {
    fn render_entry(&mut self, entry: ListEntry) {
        self.entries.insert(0, entry);
        if let Some(i) = self.state.selected() {
            self.state.select(Some(i + 1));
        }
    }

    fn notify(&mut self, message: &str) {
        self.notice = Some((message.to_string(), Instant::now()));
    }
}

impl TerminalList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let next = self.state.selected().map_or(0, |i| (i + 1).min(self.entries.len() - 1));
        self.state.select(Some(next));
    }

    pub fn select_prev(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let prev = self.state.selected().map_or(0, |i| i.saturating_sub(1));
        self.state.select(Some(prev));
    }

    pub fn selected_id(&self) -> Option<WorkoutId> {
        self.state
            .selected()
            .and_then(|i| self.entries.get(i))
            .map(|e| e.id.clone())
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.area.contains(Position::new(column, row))
    }

    /// Select and return the entry under a terminal cell
    pub fn pick(&mut self, column: u16, row: u16) -> Option<WorkoutId> {
        if !self.contains(column, row) {
            return None;
        }
        let index = self.state.offset() + usize::from((row - self.area.y) / ITEM_HEIGHT);
        let id = self.entries.get(index)?.id.clone();
        self.state.select(Some(index));
        Some(id)
    }

    /// Latest notice, until it expires
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|(_, at)| at.elapsed() < NOTICE_TTL)
            .map(|(msg, _)| msg.as_str())
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Workouts ({}) ", self.entries.len()))
            .border_style(super::map::border_style(focused));
        self.area = block.inner(area);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|e| {
                let color = kind_color(e.kind);
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled("▌", Style::default().fg(color)),
                        Span::styled(e.title.clone(), Style::default().bold()),
                    ]),
                    Line::from(format!("  {}", format_entry(e))),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Rgb(60, 70, 80)));
        frame.render_stateful_widget(list, area, &mut self.state);
    }
}

fn kind_color(kind: WorkoutType) -> Color {
    match kind {
        WorkoutType::Running => Color::Rgb(0, 196, 106),
        WorkoutType::Cycling => Color::Rgb(255, 181, 69),
    }
}
