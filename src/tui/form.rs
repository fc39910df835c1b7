//! Entry form panel

use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{EntryForm, FormValues};
use crate::workout::WorkoutType;

/// How long the panel shows the confirmation after a save
const SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Type,
    Distance,
    Duration,
    Cadence,
    Elevation,
}

#[derive(Debug, Default)]
pub struct TerminalForm {
    values: FormValues,
    focus: Option<Field>,
    visible: bool,
    settling_until: Option<Instant>,
}

impl EntryForm for TerminalForm {
    fn values(&self) -> FormValues {
        self.values.clone()
    }

    fn clear(&mut self) {
        self.values = FormValues { kind: self.values.kind, ..FormValues::default() };
    }

    fn show(&mut self) {
        self.visible = true;
        self.focus = Some(Field::Distance);
        self.settling_until = None;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.focus = None;
        self.settling_until = Some(Instant::now() + SETTLE_DELAY);
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

impl TerminalForm {
    /// Rows in display order; only the field for the current type is shown
    fn fields(&self) -> [Field; 4] {
        let extra = match self.values.kind {
            WorkoutType::Running => Field::Cadence,
            WorkoutType::Cycling => Field::Elevation,
        };
        [Field::Type, Field::Distance, Field::Duration, extra]
    }

    pub fn focus(&self) -> Option<Field> {
        self.focus
    }

    pub fn next_field(&mut self) {
        self.step_focus(1);
    }

    pub fn prev_field(&mut self) {
        self.step_focus(3);
    }

    fn step_focus(&mut self, by: usize) {
        let fields = self.fields();
        let current = self
            .focus
            .and_then(|f| fields.iter().position(|x| *x == f))
            .unwrap_or(0);
        self.focus = Some(fields[(current + by) % fields.len()]);
    }

    /// Switch running/cycling; the cadence and elevation rows swap places
    pub fn toggle_kind(&mut self) {
        self.values.kind = self.values.kind.toggle();
        if matches!(self.focus, Some(Field::Cadence | Field::Elevation)) {
            self.focus = Some(self.fields()[3]);
        }
    }

    pub fn input(&mut self, c: char) {
        if self.focus == Some(Field::Type) {
            if c == ' ' {
                self.toggle_kind();
            }
            return;
        }
        if (c.is_ascii_digit() || c == '.' || c == '-')
            && let Some(text) = self.focused_text()
        {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus? {
            Field::Type => None,
            Field::Distance => Some(&mut self.values.distance),
            Field::Duration => Some(&mut self.values.duration),
            Field::Cadence => Some(&mut self.values.cadence),
            Field::Elevation => Some(&mut self.values.elevation),
        }
    }

    pub fn is_settling(&self) -> bool {
        self.settling_until.is_some_and(|t| Instant::now() < t)
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" New workout ")
            .border_style(super::map::border_style(focused));

        let body: Vec<Line> = if self.is_settling() {
            vec![Line::styled("✓ Workout saved", Style::default().fg(Color::Green))]
        } else if self.visible {
            self.fields().iter().map(|f| self.field_line(*f)).collect()
        } else {
            vec![Line::styled(
                "Click the map (or Enter on it) to log a workout",
                Style::default().fg(Color::DarkGray),
            )]
        };

        frame.render_widget(Paragraph::new(body).block(block), area);
    }

    fn field_line(&self, field: Field) -> Line<'_> {
        let (label, value, unit) = match field {
            Field::Type => ("Type", format!("◀ {} ▶", self.values.kind.label()), ""),
            Field::Distance => ("Distance", self.values.distance.clone(), "km"),
            Field::Duration => ("Duration", self.values.duration.clone(), "min"),
            Field::Cadence => ("Cadence", self.values.cadence.clone(), "step/min"),
            Field::Elevation => ("Elev Gain", self.values.elevation.clone(), "meters"),
        };
        let value_style = if self.focus == Some(field) {
            Style::default().reversed()
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{label:<10}"), Style::default().bold()),
            Span::styled(format!(" {value:<8} "), value_style),
            Span::styled(format!(" {unit}"), Style::default().fg(Color::DarkGray)),
        ])
    }
}
