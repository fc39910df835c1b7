//! Map panel - world map canvas with workout markers

use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Paragraph,
        canvas::{Canvas, Map, MapResolution},
    },
};

use crate::map::{MapSurface, Popup};
use crate::workout::Coords;

/// Longitude covered by one map tile at zoom 0
const TILE_SPAN: f64 = 360.0;
/// Tiles across the panel at any zoom
const TILES_ACROSS: f64 = 4.0;
/// Cursor step as a share of the visible span
const CURSOR_STEP: f64 = 0.05;
const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    center: Coords,
    zoom: f64,
}

impl Viewport {
    fn lng_span(&self) -> f64 {
        (TILE_SPAN * TILES_ACROSS / 2f64.powf(self.zoom)).min(360.0)
    }

    /// `(x_bounds, y_bounds)` for a panel of `cols` x `rows` cells.
    /// A cell is about twice as tall as it is wide. The latitude window is
    /// shifted to stay within the poles.
    fn bounds(&self, cols: u16, rows: u16) -> ([f64; 2], [f64; 2]) {
        let lng_span = self.lng_span();
        let aspect = f64::from(rows.max(1)) * 2.0 / f64::from(cols.max(1));
        let lat_span = (lng_span * aspect * self.center.lat.to_radians().cos()).clamp(1e-6, 180.0);
        let south = (self.center.lat - lat_span / 2.0).clamp(-90.0, 90.0 - lat_span);
        (
            [self.center.lng - lng_span / 2.0, self.center.lng + lng_span / 2.0],
            [south, south + lat_span],
        )
    }
}

#[derive(Debug, Clone)]
struct Pin {
    coords: Coords,
    label: String,
    class_name: String,
}

/// Terminal map surface.
///
/// Remembers the inner area of the last draw so mouse positions can be
/// turned back into coordinates.
#[derive(Default)]
pub struct TerminalMap {
    viewport: Option<Viewport>,
    cursor: Option<Coords>,
    pins: Vec<Pin>,
    area: Rect,
}

impl MapSurface for TerminalMap {
    type Marker = usize;

    fn center_view(&mut self, coords: Coords, zoom: f64) {
        self.viewport = Some(Viewport { center: coords, zoom });
        self.cursor = Some(coords);
    }

    fn add_marker(&mut self, coords: Coords, popup: &Popup) -> usize {
        self.pins.push(Pin {
            coords,
            label: popup.content.clone(),
            class_name: popup.class_name.clone(),
        });
        self.pins.len() - 1
    }

    fn pan_to(&mut self, coords: Coords, zoom: f64) {
        self.center_view(coords, zoom);
    }
}

impl TerminalMap {
    pub fn cursor(&self) -> Option<Coords> {
        self.cursor
    }

    /// Move the cursor by whole steps; the view follows when it leaves the edge
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let (Some(vp), Some(cursor)) = (self.viewport.as_mut(), self.cursor.as_mut()) else {
            return;
        };
        let ([west, east], [south, north]) = vp.bounds(self.area.width, self.area.height);
        cursor.lng += f64::from(dx) * CURSOR_STEP * (east - west);
        cursor.lat = (cursor.lat + f64::from(dy) * CURSOR_STEP * (north - south)).clamp(-85.0, 85.0);
        cursor.lng = wrap_lng(cursor.lng);

        if !(west..=east).contains(&cursor.lng) || !(south..=north).contains(&cursor.lat) {
            vp.center = *cursor;
        }
    }

    pub fn zoom_by(&mut self, delta: f64) {
        if let Some(vp) = self.viewport.as_mut() {
            vp.zoom = (vp.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Coordinates under a terminal cell, if it is inside the drawn map
    pub fn coords_at(&self, column: u16, row: u16) -> Option<Coords> {
        let vp = self.viewport?;
        let inner = self.area;
        let inside = column >= inner.x
            && column < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        if !inside {
            return None;
        }

        let ([west, east], [south, north]) = vp.bounds(inner.width, inner.height);
        let fx = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
        let fy = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
        Some(Coords::new(north - fy * (north - south), wrap_lng(west + fx * (east - west))))
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Map ")
            .border_style(border_style(focused));
        self.area = block.inner(area);

        let Some(vp) = self.viewport else {
            let waiting = Paragraph::new("Waiting for your position...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(waiting, area);
            return;
        };

        let (x_bounds, y_bounds) = vp.bounds(self.area.width, self.area.height);
        let pins = &self.pins;
        let cursor = self.cursor;
        let canvas = Canvas::default()
            .block(block.title_bottom(format!(" zoom {:.0} ", vp.zoom)))
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                ctx.draw(&Map {
                    color: Color::DarkGray,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                for pin in pins {
                    ctx.print(
                        pin.coords.lng,
                        pin.coords.lat,
                        Line::styled(format!("● {}", pin.label), pin_style(&pin.class_name)),
                    );
                }
                if let Some(c) = cursor {
                    ctx.print(c.lng, c.lat, Span::styled("✛", Style::default().fg(Color::White).bold()));
                }
            });
        frame.render_widget(canvas, area);
    }
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

fn pin_style(class_name: &str) -> Style {
    match class_name {
        "running-popup" => Style::default().fg(Color::Rgb(0, 196, 106)),
        "cycling-popup" => Style::default().fg(Color::Rgb(255, 181, 69)),
        _ => Style::default().fg(Color::White),
    }
}

pub(super) fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn_map(center: Coords) -> TerminalMap {
        let mut map = TerminalMap::default();
        map.center_view(center, 13.0);
        map.area = Rect::new(10, 5, 80, 20);
        map
    }

    #[test]
    fn test_not_clickable_before_center() {
        let map = TerminalMap::default();
        assert_eq!(map.coords_at(0, 0), None);
    }

    #[test]
    fn test_center_cell_maps_near_center() {
        let center = Coords::new(40.7, -74.0);
        let map = drawn_map(center);
        let c = map.coords_at(50, 15).unwrap();
        let ([west, east], _) = Viewport { center, zoom: 13.0 }.bounds(80, 20);
        assert!((c.lng - center.lng).abs() < (east - west) / 40.0);
        assert!((c.lat - center.lat).abs() < 0.01);
    }

    #[test]
    fn test_outside_area_is_none() {
        let map = drawn_map(Coords::new(0.0, 0.0));
        assert_eq!(map.coords_at(9, 10), None);
        assert_eq!(map.coords_at(90, 10), None);
        assert_eq!(map.coords_at(20, 25), None);
    }

    #[test]
    fn test_top_left_is_north_west() {
        let center = Coords::new(10.0, 20.0);
        let map = drawn_map(center);
        let c = map.coords_at(10, 5).unwrap();
        assert!(c.lat > center.lat);
        assert!(c.lng < center.lng);
    }

    #[test]
    fn test_cursor_moves_and_view_follows() {
        let center = Coords::new(40.7, -74.0);
        let mut map = drawn_map(center);
        map.move_cursor(1, 0);
        assert!(map.cursor().unwrap().lng > center.lng);
        assert_eq!(map.viewport.unwrap().center, center);

        for _ in 0..20 {
            map.move_cursor(1, 0);
        }
        assert_ne!(map.viewport.unwrap().center, center);
    }

    #[test]
    fn test_pan_recenters() {
        let mut map = drawn_map(Coords::new(0.0, 0.0));
        let paris = Coords::new(48.85, 2.35);
        map.pan_to(paris, 13.0);
        assert_eq!(map.viewport.unwrap().center, paris);
        assert_eq!(map.cursor(), Some(paris));
    }

    #[test]
    fn test_zoomed_out_stays_within_poles() {
        let mut map = drawn_map(Coords::new(80.0, 0.0));
        for _ in 0..20 {
            map.zoom_by(-1.0);
        }
        let top = map.coords_at(10, 5).unwrap();
        let bottom = map.coords_at(89, 24).unwrap();
        assert!(top.lat <= 90.0 && top.validate().is_ok());
        assert!(bottom.lat >= -90.0 && bottom.validate().is_ok());
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(wrap_lng(190.0), -170.0);
        assert_eq!(wrap_lng(-74.0), -74.0);
    }
}
