//! Rendering of the identification window.
//!
//! One canvas pane carries the cutout scatter and placed markers, a side
//! pane shows operator messages, and a status line tracks the phase,
//! target, and confidence. The canvas uses unit-square coordinates so the
//! click mapping and the view hit test share the same space.

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;
use xmatch_core::RunMode;

use crate::cutout::MarkerKind;

/// Split the window into (canvas, messages, status) panes.
pub fn layout(size: Rect) -> (Rect, Rect, Rect) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(size);
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(outer[0]);
    (main[0], main[1], outer[1])
}

/// A rectangle of the given size centered in `size`.
pub fn centered_rect(size: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(size.width);
    let height = height.min(size.height);
    Rect {
        x: size.x + (size.width - width) / 2,
        y: size.y + (size.height - height) / 2,
        width,
        height,
    }
}

/// Map a terminal cell inside the canvas pane to view coordinates.
///
/// Returns `None` for clicks outside the drawable interior. `y` is
/// flipped so view coordinates grow upward like the sky plot.
pub fn view_position(canvas: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    let inner = canvas.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });
    if inner.width == 0 || inner.height == 0 {
        return None;
    }
    if column < inner.x
        || column >= inner.x + inner.width
        || row < inner.y
        || row >= inner.y + inner.height
    {
        return None;
    }
    let x = (column - inner.x) as f64 / (inner.width.max(1) - 1).max(1) as f64;
    let y = 1.0 - (row - inner.y) as f64 / (inner.height.max(1) - 1).max(1) as f64;
    Some((x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
}

pub fn draw(frame: &mut Frame, app: &App) {
    let (canvas_area, messages_area, status_area) = layout(frame.size());
    draw_canvas(frame, app, canvas_area);
    draw_messages(frame, app, messages_area);
    draw_status(frame, app, status_area);
}

fn draw_canvas(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .view
        .as_ref()
        .map(|view| view.title.clone())
        .unwrap_or_else(|| "no target".to_string());

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_bounds([0.0, 1.0])
        .y_bounds([0.0, 1.0])
        .paint(|ctx| {
            let Some(view) = &app.view else {
                return;
            };
            if view.sources_visible() {
                let coords: Vec<(f64, f64)> = view
                    .clickable()
                    .iter()
                    .map(|point| (point.x, point.y))
                    .collect();
                ctx.draw(&Points {
                    coords: &coords,
                    color: Color::Gray,
                });
            }
            for marker in view.markers() {
                let (symbol, color) = match marker.kind {
                    MarkerKind::InfraredHost => ("X", Color::Cyan),
                    MarkerKind::RadioHost => ("D", Color::Green),
                    MarkerKind::Component => ("#", Color::LightGreen),
                };
                ctx.print(
                    marker.x,
                    marker.y,
                    Span::styled(
                        symbol,
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                );
                if let Some(label) = &marker.label {
                    ctx.print(
                        (marker.x + 0.03).min(1.0),
                        marker.y,
                        Span::styled(format!("- {label}"), Style::default().fg(color)),
                    );
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_messages(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .notices
        .iter()
        .map(|notice| ListItem::new(notice.clone()))
        .collect();
    let list =
        List::new(items).block(Block::default().borders(Borders::ALL).title("messages"));
    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.sequencer.mode() {
        RunMode::Normal => "",
        RunMode::TrickyOnly => " [tricky]",
    };
    let demo = if app.demo { " [demo]" } else { "" };
    let target = app
        .radio
        .get(app.current)
        .map(|row| row.source.id.clone())
        .unwrap_or_default();
    let status = format!(
        " {field}{mode}{demo} | {} | target {target} (row {}/{}) | certainty {} | h for help",
        app.session.phase().title(),
        app.current,
        app.radio.len(),
        app.session.confidence(),
        field = app.field_name,
    );
    let paragraph = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_reserves_status_line() {
        let (canvas, messages, status) = layout(Rect::new(0, 0, 100, 40));
        assert_eq!(status.height, 3);
        assert_eq!(canvas.height, 37);
        assert_eq!(canvas.width + messages.width, 100);
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(outer, 64, 3);
        assert_eq!(rect.width, 64);
        assert_eq!(rect.height, 3);
        assert!(rect.x >= outer.x && rect.x + rect.width <= outer.width);
    }

    #[test]
    fn test_view_position_corners() {
        let canvas = Rect::new(0, 0, 52, 22);
        // inner area is 50x20 starting at (1, 1)
        let (x, y) = view_position(canvas, 1, 1).unwrap();
        assert!((x - 0.0).abs() < 1e-9);
        assert!((y - 1.0).abs() < 1e-9);

        let (x, y) = view_position(canvas, 50, 20).unwrap();
        assert!((x - 1.0).abs() < 1e-9);
        assert!((y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_position_outside_is_none() {
        let canvas = Rect::new(0, 0, 52, 22);
        assert!(view_position(canvas, 0, 5).is_none());
        assert!(view_position(canvas, 51, 5).is_none());
        assert!(view_position(canvas, 5, 21).is_none());
    }
}
