//! The modal comment prompt.
//!
//! Blocks the surrounding session in its own small event loop until the
//! operator confirms with Enter or dismisses with Esc. Dismissal yields
//! the empty string. Input is bounded to the comment column width; extra
//! characters are refused at the keystroke level.

use crate::views::centered_rect;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear};
use ratatui::Terminal;
use tui_textarea::TextArea;
use xmatch_core::COMMENT_LIMIT;

/// Run the prompt. Returns the entered comment (0 to [`COMMENT_LIMIT`]
/// characters), empty on dismissal.
pub fn prompt_comment<B: Backend>(
    terminal: &mut Terminal<B>,
    initial: &str,
) -> std::io::Result<String> {
    let mut textarea = TextArea::new(vec![initial.to_string()]);
    textarea.set_cursor_line_style(Style::default());
    textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title("comment for this source (enter saves, esc cancels)"),
    );

    loop {
        terminal.draw(|frame| {
            let area = centered_rect(frame.size(), 64, 3);
            frame.render_widget(Clear, area);
            frame.render_widget(&textarea, area);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => break,
                KeyCode::Esc => return Ok(String::new()),
                _ => {
                    if blocks_insert(&textarea, key.code, key.modifiers) {
                        continue;
                    }
                    textarea.input(key);
                }
            }
        }
    }

    Ok(finalize(textarea.lines()))
}

/// Refuse plain character inserts once the line is at the limit;
/// deletions and cursor movement stay allowed.
fn blocks_insert(textarea: &TextArea, code: KeyCode, modifiers: KeyModifiers) -> bool {
    let at_limit = textarea
        .lines()
        .first()
        .is_some_and(|line| line.chars().count() >= COMMENT_LIMIT);
    at_limit && matches!(code, KeyCode::Char(_)) && !modifiers.contains(KeyModifiers::CONTROL)
}

/// First line only, hard-truncated to the column width.
fn finalize(lines: &[String]) -> String {
    lines
        .first()
        .map(|line| line.chars().take(COMMENT_LIMIT).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_truncates_to_limit() {
        let long = "z".repeat(COMMENT_LIMIT + 30);
        assert_eq!(finalize(&[long]).len(), COMMENT_LIMIT);
    }

    #[test]
    fn test_finalize_keeps_first_line_only() {
        let lines = vec!["kept".to_string(), "dropped".to_string()];
        assert_eq!(finalize(&lines), "kept");
    }

    #[test]
    fn test_finalize_empty() {
        assert_eq!(finalize(&[]), "");
        assert_eq!(finalize(&[String::new()]), "");
    }
}
