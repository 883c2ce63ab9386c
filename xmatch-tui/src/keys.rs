//! Keybinding definitions for the identification window.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Operator actions, produced from raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Spacebar: move to the next selection phase.
    NextPhase,
    /// Enter or `d`: done with this source.
    Finish,
    /// `r`: restart identification of the current source.
    Restart,
    /// `X`: defer this source for a later tricky-mode pass.
    Skip,
    /// `Q`: save progress and quit.
    Quit,
    /// `b`: enlarge the cutout and redraw.
    ZoomOut,
    /// `1`-`4`: set the identification confidence.
    SetConfidence(u8),
    /// `t`: toggle catalogue source markers on/off.
    ToggleSources,
    /// `S`: save progress to file now.
    SaveTable,
    /// `c`: open the comment dialogue for this source.
    OpenComment,
    /// `C`: show the pending comment for this source.
    ShowComment,
    /// `f`: save the current figure regardless of --savefigs.
    SaveFigure,
    /// `i`: show the most recently identified sources.
    ShowRecent,
    /// `h`: show the key bindings.
    Help,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    match code {
        KeyCode::Char(' ') => Some(Action::NextPhase),
        KeyCode::Enter | KeyCode::Char('d') => Some(Action::Finish),
        KeyCode::Char('r') => Some(Action::Restart),
        KeyCode::Char('X') => Some(Action::Skip),
        KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char('b') => Some(Action::ZoomOut),
        KeyCode::Char('t') => Some(Action::ToggleSources),
        KeyCode::Char('S') => Some(Action::SaveTable),
        KeyCode::Char('c') => Some(Action::OpenComment),
        KeyCode::Char('C') => Some(Action::ShowComment),
        KeyCode::Char('f') => Some(Action::SaveFigure),
        KeyCode::Char('i') => Some(Action::ShowRecent),
        KeyCode::Char('h') => Some(Action::Help),
        KeyCode::Char(c @ '1'..='4') => {
            // other digits are silently ignored
            Some(Action::SetConfidence(c as u8 - b'0'))
        }
        _ => None,
    }
}

/// The text shown by the Help action.
pub const HELP_TEXT: &[&str] = &[
    "Basic controls:",
    "  spacebar  go to next phase",
    "  enter, d  go to next source (once in component phase)",
    "  1-4       mark identification certainty",
    "Other controls:",
    "  i         show the last 25 identified rows",
    "  b         zoom out (can be pressed multiple times)",
    "  t         toggle catalogue sources on/off",
    "  c         comment on this source",
    "  C         show the pending comment",
    "  f         manually save the figure",
    "  r         restart identification of the current source",
    "  shift+q   save table to file and quit",
    "  shift+s   save table to file",
    "  shift+x   defer for later; run with -x to revisit",
];

// ============================================================================
// TESTS
// ============================================================================
