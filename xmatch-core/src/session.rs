//! The three-phase selection protocol.
//!
//! A session walks one target through infrared host selection, radio host
//! selection, and radio component selection. Input arrives as
//! [`SessionEvent`]s from the input-adaptation layer; `Session::apply` is
//! the only transition function and returns the [`Effect`]s the caller
//! must carry out (re-plot markers, commit tags, advance the sequencer).
//! The session itself never touches the table, the renderer, or the
//! terminal.

use crate::catalogue::COMMENT_LIMIT;
use crate::identity::{Identity, Selection, XidTag};

/// Multiplier applied to both cutout pixel radii on a zoom event.
pub const ZOOM_FACTOR: f64 = 1.4;

/// Session confidence starts here; keys 1-4 overwrite it.
pub const DEFAULT_CONFIDENCE: u8 = 1;

/// Highest confidence the operator can assign.
pub const MAX_CONFIDENCE: u8 = 4;

/// The selection phases, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InfraredHost,
    RadioHost,
    RadioComponents,
}

/// Which catalogue a phase's clicks select from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveCatalogue {
    Infrared,
    Radio,
}

impl Phase {
    pub fn title(&self) -> &'static str {
        match self {
            Phase::InfraredHost => "Infrared host ID",
            Phase::RadioHost => "Radio core ID",
            Phase::RadioComponents => "Radio component IDs",
        }
    }

    pub fn catalogue(&self) -> ActiveCatalogue {
        match self {
            Phase::InfraredHost => ActiveCatalogue::Infrared,
            Phase::RadioHost | Phase::RadioComponents => ActiveCatalogue::Radio,
        }
    }
}

/// Events produced by the input-adaptation layer.
///
/// A click carries the catalogue row index and ID captured at render time
/// by the view's hit test; rows are never re-derived from coordinate
/// equality.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Click { row: usize, id: String },
    Advance,
    Finish,
    Restart,
    Skip,
    Quit,
    Zoom,
    SetConfidence(u8),
    SetComment(String),
    ToggleVisibility,
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Swap the clickable point set to the given phase's catalogue and
    /// marker style, keeping markers already placed.
    SwapMarkers(Phase),
    /// Draw the infrared host crosshair on the clicked row.
    MarkInfraredHost { row: usize },
    /// Draw the radio host marker on the clicked row.
    MarkRadioHost { row: usize },
    /// Draw a numbered component marker on the clicked row.
    MarkComponent { row: usize, ordinal: usize },
    /// Show an operator-facing message; no state changed.
    Notice(String),
    /// Write the generated tags into the working table.
    Commit {
        tags: Vec<XidTag>,
        flag: u8,
        comment: Option<String>,
    },
    /// Export the rendered view if a figure format is configured.
    SaveFigure,
    /// Mark the current row with the skipped sentinel.
    MarkSkipped,
    /// Persist the working table now.
    SaveTable,
    /// Tear down the view and ask the sequencer for the next target.
    AdvanceTarget,
    /// Re-render the current target. `reset_zoom` restores default cutout
    /// radii; a zoom rerender keeps the enlarged size.
    Rerender { reset_zoom: bool },
    /// Multiply both cutout radii by [`ZOOM_FACTOR`].
    EnlargeCutout,
    /// Flip catalogue marker visibility (cosmetic only).
    ToggleMarkers,
    /// Persist everything and end the run.
    QuitRun,
}

/// One target's identification session.
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    identity: Identity,
    confidence: u8,
    comment: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::InfraredHost,
            identity: Identity::new(),
            confidence: DEFAULT_CONFIDENCE,
            comment: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Apply one event and return the effects to carry out.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Click { row, id } => self.on_click(row, id),
            SessionEvent::Advance => self.on_advance(),
            SessionEvent::Finish => self.on_finish(),
            SessionEvent::Restart => {
                self.reset();
                vec![Effect::Rerender { reset_zoom: true }]
            }
            SessionEvent::Skip => vec![Effect::MarkSkipped, Effect::AdvanceTarget],
            SessionEvent::Quit => vec![Effect::SaveTable, Effect::QuitRun],
            SessionEvent::Zoom => {
                // same as restart, but the enlarged size survives until
                // the sequencer moves on
                self.reset();
                vec![Effect::EnlargeCutout, Effect::Rerender { reset_zoom: false }]
            }
            SessionEvent::SetConfidence(value) => self.on_confidence(value),
            SessionEvent::SetComment(text) => {
                let truncated: String = text.chars().take(COMMENT_LIMIT).collect();
                self.comment = (!truncated.is_empty()).then_some(truncated);
                vec![]
            }
            SessionEvent::ToggleVisibility => vec![Effect::ToggleMarkers],
        }
    }

    fn reset(&mut self) {
        *self = Session::new();
    }

    fn on_click(&mut self, row: usize, id: String) -> Vec<Effect> {
        match self.phase {
            Phase::InfraredHost => {
                self.identity.set_infrared_host(id, row);
                vec![Effect::MarkInfraredHost { row }]
            }
            Phase::RadioHost => {
                self.identity.set_radio_host(id, row);
                vec![Effect::MarkRadioHost { row }]
            }
            Phase::RadioComponents => match self.identity.add_component(id, row) {
                Selection::Accepted => vec![Effect::MarkComponent {
                    row,
                    ordinal: self.identity.components().len(),
                }],
                Selection::AlreadySelected => {
                    vec![Effect::Notice("source has already been selected".to_string())]
                }
            },
        }
    }

    fn on_advance(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::InfraredHost => {
                self.phase = Phase::RadioHost;
                vec![Effect::SwapMarkers(Phase::RadioHost)]
            }
            Phase::RadioHost => {
                self.phase = Phase::RadioComponents;
                vec![Effect::SwapMarkers(Phase::RadioComponents)]
            }
            Phase::RadioComponents => vec![],
        }
    }

    fn on_finish(&mut self) -> Vec<Effect> {
        if self.phase != Phase::RadioComponents {
            return vec![Effect::Notice("you're not done yet".to_string())];
        }
        let tags = self.identity.generate_tags().to_vec();
        vec![
            Effect::Commit {
                tags,
                flag: self.confidence,
                comment: self.comment.clone(),
            },
            Effect::SaveFigure,
            Effect::AdvanceTarget,
        ]
    }

    fn on_confidence(&mut self, value: u8) -> Vec<Effect> {
        // out-of-range or out-of-phase presses are silently ignored
        if self.phase != Phase::RadioComponents {
            return vec![];
        }
        if !(1..=MAX_CONFIDENCE).contains(&value) {
            return vec![];
        }
        self.confidence = value;
        vec![Effect::Notice(format!(
            "identification certainty marked as {value}"
        ))]
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in_component_phase() -> Session {
        let mut session = Session::new();
        session.apply(SessionEvent::Advance);
        session.apply(SessionEvent::Advance);
        assert_eq!(session.phase(), Phase::RadioComponents);
        session
    }

    fn click(row: usize, id: &str) -> SessionEvent {
        SessionEvent::Click {
            row,
            id: id.to_string(),
        }
    }

    #[test]
    fn test_phases_advance_in_order() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::InfraredHost);

        let effects = session.apply(SessionEvent::Advance);
        assert_eq!(session.phase(), Phase::RadioHost);
        assert_eq!(effects, vec![Effect::SwapMarkers(Phase::RadioHost)]);

        let effects = session.apply(SessionEvent::Advance);
        assert_eq!(session.phase(), Phase::RadioComponents);
        assert_eq!(effects, vec![Effect::SwapMarkers(Phase::RadioComponents)]);

        // no phase past components
        let effects = session.apply(SessionEvent::Advance);
        assert_eq!(session.phase(), Phase::RadioComponents);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_phase_catalogue_swaps_at_radio_host() {
        assert_eq!(Phase::InfraredHost.catalogue(), ActiveCatalogue::Infrared);
        assert_eq!(Phase::RadioHost.catalogue(), ActiveCatalogue::Radio);
        assert_eq!(Phase::RadioComponents.catalogue(), ActiveCatalogue::Radio);
    }

    #[test]
    fn test_click_routes_by_phase() {
        let mut session = Session::new();

        let effects = session.apply(click(3, "SWIRE3_J0039"));
        assert_eq!(effects, vec![Effect::MarkInfraredHost { row: 3 }]);

        session.apply(SessionEvent::Advance);
        let effects = session.apply(click(7, "EI1896"));
        assert_eq!(effects, vec![Effect::MarkRadioHost { row: 7 }]);

        session.apply(SessionEvent::Advance);
        let effects = session.apply(click(9, "EI1897"));
        assert_eq!(effects, vec![Effect::MarkComponent { row: 9, ordinal: 1 }]);
        let effects = session.apply(click(11, "EI1898"));
        assert_eq!(effects, vec![Effect::MarkComponent { row: 11, ordinal: 2 }]);
    }

    #[test]
    fn test_duplicate_component_click_produces_notice() {
        let mut session = session_in_component_phase();
        session.apply(click(9, "EI1897"));

        let effects = session.apply(click(9, "EI1897"));
        assert!(matches!(effects.as_slice(), [Effect::Notice(_)]));
        assert_eq!(session.identity().components().len(), 1);
    }

    #[test]
    fn test_finish_outside_component_phase_is_refused() {
        let mut session = Session::new();
        let effects = session.apply(SessionEvent::Finish);
        assert!(matches!(effects.as_slice(), [Effect::Notice(_)]));
        assert_eq!(session.phase(), Phase::InfraredHost);

        session.apply(SessionEvent::Advance);
        let effects = session.apply(SessionEvent::Finish);
        assert!(matches!(effects.as_slice(), [Effect::Notice(_)]));
    }

    #[test]
    fn test_finish_commits_tags_and_advances() {
        let mut session = Session::new();
        session.apply(click(3, "I"));
        session.apply(SessionEvent::Advance);
        session.apply(click(7, "R"));
        session.apply(SessionEvent::Advance);
        session.apply(click(9, "A"));
        session.apply(SessionEvent::SetConfidence(3));
        session.apply(SessionEvent::SetComment("two lobes".to_string()));

        let effects = session.apply(SessionEvent::Finish);

        match effects.as_slice() {
            [Effect::Commit {
                tags,
                flag,
                comment,
            }, Effect::SaveFigure, Effect::AdvanceTarget] => {
                assert_eq!(*flag, 3);
                assert_eq!(comment.as_deref(), Some("two lobes"));
                assert_eq!(tags.len(), 2);
                assert_eq!(tags[0].tag, "R*I*m2*C0");
                assert_eq!(tags[1].tag, "R*I*m2*C1");
            }
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    #[test]
    fn test_restart_resets_session_and_zoom() {
        let mut session = session_in_component_phase();
        session.apply(click(9, "A"));
        session.apply(SessionEvent::SetConfidence(4));

        let effects = session.apply(SessionEvent::Restart);

        assert_eq!(effects, vec![Effect::Rerender { reset_zoom: true }]);
        assert_eq!(session.phase(), Phase::InfraredHost);
        assert!(session.identity().components().is_empty());
        assert_eq!(session.confidence(), DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_zoom_resets_session_but_keeps_size() {
        let mut session = session_in_component_phase();

        let effects = session.apply(SessionEvent::Zoom);

        assert_eq!(
            effects,
            vec![Effect::EnlargeCutout, Effect::Rerender { reset_zoom: false }]
        );
        assert_eq!(session.phase(), Phase::InfraredHost);
    }

    #[test]
    fn test_confidence_only_in_component_phase() {
        let mut session = Session::new();
        session.apply(SessionEvent::SetConfidence(3));
        assert_eq!(session.confidence(), DEFAULT_CONFIDENCE);

        let mut session = session_in_component_phase();
        session.apply(SessionEvent::SetConfidence(3));
        assert_eq!(session.confidence(), 3);
    }

    #[test]
    fn test_out_of_range_confidence_is_ignored() {
        let mut session = session_in_component_phase();
        session.apply(SessionEvent::SetConfidence(0));
        session.apply(SessionEvent::SetConfidence(5));
        session.apply(SessionEvent::SetConfidence(9));
        assert_eq!(session.confidence(), DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_comment_is_truncated_and_empty_cleared() {
        let mut session = Session::new();
        let long = "y".repeat(COMMENT_LIMIT + 10);
        session.apply(SessionEvent::SetComment(long));
        assert_eq!(session.comment().unwrap().len(), COMMENT_LIMIT);

        session.apply(SessionEvent::SetComment(String::new()));
        assert!(session.comment().is_none());
    }

    #[test]
    fn test_skip_and_quit_effects() {
        let mut session = Session::new();
        assert_eq!(
            session.apply(SessionEvent::Skip),
            vec![Effect::MarkSkipped, Effect::AdvanceTarget]
        );
        assert_eq!(
            session.apply(SessionEvent::Quit),
            vec![Effect::SaveTable, Effect::QuitRun]
        );
    }

    #[test]
    fn test_toggle_visibility_is_cosmetic() {
        let mut session = Session::new();
        let before = session.phase();
        assert_eq!(
            session.apply(SessionEvent::ToggleVisibility),
            vec![Effect::ToggleMarkers]
        );
        assert_eq!(session.phase(), before);
    }
}
