//! Application state for one identification run.
//!
//! `App` is the explicit session context: it owns the catalogues, the
//! working table, the sequencer, the active session, and the current
//! view. Event handlers receive it by reference; nothing lives at process
//! scope, so the state machine is unit-testable without a terminal.

use crate::cli::{Cli, FigureFormat};
use crate::config::{AppConfig, FieldConfig};
use crate::cutout::{
    CutoutRenderer, CutoutRequest, CutoutView, Marker, MarkerKind, PlottedPoint,
};
use crate::error::TuiError;
use crate::keys::{Action, HELP_TEXT};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;
use xmatch_core::{
    angular_separation_arcsec, ActiveCatalogue, Catalogue, Effect, RadioTable, SequencerStep,
    Session, SessionEvent, TargetSequencer, NEIGHBOURHOOD_ARCSEC, ZOOM_FACTOR,
};
use xmatch_storage::{
    ensure_folder, read_catalogue, resume_session, save_radio_table, SaveOutcome,
};

/// Most recent operator-facing messages kept on screen.
const NOTICE_CAPACITY: usize = 16;

/// What the run loop should do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSignal {
    Continue,
    NextTarget,
    Quit,
}

pub struct App {
    pub field_name: String,
    pub field: FieldConfig,
    pub infrared: Catalogue,
    pub radio: RadioTable,
    pub sequencer: TargetSequencer,
    pub session: Session,
    pub view: Option<CutoutView>,
    pub current: usize,
    pub default_radii: (u32, u32),
    pub radii: (u32, u32),
    pub savefigs: Option<FigureFormat>,
    pub timings: bool,
    pub demo: bool,
    pub save_path: PathBuf,
    pub figures_dir: PathBuf,
    pub notices: VecDeque<String>,
}

impl App {
    /// Load catalogues, recover any previous session, and set up the
    /// sequencer.
    pub fn bootstrap(cli: &Cli, config: &AppConfig) -> Result<Self, TuiError> {
        let field = config.field(&cli.field)?.clone();

        let tree = if cli.demo { "demo_output" } else { "output" };
        let output_root = config.output_root.join(tree);
        let tables_dir = ensure_folder(&output_root.join("tables"))?;
        let figures_dir = ensure_folder(&output_root.join("figures"))?;
        let prefix = if cli.demo { "demo-" } else { "" };
        let save_path = tables_dir.join(format!("{prefix}{}_xid_table.dat", cli.field));

        let started = Instant::now();
        tracing::info!(path = %field.radio_catalogue.display(), "reading radio catalogue");
        let radio_catalogue = read_catalogue(&field.radio_catalogue, &config.radio_bindings())?;
        tracing::info!(path = %field.infrared_catalogue.display(), "reading infrared catalogue");
        let infrared = read_catalogue(&field.infrared_catalogue, &config.infrared_bindings())?;
        if cli.timings {
            tracing::debug!(elapsed_ms = started.elapsed().as_millis(), "catalogue read");
        }

        let mut radio = RadioTable::from_catalogue(radio_catalogue);
        let recovered = resume_session(&save_path, &mut radio, &config.columns.radio_id)?;
        if recovered > 0 {
            tracing::info!(recovered, "resumed previous session");
        }

        let sequencer = TargetSequencer::new(config.start_index, cli.run_mode(), &radio);
        let default_radii = (
            config.cutout.infrared_radius_px,
            config.cutout.radio_radius_px,
        );

        Ok(Self {
            field_name: cli.field.clone(),
            field,
            infrared,
            radio,
            sequencer,
            session: Session::new(),
            view: None,
            current: config.start_index,
            default_radii,
            radii: default_radii,
            savefigs: cli.savefigs,
            timings: cli.timings,
            demo: cli.demo,
            save_path,
            figures_dir,
            notices: VecDeque::new(),
        })
    }

    pub fn next_step(&mut self) -> SequencerStep {
        self.sequencer.next(&self.radio)
    }

    /// Begin a fresh session on a target row and render its view.
    pub fn start_session<R: CutoutRenderer>(
        &mut self,
        index: usize,
        renderer: &mut R,
    ) -> Result<(), TuiError> {
        self.current = index;
        self.session = Session::new();
        self.render_view(renderer)
    }

    /// Route an operator action. Session-protocol actions go through the
    /// state machine; the rest are handled here. `OpenComment` is handled
    /// by the caller because it needs the terminal.
    pub fn handle_action<R: CutoutRenderer>(
        &mut self,
        action: Action,
        renderer: &mut R,
    ) -> Result<LoopSignal, TuiError> {
        let event = match action {
            Action::NextPhase => SessionEvent::Advance,
            Action::Finish => SessionEvent::Finish,
            Action::Restart => SessionEvent::Restart,
            Action::Skip => SessionEvent::Skip,
            Action::Quit => SessionEvent::Quit,
            Action::ZoomOut => SessionEvent::Zoom,
            Action::SetConfidence(value) => SessionEvent::SetConfidence(value),
            Action::ToggleSources => SessionEvent::ToggleVisibility,
            Action::SaveTable => {
                self.save_table(false)?;
                return Ok(LoopSignal::Continue);
            }
            Action::ShowComment => {
                let message = match self.session.comment() {
                    Some(comment) => format!("comment for this source: {comment}"),
                    None => "no comment entered for this source".to_string(),
                };
                self.push_notice(message);
                return Ok(LoopSignal::Continue);
            }
            Action::SaveFigure => {
                self.export_figure(renderer, true)?;
                return Ok(LoopSignal::Continue);
            }
            Action::ShowRecent => {
                self.show_recent();
                return Ok(LoopSignal::Continue);
            }
            Action::Help => {
                for line in HELP_TEXT {
                    self.push_notice((*line).to_string());
                }
                return Ok(LoopSignal::Continue);
            }
            Action::OpenComment => return Ok(LoopSignal::Continue),
        };
        let effects = self.session.apply(event);
        self.apply_effects(effects, renderer)
    }

    /// Translate a click in view coordinates into a session event.
    pub fn handle_click<R: CutoutRenderer>(
        &mut self,
        x: f64,
        y: f64,
        renderer: &mut R,
    ) -> Result<LoopSignal, TuiError> {
        let Some(picked) = self
            .view
            .as_ref()
            .and_then(|view| view.pick(x, y))
            .map(|point| (point.row, point.id.clone()))
        else {
            return Ok(LoopSignal::Continue);
        };
        tracing::debug!(row = picked.0, id = %picked.1, "catalogue point clicked");
        let effects = self.session.apply(SessionEvent::Click {
            row: picked.0,
            id: picked.1,
        });
        self.apply_effects(effects, renderer)
    }

    pub fn apply_effects<R: CutoutRenderer>(
        &mut self,
        effects: Vec<Effect>,
        renderer: &mut R,
    ) -> Result<LoopSignal, TuiError> {
        let mut signal = LoopSignal::Continue;
        for effect in effects {
            match effect {
                Effect::SwapMarkers(_) => self.refresh_clickable(),
                Effect::MarkInfraredHost { row } => {
                    self.place_marker(ActiveCatalogue::Infrared, row, MarkerKind::InfraredHost, None)
                }
                Effect::MarkRadioHost { row } => {
                    self.place_marker(ActiveCatalogue::Radio, row, MarkerKind::RadioHost, None)
                }
                Effect::MarkComponent { row, ordinal } => self.place_marker(
                    ActiveCatalogue::Radio,
                    row,
                    MarkerKind::Component,
                    Some(format!("C{ordinal}")),
                ),
                Effect::Notice(message) => self.push_notice(message),
                Effect::Commit {
                    tags,
                    flag,
                    comment,
                } => {
                    for tag in &tags {
                        tracing::debug!(tag = %tag.tag, row = ?tag.row, "writing tag to table");
                    }
                    self.radio.commit(&tags, flag, comment.as_deref())?;
                }
                Effect::SaveFigure => {
                    if self.savefigs.is_some() {
                        self.export_figure(renderer, false)?;
                    }
                }
                Effect::MarkSkipped => {
                    self.radio.mark_skipped(self.current)?;
                    self.push_notice("marked for re-examination later".to_string());
                }
                Effect::SaveTable => self.save_table(false)?,
                Effect::AdvanceTarget => {
                    self.sequencer.request_advance();
                    self.radii = self.default_radii;
                    self.view = None;
                    signal = LoopSignal::NextTarget;
                }
                Effect::Rerender { reset_zoom } => {
                    if reset_zoom {
                        self.radii = self.default_radii;
                    }
                    self.render_view(renderer)?;
                }
                Effect::EnlargeCutout => {
                    self.radii = (
                        (self.radii.0 as f64 * ZOOM_FACTOR) as u32,
                        (self.radii.1 as f64 * ZOOM_FACTOR) as u32,
                    );
                }
                Effect::ToggleMarkers => {
                    if let Some(view) = &mut self.view {
                        view.toggle_sources();
                    }
                }
                Effect::QuitRun => signal = LoopSignal::Quit,
            }
        }
        Ok(signal)
    }

    /// Persist the working table; `whole` writes untouched rows too.
    pub fn save_table(&mut self, whole: bool) -> Result<(), TuiError> {
        let started = Instant::now();
        let outcome = save_radio_table(&self.save_path, &self.radio, whole)?;
        if self.timings {
            tracing::debug!(elapsed_ms = started.elapsed().as_millis(), "table save");
        }
        match outcome {
            SaveOutcome::Written { rows, .. } => {
                self.push_notice(format!("saved {rows} rows"));
            }
            SaveOutcome::NothingToSave => {
                self.push_notice("no data to save!".to_string());
            }
        }
        Ok(())
    }

    /// Export the current view. Manual exports always write PDF named
    /// `<id>_manual`; automatic exports use the --savefigs format.
    pub fn export_figure<R: CutoutRenderer>(
        &mut self,
        renderer: &mut R,
        manual: bool,
    ) -> Result<(), TuiError> {
        let Some(view) = &self.view else {
            return Ok(());
        };
        let Some(row) = self.radio.get(self.current) else {
            return Ok(());
        };
        let filename = if manual {
            format!("{}_manual.pdf", row.source.id)
        } else {
            match self.savefigs {
                Some(format) => format!("{}.{}", row.source.id, format.extension()),
                None => return Ok(()),
            }
        };
        let path = self.figures_dir.join(filename);
        renderer.export(view, &path)?;
        self.push_notice(format!("saved figure {}", path.display()));
        Ok(())
    }

    pub fn push_notice(&mut self, message: String) {
        tracing::info!("{message}");
        self.notices.push_back(message);
        while self.notices.len() > NOTICE_CAPACITY {
            self.notices.pop_front();
        }
    }

    fn show_recent(&mut self) {
        let lines: Vec<String> = self
            .radio
            .recent_tagged(25)
            .iter()
            .map(|row| format!("{}  {}", row.source.id, row.xid.tag))
            .collect();
        if lines.is_empty() {
            self.push_notice("nothing identified yet".to_string());
            return;
        }
        self.push_notice(format!("last {} identifications:", lines.len()));
        for line in lines {
            self.push_notice(line);
        }
    }

    /// Render (or re-render) the current target's view and plot the
    /// clickable set for the session's phase.
    pub fn render_view<R: CutoutRenderer>(&mut self, renderer: &mut R) -> Result<(), TuiError> {
        let row = self
            .radio
            .get(self.current)
            .ok_or(xmatch_core::CoreError::RowOutOfBounds {
                index: self.current,
                len: self.radio.len(),
            })?;
        let request = CutoutRequest {
            infrared_image: self.field.infrared_mosaic.clone(),
            radio_image: self.field.radio_continuum.clone(),
            radio_rms_image: self.field.radio_rms.clone(),
            target_ra: row.source.ra,
            target_dec: row.source.dec,
            infrared_radius_px: self.radii.0,
            radio_radius_px: self.radii.1,
        };

        let started = Instant::now();
        let view = renderer.render(&request)?;
        if self.timings {
            tracing::debug!(elapsed_ms = started.elapsed().as_millis(), "cutout render");
        }
        self.view = Some(view);
        self.refresh_clickable();
        Ok(())
    }

    /// Re-plot the clickable point set for the current phase, keeping any
    /// placed markers.
    fn refresh_clickable(&mut self) {
        let Some(transform) = self.view.as_ref().map(|view| view.transform) else {
            return;
        };
        let Some(target) = self.radio.get(self.current) else {
            return;
        };
        let (target_ra, target_dec, target_id) =
            (target.source.ra, target.source.dec, target.source.id.clone());

        let points: Vec<PlottedPoint> = match self.session.phase().catalogue() {
            ActiveCatalogue::Infrared => self
                .infrared
                .neighbourhood(target_ra, target_dec, NEIGHBOURHOOD_ARCSEC)
                .into_iter()
                .filter_map(|index| {
                    let row = &self.infrared.rows[index];
                    transform.sky_to_view(row.ra, row.dec).map(|(x, y)| PlottedPoint {
                        row: index,
                        id: row.id.clone(),
                        x,
                        y,
                    })
                })
                .collect(),
            ActiveCatalogue::Radio => self
                .radio
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| {
                    angular_separation_arcsec(target_ra, target_dec, row.source.ra, row.source.dec)
                        < NEIGHBOURHOOD_ARCSEC
                })
                .filter_map(|(index, row)| {
                    transform
                        .sky_to_view(row.source.ra, row.source.dec)
                        .map(|(x, y)| PlottedPoint {
                            row: index,
                            id: row.source.id.clone(),
                            x,
                            y,
                        })
                })
                .collect(),
        };

        if let Some(view) = &mut self.view {
            view.set_clickable(points);
            view.title = format!("{} - {}", self.session.phase().title(), target_id);
        }
    }

    fn place_marker(
        &mut self,
        catalogue: ActiveCatalogue,
        row: usize,
        kind: MarkerKind,
        label: Option<String>,
    ) {
        let Some(transform) = self.view.as_ref().map(|view| view.transform) else {
            return;
        };
        let position = match catalogue {
            ActiveCatalogue::Infrared => self
                .infrared
                .get(row)
                .and_then(|r| transform.sky_to_view(r.ra, r.dec)),
            ActiveCatalogue::Radio => self
                .radio
                .get(row)
                .and_then(|r| transform.sky_to_view(r.source.ra, r.source.dec)),
        };
        if let (Some((x, y)), Some(view)) = (position, &mut self.view) {
            view.add_marker(Marker { x, y, kind, label });
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::TerminalRenderer;
    use clap::Parser;
    use xmatch_core::{Phase, TagStatus};
    use xmatch_storage::write_raw_table;

    fn write_catalogue(path: &std::path::Path, prefix: &str, positions: &[(f64, f64)]) {
        let columns = vec!["ID".to_string(), "RA".to_string(), "DEC".to_string()];
        let records: Vec<Vec<String>> = positions
            .iter()
            .enumerate()
            .map(|(i, (ra, dec))| {
                vec![
                    format!("{prefix}{i:04}"),
                    format!("{ra:.5}"),
                    format!("{dec:.5}"),
                ]
            })
            .collect();
        write_raw_table(path, &columns, &records).unwrap();
    }

    fn test_app(dir: &std::path::Path) -> App {
        let radio_path = dir.join("radio.dat");
        let infrared_path = dir.join("infrared.dat");
        // three radio sources and two infrared sources near 52.0, -28.0
        write_catalogue(
            &radio_path,
            "EI",
            &[(52.000, -28.000), (52.005, -28.002), (52.010, -28.004)],
        );
        write_catalogue(&infrared_path, "SW", &[(52.001, -28.001), (52.006, -28.003)]);

        let config_text = format!(
            r#"
start_index = 0
output_root = {root:?}

[fields.cdfs]
radio_continuum = "continuum.fits"
radio_rms = "rms.fits"
infrared_mosaic = "mosaic.fits"
radio_catalogue = {radio:?}
infrared_catalogue = {infrared:?}

[columns]
radio_id = "ID"
radio_ra = "RA"
radio_dec = "DEC"
infrared_id = "ID"
infrared_ra = "RA"
infrared_dec = "DEC"

[cutout]
infrared_radius_px = 200
radio_radius_px = 180

[window]
horizontal = 0
vertical = 0
"#,
            root = dir.to_string_lossy(),
            radio = radio_path.to_string_lossy(),
            infrared = infrared_path.to_string_lossy(),
        );
        let config: AppConfig = toml::from_str(&config_text).unwrap();
        config.validate().unwrap();
        let cli = Cli::parse_from(["xmatch", "cdfs"]);
        App::bootstrap(&cli, &config).unwrap()
    }

    #[test]
    fn test_bootstrap_loads_catalogues_and_sequencer() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        assert_eq!(app.radio.len(), 3);
        assert_eq!(app.infrared.len(), 2);
        assert_eq!(app.sequencer.index(), 0);
        assert_eq!(app.radii, (200, 180));
    }

    #[test]
    fn test_full_identification_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let mut renderer = TerminalRenderer;

        app.start_session(0, &mut renderer).unwrap();
        assert_eq!(app.session.phase(), Phase::InfraredHost);
        let clickable = app.view.as_ref().unwrap().clickable().len();
        assert_eq!(clickable, 2, "both infrared sources should be pickable");

        // click the first infrared source at its plotted position
        let (x, y) = {
            let point = &app.view.as_ref().unwrap().clickable()[0];
            (point.x, point.y)
        };
        app.handle_click(x, y, &mut renderer).unwrap();

        // advance to radio host phase: clickable swaps to the radio table
        app.handle_action(Action::NextPhase, &mut renderer).unwrap();
        assert_eq!(app.session.phase(), Phase::RadioHost);
        let radio_points = app.view.as_ref().unwrap().clickable().len();
        assert_eq!(radio_points, 3);

        let (x, y) = {
            let point = &app.view.as_ref().unwrap().clickable()[0];
            (point.x, point.y)
        };
        app.handle_click(x, y, &mut renderer).unwrap();

        app.handle_action(Action::NextPhase, &mut renderer).unwrap();
        let (x, y) = {
            let point = &app.view.as_ref().unwrap().clickable()[1];
            (point.x, point.y)
        };
        app.handle_click(x, y, &mut renderer).unwrap();

        let signal = app.handle_action(Action::Finish, &mut renderer).unwrap();
        assert_eq!(signal, LoopSignal::NextTarget);
        assert_eq!(app.radio.status(0), Some(TagStatus::Tagged));
        assert_eq!(app.radio.status(1), Some(TagStatus::Tagged));
        let tag = &app.radio.rows[0].xid.tag;
        assert!(tag.starts_with("EI0000*SW0000*m2*C0"), "got {tag}");
    }

    #[test]
    fn test_skip_marks_and_advances() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let mut renderer = TerminalRenderer;

        app.start_session(0, &mut renderer).unwrap();
        let signal = app.handle_action(Action::Skip, &mut renderer).unwrap();

        assert_eq!(signal, LoopSignal::NextTarget);
        assert_eq!(app.radio.status(0), Some(TagStatus::Skipped));
    }

    #[test]
    fn test_zoom_enlarges_and_advance_resets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let mut renderer = TerminalRenderer;

        app.start_session(0, &mut renderer).unwrap();
        app.handle_action(Action::ZoomOut, &mut renderer).unwrap();
        assert_eq!(app.radii, (280, 252));

        // zoom survives a restart-free rerender; advancing resets it
        app.handle_action(Action::Skip, &mut renderer).unwrap();
        assert_eq!(app.radii, app.default_radii);
    }

    #[test]
    fn test_restart_resets_zoom() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let mut renderer = TerminalRenderer;

        app.start_session(0, &mut renderer).unwrap();
        app.handle_action(Action::ZoomOut, &mut renderer).unwrap();
        app.handle_action(Action::Restart, &mut renderer).unwrap();
        assert_eq!(app.radii, app.default_radii);
    }

    #[test]
    fn test_quit_saves_progress() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let mut renderer = TerminalRenderer;

        app.start_session(0, &mut renderer).unwrap();
        app.handle_action(Action::Skip, &mut renderer).unwrap();
        let signal = app.handle_action(Action::Quit, &mut renderer).unwrap();

        assert_eq!(signal, LoopSignal::Quit);
        assert!(app.save_path.exists());
    }

    #[test]
    fn test_save_with_no_results_reports_not_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        app.save_table(false).unwrap();

        assert!(!app.save_path.exists());
        assert!(app
            .notices
            .iter()
            .any(|notice| notice.contains("no data to save")));
    }
}
