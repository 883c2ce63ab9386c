//! XMATCH entry point.

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyEventKind,
        MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use std::io::{self, Stdout};
use tracing_subscriber::EnvFilter;
use xmatch_core::{SequencerStep, SessionEvent};
use xmatch_tui::app::{App, LoopSignal};
use xmatch_tui::cli::Cli;
use xmatch_tui::comment::prompt_comment;
use xmatch_tui::config::AppConfig;
use xmatch_tui::cutout::{CutoutRenderer, TerminalRenderer};
use xmatch_tui::error::TuiError;
use xmatch_tui::keys::{map_key, Action};
use xmatch_tui::views;

fn main() -> Result<(), TuiError> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = AppConfig::load(cli.config.as_deref())?;
    let mut app = App::bootstrap(&cli, &config)?;
    let mut renderer = TerminalRenderer;

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    run(&mut terminal, &mut app, &mut renderer)
}

fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "xmatch_core=debug,xmatch_storage=debug,xmatch_tui=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run<B: Backend, R: CutoutRenderer>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    renderer: &mut R,
) -> Result<(), TuiError> {
    loop {
        match app.next_step() {
            SequencerStep::Finished => {
                tracing::info!("nice, you're done!");
                app.save_table(true)?;
                return Ok(());
            }
            SequencerStep::Target { index, autosave } => {
                if autosave {
                    tracing::info!("autosaving");
                    app.save_table(false)?;
                }
                app.start_session(index, renderer)?;
                if session_loop(terminal, app, renderer)? == LoopSignal::Quit {
                    tracing::info!("quitting");
                    return Ok(());
                }
            }
        }
    }
}

/// The blocking per-target event loop: draw, wait for one operator
/// interaction, dispatch, repeat until the session ends.
fn session_loop<B: Backend, R: CutoutRenderer>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    renderer: &mut R,
) -> Result<LoopSignal, TuiError> {
    loop {
        terminal.draw(|frame| views::draw(frame, app))?;

        let signal = match event::read()? {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => match map_key(key) {
                Some(Action::OpenComment) => {
                    tracing::info!("please enter a comment in the box and hit return");
                    let initial = app.session.comment().unwrap_or("").to_string();
                    let comment = prompt_comment(terminal, &initial)?;
                    let effects = app.session.apply(SessionEvent::SetComment(comment));
                    app.apply_effects(effects, renderer)?
                }
                Some(action) => app.handle_action(action, renderer)?,
                None => LoopSignal::Continue,
            },
            CrosstermEvent::Mouse(mouse)
                if mouse.kind == MouseEventKind::Down(MouseButton::Left) =>
            {
                let (canvas, _, _) = views::layout(terminal.size()?);
                match views::view_position(canvas, mouse.column, mouse.row) {
                    Some((x, y)) => app.handle_click(x, y, renderer)?,
                    None => LoopSignal::Continue,
                }
            }
            _ => LoopSignal::Continue,
        };

        if signal != LoopSignal::Continue {
            return Ok(signal);
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}
