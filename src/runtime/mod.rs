use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::catalog::{Catalog, LoftyExtractor};
use crate::mpris::{ControlCmd, spawn_mpris};
use crate::session::{PlaybackSession, Player};

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;
mod startup;

pub use event_loop::control_intent;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_warning) = settings::load_settings();

    match logging::init_logging(&settings.log) {
        Ok(path) => info!(path = %path.display(), "reprise starting"),
        Err(e) => eprintln!("reprise: cannot open log file, logging disabled: {e}"),
    }
    if let Some(w) = settings_warning {
        warn!("{w}");
    }

    let selection: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();

    let catalog = Arc::new(Catalog::new(LoftyExtractor, settings.catalog.clone()));
    let (audio_player, media_rx) = AudioPlayer::spawn(settings.audio.clone())?;
    let mut player = Player::new(
        audio_player,
        PlaybackSession::from_settings(&settings.playback),
    )?;
    let mut app = App::new();

    startup::ingest_paths(&mut player, &*catalog, &selection, &mut app);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = spawn_mpris(control_tx);
    let (ingest_tx, ingest_rx) = mpsc::channel::<startup::IngestBatch>();
    mpris_sync::update_mpris(&mpris, player.session());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::EventLoop {
        settings: &settings,
        catalog: &catalog,
        player: &mut player,
        app: &mut app,
        media_rx: &media_rx,
        mpris: &mpris,
        control_rx: &control_rx,
        ingest_tx: &ingest_tx,
        ingest_rx: &ingest_rx,
    }
    .run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("reprise exiting");
    run_result
}
