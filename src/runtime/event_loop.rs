use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, error};

use crate::app::{Action, App};
use crate::audio::AudioPlayer;
use crate::catalog::{Catalog, MetadataExtractor};
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::update_mpris;
use crate::runtime::startup::{IngestBatch, apply_batch, spawn_ingest};
use crate::session::{Intent, MediaEvent, Player};
use crate::ui;

/// Everything the event loop drives.
pub struct EventLoop<'a, E> {
    pub settings: &'a config::Settings,
    pub catalog: &'a Arc<Catalog<E>>,
    pub player: &'a mut Player<AudioPlayer>,
    pub app: &'a mut App,
    pub media_rx: &'a Receiver<MediaEvent>,
    pub mpris: &'a MprisHandle,
    pub control_rx: &'a Receiver<ControlCmd>,
    pub ingest_tx: &'a Sender<IngestBatch>,
    pub ingest_rx: &'a Receiver<IngestBatch>,
}

/// MPRIS commands expressed as session intents. `Quit` has none.
pub fn control_intent(cmd: &ControlCmd) -> Option<Intent> {
    match cmd {
        ControlCmd::Quit => None,
        ControlCmd::Play => Some(Intent::Play),
        ControlCmd::Pause => Some(Intent::Pause),
        ControlCmd::PlayPause => Some(Intent::TogglePlay),
        ControlCmd::Stop => Some(Intent::Stop),
        ControlCmd::Next => Some(Intent::Next),
        ControlCmd::Prev => Some(Intent::Previous),
    }
}

impl<E: MetadataExtractor + 'static> EventLoop<'_, E> {
    /// Main terminal event loop: handles input, UI drawing, media
    /// notifications and MPRIS. Returns `Ok(())` when shutdown is requested.
    pub fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            while let Ok(ev) = self.media_rx.try_recv() {
                if let Err(e) = self.player.notify(ev) {
                    self.report(e);
                }
            }

            while let Ok(batch) = self.ingest_rx.try_recv() {
                apply_batch(&mut *self.player, batch, &mut *self.app);
            }

            self.app.sync(self.player.session());
            update_mpris(self.mpris, self.player.session());

            let (session, app, settings) = (self.player.session(), &*self.app, self.settings);
            terminal.draw(|f| ui::draw(f, session, app, settings))?;

            while let Ok(cmd) = self.control_rx.try_recv() {
                debug!(?cmd, "MPRIS command");
                match control_intent(&cmd) {
                    Some(intent) => self.dispatch(intent),
                    None => {
                        self.quit();
                        return Ok(());
                    }
                }
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let action =
                        self.app
                            .handle_key(key, self.player.session(), &self.settings.controls);
                    match action {
                        Some(Action::Session(intent)) => self.dispatch(intent),
                        Some(Action::AddPaths(paths)) => {
                            spawn_ingest(
                                Arc::clone(self.catalog),
                                paths,
                                self.ingest_tx.clone(),
                                &mut *self.app,
                            );
                        }
                        Some(Action::Quit) => {
                            self.quit();
                            return Ok(());
                        }
                        None => {}
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, intent: Intent) {
        if let Err(e) = self.player.dispatch(intent) {
            self.report(e);
        }
    }

    fn report(&mut self, e: crate::error::AudioError) {
        error!(error = %e, "audio output failed");
        self.app.set_notice(format!("Audio error: {e}"));
    }

    fn quit(&mut self) {
        self.player.output().quit_softly(Duration::from_millis(
            self.settings.audio.quit_fade_out_ms,
        ));
    }
}
