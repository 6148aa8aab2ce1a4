use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::catalog::{Catalog, MetadataExtractor, Track};
use crate::error::{AudioError, IngestError};

use super::model::PlaybackSession;
use super::output::{MediaEvent, MediaEventKind, MediaOutput};
use super::transition::{Effect, Intent};

/// Owns the session and drives a media output from it.
///
/// Each call reads the current session, computes the next one, replaces it
/// wholesale and only then forwards the resulting effects to the output.
pub struct Player<O> {
    session: PlaybackSession,
    output: O,
    rng: StdRng,
    generation: u64,
}

impl<O: MediaOutput> Player<O> {
    /// Build a player and push the session's starting volume to the output.
    pub fn new(output: O, session: PlaybackSession) -> Result<Self, AudioError> {
        Self::with_rng(output, session, StdRng::from_entropy())
    }

    pub fn with_rng(output: O, session: PlaybackSession, rng: StdRng) -> Result<Self, AudioError> {
        let mut player = Self {
            session,
            output,
            rng,
            generation: 0,
        };
        let volume = player.session.volume;
        player.output.set_volume(volume)?;
        Ok(player)
    }

    /// Latest published session.
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Generation of the most recently loaded source.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<(), AudioError> {
        trace!(?intent, "dispatch");
        let transition = self.session.apply(intent, &mut self.rng);
        self.session = transition.session;
        self.forward(transition.effects)
    }

    /// Expand `selection`, extract the files and append the survivors as one
    /// batch. Returns how many tracks were added.
    pub fn ingest<E: MetadataExtractor>(
        &mut self,
        catalog: &Catalog<E>,
        selection: &[PathBuf],
    ) -> Result<usize, IngestError> {
        let candidates = catalog.scan(selection)?;
        Ok(self.append(candidates)?)
    }

    /// Append an already extracted batch. Returns how many tracks survived
    /// duplicate filtering.
    pub fn append(&mut self, candidates: Vec<Track>) -> Result<usize, AudioError> {
        let offered = candidates.len();
        let before = self.session.len();
        self.dispatch(Intent::Append(candidates))?;
        let added = self.session.len() - before;
        debug!(offered, added, "appended batch");
        Ok(added)
    }

    pub fn remove(&mut self, index: usize) -> Result<(), AudioError> {
        self.dispatch(Intent::Remove(index))
    }

    /// Feed a notification from the output back into the session. Events for
    /// a source that has since been replaced are dropped.
    pub fn notify(&mut self, event: MediaEvent) -> Result<(), AudioError> {
        if event.generation != self.generation {
            trace!(
                event = event.generation,
                current = self.generation,
                "stale media event"
            );
            return Ok(());
        }
        let intent = match event.kind {
            MediaEventKind::DurationKnown(d) => Intent::DurationKnown(d),
            MediaEventKind::Position(at) => Intent::Position(at),
            MediaEventKind::Ended => Intent::TrackEnded,
            MediaEventKind::Failed => Intent::SourceFailed,
        };
        self.dispatch(intent)
    }

    fn forward(&mut self, effects: Vec<Effect>) -> Result<(), AudioError> {
        for effect in effects {
            match effect {
                Effect::Load { track, autoplay } => {
                    self.generation += 1;
                    self.output.load(&track, autoplay, self.generation)?;
                }
                Effect::Play => self.output.play()?,
                Effect::Pause => self.output.pause()?,
                Effect::Stop => self.output.stop()?,
                Effect::Seek(to) => self.output.seek(to)?,
                Effect::SetVolume(v) => self.output.set_volume(v)?,
            }
        }
        Ok(())
    }
}
