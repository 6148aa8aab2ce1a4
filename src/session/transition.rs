//! Pure session transitions.
//!
//! `PlaybackSession::apply` takes the current session and one [`Intent`] and
//! returns the next session together with the [`Effect`]s the media output
//! has to perform. Nothing here touches a device, so every rule of the
//! transport state machine can be tested on plain values.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::catalog::{Track, dedupe};

use super::model::{PlaybackSession, RepeatMode};

/// Everything that can change a session: user gestures, catalog batches and
/// notifications from the output device.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Append a freshly extracted batch as one unit.
    Append(Vec<Track>),
    Remove(usize),

    TogglePlay,
    Play,
    Pause,
    Stop,
    Previous,
    Next,
    Select(usize),
    Seek(Duration),
    /// Relative seek in whole seconds, positive or negative.
    SeekBy(i64),
    SetVolume(f32),
    AdjustVolume(f32),

    ToggleShuffle,
    CycleRepeatMode,
    ToggleInfoOverlay,

    /// The current source reached its natural end.
    TrackEnded,
    /// The output learned the real length of the current source.
    DurationKnown(Duration),
    /// Periodic playback position report.
    Position(Duration),
    /// The output could not open or decode the current source.
    SourceFailed,
}

/// Commands for the media output, in the order they must be performed.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Replace the current source; start playing immediately when `autoplay`.
    Load { track: Arc<Track>, autoplay: bool },
    Play,
    Pause,
    /// Drop the current source entirely.
    Stop,
    Seek(Duration),
    SetVolume(f32),
}

/// Result of applying one intent.
#[derive(Debug, Clone)]
pub struct Transition {
    pub session: PlaybackSession,
    pub effects: Vec<Effect>,
}

impl PlaybackSession {
    /// Compute the session that follows `intent`. `rng` is only consulted by
    /// shuffled advances.
    pub fn apply<R: Rng + ?Sized>(&self, intent: Intent, rng: &mut R) -> Transition {
        let mut next = self.clone();
        let mut effects = Vec::new();

        // Transport intents are no-ops on an empty playlist.
        let needs_tracks = !matches!(
            intent,
            Intent::Append(_)
                | Intent::SetVolume(_)
                | Intent::AdjustVolume(_)
                | Intent::ToggleShuffle
                | Intent::CycleRepeatMode
                | Intent::ToggleInfoOverlay
        );
        if needs_tracks && self.playlist.is_empty() {
            return Transition {
                session: next,
                effects,
            };
        }

        match intent {
            Intent::Append(candidates) => {
                let fresh = dedupe(&next.playlist, candidates);
                if !fresh.is_empty() {
                    let was_empty = next.playlist.is_empty();
                    next.playlist.extend(fresh.into_iter().map(Arc::new));
                    if was_empty {
                        // First load selects track 1 without starting it.
                        next.current_index = 0;
                        next.is_playing = false;
                        next.load_current(false, &mut effects);
                    }
                }
            }

            Intent::Remove(index) => {
                if index < next.playlist.len() {
                    let removing_current = index == next.current_index;
                    if removing_current {
                        effects.push(Effect::Stop);
                    }

                    next.playlist.remove(index);

                    if index < next.current_index {
                        next.current_index -= 1;
                    } else if removing_current {
                        next.current_index = next.current_index.saturating_sub(1);
                    }

                    if next.playlist.is_empty() {
                        next.current_index = 0;
                        next.is_playing = false;
                        next.elapsed = Duration::ZERO;
                        next.total_duration = Duration::ZERO;
                        next.source_loaded = false;
                    } else if removing_current {
                        next.is_playing = false;
                        next.load_current(false, &mut effects);
                    }
                }
            }

            Intent::TogglePlay => {
                if next.is_playing {
                    next.is_playing = false;
                    effects.push(Effect::Pause);
                } else {
                    next.resume(&mut effects);
                }
            }

            Intent::Play => {
                if !next.is_playing {
                    next.resume(&mut effects);
                }
            }

            Intent::Pause => {
                if next.is_playing {
                    next.is_playing = false;
                    effects.push(Effect::Pause);
                }
            }

            Intent::Stop => {
                next.is_playing = false;
                next.elapsed = Duration::ZERO;
                effects.push(Effect::Pause);
                effects.push(Effect::Seek(Duration::ZERO));
            }

            Intent::Previous => {
                next.current_index = if next.current_index == 0 {
                    next.playlist.len() - 1
                } else {
                    next.current_index - 1
                };
                next.start_current(&mut effects);
            }

            Intent::Next => {
                next.advance(rng, &mut effects);
            }

            Intent::Select(index) => {
                if index < next.playlist.len() {
                    next.current_index = index;
                    next.start_current(&mut effects);
                }
            }

            Intent::Seek(to) => {
                next.seek_to(to, &mut effects);
            }

            Intent::SeekBy(secs) => {
                let by = Duration::from_secs(secs.unsigned_abs());
                let to = if secs < 0 {
                    next.elapsed.saturating_sub(by)
                } else {
                    next.elapsed.saturating_add(by)
                };
                next.seek_to(to, &mut effects);
            }

            Intent::SetVolume(v) => {
                next.set_volume(v, &mut effects);
            }

            Intent::AdjustVolume(delta) => {
                let v = next.volume + delta;
                next.set_volume(v, &mut effects);
            }

            Intent::ToggleShuffle => {
                next.shuffle = !next.shuffle;
            }

            Intent::CycleRepeatMode => {
                next.repeat_mode = next.repeat_mode.cycled();
            }

            Intent::ToggleInfoOverlay => {
                next.info_overlay_visible = !next.info_overlay_visible;
            }

            Intent::TrackEnded => match next.repeat_mode {
                RepeatMode::QueueRepeat => next.advance(rng, &mut effects),
                RepeatMode::TrackRepeat => next.start_current(&mut effects),
                RepeatMode::NoRepeat => {
                    if next.current_index + 1 == next.playlist.len() {
                        // End of the queue: rewind to the first track and stop.
                        next.current_index = 0;
                        next.is_playing = false;
                        next.load_current(false, &mut effects);
                    } else {
                        next.advance(rng, &mut effects);
                    }
                }
            },

            Intent::DurationKnown(d) => {
                next.total_duration = d;
            }

            Intent::Position(at) => {
                next.elapsed = at;
            }

            Intent::SourceFailed => {
                next.is_playing = false;
                next.elapsed = Duration::ZERO;
                next.source_loaded = false;
            }
        }

        Transition {
            session: next,
            effects,
        }
    }

    /// Move to the next track (random when shuffling) and play it.
    fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, effects: &mut Vec<Effect>) {
        let len = self.playlist.len();
        self.current_index = if self.shuffle {
            // Uniform over the whole playlist; the current track may come up again.
            rng.gen_range(0..len)
        } else {
            (self.current_index + 1) % len
        };
        self.start_current(effects);
    }

    /// Start playing the current track, reloading it when the output lost it.
    fn resume(&mut self, effects: &mut Vec<Effect>) {
        if self.source_loaded {
            self.is_playing = true;
            effects.push(Effect::Play);
        } else {
            self.start_current(effects);
        }
    }

    fn start_current(&mut self, effects: &mut Vec<Effect>) {
        self.is_playing = true;
        self.load_current(true, effects);
    }

    fn load_current(&mut self, autoplay: bool, effects: &mut Vec<Effect>) {
        self.elapsed = Duration::ZERO;
        if let Some(track) = self.playlist.get(self.current_index) {
            self.total_duration = track.duration;
            self.source_loaded = true;
            effects.push(Effect::Load {
                track: Arc::clone(track),
                autoplay,
            });
        }
    }

    fn seek_to(&mut self, to: Duration, effects: &mut Vec<Effect>) {
        let to = if self.total_duration > Duration::ZERO {
            to.min(self.total_duration)
        } else {
            to
        };
        self.elapsed = to;
        effects.push(Effect::Seek(to));
    }

    fn set_volume(&mut self, v: f32, effects: &mut Vec<Effect>) {
        if v.is_nan() {
            return;
        }
        self.volume = v.clamp(0.0, 1.0);
        effects.push(Effect::SetVolume(self.volume));
    }
}
