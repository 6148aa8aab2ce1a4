//! Session model types: `PlaybackSession`, `RepeatMode` and `TransportState`.
//!
//! The `PlaybackSession` holds the playlist, the current track and the
//! playback policies. It is a plain value; see `transition` for how it changes.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::Track;
use crate::config::{PlaybackSettings, RepeatModeSetting};

/// What happens when the current track reaches its natural end.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Advance to the next track, wrapping to the start of the playlist.
    #[default]
    QueueRepeat,
    /// Restart the current track.
    TrackRepeat,
    /// Advance, but stop and rewind to the first track after the last one.
    NoRepeat,
}

impl RepeatMode {
    /// `QueueRepeat -> TrackRepeat -> NoRepeat -> QueueRepeat`.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::QueueRepeat => RepeatMode::TrackRepeat,
            RepeatMode::TrackRepeat => RepeatMode::NoRepeat,
            RepeatMode::NoRepeat => RepeatMode::QueueRepeat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::QueueRepeat => "Repeat queue",
            RepeatMode::TrackRepeat => "Repeat track",
            RepeatMode::NoRepeat => "No repeat",
        }
    }
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(s: RepeatModeSetting) -> Self {
        match s {
            RepeatModeSetting::QueueRepeat => RepeatMode::QueueRepeat,
            RepeatModeSetting::TrackRepeat => RepeatMode::TrackRepeat,
            RepeatModeSetting::NoRepeat => RepeatMode::NoRepeat,
        }
    }
}

/// Coarse transport state derived from the session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Empty,
    Paused,
    Playing,
}

/// The single mutable aggregate of the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub playlist: Vec<Arc<Track>>,
    pub current_index: usize,
    pub is_playing: bool,
    pub elapsed: Duration,
    pub total_duration: Duration,
    pub volume: f32,
    pub repeat_mode: RepeatMode,
    pub shuffle: bool,
    pub info_overlay_visible: bool,
    /// The output holds a playable source for the current track. Cleared when
    /// the output reports a failure, so the next play reloads it.
    pub source_loaded: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            playlist: Vec::new(),
            current_index: 0,
            is_playing: false,
            elapsed: Duration::ZERO,
            total_duration: Duration::ZERO,
            volume: 1.0,
            repeat_mode: RepeatMode::default(),
            shuffle: false,
            info_overlay_visible: false,
            source_loaded: false,
        }
    }
}

impl PlaybackSession {
    /// Empty session with the configured starting policies.
    pub fn from_settings(settings: &PlaybackSettings) -> Self {
        Self {
            volume: settings.volume.clamp(0.0, 1.0),
            repeat_mode: settings.repeat_mode.into(),
            shuffle: settings.shuffle,
            ..Self::default()
        }
    }

    pub fn state(&self) -> TransportState {
        if self.playlist.is_empty() {
            TransportState::Empty
        } else if self.is_playing {
            TransportState::Playing
        } else {
            TransportState::Paused
        }
    }

    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    pub fn len(&self) -> usize {
        self.playlist.len()
    }

    /// The selected track, if the playlist is non-empty.
    pub fn current_track(&self) -> Option<&Arc<Track>> {
        self.playlist.get(self.current_index)
    }

    /// Total duration of the current source: the value reported by the output
    /// device once known, otherwise the one read from the tags.
    pub fn duration(&self) -> Duration {
        if self.total_duration > Duration::ZERO {
            self.total_duration
        } else {
            self.current_track()
                .map(|t| t.duration)
                .unwrap_or(Duration::ZERO)
        }
    }
}
