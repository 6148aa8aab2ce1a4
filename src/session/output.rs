//! The narrow interface between the session and whatever makes sound.

use std::time::Duration;

use crate::catalog::Track;
use crate::error::AudioError;

/// Commands the session sends to a media output.
///
/// Every `load` carries a generation number; the output tags the
/// [`MediaEvent`]s it reports for that source with the same number.
pub trait MediaOutput {
    fn load(&mut self, track: &Track, autoplay: bool, generation: u64) -> Result<(), AudioError>;
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
    fn seek(&mut self, to: Duration) -> Result<(), AudioError>;
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    DurationKnown(Duration),
    Position(Duration),
    Ended,
    Failed,
}

/// Notification pushed by the output for the source loaded under `generation`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub generation: u64,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(generation: u64, kind: MediaEventKind) -> Self {
        Self { generation, kind }
    }
}
