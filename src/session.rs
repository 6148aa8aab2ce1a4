//! Playback session: the playlist aggregate, its transport state machine and
//! the driver that connects it to a media output.

mod model;
mod output;
mod player;
mod transition;

pub use model::{PlaybackSession, RepeatMode, TransportState};
pub use output::{MediaEvent, MediaEventKind, MediaOutput};
pub use player::Player;
pub use transition::{Effect, Intent, Transition};

#[cfg(test)]
mod tests;
