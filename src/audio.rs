//! Audio output backed by a dedicated `rodio` thread.
//!
//! The session talks to it through [`AudioPlayer`], which implements
//! `MediaOutput`; the thread answers with `MediaEvent`s over a channel.

mod player;
mod sink;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::AudioCmd;
