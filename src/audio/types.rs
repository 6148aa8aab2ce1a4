//! Commands accepted by the audio thread.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the current source. Events for it are tagged with `generation`.
    Load {
        path: PathBuf,
        autoplay: bool,
        generation: u64,
    },
    /// Resume the current source.
    Play,
    /// Pause the current source, keeping its position.
    Pause,
    /// Drop the current source.
    Stop,
    /// Jump to an absolute position in the current source.
    Seek(Duration),
    /// Output gain in `[0, 1]`.
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}
