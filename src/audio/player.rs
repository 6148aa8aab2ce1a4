use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::catalog::Track;
use crate::config::AudioSettings;
use crate::error::AudioError;
use crate::session::{MediaEvent, MediaOutput};

use super::thread::spawn_audio_thread;
use super::types::AudioCmd;

/// Handle to the audio thread. Implements [`MediaOutput`] by forwarding
/// commands over a channel.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    /// Start the audio thread on the default output device. The returned
    /// receiver yields the thread's playback notifications.
    pub fn spawn(audio_settings: AudioSettings) -> Result<(Self, Receiver<MediaEvent>), AudioError> {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (events_tx, events_rx) = mpsc::channel::<MediaEvent>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let audio_handle = spawn_audio_thread(rx, events_tx, ready_tx, audio_settings);

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = audio_handle.join();
                return Err(e);
            }
            Err(_) => return Err(AudioError::Disconnected),
        }

        Ok((
            Self {
                tx,
                join: Mutex::new(Some(audio_handle)),
            },
            events_rx,
        ))
    }

    pub fn send(&self, cmd: AudioCmd) -> Result<(), AudioError> {
        self.tx.send(cmd).map_err(|_| AudioError::Disconnected)
    }

    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl MediaOutput for AudioPlayer {
    fn load(&mut self, track: &Track, autoplay: bool, generation: u64) -> Result<(), AudioError> {
        self.send(AudioCmd::Load {
            path: track.path.clone(),
            autoplay,
            generation,
        })
    }

    fn play(&mut self) -> Result<(), AudioError> {
        self.send(AudioCmd::Play)
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.send(AudioCmd::Pause)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.send(AudioCmd::Stop)
    }

    fn seek(&mut self, to: Duration) -> Result<(), AudioError> {
        self.send(AudioCmd::Seek(to))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.send(AudioCmd::SetVolume(volume))
    }
}
