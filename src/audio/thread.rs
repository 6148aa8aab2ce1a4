use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::error::AudioError;
use crate::session::{MediaEvent, MediaEventKind};

use super::sink::create_sink_at;
use super::types::AudioCmd;

/// Wall-clock position of the current source.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct PlayClock {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl PlayClock {
    pub(super) fn at(position: Duration) -> Self {
        Self {
            started_at: None,
            accumulated: position,
        }
    }

    pub(super) fn running(&self) -> bool {
        self.started_at.is_some()
    }

    pub(super) fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub(super) fn stop(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    pub(super) fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}

/// Volume levels for a fade from `from` down to silence in `steps` steps.
pub(super) fn fade_levels(from: f32, steps: u64) -> impl Iterator<Item = f32> {
    let steps = steps.max(1);
    (1..=steps).map(move |step| from * (1.0 - step as f32 / steps as f32))
}

struct Loaded {
    path: PathBuf,
    generation: u64,
    sink: Sink,
    clock: PlayClock,
    ended: bool,
}

struct AudioThread {
    stream: OutputStream,
    events: Sender<MediaEvent>,
    current: Option<Loaded>,
    volume: f32,
}

impl AudioThread {
    fn emit(&self, generation: u64, kind: MediaEventKind) {
        // The receiver only goes away on shutdown.
        let _ = self.events.send(MediaEvent::new(generation, kind));
    }

    fn load(&mut self, path: PathBuf, autoplay: bool, generation: u64) {
        self.stop();
        match create_sink_at(&self.stream, &path, Duration::ZERO) {
            Ok((sink, total)) => {
                sink.set_volume(self.volume);
                let mut clock = PlayClock::default();
                if autoplay {
                    sink.play();
                    clock.start();
                }
                debug!(path = %path.display(), generation, autoplay, "loaded source");
                if let Some(total) = total {
                    self.emit(generation, MediaEventKind::DurationKnown(total));
                }
                self.current = Some(Loaded {
                    path,
                    generation,
                    sink,
                    clock,
                    ended: false,
                });
            }
            Err(e) => {
                error!(error = %e, "cannot play source");
                self.emit(generation, MediaEventKind::Failed);
            }
        }
    }

    fn play(&mut self) {
        if let Some(cur) = self.current.as_mut() {
            cur.sink.play();
            cur.clock.start();
        }
    }

    fn pause(&mut self) {
        if let Some(cur) = self.current.as_mut() {
            cur.sink.pause();
            cur.clock.stop();
        }
    }

    fn stop(&mut self) {
        if let Some(cur) = self.current.take() {
            cur.sink.stop();
        }
    }

    /// Scrubbing: rebuild the current sink and skip into the file. This also
    /// revives a source that already played to its end.
    fn seek(&mut self, to: Duration) {
        let Some(cur) = self.current.take() else {
            return;
        };
        cur.sink.stop();
        let playing = cur.clock.running();

        match create_sink_at(&self.stream, &cur.path, to) {
            Ok((sink, _)) => {
                sink.set_volume(self.volume);
                let mut clock = PlayClock::at(to);
                if playing {
                    sink.play();
                    clock.start();
                }
                self.current = Some(Loaded {
                    sink,
                    clock,
                    ended: false,
                    ..cur
                });
            }
            Err(e) => {
                error!(error = %e, "cannot seek source");
                self.emit(cur.generation, MediaEventKind::Failed);
            }
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(cur) = self.current.as_ref() {
            cur.sink.set_volume(self.volume);
        }
    }

    fn quit(&mut self, fade_out_ms: u64) {
        if let Some(cur) = self.current.take() {
            // Fade out gently before stopping.
            if fade_out_ms > 0 && cur.clock.running() {
                let steps: u64 = 20;
                let step_ms = (fade_out_ms / steps).max(1);
                for level in fade_levels(self.volume, steps) {
                    cur.sink.set_volume(level);
                    thread::sleep(Duration::from_millis(step_ms));
                }
            }
            cur.sink.stop();
        }
    }

    /// Periodic report: position while playing, and one `Ended` once the
    /// sink runs dry.
    fn tick(&mut self) {
        let Some(cur) = self.current.as_mut() else {
            return;
        };
        if cur.ended || !cur.clock.running() {
            return;
        }
        let generation = cur.generation;
        if cur.sink.empty() {
            cur.ended = true;
            cur.clock.stop();
            self.emit(generation, MediaEventKind::Ended);
        } else {
            let at = cur.clock.elapsed();
            self.emit(generation, MediaEventKind::Position(at));
        }
    }
}

/// Spawn the audio thread. `ready` receives the outcome of opening the
/// output device exactly once.
pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<MediaEvent>,
    ready: SyncSender<Result<(), AudioError>>,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(AudioError::Device(e)));
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        info!("audio output opened");
        let _ = ready.send(Ok(()));

        let mut audio = AudioThread {
            stream,
            events,
            current: None,
            volume: 1.0,
        };
        let poll = Duration::from_millis(audio_settings.poll_interval_ms.max(1));

        loop {
            match rx.recv_timeout(poll) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load {
                        path,
                        autoplay,
                        generation,
                    } => audio.load(path, autoplay, generation),
                    AudioCmd::Play => audio.play(),
                    AudioCmd::Pause => audio.pause(),
                    AudioCmd::Stop => audio.stop(),
                    AudioCmd::Seek(to) => audio.seek(to),
                    AudioCmd::SetVolume(v) => audio.set_volume(v),
                    AudioCmd::Quit { fade_out_ms } => {
                        audio.quit(fade_out_ms);
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => audio.tick(),
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("audio command channel closed");
                    audio.stop();
                    break;
                }
            }
        }
        info!("audio thread finished");
    })
}
