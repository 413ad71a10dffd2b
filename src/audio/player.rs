use super::{AudioBackend, AudioConfig};
use crate::error::{CoreError, CoreResult};
use anyhow::Result;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Open `path` just far enough to read its length from the header
pub(crate) fn read_duration(path: &Path) -> Option<Duration> {
    let file = File::open(path).ok()?;
    let decoder = Decoder::new(BufReader::new(file)).ok()?;
    decoder.total_duration()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// rodio-backed sound device
pub struct AudioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    // shared with a running fade thread
    sink: Option<Arc<Sink>>,
    // set to abandon a fade-in that is still running
    fade_in_cancel: Arc<AtomicBool>,
    state: PlaybackState,
    config: AudioConfig,
    // elapsed time bookkeeping across pause/resume
    playing_since: Option<Instant>,
    played_before: Duration,
}

impl AudioPlayer {
    pub fn new(config: AudioConfig) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            fade_in_cancel: Arc::new(AtomicBool::new(false)),
            state: PlaybackState::Stopped,
            config,
            playing_since: None,
            played_before: Duration::ZERO,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    fn open(&self, path: &Path) -> CoreResult<Sink> {
        let playback_error = |reason: String| CoreError::Playback {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| playback_error(format!("failed to open file: {}", e)))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| playback_error(format!("unsupported or corrupted audio: {}", e)))?;
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| playback_error(format!("no output device: {}", e)))?;

        sink.append(source);
        Ok(sink)
    }

    /// Ramp from silence up to the configured volume on a helper thread, so
    /// the caller's event loop never waits on the fade.
    fn fade_in(&mut self, sink: &Arc<Sink>) {
        let target_volume = self.config.volume;
        let fade_duration = self.config.fade_in_duration;

        if fade_duration == 0 {
            sink.set_volume(target_volume);
            return;
        }

        self.fade_in_cancel = Arc::new(AtomicBool::new(false));
        sink.set_volume(0.0);
        let _ = spawn_fade(
            Arc::clone(sink),
            ramp(0.0, target_volume, 10),
            fade_duration,
            Arc::clone(&self.fade_in_cancel),
            false,
        );
    }

    /// Fade the old sink out in the background and stop it at the bottom
    fn fade_out(&self, sink: Arc<Sink>) {
        let fade_duration = self.config.fade_out_duration;

        if fade_duration == 0 {
            sink.stop();
            return;
        }

        let never = Arc::new(AtomicBool::new(false));
        let _ = spawn_fade(sink, ramp(self.config.volume, 0.0, 15), fade_duration, never, true);
    }

    fn cancel_fade_in(&self) {
        self.fade_in_cancel.store(true, Ordering::Relaxed);
    }

    fn reset_clock(&mut self) {
        self.playing_since = None;
        self.played_before = Duration::ZERO;
    }
}

/// Evenly spaced volume levels from `from` to `to`, `to` included
fn ramp(from: f32, to: f32, steps: u32) -> Vec<f32> {
    let step = (to - from) / steps as f32;
    (1..=steps)
        .map(|i| (from + step * i as f32).clamp(0.0, 1.0))
        .collect()
}

fn spawn_fade(
    sink: Arc<Sink>,
    levels: Vec<f32>,
    duration_ms: u64,
    cancel: Arc<AtomicBool>,
    stop_after: bool,
) -> thread::JoinHandle<()> {
    let step_duration = Duration::from_millis(duration_ms / levels.len().max(1) as u64);
    thread::spawn(move || {
        for level in levels {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            sink.set_volume(level);
            thread::sleep(step_duration);
        }
        if stop_after {
            sink.stop();
        }
    })
}

impl AudioBackend for AudioPlayer {
    fn load_and_play(&mut self, path: &Path) -> CoreResult<()> {
        self.stop();

        let sink = match self.open(path) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                warn!("{}", e);
                return Err(e);
            }
        };
        self.fade_in(&sink);

        self.sink = Some(sink);
        self.state = PlaybackState::Playing;
        self.played_before = Duration::ZERO;
        self.playing_since = Some(Instant::now());
        debug!("Started {}", path.display());
        Ok(())
    }

    fn stop(&mut self) {
        self.cancel_fade_in();
        if let Some(sink) = self.sink.take() {
            self.fade_out(sink);
        }
        self.state = PlaybackState::Stopped;
        self.reset_clock();
    }

    fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.pause();
            if let Some(since) = self.playing_since.take() {
                self.played_before += since.elapsed();
            }
            self.state = PlaybackState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state != PlaybackState::Paused {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.play();
            self.playing_since = Some(Instant::now());
            self.state = PlaybackState::Playing;
        }
    }

    fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    fn set_volume(&mut self, volume: f32) {
        let clamped_volume = volume.clamp(0.0, 1.0);
        self.config.volume = clamped_volume;
        self.cancel_fade_in();

        if let Some(sink) = &self.sink {
            sink.set_volume(clamped_volume);
        }
    }

    fn volume(&self) -> f32 {
        self.config.volume
    }

    fn position_ms(&self) -> u64 {
        let running = self.playing_since.map(|since| since.elapsed()).unwrap_or_default();
        (self.played_before + running).as_millis() as u64
    }

    fn take_finished(&mut self) -> bool {
        let finished = self.state == PlaybackState::Playing
            && self.sink.as_ref().map_or(false, |sink| sink.empty());

        if finished {
            self.sink = None;
            self.state = PlaybackState::Stopped;
            self.reset_clock();
        }
        finished
    }
}
