//! Audio playback for synthesized narration
//!
//! The output stream is not `Send`, so [`RodioPlayer`] keeps it on a
//! dedicated thread and talks to it over a command channel.

use super::AudioBytes;
use crate::error::PlaybackError;
use crate::{Result, YouAreHereError};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Invoked exactly once when a clip finishes, or fails while playing.
/// Dropped without being called when playback is stopped.
pub type PlaybackCallback = Box<dyn FnOnce(std::result::Result<(), PlaybackError>) + Send>;

/// Something that can play one clip at a time
pub trait AudioPlayer: Send {
    /// Start playing `audio`, replacing anything already playing.
    ///
    /// Errors mean playback never started and `on_finish` will not be called.
    fn play(&mut self, audio: AudioBytes, on_finish: PlaybackCallback) -> std::result::Result<(), PlaybackError>;

    /// Stop playback; the pending callback is discarded
    fn stop(&mut self);

    /// Fraction of the current clip already played, if known
    fn progress(&self) -> Option<f32>;
}

/// Position within the current clip
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackProgress {
    pub position: Duration,
    pub duration: Option<Duration>,
}

impl PlaybackProgress {
    pub fn fraction(&self) -> Option<f32> {
        let total = self.duration?.as_secs_f32();
        if total <= 0.0 {
            return None;
        }
        Some((self.position.as_secs_f32() / total).clamp(0.0, 1.0))
    }
}

enum PlayerCommand {
    Play {
        audio: AudioBytes,
        on_finish: PlaybackCallback,
        reply: Sender<std::result::Result<(), PlaybackError>>,
    },
    Stop,
    Shutdown,
}

struct ActiveClip {
    sink: Sink,
    duration: Option<Duration>,
    on_finish: PlaybackCallback,
}

/// How often the playback thread checks for clip completion
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long `play` waits for the playback thread to accept a clip
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Plays audio on the default output device via rodio
pub struct RodioPlayer {
    command_tx: Sender<PlayerCommand>,
    progress: Arc<Mutex<Option<PlaybackProgress>>>,
    worker: Option<JoinHandle<()>>,
}

impl RodioPlayer {
    /// Open the default output device on a new playback thread
    pub fn new() -> Result<Self> {
        let (command_tx, command_rx) = bounded(16);
        let (ready_tx, ready_rx) = bounded(1);
        let progress = Arc::new(Mutex::new(None));
        let progress_clone = Arc::clone(&progress);

        let worker = thread::Builder::new()
            .name("youarehere-playback".into())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = ready_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                run_playback_loop(&handle, &command_rx, &progress_clone);
            })
            .map_err(|e| YouAreHereError::AudioDeviceError(format!("Failed to spawn playback thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("Audio output ready");
                Ok(Self {
                    command_tx,
                    progress,
                    worker: Some(worker),
                })
            }
            Ok(Err(e)) => Err(YouAreHereError::AudioDeviceError(format!(
                "No output device available: {}",
                e
            ))),
            Err(_) => Err(YouAreHereError::AudioDeviceError(
                "Playback thread exited during startup".into(),
            )),
        }
    }
}

fn run_playback_loop(
    handle: &OutputStreamHandle,
    command_rx: &Receiver<PlayerCommand>,
    progress: &Mutex<Option<PlaybackProgress>>,
) {
    let mut active: Option<ActiveClip> = None;

    loop {
        match command_rx.recv_timeout(POLL_INTERVAL) {
            Ok(PlayerCommand::Play {
                audio,
                on_finish,
                reply,
            }) => {
                if let Some(previous) = active.take() {
                    previous.sink.stop();
                }
                *progress.lock() = None;

                match start_clip(handle, audio) {
                    Ok((sink, duration)) => {
                        debug!("Playback started ({:?})", duration);
                        let clip = ActiveClip {
                            sink,
                            duration,
                            on_finish,
                        };
                        active = accept_clip(clip, &reply, progress);
                    }
                    Err(e) => {
                        warn!("Playback failed to start: {}", e);
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Ok(PlayerCommand::Stop) => {
                if let Some(clip) = active.take() {
                    clip.sink.stop();
                    debug!("Playback stopped");
                }
                *progress.lock() = None;
            }
            Ok(PlayerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(clip) = active.take() {
                    clip.sink.stop();
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let finished = active.as_ref().is_some_and(|clip| clip.sink.empty());
        if finished {
            if let Some(clip) = active.take() {
                *progress.lock() = None;
                debug!("Playback finished");
                (clip.on_finish)(Ok(()));
            }
        } else if let Some(clip) = &active {
            *progress.lock() = Some(PlaybackProgress {
                position: clip.sink.get_pos(),
                duration: clip.duration,
            });
        }
    }

    debug!("Playback thread exiting");
}

/// Report a started clip to the waiting caller.
///
/// If the caller already gave up, the clip is stopped here; nobody would
/// stop it or hear its completion otherwise.
fn accept_clip(
    clip: ActiveClip,
    reply: &Sender<std::result::Result<(), PlaybackError>>,
    progress: &Mutex<Option<PlaybackProgress>>,
) -> Option<ActiveClip> {
    *progress.lock() = Some(PlaybackProgress {
        position: Duration::ZERO,
        duration: clip.duration,
    });

    if reply.send(Ok(())).is_err() {
        warn!("Caller stopped waiting, dropping late clip");
        clip.sink.stop();
        *progress.lock() = None;
        return None;
    }
    Some(clip)
}

fn start_clip(
    handle: &OutputStreamHandle,
    audio: AudioBytes,
) -> std::result::Result<(Sink, Option<Duration>), PlaybackError> {
    let bytes = audio.into_inner();
    let source = Decoder::new(Cursor::new(bytes.clone()))
        .map_err(|e| PlaybackError::Decode(e.to_string()))?;
    let duration = source.total_duration().or_else(|| estimate_duration(bytes));
    if duration.is_none() {
        debug!("Clip length unknown, progress unavailable");
    }

    let sink = Sink::try_new(handle).map_err(|e| PlaybackError::Device(e.to_string()))?;
    sink.append(source);
    sink.play();
    Ok((sink, duration))
}

/// Length of a clip whose container does not say, by decoding it once
fn estimate_duration(bytes: Vec<u8>) -> Option<Duration> {
    let decoder = Decoder::new(Cursor::new(bytes)).ok()?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples = decoder.count() as u64;
    duration_from_samples(samples, channels, sample_rate)
}

fn duration_from_samples(samples: u64, channels: u16, sample_rate: u32) -> Option<Duration> {
    let per_second = u64::from(channels) * u64::from(sample_rate);
    if per_second == 0 || samples == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(samples as f64 / per_second as f64))
}

impl AudioPlayer for RodioPlayer {
    fn play(&mut self, audio: AudioBytes, on_finish: PlaybackCallback) -> std::result::Result<(), PlaybackError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(PlayerCommand::Play {
                audio,
                on_finish,
                reply: reply_tx,
            })
            .map_err(|_| PlaybackError::Device("playback thread has stopped".into()))?;

        match reply_rx.recv_timeout(REPLY_TIMEOUT) {
            Ok(result) => result,
            Err(_) => {
                // The clip may still start late; queue a stop behind it
                let _ = self.command_tx.send(PlayerCommand::Stop);
                Err(PlaybackError::Device("playback thread did not respond".into()))
            }
        }
    }

    fn stop(&mut self) {
        if self.command_tx.send(PlayerCommand::Stop).is_err() {
            warn!("Playback thread already gone");
        }
    }

    fn progress(&self) -> Option<f32> {
        let progress = *self.progress.lock();
        progress.and_then(|p| p.fraction())
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        let _ = self.command_tx.send(PlayerCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Playback thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let progress = PlaybackProgress {
            position: Duration::from_secs(3),
            duration: Some(Duration::from_secs(12)),
        };
        assert_eq!(progress.fraction(), Some(0.25));
    }

    #[test]
    fn test_progress_unknown_duration() {
        let progress = PlaybackProgress {
            position: Duration::from_secs(3),
            duration: None,
        };
        assert_eq!(progress.fraction(), None);

        let zero = PlaybackProgress {
            position: Duration::ZERO,
            duration: Some(Duration::ZERO),
        };
        assert_eq!(zero.fraction(), None);
    }

    #[test]
    fn test_progress_clamped() {
        let progress = PlaybackProgress {
            position: Duration::from_secs(13),
            duration: Some(Duration::from_secs(12)),
        };
        assert_eq!(progress.fraction(), Some(1.0));
    }

    /// 16-bit PCM WAV of silence
    fn silent_wav(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
        let data_len = frames * u32::from(channels) * 2;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * u32::from(channels) * 2).to_le_bytes());
        wav.extend_from_slice(&(channels * 2).to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(wav.len() + data_len as usize, 0);
        wav
    }

    #[test]
    fn test_duration_from_samples() {
        assert_eq!(duration_from_samples(88_200, 2, 44_100), Some(Duration::from_secs(1)));
        assert_eq!(duration_from_samples(72_000, 1, 24_000), Some(Duration::from_secs(3)));
        assert_eq!(duration_from_samples(1_000, 0, 44_100), None);
        assert_eq!(duration_from_samples(1_000, 2, 0), None);
        assert_eq!(duration_from_samples(0, 2, 44_100), None);
    }

    #[test]
    fn test_estimate_duration_by_decoding() {
        let wav = silent_wav(8_000, 1, 16_000);
        assert_eq!(estimate_duration(wav), Some(Duration::from_secs(2)));
        assert_eq!(estimate_duration(vec![0u8; 64]), None);
    }

    #[test]
    fn test_late_clip_dropped_when_caller_gone() {
        let (sink, _queue) = Sink::new_idle();
        let clip = ActiveClip {
            sink,
            duration: Some(Duration::from_secs(4)),
            on_finish: Box::new(|_| panic!("late clip must not report completion")),
        };
        let (reply_tx, reply_rx) = bounded(1);
        drop(reply_rx);
        let progress = Mutex::new(None);

        assert!(accept_clip(clip, &reply_tx, &progress).is_none());
        assert_eq!(*progress.lock(), None);
    }

    #[test]
    fn test_clip_accepted_when_caller_waiting() {
        let (sink, _queue) = Sink::new_idle();
        let clip = ActiveClip {
            sink,
            duration: Some(Duration::from_secs(4)),
            on_finish: Box::new(|_| {}),
        };
        let (reply_tx, reply_rx) = bounded(1);
        let progress = Mutex::new(None);

        assert!(accept_clip(clip, &reply_tx, &progress).is_some());
        assert!(matches!(reply_rx.try_recv(), Ok(Ok(()))));
        let started = *progress.lock();
        assert_eq!(started.and_then(|p| p.fraction()), Some(0.0));
    }

    #[test]
    fn test_rejects_garbage_audio() {
        // Might not have an audio device in CI
        if let Ok(mut player) = RodioPlayer::new() {
            let result = player.play(AudioBytes::new(vec![0u8; 64]), Box::new(|_| {}));
            assert!(matches!(result, Err(PlaybackError::Decode(_))));
            assert_eq!(player.progress(), None);
        }
    }
}
