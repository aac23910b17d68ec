//! Audio engine capability seam and the rodio-backed implementation.
//!
//! # Overview
//!
//! [`AudioEngine`] is the narrow command interface the controller drives:
//! `load / play / pause / seek / set_muted`, plus the `is_paused` query the
//! native decoder exposes. Everything the engine reports back travels as
//! [`EngineEvent`]s on a channel — metadata, position ticks, end-of-stream,
//! and decoder/transport failures, which are forwarded without
//! interpretation.
//!
//! [`RodioEngine`] is the production implementation: a dedicated OS thread
//! owns the output device, fetches the audio URI, decodes it and pumps
//! position events. Any engine implementing the same shape is substitutable,
//! which is how the controller is tested.
//!
//! [`NullEngine`] stands in when no output device exists so the rest of the
//! application keeps working in text-only mode.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};
use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// EngineEvent
// ---------------------------------------------------------------------------

/// Events emitted by an audio engine. May arrive at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The source's total duration became known.
    MetadataLoaded { duration_secs: f64 },
    /// Periodic playback-position report.
    TimeUpdate { position_secs: f64 },
    /// The source played to its end.
    Ended,
    /// The engine failed (unreachable URI, undecodable audio, seek error).
    Failed { message: String },
}

// ---------------------------------------------------------------------------
// AudioEngine trait
// ---------------------------------------------------------------------------

/// Command interface of a native audio engine.
///
/// Implementations report everything else through [`EngineEvent`]s.
pub trait AudioEngine: Send + Sync {
    /// Replace the current source with `uri` and start loading it. Must not
    /// block waiting for metadata; the engine reports
    /// [`EngineEvent::MetadataLoaded`] asynchronously. Loading never
    /// auto-plays.
    fn load(&mut self, uri: &str);

    fn play(&mut self);

    fn pause(&mut self);

    /// Seek to an absolute position in seconds.
    fn seek(&mut self, position_secs: f64);

    fn set_muted(&mut self, muted: bool);

    /// The engine's own paused/playing truth. Callers query this instead of
    /// assuming their last command took effect.
    fn is_paused(&self) -> bool;
}

// Compile-time assertion: Box<dyn AudioEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioEngine>) {}
};

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Failure to bring up an audio engine at all.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No usable output device (headless host, busy device).
    #[error("audio output unavailable: {0}")]
    DeviceUnavailable(String),
}

// ---------------------------------------------------------------------------
// RodioEngine
// ---------------------------------------------------------------------------

/// How often the engine thread reports playback position.
const POSITION_PUMP_INTERVAL: Duration = Duration::from_millis(250);

/// Timeout for fetching audio bytes on the engine thread.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

enum EngineCommand {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetMuted(bool),
}

/// Production engine: a dedicated thread owning a rodio output stream.
///
/// The handle is `Send`; the thread is not (the output stream must live on
/// the thread that created it). Commands travel over a std channel; events
/// come back on the tokio channel given to [`RodioEngine::spawn`].
pub struct RodioEngine {
    commands: std_mpsc::Sender<EngineCommand>,
    paused: Arc<AtomicBool>,
}

impl RodioEngine {
    /// Start the engine thread and verify an output device exists.
    ///
    /// # Errors
    ///
    /// [`EngineError::DeviceUnavailable`] when the host has no usable audio
    /// output. The thread exits in that case.
    pub fn spawn(events: mpsc::Sender<EngineEvent>) -> Result<Self, EngineError> {
        let (command_tx, command_rx) = std_mpsc::channel::<EngineCommand>();
        let (startup_tx, startup_rx) = std_mpsc::channel::<Result<(), String>>();
        let paused = Arc::new(AtomicBool::new(true));
        let paused_for_thread = Arc::clone(&paused);

        std::thread::Builder::new()
            .name("boletim-audio".into())
            .spawn(move || {
                // The output stream is !Send, so it is created here and never
                // leaves this thread.
                let (_stream, stream_handle) = match OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = startup_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = startup_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                engine_loop(command_rx, events, stream_handle, paused_for_thread);
            })
            .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

        match startup_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                commands: command_tx,
                paused,
            }),
            Ok(Err(msg)) => Err(EngineError::DeviceUnavailable(msg)),
            Err(_) => Err(EngineError::DeviceUnavailable(
                "engine thread exited during startup".into(),
            )),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("player: engine thread is gone, command dropped");
        }
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, uri: &str) {
        self.send(EngineCommand::Load(uri.to_string()));
    }

    fn play(&mut self) {
        self.send(EngineCommand::Play);
    }

    fn pause(&mut self) {
        self.send(EngineCommand::Pause);
    }

    fn seek(&mut self, position_secs: f64) {
        self.send(EngineCommand::Seek(position_secs));
    }

    fn set_muted(&mut self, muted: bool) {
        self.send(EngineCommand::SetMuted(muted));
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// The engine thread: process commands, pump position, detect end-of-stream.
fn engine_loop(
    commands: std_mpsc::Receiver<EngineCommand>,
    events: mpsc::Sender<EngineEvent>,
    stream_handle: rodio::OutputStreamHandle,
    paused: Arc<AtomicBool>,
) {
    let sink = match Sink::try_new(&stream_handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = events.blocking_send(EngineEvent::Failed {
                message: format!("audio sink: {e}"),
            });
            return;
        }
    };
    sink.pause();

    let http = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::blocking::Client::new());

    let mut has_source = false;

    loop {
        match commands.recv_timeout(POSITION_PUMP_INTERVAL) {
            Ok(EngineCommand::Load(uri)) => {
                sink.stop();
                sink.pause();
                has_source = false;

                match fetch_and_decode(&http, &uri) {
                    Ok((source, duration)) => {
                        sink.append(source);
                        sink.pause();
                        has_source = true;
                        if let Some(duration) = duration {
                            let _ = events.blocking_send(EngineEvent::MetadataLoaded {
                                duration_secs: duration.as_secs_f64(),
                            });
                        }
                        log::debug!("player: loaded {uri}");
                    }
                    Err(message) => {
                        log::error!("player: load failed: {message}");
                        let _ = events.blocking_send(EngineEvent::Failed { message });
                    }
                }
            }
            Ok(EngineCommand::Play) => sink.play(),
            Ok(EngineCommand::Pause) => sink.pause(),
            Ok(EngineCommand::Seek(secs)) => {
                if let Err(e) = sink.try_seek(Duration::from_secs_f64(secs.max(0.0))) {
                    let _ = events.blocking_send(EngineEvent::Failed {
                        message: format!("seek: {e}"),
                    });
                }
            }
            Ok(EngineCommand::SetMuted(muted)) => {
                sink.set_volume(if muted { 0.0 } else { 1.0 });
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                // Pump tick.
                if has_source {
                    if sink.empty() {
                        has_source = false;
                        sink.pause();
                        let _ = events.blocking_send(EngineEvent::Ended);
                    } else if !sink.is_paused() {
                        let _ = events.blocking_send(EngineEvent::TimeUpdate {
                            position_secs: sink.get_pos().as_secs_f64(),
                        });
                    }
                }
            }
            Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                log::debug!("player: command channel closed, engine thread exiting");
                return;
            }
        }

        paused.store(sink.is_paused() || sink.empty(), Ordering::Release);
    }
}

/// Fetch `uri` and decode it, reporting the total duration when the decoder
/// knows it.
fn fetch_and_decode(
    http: &reqwest::blocking::Client,
    uri: &str,
) -> Result<(Decoder<Cursor<Vec<u8>>>, Option<Duration>), String> {
    let response = http.get(uri).send().map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {} fetching audio", response.status().as_u16()));
    }
    let bytes = response.bytes().map_err(|e| e.to_string())?.to_vec();

    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let duration = decoder.total_duration();
    Ok((decoder, duration))
}

// ---------------------------------------------------------------------------
// NullEngine
// ---------------------------------------------------------------------------

/// No-op engine used when no output device is available. Accepts every
/// command and stays paused forever; text-only operation keeps working.
#[derive(Debug, Default)]
pub struct NullEngine;

impl AudioEngine for NullEngine {
    fn load(&mut self, uri: &str) {
        log::warn!("player: no audio device — ignoring load of {uri}");
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn seek(&mut self, _position_secs: f64) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn is_paused(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_engine_is_always_paused() {
        let mut engine = NullEngine;
        engine.load("http://host/audio/x.mp3?t=1");
        engine.play();
        assert!(engine.is_paused());
    }

    #[test]
    fn null_engine_is_object_safe() {
        let _: Box<dyn AudioEngine> = Box::new(NullEngine);
    }

    #[test]
    fn engine_error_display_mentions_audio() {
        let e = EngineError::DeviceUnavailable("no default device".into());
        assert!(e.to_string().contains("audio"));
    }
}
