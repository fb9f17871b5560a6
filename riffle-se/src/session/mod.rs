//! Playback session state machine
//!
//! Owns the current sample, the active playback voice, and the bounded-loop
//! lifecycle. The machine is driven from a single event loop: fetch/decode
//! tasks, voice completions, and the auto-stop backstop all report in as
//! [`SessionEvent`]s, so session state is never mutated from two places at
//! once.
//!
//! Two staleness mechanisms keep out-of-order completions harmless:
//! - every `load()` issues a new monotonic request token, and a completion
//!   is applied only while its token is still the latest ("latest wins");
//! - every playback teardown bumps a generation counter, and voice/timer
//!   events carry the generation they were scheduled under, so nothing
//!   scheduled before a `stop()` can take effect after it.

pub mod controller;

use crate::audio::{AudioClip, AudioSink, Voice};
use crate::client::{SampleDescriptor, SampleSource};
use crate::decode;
use crate::error::{Error, Result};
use crate::gesture::PointerEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Extra time past the expected end of the final pass before the auto-stop
/// backstop fires
const AUTO_STOP_GRACE: Duration = Duration::from_millis(250);

/// Default number of bounded-loop passes per sample
pub const DEFAULT_MAX_LOOPS: u32 = 3;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No sample loaded yet
    Idle,
    /// A decoded sample is ready but not playing
    Loaded,
    /// Bounded-loop playback in progress
    Playing,
    /// Playback halted (loop exhausted, toggled off, or stopped)
    Stopped,
}

/// A decoded sample ready for playback
#[derive(Debug)]
pub struct LoadedSample {
    pub descriptor: SampleDescriptor,
    pub clip: AudioClip,
}

/// Everything that can reach the session's event loop
#[derive(Debug)]
pub enum SessionEvent {
    /// Raw frontend input; consumed by the controller, not the machine
    Pointer(PointerEvent),
    /// A fetch+decode task finished
    LoadDone {
        token: u64,
        result: Result<LoadedSample>,
    },
    /// The active voice completed one pass naturally
    PassEnded { generation: u64 },
    /// The auto-stop backstop timer fired
    AutoStop { generation: u64 },
    /// Tear the session down and exit the event loop
    Shutdown,
}

/// Observable outcome of applying one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// A load completed and became the current sample
    Loaded,
    /// The bounded loop ran out and playback halted
    Finished,
}

/// The playback session: one per engine run
pub struct PlaybackSession {
    state: SessionState,
    current: Option<LoadedSample>,
    loop_count: u32,
    max_loops: u32,
    /// Most recent request token issued by `load()`
    latest_token: u64,
    /// Bumped on every playback teardown; stamps voice/timer events
    generation: u64,
    voice: Option<Box<dyn Voice>>,
    auto_stop: Option<JoinHandle<()>>,
    sink: Arc<dyn AudioSink>,
    source: Arc<dyn SampleSource>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl PlaybackSession {
    pub fn new(
        sink: Arc<dyn AudioSink>,
        source: Arc<dyn SampleSource>,
        max_loops: u32,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            current: None,
            loop_count: 0,
            max_loops: max_loops.max(1),
            latest_token: 0,
            generation: 0,
            voice: None,
            auto_stop: None,
            sink,
            source,
            events_tx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Descriptor of the currently loaded sample, if any
    pub fn current_descriptor(&self) -> Option<&SampleDescriptor> {
        self.current.as_ref().map(|sample| &sample.descriptor)
    }

    /// Request the next sample: fetch a descriptor and its bytes, decode.
    ///
    /// Issues a new request token; when the spawned task reports back, the
    /// result is applied only if no newer `load()` has been issued since.
    pub fn load(&mut self) {
        self.latest_token += 1;
        let token = self.latest_token;

        let source = self.source.clone();
        let events_tx = self.events_tx.clone();

        debug!(token, "Requesting next sample");

        tokio::spawn(async move {
            let result = fetch_and_decode(source).await;
            // Loop gone means the session is tearing down
            let _ = events_tx.send(SessionEvent::LoadDone { token, result });
        });
    }

    /// Apply one machine event; `Pointer` and `Shutdown` belong to the
    /// controller and are ignored here.
    pub fn apply(&mut self, event: SessionEvent) -> Option<SessionChange> {
        match event {
            SessionEvent::Pointer(_) | SessionEvent::Shutdown => None,
            SessionEvent::LoadDone { token, result } => self.on_load_done(token, result),
            SessionEvent::PassEnded { generation } => self.on_pass_ended(generation),
            SessionEvent::AutoStop { generation } => self.on_auto_stop(generation),
        }
    }

    /// Begin bounded-loop playback of the current sample from the beginning.
    ///
    /// Any existing voice and pending timer are torn down first; overlapping
    /// audio output must never occur.
    pub fn start(&mut self) -> Result<()> {
        let Some(sample) = self.current.as_ref() else {
            return Err(Error::InvalidState("no sample loaded".to_string()));
        };
        let duration = sample.clip.duration();

        self.teardown_playback();
        self.loop_count = 0;

        if let Err(e) = self.start_voice() {
            self.state = SessionState::Stopped;
            return Err(e);
        }

        // Backstop in case the voice never reports completion
        let generation = self.generation;
        let events_tx = self.events_tx.clone();
        let deadline = duration * self.max_loops + AUTO_STOP_GRACE;
        self.auto_stop = Some(tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let _ = events_tx.send(SessionEvent::AutoStop { generation });
        }));

        self.state = SessionState::Playing;
        info!(
            sample = %self.current.as_ref().map(|s| s.descriptor.storage_name.as_str()).unwrap_or(""),
            loops = self.max_loops,
            "Playback started"
        );
        Ok(())
    }

    /// Halt playback and cancel the pending auto-stop timer. Idempotent.
    ///
    /// Events scheduled before this call carry a stale generation and are
    /// discarded when they arrive, so no previously scheduled callback can
    /// take effect afterward.
    pub fn stop(&mut self) {
        self.teardown_playback();
        self.state = SessionState::Stopped;
    }

    /// Restart from the beginning, or toggle playback off if playing.
    pub fn toggle(&mut self) -> Result<()> {
        match self.state {
            SessionState::Playing => {
                self.stop();
                Ok(())
            }
            SessionState::Loaded | SessionState::Stopped if self.current.is_some() => self.start(),
            _ => {
                debug!("Toggle with no sample loaded; ignoring");
                Ok(())
            }
        }
    }

    fn on_load_done(&mut self, token: u64, result: Result<LoadedSample>) -> Option<SessionChange> {
        if token != self.latest_token {
            debug!(token, latest = self.latest_token, "Discarding stale load result");
            return None;
        }

        match result {
            Ok(sample) => {
                self.teardown_playback();
                info!(sample = %sample.descriptor.storage_name, "Sample loaded");
                self.current = Some(sample);
                self.state = SessionState::Loaded;
                Some(SessionChange::Loaded)
            }
            Err(e) => {
                // Non-fatal: the session stays interactive in its prior state
                error!("Load failed: {}", e);
                None
            }
        }
    }

    fn on_pass_ended(&mut self, generation: u64) -> Option<SessionChange> {
        if generation != self.generation || self.state != SessionState::Playing {
            debug!(generation, "Discarding stale pass-end event");
            return None;
        }

        self.loop_count += 1;

        if self.loop_count >= self.max_loops {
            info!(loops = self.loop_count, "Bounded loop complete");
            self.stop();
            return Some(SessionChange::Finished);
        }

        // Restart from the beginning for the next pass; the finished voice
        // is released before a new one exists.
        self.voice = None;
        if let Err(e) = self.start_voice() {
            error!("Loop restart failed: {}", e);
            self.stop();
            return Some(SessionChange::Finished);
        }

        None
    }

    fn on_auto_stop(&mut self, generation: u64) -> Option<SessionChange> {
        if generation != self.generation || self.state != SessionState::Playing {
            return None;
        }

        warn!("Auto-stop backstop fired before the loop completed");
        self.stop();
        Some(SessionChange::Finished)
    }

    /// Start one pass of the current sample on a fresh voice.
    fn start_voice(&mut self) -> Result<()> {
        let sample = self
            .current
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no sample loaded".to_string()))?;

        let generation = self.generation;
        let events_tx = self.events_tx.clone();
        let voice = self.sink.play(
            &sample.clip,
            Box::new(move || {
                let _ = events_tx.send(SessionEvent::PassEnded { generation });
            }),
        )?;

        self.voice = Some(voice);
        Ok(())
    }

    /// Release the voice and timer and invalidate anything they scheduled.
    fn teardown_playback(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.auto_stop.take() {
            timer.abort();
        }
        self.voice = None;
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.teardown_playback();
    }
}

/// Fetch the next sample's descriptor and bytes, then decode off the event
/// loop.
async fn fetch_and_decode(source: Arc<dyn SampleSource>) -> Result<LoadedSample> {
    let descriptor = source.next_sample().await?;
    let bytes = source.fetch(&descriptor.display_name).await?;

    let extension = descriptor
        .display_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_string());

    let clip = tokio::task::spawn_blocking(move || {
        decode::decode_clip(bytes, extension.as_deref())
    })
    .await
    .map_err(|e| Error::Decode(format!("decode task failed: {e}")))??;

    Ok(LoadedSample { descriptor, clip })
}
