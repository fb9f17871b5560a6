//! Session controller
//!
//! Runs the single event loop that owns the playback session: raw pointer
//! events go through the gesture adapter, intents drive the state machine,
//! and machine events (load completions, pass ends, the auto-stop backstop)
//! are applied in arrival order. Every failure is logged and leaves the loop
//! interactive.

use crate::audio::AudioSink;
use crate::client::SampleSource;
use crate::gesture::{DeviceClass, GestureAdapter, Intent, PointerEvent};
use crate::session::{PlaybackSession, SessionChange, SessionEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Handle for feeding input into a running controller
#[derive(Clone)]
pub struct SessionHandle {
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Forward one raw pointer event; returns false when the loop is gone.
    pub fn pointer(&self, event: PointerEvent) -> bool {
        self.events_tx.send(SessionEvent::Pointer(event)).is_ok()
    }

    /// Ask the loop to tear down and exit.
    ///
    /// The session itself holds an event sender for its in-flight tasks, so
    /// the loop cannot end by channel closure alone.
    pub fn shutdown(&self) {
        let _ = self.events_tx.send(SessionEvent::Shutdown);
    }
}

/// Controller owning the adapter, the state machine, and the server source
pub struct SessionController {
    session: PlaybackSession,
    source: Arc<dyn SampleSource>,
    adapter: GestureAdapter,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// Start playback as soon as the pending load lands
    autostart: bool,
}

impl SessionController {
    pub fn new(
        sink: Arc<dyn AudioSink>,
        source: Arc<dyn SampleSource>,
        device: DeviceClass,
        max_loops: u32,
    ) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = PlaybackSession::new(sink, source.clone(), max_loops, events_tx.clone());

        (
            Self {
                session,
                source,
                adapter: GestureAdapter::for_device(device),
                events_rx,
                autostart: false,
            },
            SessionHandle { events_tx },
        )
    }

    /// Drive the session until every input handle is dropped.
    ///
    /// The first sample is loaded up front but not played; the user starts
    /// the session with a tap/click.
    pub async fn run(mut self) {
        self.session.load();

        while let Some(event) = self.events_rx.recv().await {
            match event {
                SessionEvent::Shutdown => break,
                SessionEvent::Pointer(pointer) => {
                    if let Some(intent) = self.adapter.handle(pointer) {
                        self.dispatch(intent).await;
                    }
                }
                other => {
                    let change = self.session.apply(other);
                    if change == Some(SessionChange::Loaded) && self.autostart {
                        self.autostart = false;
                        if let Err(e) = self.session.start() {
                            error!("Playback did not start: {}", e);
                        }
                    }
                }
            }
        }

        // Session teardown on unload
        self.session.stop();
        info!("Session loop exited");
    }

    async fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::Next => self.next(),
            Intent::Save => {
                self.save().await;
                self.next();
            }
            Intent::Toggle => {
                if let Err(e) = self.session.toggle() {
                    error!("Playback did not start: {}", e);
                }
            }
        }
    }

    /// Load the next sample and play it as soon as it lands.
    fn next(&mut self) {
        self.autostart = true;
        self.session.load();
    }

    /// Archive the current sample. Failures are reported and the session
    /// stays interactive; retry is user-initiated by saving again.
    async fn save(&mut self) {
        let Some(descriptor) = self.session.current_descriptor() else {
            warn!("Save requested but no sample is loaded");
            return;
        };
        let display_name = descriptor.display_name.clone();
        let storage_name = descriptor.storage_name.clone();

        match self.source.archive(&display_name).await {
            Ok(message) => info!(sample = %storage_name, "{}", message),
            Err(e) => error!(sample = %storage_name, "Archive failed: {}", e),
        }
    }
}
