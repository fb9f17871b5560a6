//! Integration tests for the session event loop
//!
//! Drives a full `SessionController` with a scripted server source and the
//! mock sink. Real (short) delays stand in for network latency, so the
//! latest-wins race is exercised with genuinely out-of-order completions.

use async_trait::async_trait;
use riffle_se::audio::mock::MockSink;
use riffle_se::client::{SampleDescriptor, SampleSource};
use riffle_se::error::{Error, Result};
use riffle_se::gesture::{DeviceClass, PointerEvent};
use riffle_se::session::controller::{SessionController, SessionHandle};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// One scripted selection: storage name + simulated fetch latency
#[derive(Debug, Clone)]
struct Scripted {
    name: &'static str,
    fetch_delay: Duration,
}

/// Server source playing back a fixed script of selections
struct ScriptedSource {
    queue: Mutex<VecDeque<Scripted>>,
    /// Fetch latency per display name, captured when the sample is selected
    delays: Mutex<Vec<(String, Duration)>>,
    archived: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(script: &[(&'static str, u64)]) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(
                script
                    .iter()
                    .map(|(name, millis)| Scripted {
                        name,
                        fetch_delay: Duration::from_millis(*millis),
                    })
                    .collect(),
            ),
            delays: Mutex::new(Vec::new()),
            archived: Mutex::new(Vec::new()),
        })
    }

    fn archived(&self) -> Vec<String> {
        self.archived.lock().unwrap().clone()
    }
}

#[async_trait]
impl SampleSource for ScriptedSource {
    async fn auth_status(&self) -> Result<bool> {
        Ok(true)
    }

    async fn next_sample(&self) -> Result<SampleDescriptor> {
        let scripted = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Server {
                status: 500,
                message: "script exhausted".to_string(),
            })?;

        self.delays
            .lock()
            .unwrap()
            .push((scripted.name.to_string(), scripted.fetch_delay));

        Ok(SampleDescriptor {
            display_name: scripted.name.to_string(),
            storage_name: scripted.name.to_string(),
        })
    }

    async fn fetch(&self, display_name: &str) -> Result<Vec<u8>> {
        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == display_name)
            .map(|(_, delay)| *delay)
            .unwrap_or_default();

        sleep(delay).await;
        Ok(short_wav())
    }

    async fn archive(&self, display_name: &str) -> Result<String> {
        self.archived.lock().unwrap().push(display_name.to_string());
        Ok("File added to Drive successfully".to_string())
    }
}

/// A 10 ms mono wav; short enough that the auto-stop backstop never beats
/// the mock sink's simulated passes.
fn short_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..441 {
            writer.write_sample(((i % 80) - 40) as i16 * 200).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn swipe_left(handle: &SessionHandle) {
    handle.pointer(PointerEvent::Down { x: 300.0, y: 100.0 });
    handle.pointer(PointerEvent::Up { x: 100.0, y: 100.0 });
}

fn swipe_right(handle: &SessionHandle) {
    handle.pointer(PointerEvent::Down { x: 100.0, y: 100.0 });
    handle.pointer(PointerEvent::Up { x: 300.0, y: 100.0 });
}

fn tap(handle: &SessionHandle) {
    handle.pointer(PointerEvent::Down { x: 100.0, y: 100.0 });
    handle.pointer(PointerEvent::Up { x: 101.0, y: 100.0 });
}

struct Harness {
    sink: Arc<MockSink>,
    source: Arc<ScriptedSource>,
    handle: SessionHandle,
    loop_task: tokio::task::JoinHandle<()>,
}

fn start_session(
    script: &[(&'static str, u64)],
    pass_millis: u64,
    max_loops: u32,
) -> Harness {
    let sink = Arc::new(MockSink::with_pass_duration(Duration::from_millis(
        pass_millis,
    )));
    let source = ScriptedSource::new(script);

    let (controller, handle) = SessionController::new(
        sink.clone(),
        source.clone(),
        DeviceClass::Touch,
        max_loops,
    );
    let loop_task = tokio::spawn(controller.run());

    Harness {
        sink,
        source,
        handle,
        loop_task,
    }
}

async fn finish(harness: Harness) {
    harness.handle.shutdown();
    harness.loop_task.await.expect("Session loop panicked");
}

// =============================================================================
// Latest-wins load race
// =============================================================================

#[tokio::test]
async fn test_latest_load_wins_with_out_of_order_responses() {
    // init loads instantly; A is slow, B is fast, so B's bytes arrive first
    // and A's arrive while B is already current.
    let h = start_session(
        &[("init.wav", 0), ("a.wav", 200), ("b.wav", 10), ("c.wav", 0)],
        60,
        3,
    );

    sleep(Duration::from_millis(30)).await;
    swipe_left(&h.handle); // next -> a.wav (slow)
    sleep(Duration::from_millis(10)).await;
    swipe_left(&h.handle); // next -> b.wav (fast, newer token)

    // Let both responses land (a.wav's arrives last and must be discarded)
    sleep(Duration::from_millis(320)).await;

    // Saving archives the *current* sample: b.wav, never a.wav
    swipe_right(&h.handle);
    sleep(Duration::from_millis(50)).await;

    assert_eq!(h.source.archived(), vec!["b.wav"]);
    assert!(!h.sink.overlap_detected());

    finish(h).await;
}

// =============================================================================
// Bounded-loop playback
// =============================================================================

#[tokio::test]
async fn test_tap_starts_bounded_loop_that_stops_itself() {
    let h = start_session(&[("kick.wav", 0)], 50, 2);

    // Initial load is not auto-played
    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.sink.play_count(), 0);

    tap(&h.handle);

    // Two passes then stop; nothing further plays
    sleep(Duration::from_millis(250)).await;
    assert_eq!(h.sink.play_count(), 2);
    assert_eq!(h.sink.active_voices(), 0);

    sleep(Duration::from_millis(150)).await;
    assert_eq!(h.sink.play_count(), 2);

    finish(h).await;
}

#[tokio::test]
async fn test_tap_while_playing_toggles_off() {
    let h = start_session(&[("kick.wav", 0)], 100, 3);

    sleep(Duration::from_millis(50)).await;
    tap(&h.handle); // start
    sleep(Duration::from_millis(30)).await;
    tap(&h.handle); // toggle off mid-first-pass

    // No pass completion, no loop restart, no auto-stop effects
    sleep(Duration::from_millis(400)).await;
    assert_eq!(h.sink.play_count(), 1);
    assert_eq!(h.sink.active_voices(), 0);

    // A third tap restarts from the beginning
    tap(&h.handle);
    sleep(Duration::from_millis(30)).await;
    assert_eq!(h.sink.play_count(), 2);
    assert!(!h.sink.overlap_detected());

    finish(h).await;
}

// =============================================================================
// Save flow
// =============================================================================

#[tokio::test]
async fn test_save_archives_then_advances() {
    let h = start_session(&[("keep.wav", 0), ("next.wav", 0)], 40, 1);

    sleep(Duration::from_millis(50)).await;
    swipe_right(&h.handle);
    sleep(Duration::from_millis(100)).await;

    // Current sample archived, then the next one loaded and auto-played
    assert_eq!(h.source.archived(), vec!["keep.wav"]);
    assert!(h.sink.play_count() >= 1);

    finish(h).await;
}

#[tokio::test]
async fn test_failed_load_leaves_session_interactive() {
    // Script has one sample; the next swipe exhausts it and the load fails
    let h = start_session(&[("only.wav", 0)], 40, 1);

    sleep(Duration::from_millis(50)).await;
    swipe_left(&h.handle); // load fails: script exhausted
    sleep(Duration::from_millis(50)).await;

    // The previously loaded sample is still current and still playable
    tap(&h.handle);
    sleep(Duration::from_millis(30)).await;
    assert_eq!(h.sink.play_count(), 1);

    finish(h).await;
}
