//! Mock audio sink
//!
//! Plays nothing; completion is simulated on the tokio clock. Used by the
//! test suites and by headless runs where no output device exists. Tracks
//! enough bookkeeping to assert the engine's voice-exclusivity invariant.

use super::{AudioClip, AudioSink, EndCallback, Voice};
use crate::error::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Audio sink that simulates playback with timers
#[derive(Debug, Default)]
pub struct MockSink {
    /// Overrides the clip's natural duration when set (shortens tests)
    pass_duration: Option<Duration>,
    play_count: Arc<AtomicUsize>,
    active_voices: Arc<AtomicUsize>,
    overlap_detected: Arc<AtomicBool>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate every pass taking the given duration regardless of the clip.
    pub fn with_pass_duration(duration: Duration) -> Self {
        Self {
            pass_duration: Some(duration),
            ..Self::default()
        }
    }

    /// Total number of passes started
    pub fn play_count(&self) -> usize {
        self.play_count.load(Ordering::SeqCst)
    }

    /// Number of voices currently live
    pub fn active_voices(&self) -> usize {
        self.active_voices.load(Ordering::SeqCst)
    }

    /// True if a second voice was ever started while one was still live
    pub fn overlap_detected(&self) -> bool {
        self.overlap_detected.load(Ordering::SeqCst)
    }
}

impl AudioSink for MockSink {
    fn play(&self, clip: &AudioClip, on_end: EndCallback) -> Result<Box<dyn Voice>> {
        self.play_count.fetch_add(1, Ordering::SeqCst);
        if self.active_voices.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlap_detected.store(true, Ordering::SeqCst);
        }

        let duration = self.pass_duration.unwrap_or_else(|| clip.duration());
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_end();
        });

        Ok(Box::new(MockVoice {
            timer,
            active_voices: self.active_voices.clone(),
        }))
    }
}

struct MockVoice {
    timer: JoinHandle<()>,
    active_voices: Arc<AtomicUsize>,
}

impl Voice for MockVoice {}

impl Drop for MockVoice {
    fn drop(&mut self) {
        self.timer.abort();
        self.active_voices.fetch_sub(1, Ordering::SeqCst);
    }
}
