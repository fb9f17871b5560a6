//! Audio output abstraction
//!
//! The session engine plays fully decoded clips through an [`AudioSink`].
//! Production uses the cpal-backed [`output::CpalSink`]; tests and headless
//! runs use [`mock::MockSink`], which advances on a virtual clock.
//!
//! A sink voice plays exactly one pass of the clip and reports completion
//! once; looping is the session's job (it restarts a fresh voice), which
//! keeps the at-most-one-voice invariant enforceable in one place.

pub mod mock;
pub mod output;

use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Decoded, playable audio clip: interleaved stereo f32 samples
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Interleaved stereo samples [L, R, L, R, ...]
    pub samples: Arc<Vec<f32>>,
    /// Sample rate of the decoded audio
    pub sample_rate: u32,
}

impl AudioClip {
    /// Natural duration of one pass
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as u64 / 2;
        Duration::from_nanos(frames.saturating_mul(1_000_000_000) / self.sample_rate as u64)
    }
}

/// Callback invoked exactly once when a voice finishes one complete pass.
///
/// Not invoked when the voice is stopped early.
pub type EndCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to one active playback voice.
///
/// Dropping the handle tears the underlying output down. The engine holds at
/// most one of these at a time.
pub trait Voice: Send {}

/// Playback output seam
pub trait AudioSink: Send + Sync {
    /// Start playing one pass of the clip from the beginning.
    ///
    /// `on_end` fires once if the pass completes naturally; a stopped voice
    /// never fires it.
    fn play(&self, clip: &AudioClip, on_end: EndCallback) -> Result<Box<dyn Voice>>;
}
