//! Audio output using cpal
//!
//! cpal streams are not `Send`, so a dedicated audio thread owns the device
//! and the active stream; the engine talks to it over a channel. One `Play`
//! command replaces whatever was playing before, and a dropped voice handle
//! stops its own playback without touching a newer voice.

use super::{AudioClip, AudioSink, EndCallback, Voice};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

enum Msg {
    Play {
        voice_id: u64,
        clip: AudioClip,
        on_end: EndCallback,
    },
    Stop {
        voice_id: u64,
    },
    Ended {
        voice_id: u64,
    },
    Shutdown,
}

/// Audio sink backed by the system output device
pub struct CpalSink {
    tx: Sender<Msg>,
    next_voice_id: AtomicU64,
}

impl CpalSink {
    /// Open the default output device and start the audio thread.
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Msg>();
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<String, String>>();

        let thread_tx = tx.clone();
        std::thread::Builder::new()
            .name("riffle-audio".to_string())
            .spawn(move || audio_thread(rx, thread_tx, ready_tx))
            .map_err(|e| Error::Audio(format!("Failed to spawn audio thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(device_name)) => {
                info!("Audio output ready on device: {}", device_name);
                Ok(Self {
                    tx,
                    next_voice_id: AtomicU64::new(1),
                })
            }
            Ok(Err(message)) => Err(Error::Audio(message)),
            Err(_) => Err(Error::Audio("Audio thread exited during startup".to_string())),
        }
    }
}

impl AudioSink for CpalSink {
    fn play(&self, clip: &AudioClip, on_end: EndCallback) -> Result<Box<dyn Voice>> {
        let voice_id = self.next_voice_id.fetch_add(1, Ordering::SeqCst);

        self.tx
            .send(Msg::Play {
                voice_id,
                clip: clip.clone(),
                on_end,
            })
            .map_err(|_| Error::Audio("Audio thread is gone".to_string()))?;

        Ok(Box::new(CpalVoice {
            voice_id,
            tx: self.tx.clone(),
        }))
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
    }
}

struct CpalVoice {
    voice_id: u64,
    tx: Sender<Msg>,
}

impl Voice for CpalVoice {}

impl Drop for CpalVoice {
    fn drop(&mut self) {
        // Audio thread gone means nothing is playing anyway
        let _ = self.tx.send(Msg::Stop {
            voice_id: self.voice_id,
        });
    }
}

/// Audio thread: owns the device and at most one live stream.
fn audio_thread(
    rx: mpsc::Receiver<Msg>,
    tx: Sender<Msg>,
    ready_tx: Sender<std::result::Result<String, String>>,
) {
    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err("No default output device found".to_string()));
            return;
        }
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    let _ = ready_tx.send(Ok(device_name));

    // (id, stream, callback to fire if the pass completes naturally)
    let mut current: Option<(u64, Stream, Option<EndCallback>)> = None;

    while let Ok(msg) = rx.recv() {
        match msg {
            Msg::Play {
                voice_id,
                clip,
                on_end,
            } => {
                // Stop-before-start: the old stream is dropped before the
                // new one exists, so output never overlaps.
                current = None;

                match build_stream(&device, &clip, voice_id, tx.clone()) {
                    Ok(stream) => {
                        if let Err(e) = stream.play() {
                            error!("Failed to start audio stream: {}", e);
                            continue;
                        }
                        current = Some((voice_id, stream, Some(on_end)));
                    }
                    Err(e) => {
                        // Playback simply does not start; the engine's
                        // auto-stop backstop unwinds the session state.
                        error!("Failed to open audio stream: {}", e);
                    }
                }
            }
            Msg::Stop { voice_id } => {
                if current.as_ref().map(|(id, _, _)| *id) == Some(voice_id) {
                    current = None;
                }
            }
            Msg::Ended { voice_id } => {
                if let Some((id, _, on_end)) = current.as_mut() {
                    if *id == voice_id {
                        if let Some(on_end) = on_end.take() {
                            on_end();
                        }
                    }
                }
            }
            // The thread owns a sender clone for stream callbacks, so the
            // channel never closes on its own
            Msg::Shutdown => break,
        }
    }

    debug!("Audio thread shutting down");
}

/// Build an output stream that plays one pass of the clip.
fn build_stream(
    device: &Device,
    clip: &AudioClip,
    voice_id: u64,
    tx: Sender<Msg>,
) -> std::result::Result<Stream, String> {
    let config = pick_config(device, clip.sample_rate)?;

    if config.sample_rate.0 != clip.sample_rate {
        warn!(
            "Device rate {} != clip rate {}; playing without resampling",
            config.sample_rate.0, clip.sample_rate
        );
    }

    let samples = clip.samples.clone();
    let channels = config.channels as usize;
    let position = Arc::new(AtomicUsize::new(0));
    let ended = Arc::new(AtomicBool::new(false));

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _| {
                let mut pos = position.load(Ordering::Relaxed);

                for frame in data.chunks_mut(channels) {
                    let (left, right) = if pos + 1 < samples.len() {
                        let pair = (samples[pos], samples[pos + 1]);
                        pos += 2;
                        pair
                    } else {
                        (0.0, 0.0)
                    };

                    for (index, out) in frame.iter_mut().enumerate() {
                        *out = if index % 2 == 0 { left } else { right };
                    }
                }

                position.store(pos, Ordering::Relaxed);

                if pos + 1 >= samples.len() && !ended.swap(true, Ordering::Relaxed) {
                    let _ = tx.send(Msg::Ended { voice_id });
                }
            },
            move |e| {
                error!("Audio stream error: {}", e);
            },
            None,
        )
        .map_err(|e| format!("build_output_stream failed: {e}"))?;

    Ok(stream)
}

/// Prefer a stereo f32 config at the clip's sample rate, falling back to the
/// device default.
fn pick_config(device: &Device, sample_rate: u32) -> std::result::Result<StreamConfig, String> {
    let mut supported = device
        .supported_output_configs()
        .map_err(|e| format!("Failed to get device configs: {e}"))?;

    let preferred = supported.find(|config| {
        config.channels() == 2
            && config.min_sample_rate().0 <= sample_rate
            && config.max_sample_rate().0 >= sample_rate
            && config.sample_format() == SampleFormat::F32
    });

    if let Some(config) = preferred {
        return Ok(config.with_sample_rate(cpal::SampleRate(sample_rate)).config());
    }

    let default = device
        .default_output_config()
        .map_err(|e| format!("Failed to get default config: {e}"))?;

    if default.sample_format() != SampleFormat::F32 {
        return Err(format!(
            "Unsupported sample format: {:?}",
            default.sample_format()
        ));
    }

    Ok(default.config())
}
