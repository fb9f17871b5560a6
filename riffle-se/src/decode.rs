//! Audio decoding using symphonia
//!
//! Decodes a fetched sample (a complete byte buffer, not a stream) into an
//! interleaved stereo f32 clip. Mono input is duplicated to stereo and
//! multi-channel input is downmixed.

use crate::audio::AudioClip;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::sync::Arc;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode a complete audio file held in memory.
///
/// `extension` is a probe hint taken from the sample's display name.
pub fn decode_clip(bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioClip> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("unrecognized format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {e}")))?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(44100);
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::Decode(format!("packet read failed: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| Error::Decode(format!("decode failed: {e}")))?;

        sample_rate = decoded.spec().rate;
        append_stereo(&decoded, &mut samples);
    }

    if samples.is_empty() {
        return Err(Error::Decode("no audio frames decoded".to_string()));
    }

    Ok(AudioClip {
        samples: Arc::new(samples),
        sample_rate,
    })
}

/// Append one decoded buffer as interleaved stereo f32.
fn append_stereo(buffer: &AudioBufferRef, out: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::F32(buf) => {
            append_converted(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i]
            })
        }
        AudioBufferRef::S16(buf) => {
            append_converted(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / i16::MAX as f32
            })
        }
        AudioBufferRef::S32(buf) => {
            append_converted(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / i32::MAX as f32
            })
        }
        AudioBufferRef::U8(buf) => {
            append_converted(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                (buf.chan(ch)[i] as f32 - 128.0) / 128.0
            })
        }
        _ => {
            // Remaining bit depths do not occur in the library's wav files
            tracing::warn!("Skipping buffer with unsupported sample format");
        }
    }
}

/// Interleave `frames` frames into stereo, reading via `sample(channel, frame)`.
fn append_converted(
    channels: usize,
    frames: usize,
    out: &mut Vec<f32>,
    sample: impl Fn(usize, usize) -> f32,
) {
    out.reserve(frames * 2);

    match channels {
        0 => {}
        1 => {
            for i in 0..frames {
                let value = sample(0, i);
                out.push(value);
                out.push(value);
            }
        }
        2 => {
            for i in 0..frames {
                out.push(sample(0, i));
                out.push(sample(1, i));
            }
        }
        _ => {
            // Downmix: average even channels left, odd channels right
            let halves = (channels as f32 / 2.0).max(1.0);
            for i in 0..frames {
                let mut left = 0.0f32;
                let mut right = 0.0f32;
                for ch in 0..channels {
                    if ch % 2 == 0 {
                        left += sample(ch, i);
                    } else {
                        right += sample(ch, i);
                    }
                }
                out.push(left / halves);
                out.push(right / halves);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                for _ in 0..channels {
                    let value = ((i % 100) as i16 - 50) * 100;
                    writer.write_sample(value).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_stereo_wav() {
        let bytes = wav_bytes(2, 44100, 441);
        let clip = decode_clip(bytes, Some("wav")).unwrap();

        assert_eq!(clip.sample_rate, 44100);
        assert_eq!(clip.samples.len(), 441 * 2);
    }

    #[test]
    fn test_decode_mono_duplicates_to_stereo() {
        let bytes = wav_bytes(1, 22050, 100);
        let clip = decode_clip(bytes, Some("wav")).unwrap();

        assert_eq!(clip.sample_rate, 22050);
        assert_eq!(clip.samples.len(), 200);
        // Each frame's left and right are identical
        for frame in clip.samples.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_clip(vec![0u8; 64], Some("wav"));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_samples_in_range() {
        let bytes = wav_bytes(2, 44100, 441);
        let clip = decode_clip(bytes, Some("wav")).unwrap();

        assert!(clip.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
}
