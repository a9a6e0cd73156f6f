// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Whole-file decoding of audio assets into memory. Stimulus audio is short,
//! so everything is decoded up front rather than streamed.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use crate::audio::Clip;
use crate::playback::PlaybackError;

fn load_error(id: &str, reason: impl ToString) -> PlaybackError {
    PlaybackError::AssetLoad {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// Decodes the file at the given path into a clip identified by the given
/// resource id. Supports WAV, MP3, and anything else symphonia can probe.
pub fn decode_file(id: &str, path: &Path) -> Result<Clip, PlaybackError> {
    let file = File::open(path)
        .map_err(|e| load_error(id, format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // A hint from the extension helps the probe pick the right demuxer.
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| load_error(id, e))?;

    let mut format_reader = probed.format;
    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| load_error(id, "no audio track found"))?;
    let track_id = track.id;
    let params = &track.codec_params;

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| load_error(id, "sample rate not specified"))?;
    let channels = params
        .channels
        .ok_or_else(|| load_error(id, "channel layout not specified"))?
        .count() as u16;

    let mut decoder = get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| load_error(id, e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(load_error(id, e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let buf = sample_buf.get_or_insert_with(|| {
                    SampleBuffer::new(decoded.capacity() as u64, *decoded.spec())
                });
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            // A decode error on one packet is recoverable per the
            // symphonia docs; skip the packet.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(id, err = e, "skipping undecodable packet");
            }
            Err(e) => return Err(load_error(id, e)),
        }
    }

    if samples.is_empty() {
        return Err(load_error(id, "file contains no audio"));
    }

    let clip = Clip::new(id, samples, channels, sample_rate);
    debug!(
        id,
        channels,
        sample_rate,
        duration_ms = clip.duration().as_millis(),
        memory_kb = clip.memory_size() / 1024,
        "Decoded asset"
    );
    Ok(clip)
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::decode_file;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for i in 0..frames {
            let value = ((i % 100) as f32 / 100.0 * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(value).expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn test_decode_wav() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, 8000, 800);

        let clip = decode_file("tone.wav", &path).expect("decode should succeed");
        assert_eq!(clip.id(), "tone.wav");
        assert_eq!(clip.channels(), 2);
        assert_eq!(clip.sample_rate(), 8000);
        assert_eq!(clip.data().len(), 1600);
        assert_eq!(clip.duration().as_millis(), 100);
    }

    #[test]
    fn test_decode_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = decode_file("missing.wav", &dir.path().join("missing.wav"));
        assert!(matches!(
            result,
            Err(crate::playback::PlaybackError::AssetLoad { .. })
        ));
    }
}
