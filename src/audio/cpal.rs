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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Sender};
use tracing::{error, info, span, Level};

use crate::audio::{Clip, GradedSession};
use crate::playback::PlaybackError;

/// How long to let a stream drain after the last clip frame was handed to
/// the callback.
const DRAIN_TIME: Duration = Duration::from_millis(100);

fn playback_error(id: &str, reason: impl ToString) -> PlaybackError {
    PlaybackError::Playback {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// A small wrapper around a cpal::Device.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
}

impl Device {
    /// Gets the output device with the given name from the default host.
    pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
        let host = cpal::default_host();
        for device in host.output_devices()? {
            if device.name()? == name {
                return Ok(Device {
                    name: name.to_string(),
                    host_id: host.id(),
                    device,
                });
            }
        }

        Err(format!("no audio output device found with name {}", name).into())
    }

    /// Lists the output devices on the default host.
    pub fn list() -> Result<Vec<Box<dyn crate::audio::Device>>, Box<dyn Error>> {
        let host = cpal::default_host();
        let mut devices: Vec<Box<dyn crate::audio::Device>> = Vec::new();
        for device in host.output_devices()? {
            devices.push(Box::new(Device {
                name: device.name()?,
                host_id: host.id(),
                device,
            }));
        }

        Ok(devices)
    }
}

impl crate::audio::Device for Device {
    fn play_clip(&self, clip: &Clip) -> Result<(), PlaybackError> {
        let span = span!(Level::INFO, "play clip (cpal)");
        let _enter = span.enter();

        let id = clip.id().to_string();
        info!(
            device = self.name,
            clip = id,
            duration_ms = clip.duration().as_millis(),
            "Playing clip."
        );

        let supported = self
            .device
            .default_output_config()
            .map_err(|e| playback_error(&id, e))?;
        let out_channels = supported.channels() as usize;
        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: cpal::SampleRate(clip.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };

        let clip = clip.clone();
        let clip_channels = clip.channels().max(1) as usize;
        let total_frames = clip.data().len() / clip_channels;
        let mut frame_pos = 0usize;

        // The callback signals once when the clip runs out of frames; the
        // error callback signals too so a dead stream cannot hang us.
        let (done_tx, done_rx) = bounded::<()>(1);
        let error_done_tx = done_tx.clone();
        let stream = self
            .device
            .build_output_stream(
                &stream_config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in out.chunks_mut(out_channels) {
                        if frame_pos >= total_frames {
                            frame.fill(0.0);
                            let _ = done_tx.try_send(());
                            continue;
                        }
                        let data = clip.data();
                        for (ch, sample) in frame.iter_mut().enumerate() {
                            let src_ch = ch.min(clip_channels - 1);
                            *sample = data[frame_pos * clip_channels + src_ch];
                        }
                        frame_pos += 1;
                    }
                },
                move |err| {
                    error!(err = %err, "cpal stream error");
                    let _ = error_done_tx.try_send(());
                },
                None,
            )
            .map_err(|e| playback_error(&id, e))?;
        stream.play().map_err(|e| playback_error(&id, e))?;

        let _ = done_rx.recv();
        thread::sleep(DRAIN_TIME);
        drop(stream);

        Ok(())
    }

    fn begin_graded(&self, stems: &[Clip]) -> Result<Box<dyn GradedSession>, PlaybackError> {
        let span = span!(Level::INFO, "graded session (cpal)");
        let _enter = span.enter();

        info!(device = self.name, stems = stems.len(), "Starting graded session.");

        let gains: Arc<Vec<AtomicU32>> = Arc::new(
            (0..stems.len())
                .map(|_| AtomicU32::new(0.0f32.to_bits()))
                .collect(),
        );

        // The stream is not Send, so it lives on a dedicated thread and is
        // held there until the session finishes.
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);
        let device = self.device.clone();
        let stems: Vec<Clip> = stems.to_vec();
        let callback_gains = Arc::clone(&gains);
        thread::spawn(move || {
            let supported = match device.default_output_config() {
                Ok(supported) => supported,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            let out_channels = supported.channels() as usize;
            let sample_rate = stems
                .first()
                .map(|stem| stem.sample_rate())
                .unwrap_or_else(|| supported.sample_rate().0);
            let stream_config = cpal::StreamConfig {
                channels: supported.channels(),
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            // One shared frame clock across every stem keeps them in
            // lockstep; the gain stages decide which one is audible.
            let mut frame_pos = 0usize;
            let build_result = device.build_output_stream(
                &stream_config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in out.chunks_mut(out_channels) {
                        frame.fill(0.0);
                        for (slot, stem) in stems.iter().enumerate() {
                            let gain =
                                f32::from_bits(callback_gains[slot].load(Ordering::Relaxed));
                            if gain == 0.0 {
                                continue;
                            }
                            let stem_channels = stem.channels().max(1) as usize;
                            let data = stem.data();
                            if frame_pos >= data.len() / stem_channels {
                                continue;
                            }
                            for (ch, sample) in frame.iter_mut().enumerate() {
                                let src_ch = ch.min(stem_channels - 1);
                                *sample += gain * data[frame_pos * stem_channels + src_ch];
                            }
                        }
                        frame_pos += 1;
                    }
                },
                |err| error!(err = %err, "cpal stream error"),
                None,
            );
            let stream = match build_result {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            let _ = stop_rx.recv();
            drop(stream);
        });

        ready_rx
            .recv()
            .map_err(|e| playback_error("graded stems", e))?
            .map_err(|reason| playback_error("graded stems", reason))?;

        Ok(Box::new(Session { gains, stop_tx }))
    }
}

/// A live graded session on a cpal stream.
struct Session {
    gains: Arc<Vec<AtomicU32>>,
    stop_tx: Sender<()>,
}

impl Session {
    fn close_all(&self) {
        for gain in self.gains.iter() {
            gain.store(0.0f32.to_bits(), Ordering::Relaxed);
        }
    }
}

impl GradedSession for Session {
    fn open_only(&mut self, slot: Option<usize>) {
        self.close_all();
        if let Some(slot) = slot {
            if let Some(gain) = self.gains.get(slot) {
                gain.store(1.0f32.to_bits(), Ordering::Relaxed);
            }
        }
    }

    fn finish(self: Box<Self>) {
        self.close_all();
        let _ = self.stop_tx.try_send(());
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.host_id.name())
    }
}
