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
use std::{error::Error, fmt, sync::Arc, time::Duration};

use crate::playback::PlaybackError;

pub mod cpal;
pub mod decode;
pub mod mock;

/// A fully decoded audio resource held in memory. Interleaved f32 samples,
/// shared cheaply between playback invocations.
#[derive(Clone)]
pub struct Clip {
    /// The resource identifier this clip was decoded from.
    id: String,
    /// Interleaved sample data.
    data: Arc<Vec<f32>>,
    /// Number of interleaved channels.
    channels: u16,
    /// Sample rate of the decoded data.
    sample_rate: u32,
}

impl Clip {
    /// Creates a new clip from decoded sample data.
    pub fn new(id: &str, data: Vec<f32>, channels: u16, sample_rate: u32) -> Clip {
        Clip {
            id: id.to_string(),
            data: Arc::new(data),
            channels,
            sample_rate,
        }
    }

    /// The resource identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The interleaved sample data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// The sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The playback duration of the clip.
    pub fn duration(&self) -> Duration {
        let frames = self.data.len() / self.channels.max(1) as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate.max(1) as f64)
    }

    /// The memory size of the decoded data in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// A playback device. Single clips play blocking to their natural end;
/// graded playback hands back a session whose gain stages the caller drives.
pub trait Device: fmt::Display + Send + Sync {
    /// Plays a decoded clip through the device, blocking until playback
    /// reaches the natural end of the clip.
    fn play_clip(&self, clip: &Clip) -> Result<(), PlaybackError>;

    /// Starts all stems simultaneously on one shared clock, each behind its
    /// own gain stage, with every gain stage closed. The returned session
    /// stays live until finished.
    fn begin_graded(&self, stems: &[Clip]) -> Result<Box<dyn GradedSession>, PlaybackError>;
}

/// One graded playback invocation: N lockstep sources and their gain stages.
pub trait GradedSession: Send {
    /// Closes every gain stage, then opens only the addressed slot. None
    /// leaves all stages closed (a silent tick).
    fn open_only(&mut self, slot: Option<usize>);

    /// Stops all sources and closes all gain stages.
    fn finish(self: Box<Self>);
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets a device with the given name. Names starting with "mock" resolve to
/// the mock device.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    }

    Ok(Arc::new(cpal::Device::get(name)?))
}
