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
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use parking_lot::Mutex;
use tracing::{info, span, Level};

use crate::audio::{Clip, GradedSession};
use crate::playback::PlaybackError;

/// A mock device. Doesn't actually play anything, but records what it was
/// asked to do so tests can assert on it.
#[derive(Clone)]
pub struct Device {
    name: String,
    is_playing: Arc<AtomicBool>,
    played: Arc<Mutex<Vec<String>>>,
    fail_playback: Arc<Mutex<HashSet<String>>>,
    sessions_started: Arc<AtomicUsize>,
    ticks: Arc<Mutex<Vec<Vec<f32>>>>,
    final_gains: Arc<Mutex<Option<Vec<f32>>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            is_playing: Arc::new(AtomicBool::new(false)),
            played: Arc::new(Mutex::new(Vec::new())),
            fail_playback: Arc::new(Mutex::new(HashSet::new())),
            sessions_started: Arc::new(AtomicUsize::new(0)),
            ticks: Arc::new(Mutex::new(Vec::new())),
            final_gains: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns true if the device is currently playing.
    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Relaxed)
    }

    /// The clip ids played to completion so far.
    #[cfg(test)]
    pub fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }

    /// Makes playback of the given clip id fail.
    #[cfg(test)]
    pub fn fail_playback_of(&self, id: &str) {
        self.fail_playback.lock().insert(id.to_string());
    }

    /// The number of graded sessions started on this device.
    #[cfg(test)]
    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::Relaxed)
    }

    /// The gain snapshot taken at each graded tick of the latest session.
    #[cfg(test)]
    pub fn ticks(&self) -> Vec<Vec<f32>> {
        self.ticks.lock().clone()
    }

    /// The gain values after the latest session finished, if it finished.
    #[cfg(test)]
    pub fn final_gains(&self) -> Option<Vec<f32>> {
        self.final_gains.lock().clone()
    }
}

impl crate::audio::Device for Device {
    /// Sleeps for the clip duration instead of playing it.
    fn play_clip(&self, clip: &Clip) -> Result<(), PlaybackError> {
        let span = span!(Level::INFO, "play clip (mock)");
        let _enter = span.enter();

        if self.fail_playback.lock().contains(clip.id()) {
            return Err(PlaybackError::Playback {
                id: clip.id().to_string(),
                reason: "mock playback failure".to_string(),
            });
        }

        info!(
            device = self.name,
            clip = clip.id(),
            duration_ms = clip.duration().as_millis(),
            "Playing clip."
        );

        self.is_playing.store(true, Ordering::Relaxed);
        thread::sleep(clip.duration());
        self.is_playing.store(false, Ordering::Relaxed);
        self.played.lock().push(clip.id().to_string());

        Ok(())
    }

    fn begin_graded(&self, stems: &[Clip]) -> Result<Box<dyn GradedSession>, PlaybackError> {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        self.ticks.lock().clear();
        *self.final_gains.lock() = None;

        Ok(Box::new(Session {
            gains: vec![0.0; stems.len()],
            ticks: Arc::clone(&self.ticks),
            final_gains: Arc::clone(&self.final_gains),
        }))
    }
}

/// A mock graded session recording every gain transition.
struct Session {
    gains: Vec<f32>,
    ticks: Arc<Mutex<Vec<Vec<f32>>>>,
    final_gains: Arc<Mutex<Option<Vec<f32>>>>,
}

impl GradedSession for Session {
    fn open_only(&mut self, slot: Option<usize>) {
        self.gains.iter_mut().for_each(|gain| *gain = 0.0);
        if let Some(slot) = slot {
            if let Some(gain) = self.gains.get_mut(slot) {
                *gain = 1.0;
            }
        }
        self.ticks.lock().push(self.gains.clone());
    }

    fn finish(mut self: Box<Self>) {
        self.gains.iter_mut().for_each(|gain| *gain = 0.0);
        *self.final_gains.lock() = Some(self.gains.clone());
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
