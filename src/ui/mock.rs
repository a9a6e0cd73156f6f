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
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::ui::MicState;

/// A mock surface recording every request the runner makes of it.
#[derive(Clone)]
pub struct Surface {
    messages: Arc<Mutex<Vec<String>>>,
    mic: Arc<Mutex<MicState>>,
    indicator: Arc<AtomicBool>,
}

impl Surface {
    pub fn new() -> Surface {
        Surface {
            messages: Arc::new(Mutex::new(Vec::new())),
            mic: Arc::new(Mutex::new(MicState::Hidden)),
            indicator: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The most recently displayed message.
    #[cfg(test)]
    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    /// Every message displayed so far.
    #[cfg(test)]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// The current talk affordance state.
    #[cfg(test)]
    pub fn mic_state(&self) -> MicState {
        *self.mic.lock()
    }

    /// Whether the recording indicator is visible.
    #[cfg(test)]
    pub fn indicator_visible(&self) -> bool {
        self.indicator.load(Ordering::Relaxed)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Surface::new()
    }
}

impl crate::ui::Surface for Surface {
    fn set_message(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }

    fn set_mic(&self, state: MicState) {
        *self.mic.lock() = state;
    }

    fn set_indicator(&self, visible: bool) {
        self.indicator.store(visible, Ordering::Relaxed);
    }
}
