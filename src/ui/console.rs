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
use crate::ui::MicState;

/// A terminal display surface for running sessions without the browser
/// front end.
pub struct Surface {}

impl Surface {
    pub fn new() -> Surface {
        Surface {}
    }
}

impl Default for Surface {
    fn default() -> Self {
        Surface::new()
    }
}

impl crate::ui::Surface for Surface {
    fn set_message(&self, message: &str) {
        println!("  {}", message);
    }

    fn set_mic(&self, state: MicState) {
        match state {
            MicState::Hidden => {}
            MicState::Idle => println!("  [talk key: waiting]"),
            MicState::Recording => println!("  [talk key: recording]"),
        }
    }

    fn set_indicator(&self, visible: bool) {
        if visible {
            println!("  [recording]");
        }
    }
}
