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
pub mod console;
pub mod mock;

/// The state of the talk affordance shown to the participant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MicState {
    /// Not shown (agent or terminal step).
    Hidden,
    /// Shown, waiting for the participant to hold the talk key.
    Idle,
    /// Shown in its active-recording state.
    Recording,
}

/// The display the participant sees. The runner only issues side-effecting
/// requests; it never reads UI state back.
pub trait Surface: Send + Sync {
    /// Replaces the displayed message.
    fn set_message(&self, message: &str);

    /// Sets the talk affordance state.
    fn set_mic(&self, state: MicState);

    /// Shows or hides the recording indicator.
    fn set_indicator(&self, visible: bool);
}
