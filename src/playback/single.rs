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

//! The single-clip strategy: fetch, decode, play to the natural end.

use tracing::error;

use super::Sequencer;
use crate::playsync::Completion;

impl Sequencer {
    /// Plays the named resource to completion. The completion token fires
    /// exactly once — on failure too, so one bad asset cannot leave the
    /// whole session stuck on an agent step.
    pub(super) async fn play_once(&self, id: &str, completion: Completion) {
        let device = self.device.clone();
        let assets = self.assets.clone();
        let id = id.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let clip = assets.fetch(&id)?;
            device.play_clip(&clip)
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(err = %e, "Error while playing clip");
                self.surface.set_message(&e.to_string());
            }
            Err(e) => {
                error!(err = %e, "Error waiting for playback to finish");
            }
        }

        completion.complete();
    }
}
