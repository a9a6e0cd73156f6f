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

//! The graded crossfade strategy: all stems play in lockstep from one shared
//! start, and a serial tick loop opens exactly one gain stage at a time.
//! Time-division switching between discrete recorded variants stands in for
//! actual synthesis of a gradually changing utterance.

use tracing::{debug, info};

use super::{PlaybackError, Sequencer};
use crate::playsync::Completion;
use crate::scenario::GradedSpec;

impl Sequencer {
    /// Plays a graded crossfade. Requires the stem bank to be loaded;
    /// invoking earlier is an error and creates no sources or gain stages.
    pub(super) async fn play_graded(
        &self,
        spec: &GradedSpec,
        completion: Completion,
    ) -> Result<(), PlaybackError> {
        let stems = self.stems.clips().ok_or(PlaybackError::NotReady)?;
        let stem_count = stems.len();

        let mut session = {
            let device = self.device.clone();
            tokio::task::spawn_blocking(move || device.begin_graded(&stems))
                .await
                .map_err(|e| PlaybackError::Playback {
                    id: "graded stems".to_string(),
                    reason: e.to_string(),
                })??
        };

        info!(
            stems = stem_count,
            ticks = spec.sequence().len(),
            interval_ms = spec.interval().as_millis(),
            "Playing graded sequence."
        );

        // One outstanding timer at a time: open, hold, move on.
        for &entry in spec.sequence() {
            let slot = GradedSpec::slot(entry, stem_count);
            if slot.is_none() {
                debug!(entry, "sequence entry outside the stem range, silent tick");
            }
            session.open_only(slot);
            tokio::time::sleep(spec.interval()).await;
        }

        session.finish();
        completion.complete();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::audio;
    use crate::playback::testutil::StubAssets;
    use crate::playback::{AssetSource, PlaybackError, Sequencer, StemBank};
    use crate::playsync::completion;
    use crate::scenario::GradedSpec;
    use crate::ui;

    const STEM_COUNT: usize = 11;

    fn stem_ids() -> Vec<String> {
        (0..STEM_COUNT).map(|i| format!("stem_{:02}.wav", i)).collect()
    }

    async fn loaded_sequencer(device: &Arc<audio::mock::Device>) -> Sequencer {
        let assets = Arc::new(StubAssets::new()) as Arc<dyn AssetSource>;
        let bank = Arc::new(StemBank::new(stem_ids(), Arc::clone(&assets)));
        bank.load_all().await.expect("load should succeed");
        Sequencer::new(
            Arc::clone(device) as Arc<dyn audio::Device>,
            assets,
            bank,
            Arc::new(ui::mock::Surface::new()),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_one_stage_open_per_tick() {
        let device = Arc::new(audio::mock::Device::get("mock-device"));
        let sequencer = loaded_sequencer(&device).await;

        let sequence: Vec<u32> = (1..=STEM_COUNT as u32).rev().collect();
        let spec = GradedSpec::new(sequence.clone(), Duration::from_millis(10));

        let (token, completed) = completion();
        sequencer
            .play_graded(&spec, token)
            .await
            .expect("graded playback should succeed");
        assert!(completed.wait().await);

        let ticks = device.ticks();
        assert_eq!(ticks.len(), STEM_COUNT);
        for (tick, &entry) in ticks.iter().zip(sequence.iter()) {
            let open: Vec<usize> = tick
                .iter()
                .enumerate()
                .filter(|(_, gain)| **gain != 0.0)
                .map(|(slot, _)| slot)
                .collect();
            // Exactly one stage open, and it is the addressed one.
            assert_eq!(open, vec![entry as usize - 1]);
        }

        // After the final tick every stage is closed again.
        let final_gains = device.final_gains().expect("session should have finished");
        assert!(final_gains.iter().all(|gain| *gain == 0.0));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_out_of_range_entry_is_silent() {
        let device = Arc::new(audio::mock::Device::get("mock-device"));
        let sequencer = loaded_sequencer(&device).await;

        let spec = GradedSpec::new(vec![12, 0, 5], Duration::from_millis(5));
        let (token, completed) = completion();
        sequencer
            .play_graded(&spec, token)
            .await
            .expect("graded playback should succeed");
        assert!(completed.wait().await);

        let ticks = device.ticks();
        assert_eq!(ticks.len(), 3);
        // 12 and 0 are outside [1, 11]: silence, not a panic or a stale stage.
        assert!(ticks[0].iter().all(|gain| *gain == 0.0));
        assert!(ticks[1].iter().all(|gain| *gain == 0.0));
        assert_eq!(ticks[2][4], 1.0);
        assert_eq!(ticks[2].iter().filter(|gain| **gain != 0.0).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_not_ready_creates_no_session() {
        let device = Arc::new(audio::mock::Device::get("mock-device"));
        let assets = Arc::new(StubAssets::new()) as Arc<dyn AssetSource>;
        let bank = Arc::new(StemBank::new(stem_ids(), Arc::clone(&assets)));
        let sequencer = Sequencer::new(
            Arc::clone(&device) as Arc<dyn audio::Device>,
            assets,
            bank,
            Arc::new(ui::mock::Surface::new()),
        );

        let spec = GradedSpec::new(vec![1, 2, 3], Duration::from_millis(5));
        let (token, completed) = completion();
        let result = sequencer.play_graded(&spec, token).await;

        assert!(matches!(result, Err(PlaybackError::NotReady)));
        assert_eq!(device.sessions_started(), 0);
        // The token was returned unfired.
        assert!(!completed.wait().await);
    }
}
