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

//! One-time loading of the graded crossfade stems. The stems are decoded
//! into memory up front so graded playback never touches the disk.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use super::{AssetSource, PlaybackError};
use crate::audio::Clip;

/// The fixed set of stems the graded strategy crossfades between. Loading
/// is idempotent: concurrent or repeated load_all calls fetch and decode
/// each stem exactly once.
pub struct StemBank {
    /// The resource identifiers of the stems, in slot order.
    ids: Vec<String>,
    /// The asset source used to fetch and decode the stems.
    assets: Arc<dyn AssetSource>,
    /// The decoded stems, populated by the first successful load.
    loaded: OnceCell<Arc<Vec<Clip>>>,
}

impl StemBank {
    /// Creates a new, unloaded stem bank.
    pub fn new(ids: Vec<String>, assets: Arc<dyn AssetSource>) -> StemBank {
        StemBank {
            ids,
            assets,
            loaded: OnceCell::new(),
        }
    }

    /// Loads every stem. A second call while a load is in flight waits on
    /// the first; a call after completion returns immediately. A failed
    /// load loads nothing and leaves the bank unloaded.
    pub async fn load_all(&self) -> Result<(), PlaybackError> {
        self.loaded
            .get_or_try_init(|| async {
                let ids = self.ids.clone();
                let assets = Arc::clone(&self.assets);
                let clips = tokio::task::spawn_blocking(move || {
                    ids.iter()
                        .map(|id| assets.fetch(id))
                        .collect::<Result<Vec<Clip>, PlaybackError>>()
                })
                .await
                .map_err(|e| PlaybackError::AssetLoad {
                    id: "graded stems".to_string(),
                    reason: e.to_string(),
                })??;

                info!(
                    stems = clips.len(),
                    memory_kb = clips.iter().map(Clip::memory_size).sum::<usize>() / 1024,
                    "Graded stems loaded."
                );
                Ok(Arc::new(clips))
            })
            .await
            .map(|_| ())
    }

    /// The decoded stems, or None if loading has not completed.
    pub fn clips(&self) -> Option<Arc<Vec<Clip>>> {
        self.loaded.get().cloned()
    }

    /// Whether the stems have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// The number of stems the bank will hold once loaded.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the bank holds no stems.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use super::StemBank;
    use crate::playback::testutil::StubAssets;
    use crate::playback::AssetSource;

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("stem_{:02}.wav", i)).collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_all() {
        let assets = Arc::new(StubAssets::new());
        let bank = StemBank::new(ids(3), Arc::clone(&assets) as Arc<dyn AssetSource>);

        assert!(!bank.is_loaded());
        assert!(bank.clips().is_none());

        bank.load_all().await.expect("load should succeed");
        assert!(bank.is_loaded());
        assert_eq!(bank.clips().expect("clips").len(), 3);
        assert_eq!(assets.fetch_count(), 3);

        // A repeated load is a no-op.
        bank.load_all().await.expect("load should succeed");
        assert_eq!(assets.fetch_count(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_load_fetches_once() {
        let assets = Arc::new(StubAssets::with_delay(Duration::from_millis(20)));
        let bank = Arc::new(StemBank::new(ids(4), Arc::clone(&assets) as Arc<dyn AssetSource>));

        let (first, second) = tokio::join!(bank.load_all(), bank.load_all());
        first.expect("load should succeed");
        second.expect("load should succeed");

        // One fetch per stem, no matter how many callers raced.
        assert_eq!(assets.fetch_count(), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_load_loads_nothing() {
        let assets = Arc::new(StubAssets::new());
        assets.fail_id("stem_01.wav");
        let bank = StemBank::new(ids(3), Arc::clone(&assets) as Arc<dyn AssetSource>);

        assert!(bank.load_all().await.is_err());
        assert!(!bank.is_loaded());
        assert!(bank.clips().is_none());
    }
}
