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

//! The audio sequencing half of the playback engine.
//!
//! Two strategies sit behind one contract — play asynchronously, fire the
//! completion token exactly once when done:
//! - single-clip playback to the clip's natural end, and
//! - a graded crossfade across pre-loaded stems.

mod graded;
mod loader;
mod single;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{span, Level, Span};

use crate::audio;
use crate::playsync::Completion;
use crate::scenario::Directive;
use crate::ui;

pub use loader::StemBank;

/// Typed playback errors.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// The named resource could not be fetched or decoded.
    #[error("cannot load resource {id}: {reason}")]
    AssetLoad { id: String, reason: String },

    /// A decoded resource failed to play.
    #[error("playback failed for {id}: {reason}")]
    Playback { id: String, reason: String },

    /// The graded strategy was invoked before the stems finished loading.
    #[error("graded stems are not loaded yet")]
    NotReady,
}

/// Resolves opaque resource identifiers to decoded clips.
pub trait AssetSource: Send + Sync {
    /// Fetches and decodes the named resource. Blocking.
    fn fetch(&self, id: &str) -> Result<audio::Clip, PlaybackError>;
}

/// The file-backed asset source: identifiers are paths relative to the
/// asset root directory.
pub struct FileAssets {
    root: PathBuf,
}

impl FileAssets {
    /// Creates a new file-backed asset source rooted at the given directory.
    pub fn new(root: &Path) -> FileAssets {
        FileAssets {
            root: root.to_path_buf(),
        }
    }
}

impl AssetSource for FileAssets {
    fn fetch(&self, id: &str) -> Result<audio::Clip, PlaybackError> {
        let path = if Path::new(id).is_absolute() {
            PathBuf::from(id)
        } else {
            self.root.join(id)
        };
        audio::decode::decode_file(id, &path)
    }
}

/// Dispatches playback directives to the matching strategy.
pub struct Sequencer {
    /// The device to play audio through.
    device: Arc<dyn audio::Device>,
    /// Resolves single-clip resource identifiers.
    assets: Arc<dyn AssetSource>,
    /// The pre-loaded stems for the graded strategy.
    stems: Arc<StemBank>,
    /// The display surface, used to surface load failures.
    surface: Arc<dyn ui::Surface>,
    /// The logging span.
    span: Span,
}

impl Sequencer {
    /// Creates a new sequencer.
    pub fn new(
        device: Arc<dyn audio::Device>,
        assets: Arc<dyn AssetSource>,
        stems: Arc<StemBank>,
        surface: Arc<dyn ui::Surface>,
    ) -> Sequencer {
        Sequencer {
            device,
            assets,
            stems,
            surface,
            span: span!(Level::INFO, "sequencer"),
        }
    }

    /// Plays the given directive, firing the completion token exactly once
    /// when playback is done. An error return means playback never started
    /// and the token was not consumed by a completion signal.
    pub async fn play(
        &self,
        directive: &Directive,
        completion: Completion,
    ) -> Result<(), PlaybackError> {
        let _enter = self.span.enter();

        match directive {
            Directive::Clip(id) => {
                self.play_once(id, completion).await;
                Ok(())
            }
            Directive::Graded(spec) => self.play_graded(spec, completion).await,
        }
    }
}
