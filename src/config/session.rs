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
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use config::{Config, File};
use rand::seq::SliceRandom;
use serde::Deserialize;

use super::error::ConfigError;

/// The configuration for an experimental session.
#[derive(Deserialize)]
pub(super) struct Session {
    /// The controller configuration.
    pub controller: Controller,
    /// The audio device to use.
    pub audio_device: String,
    /// The path to the scenario definitions.
    pub scenarios: String,
    /// The path audio resource identifiers are resolved against.
    pub assets: String,
    /// The stems for the graded crossfade, in slot order.
    #[serde(default)]
    pub graded_stems: Vec<String>,
    /// How the condition for this session is chosen.
    pub condition: Condition,
}

impl Session {
    /// Deserializes a file from the path into a session configuration struct.
    pub fn deserialize(path: &Path) -> Result<Session, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Session>()?)
    }
}

/// Allows users to specify various controllers.
#[derive(Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(super) enum Controller {
    Keyboard,
}

impl Controller {
    /// Creates a controller driver from the config.
    pub fn driver(&self) -> Arc<dyn crate::controller::Driver> {
        match self {
            Controller::Keyboard => Arc::new(crate::controller::keyboard::Driver::new()),
        }
    }
}

/// How the condition for a session is chosen.
#[derive(Deserialize, Clone)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub(super) enum Condition {
    /// Always run the named condition.
    Fixed { name: String },
    /// Assign one of the listed conditions at random.
    Random { choices: Vec<String> },
}

impl Condition {
    /// Selects the condition name for this session.
    pub fn select(&self) -> Result<String, Box<dyn Error>> {
        match self {
            Condition::Fixed { name } => Ok(name.clone()),
            Condition::Random { choices } => choices
                .choose(&mut rand::thread_rng())
                .cloned()
                .ok_or_else(|| "random condition policy has no choices".into()),
        }
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use config::{Config, File, FileFormat};

    use super::{Condition, Session};

    #[test]
    fn test_parse_session() -> Result<(), Box<dyn Error>> {
        let session: Session = Config::builder()
            .add_source(File::from_str(
                r#"
controller:
  kind: keyboard
audio_device: mock-device
scenarios: assets/scenarios
assets: assets/audio
graded_stems:
  - stem_01.wav
  - stem_02.wav
condition:
  policy: fixed
  name: A1
"#,
                FileFormat::Yaml,
            ))
            .build()?
            .try_deserialize()?;

        assert_eq!(session.audio_device, "mock-device");
        assert_eq!(session.graded_stems.len(), 2);
        assert_eq!(session.condition.select()?, "A1");
        Ok(())
    }

    #[test]
    fn test_stems_default_to_empty() -> Result<(), Box<dyn Error>> {
        let session: Session = Config::builder()
            .add_source(File::from_str(
                r#"
controller:
  kind: keyboard
audio_device: mock-device
scenarios: assets/scenarios
assets: assets/audio
condition:
  policy: fixed
  name: A1
"#,
                FileFormat::Yaml,
            ))
            .build()?
            .try_deserialize()?;

        assert!(session.graded_stems.is_empty());
        Ok(())
    }

    #[test]
    fn test_random_condition() -> Result<(), Box<dyn Error>> {
        let condition = Condition::Random {
            choices: vec!["A1".to_string(), "A2".to_string()],
        };
        let selected = condition.select()?;
        assert!(selected == "A1" || selected == "A2");

        let empty = Condition::Random { choices: vec![] };
        assert!(empty.select().is_err());
        Ok(())
    }
}
