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
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::playback::{AssetSource, FileAssets, Sequencer, StemBank};
use crate::runner::Runner;
use crate::{audio, ui};

mod error;
mod scenario;
mod session;

/// Parses a scenario from a YAML file.
pub fn parse_scenario(file: &Path) -> Result<Arc<crate::scenario::Scenario>, Box<dyn Error>> {
    let parsed = match scenario::Scenario::deserialize(file) {
        Ok(parsed) => parsed,
        Err(e) => return Err(format!("error parsing file {}: {}", file.display(), e).into()),
    };
    Ok(Arc::new(parsed.to_scenario()?))
}

/// Recurse into the given path and return all valid scenarios found.
pub fn get_all_scenarios(path: &PathBuf) -> Result<Arc<crate::scenario::Scenarios>, Box<dyn Error>> {
    let mut scenarios: HashMap<String, Arc<crate::scenario::Scenario>> = HashMap::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            get_all_scenarios(&path)?.sorted_list().iter().for_each(|scenario| {
                scenarios.insert(scenario.name().to_string(), scenario.clone());
            });
        }

        let extension = path.extension();
        if extension.is_some_and(|ext| ext == "yaml" || ext == "yml") {
            match parse_scenario(&path) {
                Ok(scenario) => {
                    scenarios.insert(scenario.name().to_string(), scenario);
                }
                Err(e) => error!(err = e.as_ref(), "Error while parsing files"),
            }
        }
    }

    Ok(Arc::new(crate::scenario::Scenarios::new(scenarios)))
}

/// Initializes the runner and controller from the given session config and returns the
/// controller. The controller owns the runner, which can be waited on until the session
/// ends. If a condition override is given it takes precedence over the configured
/// assignment policy.
pub async fn init_session(
    session_path: &PathBuf,
    condition_override: Option<String>,
) -> Result<crate::controller::Controller, Box<dyn Error>> {
    let session = session::Session::deserialize(session_path)?;
    let device = audio::get_device(&session.audio_device)?;
    let scenarios = get_all_scenarios(&PathBuf::from(&session.scenarios))?;

    let condition = match condition_override {
        Some(condition) => condition,
        None => session.condition.select()?,
    };
    let scenario = scenarios.get(&condition)?;
    info!(condition = condition, "Condition assigned.");

    let surface = Arc::new(ui::console::Surface::new()) as Arc<dyn ui::Surface>;
    let assets =
        Arc::new(FileAssets::new(Path::new(&session.assets))) as Arc<dyn AssetSource>;
    let stems = Arc::new(StemBank::new(
        session.graded_stems.clone(),
        Arc::clone(&assets),
    ));

    // Pre-decode the stems before the session can begin so the graded steps
    // never wait on I/O.
    if scenario.uses_graded() {
        surface.set_message("Loading audio...");
        stems.load_all().await?;
        surface.set_message("Ready.");
    }

    let sequencer = Arc::new(Sequencer::new(
        device,
        assets,
        stems,
        Arc::clone(&surface),
    ));
    let runner = Arc::new(Runner::new(scenario, sequencer, surface));
    let controller = crate::controller::Controller::new(runner, session.controller.driver())?;
    Ok(controller)
}
