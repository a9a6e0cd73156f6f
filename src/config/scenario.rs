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
use std::time::Duration;

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use crate::scenario::{Directive, GradedSpec};

/// A YAML representation of a scenario.
#[derive(Deserialize)]
pub(super) struct Scenario {
    /// The condition name.
    name: String,
    /// The steps of the scenario, in order.
    steps: Vec<Step>,
}

/// A YAML representation of a scenario step.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(super) enum Step {
    Agent(AgentStep),
    User(UserStep),
    End(EndStep),
}

/// An agent step. Exactly one of `clip` or `graded` must be set.
#[derive(Deserialize)]
pub(super) struct AgentStep {
    /// The message to show while the agent speaks.
    message: String,
    /// A single audio resource to play to its end.
    clip: Option<String>,
    /// A graded crossfade across the pre-loaded stems.
    graded: Option<Graded>,
}

/// A user turn step.
#[derive(Deserialize)]
pub(super) struct UserStep {
    /// The prompt shown to the participant.
    message: String,
}

/// The end step.
#[derive(Deserialize)]
pub(super) struct EndStep {
    /// The closing message.
    message: String,
}

/// A graded crossfade configuration.
#[derive(Deserialize)]
pub(super) struct Graded {
    /// The 1-based stem sequence.
    sequence: Vec<u32>,
    /// The hold interval per sequence entry, e.g. "250ms".
    interval: String,
}

impl Graded {
    /// Gets the interval as a duration.
    fn interval(&self) -> Result<Duration, duration_string::Error> {
        Ok(DurationString::from_string(self.interval.clone())?.into())
    }
}

impl Scenario {
    /// Deserializes a file from the path into a scenario configuration struct.
    pub fn deserialize(path: &Path) -> Result<Scenario, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Scenario>()?)
    }

    /// Converts this configuration into a validated scenario.
    pub fn to_scenario(self) -> Result<crate::scenario::Scenario, Box<dyn Error>> {
        let name = self.name;
        let steps = self
            .steps
            .into_iter()
            .map(|step| {
                Ok(match step {
                    Step::Agent(agent) => {
                        let directive = match (agent.clip, agent.graded) {
                            (Some(clip), None) => Directive::Clip(clip),
                            (None, Some(graded)) => Directive::Graded(GradedSpec::new(
                                graded.sequence.clone(),
                                graded.interval()?,
                            )),
                            _ => {
                                return Err(format!(
                                    "agent step in scenario {} must have exactly one of clip or graded",
                                    name,
                                )
                                .into())
                            }
                        };
                        crate::scenario::Step::Agent {
                            message: agent.message,
                            directive,
                        }
                    }
                    Step::User(user) => crate::scenario::Step::UserTurn {
                        message: user.message,
                    },
                    Step::End(end) => crate::scenario::Step::End {
                        message: end.message,
                    },
                })
            })
            .collect::<Result<Vec<crate::scenario::Step>, Box<dyn Error>>>()?;

        Ok(crate::scenario::Scenario::new(&name, steps)?)
    }
}
