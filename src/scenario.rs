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
use core::fmt;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

/// How an agent step produces audio.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// Play a single named audio resource to its natural end.
    Clip(String),
    /// Crossfade across the pre-loaded graded stems.
    Graded(GradedSpec),
}

/// A graded crossfade specification: which stem is audible at each tick, and
/// how long each tick lasts. Sequence entries are 1-based, matching how the
/// stems are numbered in the experiment material.
#[derive(Clone, Debug, PartialEq)]
pub struct GradedSpec {
    sequence: Vec<u32>,
    interval: Duration,
}

impl GradedSpec {
    /// Creates a new graded spec.
    pub fn new(sequence: Vec<u32>, interval: Duration) -> GradedSpec {
        GradedSpec { sequence, interval }
    }

    /// The 1-based stem sequence.
    pub fn sequence(&self) -> &[u32] {
        &self.sequence
    }

    /// The fixed hold interval per sequence entry.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Translates a 1-based sequence entry to a stem slot, given the number
    /// of loaded stems. Entries outside the stem range resolve to None,
    /// which plays as silence for that tick.
    pub fn slot(entry: u32, stem_count: usize) -> Option<usize> {
        (entry as usize).checked_sub(1).filter(|s| *s < stem_count)
    }
}

/// A single step of a scenario.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// The agent speaks: show the message and play the directive.
    Agent { message: String, directive: Directive },
    /// The participant speaks while holding the talk key.
    UserTurn { message: String },
    /// The terminal step of every scenario.
    End { message: String },
}

impl Step {
    /// The message displayed to the participant for this step.
    pub fn message(&self) -> &str {
        match self {
            Step::Agent { message, .. } => message,
            Step::UserTurn { message } => message,
            Step::End { message } => message,
        }
    }
}

/// Typed errors for scenario construction.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario {0} is malformed: {1}")]
    Malformed(String, String),
}

/// An immutable, validated script for one experimental session: an ordered
/// sequence of steps ending in exactly one End step.
pub struct Scenario {
    /// The condition name this scenario implements (e.g. A1, A2, A3).
    name: String,
    /// The ordered steps.
    steps: Vec<Step>,
}

impl Scenario {
    /// Creates a new scenario, rejecting malformed step sequences up front
    /// so the runner never has to deal with them.
    pub fn new(name: &str, steps: Vec<Step>) -> Result<Scenario, ScenarioError> {
        if steps.is_empty() {
            return Err(ScenarioError::Malformed(
                name.to_string(),
                "scenario has no steps".to_string(),
            ));
        }
        let end_count = steps
            .iter()
            .filter(|step| matches!(step, Step::End { .. }))
            .count();
        if end_count != 1 {
            return Err(ScenarioError::Malformed(
                name.to_string(),
                format!("expected exactly one end step, found {}", end_count),
            ));
        }
        if !matches!(steps.last(), Some(Step::End { .. })) {
            return Err(ScenarioError::Malformed(
                name.to_string(),
                "the end step must be the last step".to_string(),
            ));
        }

        Ok(Scenario {
            name: name.to_string(),
            steps,
        })
    }

    /// The condition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The step at the given position, if any.
    pub fn step(&self, position: usize) -> Option<&Step> {
        self.steps.get(position)
    }

    /// The number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the scenario uses the graded crossfade strategy anywhere.
    pub fn uses_graded(&self) -> bool {
        self.steps.iter().any(|step| {
            matches!(
                step,
                Step::Agent {
                    directive: Directive::Graded(_),
                    ..
                }
            )
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} steps)", self.name, self.steps.len())
    }
}

/// The scenario registry, keyed by condition name.
pub struct Scenarios {
    scenarios: HashMap<String, Arc<Scenario>>,
}

impl Scenarios {
    /// Creates a new scenario registry.
    pub fn new(scenarios: HashMap<String, Arc<Scenario>>) -> Scenarios {
        Scenarios { scenarios }
    }

    /// Gets the scenario for the given condition name.
    pub fn get(&self, name: &str) -> Result<Arc<Scenario>, Box<dyn Error>> {
        match self.scenarios.get(name) {
            Some(scenario) => Ok(Arc::clone(scenario)),
            None => Err(format!("no scenario found for condition {}", name).into()),
        }
    }

    /// Returns the scenarios sorted by condition name for consistent output.
    pub fn sorted_list(&self) -> Vec<Arc<Scenario>> {
        let mut list: Vec<Arc<Scenario>> = self.scenarios.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// The number of scenarios in the registry.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Returns true if the registry holds no scenarios.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use super::{Directive, GradedSpec, Scenario, Scenarios, Step};

    fn agent(message: &str) -> Step {
        Step::Agent {
            message: message.to_string(),
            directive: Directive::Clip("line1.wav".to_string()),
        }
    }

    fn end() -> Step {
        Step::End {
            message: "done".to_string(),
        }
    }

    #[test]
    fn test_scenario_validation() {
        assert!(Scenario::new("ok", vec![agent("a"), end()]).is_ok());
        assert!(Scenario::new("empty", vec![]).is_err());
        assert!(Scenario::new("no-end", vec![agent("a")]).is_err());
        assert!(Scenario::new("end-not-last", vec![end(), agent("a")]).is_err());
        assert!(Scenario::new("two-ends", vec![agent("a"), end(), end()]).is_err());
    }

    #[test]
    fn test_slot_translation() {
        // 1-based entries map to 0-based slots.
        assert_eq!(GradedSpec::slot(1, 11), Some(0));
        assert_eq!(GradedSpec::slot(11, 11), Some(10));
        // Entries outside the stem range resolve to silence.
        assert_eq!(GradedSpec::slot(0, 11), None);
        assert_eq!(GradedSpec::slot(12, 11), None);
        assert_eq!(GradedSpec::slot(1, 0), None);
    }

    #[test]
    fn test_uses_graded() {
        let plain = Scenario::new("plain", vec![agent("a"), end()]).expect("valid scenario");
        assert!(!plain.uses_graded());

        let graded = Scenario::new(
            "graded",
            vec![
                Step::Agent {
                    message: "a".to_string(),
                    directive: Directive::Graded(GradedSpec::new(
                        vec![1, 2, 3],
                        Duration::from_millis(250),
                    )),
                },
                end(),
            ],
        )
        .expect("valid scenario");
        assert!(graded.uses_graded());
    }

    #[test]
    fn test_registry() {
        let mut map = HashMap::new();
        for name in ["A3", "A1", "A2"] {
            map.insert(
                name.to_string(),
                Arc::new(Scenario::new(name, vec![agent("a"), end()]).expect("valid scenario")),
            );
        }
        let scenarios = Scenarios::new(map);

        assert_eq!(scenarios.len(), 3);
        assert_eq!(scenarios.get("A2").expect("scenario").name(), "A2");
        assert!(scenarios.get("B9").is_err());

        let sorted: Vec<String> = scenarios
            .sorted_list()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(sorted, vec!["A1", "A2", "A3"]);
    }
}
