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
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, span, Level, Span};

use crate::{
    playback::Sequencer,
    playsync::completion,
    scenario::{Scenario, Step},
    ui::{self, MicState},
};

/// Appended to the user turn prompt so the participant knows how to speak.
const HOLD_INSTRUCTION: &str = " (hold Enter while speaking)";

/// Shown while the participant holds the talk key.
const RECORDING_MESSAGE: &str = "Recording... (release Enter to stop)";

/// The mutable run state. Everything the runner tracks between events lives
/// here, behind one lock, so each event handler sees a consistent snapshot.
struct RunnerState {
    /// The cursor into the scenario steps.
    position: usize,
    /// Set once the session begins.
    started: bool,
    /// Set when the end step is reached. No event moves the cursor after this.
    finished: bool,
    /// Whether the current step is waiting on the participant.
    is_user_turn: bool,
    /// Whether the participant is currently holding the talk key.
    is_recording: bool,
}

/// Steps through a scenario, dispatching each step to the sequencer or the
/// participant and advancing on completion signals.
pub struct Runner {
    /// The scenario to step through.
    scenario: Arc<Scenario>,
    /// Plays agent audio.
    sequencer: Arc<Sequencer>,
    /// The participant-facing display.
    surface: Arc<dyn ui::Surface>,
    /// The mutable run state.
    state: Mutex<RunnerState>,
    /// The logging span.
    span: Span,
}

impl Runner {
    /// Creates a new runner.
    pub fn new(
        scenario: Arc<Scenario>,
        sequencer: Arc<Sequencer>,
        surface: Arc<dyn ui::Surface>,
    ) -> Runner {
        Runner {
            scenario,
            sequencer,
            surface,
            state: Mutex::new(RunnerState {
                position: 0,
                started: false,
                finished: false,
                is_user_turn: false,
                is_recording: false,
            }),
            span: span!(Level::INFO, "runner"),
        }
    }

    /// Begins the session at the first step. Starting an already running
    /// session does nothing.
    pub fn start(self: &Arc<Self>) {
        let _enter = self.span.enter();

        {
            let mut state = self.state.lock();
            if state.started && !state.finished {
                info!(
                    scenario = self.scenario.name(),
                    "Session is already in progress."
                );
                return;
            }

            info!(scenario = self.scenario.name(), "Starting session.");
            state.position = 0;
            state.started = true;
            state.finished = false;
            state.is_user_turn = false;
            state.is_recording = false;
        }

        self.dispatch();
    }

    /// Moves the cursor to the next step and dispatches it. Does nothing
    /// before start or after the end step.
    fn advance(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if !state.started || state.finished {
                return;
            }
            state.position += 1;
        }

        self.dispatch();
    }

    /// Dispatches the step under the cursor.
    fn dispatch(self: &Arc<Self>) {
        let _enter = self.span.enter();

        let step = {
            let state = self.state.lock();
            match self.scenario.step(state.position) {
                Some(step) => step.clone(),
                None => return,
            }
        };

        info!(message = step.message(), "Dispatching step.");

        match step {
            Step::Agent { message, directive } => {
                {
                    let mut state = self.state.lock();
                    state.is_user_turn = false;
                    state.is_recording = false;
                }
                self.surface.set_message(&message);
                self.surface.set_mic(MicState::Hidden);
                self.surface.set_indicator(false);

                let runner = Arc::clone(self);
                tokio::spawn(async move {
                    let (token, completed) = completion();
                    if let Err(e) = runner.sequencer.play(&directive, token).await {
                        error!(err = e.to_string(), "Unable to play step audio.");
                        runner.surface.set_message(&e.to_string());
                        return;
                    }
                    if completed.wait().await {
                        runner.advance();
                    }
                });
            }
            Step::UserTurn { message } => {
                // Surface updates land before the turn flag flips so the
                // prompt is visible by the time the talk key is live.
                self.surface
                    .set_message(&format!("{}{}", message, HOLD_INSTRUCTION));
                self.surface.set_mic(MicState::Idle);
                self.surface.set_indicator(false);
                {
                    let mut state = self.state.lock();
                    state.is_user_turn = true;
                    state.is_recording = false;
                }
            }
            Step::End { message } => {
                self.surface.set_message(&message);
                self.surface.set_mic(MicState::Hidden);
                self.surface.set_indicator(false);
                {
                    let mut state = self.state.lock();
                    state.finished = true;
                    state.is_user_turn = false;
                    state.is_recording = false;
                }
                info!(scenario = self.scenario.name(), "Session finished.");
            }
        }
    }

    /// Handles the talk key being pressed. Only meaningful during a user
    /// turn that is not already recording.
    pub fn on_turn_start(&self) {
        let _enter = self.span.enter();

        let mut state = self.state.lock();
        if !state.is_user_turn || state.is_recording || state.finished {
            return;
        }
        state.is_recording = true;

        info!("Participant turn started.");
        self.surface.set_message(RECORDING_MESSAGE);
        self.surface.set_mic(MicState::Recording);
        self.surface.set_indicator(true);
    }

    /// Handles the talk key being released. Ends the user turn and moves on.
    pub fn on_turn_end(self: &Arc<Self>) {
        let _enter = self.span.enter();

        {
            let mut state = self.state.lock();
            if !state.is_recording {
                return;
            }
            state.is_recording = false;
            state.is_user_turn = false;
        }

        info!("Participant turn ended.");
        self.surface.set_mic(MicState::Hidden);
        self.surface.set_indicator(false);
        self.advance();
    }

    /// Whether the end step has been reached.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> usize {
        self.state.lock().position
    }

    #[cfg(test)]
    pub(crate) fn is_user_turn(&self) -> bool {
        self.state.lock().is_user_turn
    }

    #[cfg(test)]
    pub(crate) fn is_recording(&self) -> bool {
        self.state.lock().is_recording
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::audio;
    use crate::playback::testutil::StubAssets;
    use crate::playback::{AssetSource, Sequencer, StemBank};
    use crate::scenario::{Directive, GradedSpec, Scenario, Step};
    use crate::test::eventually;
    use crate::ui::{self, MicState};

    use super::Runner;

    struct Fixture {
        runner: Arc<Runner>,
        device: Arc<audio::mock::Device>,
        surface: Arc<ui::mock::Surface>,
    }

    fn agent(message: &str, clip: &str) -> Step {
        Step::Agent {
            message: message.to_string(),
            directive: Directive::Clip(clip.to_string()),
        }
    }

    fn user_turn(message: &str) -> Step {
        Step::UserTurn {
            message: message.to_string(),
        }
    }

    fn end(message: &str) -> Step {
        Step::End {
            message: message.to_string(),
        }
    }

    async fn fixture(steps: Vec<Step>, assets: StubAssets) -> Fixture {
        let device = Arc::new(audio::mock::Device::get("mock-device"));
        let surface = Arc::new(ui::mock::Surface::new());
        let assets = Arc::new(assets) as Arc<dyn AssetSource>;

        let stem_ids: Vec<String> = (1..=11).map(|i| format!("stem_{:02}.wav", i)).collect();
        let bank = Arc::new(StemBank::new(stem_ids, Arc::clone(&assets)));
        bank.load_all().await.expect("stems should load");

        let sequencer = Arc::new(Sequencer::new(
            Arc::clone(&device) as Arc<dyn audio::Device>,
            assets,
            bank,
            Arc::clone(&surface) as Arc<dyn ui::Surface>,
        ));
        let scenario =
            Arc::new(Scenario::new("test", steps).expect("scenario should be valid"));
        Fixture {
            runner: Arc::new(Runner::new(
                scenario,
                sequencer,
                Arc::clone(&surface) as Arc<dyn ui::Surface>,
            )),
            device,
            surface,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_steps_run_in_order() {
        let fixture = fixture(
            vec![
                agent("hello", "hello.wav"),
                user_turn("your turn"),
                agent("goodbye", "goodbye.wav"),
                end("done"),
            ],
            StubAssets::new(),
        )
        .await;
        let runner = &fixture.runner;

        assert_eq!(runner.position(), 0);
        runner.start();

        // The first agent clip finishes and the runner lands on the user turn.
        {
            let runner = Arc::clone(runner);
            eventually(
                move || runner.is_user_turn(),
                "runner never reached the user turn",
            );
        }
        assert_eq!(runner.position(), 1);
        assert_eq!(fixture.device.played(), vec!["hello.wav".to_string()]);
        assert_eq!(fixture.surface.mic_state(), MicState::Idle);
        assert!(fixture
            .surface
            .last_message()
            .expect("message should be set")
            .contains("hold Enter"));

        // The cursor holds until the key is released.
        runner.on_turn_start();
        assert!(runner.is_recording());
        assert_eq!(fixture.surface.mic_state(), MicState::Recording);
        assert!(fixture.surface.indicator_visible());
        assert_eq!(runner.position(), 1);

        runner.on_turn_end();

        {
            let runner = Arc::clone(runner);
            eventually(
                move || runner.is_finished(),
                "runner never reached the end step",
            );
        }
        assert_eq!(runner.position(), 3);
        assert_eq!(
            fixture.device.played(),
            vec!["hello.wav".to_string(), "goodbye.wav".to_string()]
        );
        assert_eq!(fixture.surface.last_message(), Some("done".to_string()));
        assert_eq!(fixture.surface.mic_state(), MicState::Hidden);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_hold_only_counts_during_user_turn() {
        let fixture = fixture(
            vec![user_turn("speak"), end("done")],
            StubAssets::new(),
        )
        .await;
        let runner = &fixture.runner;

        // Before start, key events do nothing.
        runner.on_turn_start();
        assert!(!runner.is_recording());
        runner.on_turn_end();
        assert_eq!(runner.position(), 0);

        runner.start();
        assert!(runner.is_user_turn());

        // A release without a hold does not advance.
        runner.on_turn_end();
        assert_eq!(runner.position(), 0);

        // A second hold while recording is ignored.
        runner.on_turn_start();
        runner.on_turn_start();
        assert!(runner.is_recording());

        runner.on_turn_end();
        assert!(runner.is_finished());
        assert_eq!(runner.position(), 1);

        // Key events after the end are inert.
        runner.on_turn_start();
        assert!(!runner.is_recording());
        assert_eq!(runner.position(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_twice_does_not_restart() {
        let fixture = fixture(
            vec![user_turn("speak"), end("done")],
            StubAssets::new(),
        )
        .await;
        let runner = &fixture.runner;

        runner.start();
        runner.on_turn_start();
        runner.start();

        // Recording survives the second start call.
        assert!(runner.is_recording());
        assert_eq!(runner.position(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_clip_still_advances() {
        let assets = StubAssets::new();
        assets.fail_id("missing.wav");
        let fixture = fixture(
            vec![agent("hello", "missing.wav"), user_turn("speak"), end("done")],
            assets,
        )
        .await;
        let runner = &fixture.runner;

        runner.start();

        {
            let runner = Arc::clone(runner);
            eventually(
                move || runner.is_user_turn(),
                "runner never advanced past the failed clip",
            );
        }
        assert_eq!(runner.position(), 1);
        assert!(fixture.device.played().is_empty());
        // The failure was surfaced before the user turn prompt replaced it.
        assert!(fixture
            .surface
            .messages()
            .iter()
            .any(|m| m.contains("cannot load resource missing.wav")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_graded_step_advances_on_completion() {
        let fixture = fixture(
            vec![
                Step::Agent {
                    message: "listen".to_string(),
                    directive: Directive::Graded(GradedSpec::new(
                        vec![3, 2, 1],
                        Duration::from_millis(10),
                    )),
                },
                end("done"),
            ],
            StubAssets::new(),
        )
        .await;
        let runner = &fixture.runner;

        runner.start();

        {
            let runner = Arc::clone(runner);
            eventually(
                move || runner.is_finished(),
                "runner never finished the graded step",
            );
        }
        assert_eq!(fixture.device.ticks().len(), 3);
        assert_eq!(fixture.surface.last_message(), Some("done".to_string()));
    }
}
