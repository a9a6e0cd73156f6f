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
use tokio::sync::oneshot;

/// A single-shot completion signal handed to a playback strategy. Completing
/// consumes the token, so a step can never be signalled twice.
pub struct Completion {
    tx: oneshot::Sender<()>,
}

/// The waiting half of a completion pair.
pub struct Completed {
    rx: oneshot::Receiver<()>,
}

/// Creates a new completion pair.
pub fn completion() -> (Completion, Completed) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, Completed { rx })
}

impl Completion {
    /// Signals that the step has finished. The waiting half of the pair is
    /// woken exactly once.
    pub fn complete(self) {
        // The receiver may already be gone if the session was torn down.
        let _ = self.tx.send(());
    }
}

impl Completed {
    /// Waits for the completion signal. Returns false if the token was
    /// dropped without ever being completed.
    pub async fn wait(self) -> bool {
        self.rx.await.is_ok()
    }
}
