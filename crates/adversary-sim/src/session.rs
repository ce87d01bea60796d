//! Async driver connecting the state machine to a generator, a history
//! store, and a cancellation token.
//!
//! The session awaits each generation call while racing it against
//! cancellation; a cancelled call rolls the machine back via `abort`, and
//! the ticket discipline guarantees the abandoned reply can never land.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use adversary_core::types::{AttackStep, ScenarioInput, SimulationScenario};
use adversary_gen::ScenarioGenerator;
use adversary_history::{export, ExportedScenario, HistoryRecord, HistoryStore};

use crate::cancel::{cancel_pair, CancelHandle, CancelToken};
use crate::controller::{Phase, SimulationController};
use crate::error::SessionError;

/// Await `work` unless the token cancels first. `None` means cancelled;
/// the abandoned future is dropped here.
async fn race_cancel<T>(
    token: &mut CancelToken,
    work: impl Future<Output = T>,
) -> Option<T> {
    tokio::pin!(work);
    tokio::select! {
        result = &mut work => Some(result),
        _ = token.cancelled() => None,
    }
}

pub struct SimulationSession<S: HistoryStore> {
    controller: SimulationController,
    generator: Arc<dyn ScenarioGenerator>,
    history: S,
    cancel_handle: CancelHandle,
    cancel_token: CancelToken,
}

impl<S: HistoryStore> SimulationSession<S> {
    pub fn new(generator: Arc<dyn ScenarioGenerator>, history: S) -> Self {
        let (cancel_handle, cancel_token) = cancel_pair();
        Self {
            controller: SimulationController::new(),
            generator,
            history,
            cancel_handle,
            cancel_token,
        }
    }

    // ── State access ──────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn scenario(&self) -> Option<&SimulationScenario> {
        self.controller.scenario()
    }

    pub fn current_step(&self) -> Option<&AttackStep> {
        self.controller.current_step()
    }

    pub fn step_index(&self) -> usize {
        self.controller.step_index()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.controller.last_error()
    }

    pub fn history(&self) -> &S {
        &self.history
    }

    /// Handle for cancelling whatever request this session has in flight.
    /// Stale after a cancellation is consumed; fetch a fresh one per use.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel_handle.clone()
    }

    // ── Generation ────────────────────────────────────────────────

    /// Generate a complete scenario in one call.
    pub async fn generate(&mut self, input: ScenarioInput) -> Result<(), SessionError> {
        let ticket = self.controller.begin_generate(input.clone())?;

        let generator = Arc::clone(&self.generator);
        let outcome =
            race_cancel(&mut self.cancel_token, generator.generate_scenario(&input)).await;

        match outcome {
            None => {
                self.controller.abort();
                self.rearm_cancel();
                Err(SessionError::Cancelled)
            }
            Some(Ok(scenario)) => {
                self.controller.complete_generate(ticket, Ok(scenario))?;
                Ok(())
            }
            Some(Err(e)) => {
                self.controller
                    .complete_generate(ticket, Err(e.to_string()))?;
                Err(SessionError::Generation(e))
            }
        }
    }

    /// Open a turn-based simulation: scenario frame plus the attacker's
    /// first move.
    pub async fn start(&mut self, input: ScenarioInput) -> Result<(), SessionError> {
        let ticket = self.controller.begin_generate(input.clone())?;

        let generator = Arc::clone(&self.generator);
        let outcome =
            race_cancel(&mut self.cancel_token, generator.start_simulation(&input)).await;

        match outcome {
            None => {
                self.controller.abort();
                self.rearm_cancel();
                Err(SessionError::Cancelled)
            }
            Some(Ok(opening)) => {
                self.controller
                    .complete_generate(ticket, Ok(opening.into_scenario()))?;
                Ok(())
            }
            Some(Err(e)) => {
                self.controller
                    .complete_generate(ticket, Err(e.to_string()))?;
                Err(SessionError::Generation(e))
            }
        }
    }

    /// Respond to the latest step with a defensive action, generating the
    /// attacker's next move.
    pub async fn take_action(&mut self, choice: &str) -> Result<(), SessionError> {
        let (ticket, request) = self.controller.begin_action(choice)?;

        let generator = Arc::clone(&self.generator);
        let outcome =
            race_cancel(&mut self.cancel_token, generator.continue_simulation(&request)).await;

        match outcome {
            None => {
                self.controller.abort();
                self.rearm_cancel();
                Err(SessionError::Cancelled)
            }
            Some(Ok(step)) => {
                self.controller.complete_action(ticket, Ok(step))?;
                Ok(())
            }
            Some(Err(e)) => {
                self.controller.complete_action(ticket, Err(e.to_string()))?;
                Err(SessionError::Generation(e))
            }
        }
    }

    // ── Navigation & lifecycle ────────────────────────────────────

    pub fn go_to_step(&mut self, index: usize) {
        self.controller.go_to_step(index);
    }

    pub fn dismiss_error(&mut self) {
        self.controller.dismiss_error();
    }

    /// Clear the live simulation, archiving it to history first. Returns
    /// the number of history entries after the clear.
    pub fn clear(&mut self) -> Result<usize, SessionError> {
        if let Some(entry) = self.controller.clear()? {
            self.history.add(entry)?;
        }
        Ok(self.history.list()?.len())
    }

    /// The live scenario packaged for export, if any.
    pub fn export_entry(&self) -> Option<ExportedScenario> {
        self.controller.current_export()
    }

    /// Write the live scenario to an export file in `dir`.
    pub fn export_current(&self, dir: impl AsRef<Path>) -> Result<PathBuf, SessionError> {
        let entry = self
            .controller
            .current_export()
            .ok_or(crate::error::ControllerError::NoScenario)?;
        Ok(export::write_export(dir, &entry)?)
    }

    /// Load an export file as the live simulation.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let entry = export::read_export(path)?;
        self.load(entry)
    }

    /// Replace the live simulation with a history entry.
    pub fn load(&mut self, entry: ExportedScenario) -> Result<(), SessionError> {
        self.controller.load_from_history(entry)?;
        Ok(())
    }

    pub fn history_entries(&self) -> Result<Vec<HistoryRecord>, SessionError> {
        Ok(self.history.list()?)
    }

    pub fn clear_history(&mut self) -> Result<(), SessionError> {
        Ok(self.history.clear()?)
    }

    /// Replace the consumed cancellation pair so the next request starts
    /// un-cancelled. Handles fetched earlier keep pointing at the old pair.
    fn rearm_cancel(&mut self) {
        let (handle, token) = cancel_pair();
        self.cancel_handle = handle;
        self.cancel_token = token;
    }
}
