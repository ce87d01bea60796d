//! The simulation state machine.
//!
//! Pure and synchronous: every async completion is delivered to the machine
//! as a ticketed `complete_*` call, so cancelled or superseded requests can
//! never mutate state. The driver in [`crate::session`] owns the awaiting.
//!
//! Phases and transitions:
//!
//! ```text
//! Idle ──begin_generate──▶ Generating ──ok──▶ Ready (step 0)
//!                              │ err                │
//!                              ▼                    │ begin_action (latest step only)
//!                            Error                  ▼
//!                              ▲            AwaitingNextStep ──ok──▶ Ready (new last step)
//!                              └────err (steps retained)──┘
//! ```
//!
//! `clear` returns to Idle from any settled phase, handing back the archive
//! entry for the history store.

use adversary_core::types::{AttackStep, ScenarioInput, SimulationScenario};
use adversary_core::validate;
use adversary_gen::ContinuationRequest;
use adversary_history::ExportedScenario;

use crate::error::ControllerError;

/// Which phase the simulation is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No scenario, no request in flight.
    Idle,
    /// Whole-scenario request in flight; nothing to show yet.
    Generating,
    /// Scenario present; the user is viewing a step.
    Ready,
    /// Continuation request in flight; existing steps remain visible.
    AwaitingNextStep,
    /// The last operation failed. A scenario from a failed continuation is
    /// preserved; a failed generation leaves none.
    Error,
}

/// Correlates a `begin_*` call with its `complete_*` delivery. Completions
/// carrying a stale ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

#[derive(Debug)]
pub struct SimulationController {
    phase: Phase,
    input: Option<ScenarioInput>,
    scenario: Option<SimulationScenario>,
    step_index: usize,
    last_error: Option<String>,
    next_ticket: u64,
    inflight: Option<RequestTicket>,
}

impl Default for SimulationController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            input: None,
            scenario: None,
            step_index: 0,
            last_error: None,
            next_ticket: 0,
            inflight: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scenario(&self) -> Option<&SimulationScenario> {
        self.scenario.as_ref()
    }

    pub fn input(&self) -> Option<&ScenarioInput> {
        self.input.as_ref()
    }

    /// Index of the step currently in view.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn current_step(&self) -> Option<&AttackStep> {
        self.scenario.as_ref()?.steps.get(self.step_index)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a generation or continuation request is in flight.
    pub fn is_loading(&self) -> bool {
        self.inflight.is_some()
    }

    /// Whether the view is on the latest revealed step.
    pub fn viewing_latest_step(&self) -> bool {
        match &self.scenario {
            Some(s) => s.last_step_index() == Some(self.step_index),
            None => false,
        }
    }

    /// The current scenario packaged for export or archival.
    pub fn current_export(&self) -> Option<ExportedScenario> {
        match (&self.scenario, &self.input) {
            (Some(scenario), Some(input)) => {
                Some(ExportedScenario::new(input.clone(), scenario.clone()))
            }
            _ => None,
        }
    }

    // ── Whole-scenario generation ─────────────────────────────────

    /// Start a whole-scenario generation. Valid from Idle, Ready, or Error;
    /// any prior scenario is dropped immediately.
    pub fn begin_generate(
        &mut self,
        input: ScenarioInput,
    ) -> Result<RequestTicket, ControllerError> {
        self.ensure_settled()?;
        if input.environment.trim().is_empty() {
            return Err(ControllerError::EmptyEnvironment);
        }

        self.scenario = None;
        self.step_index = 0;
        self.last_error = None;
        self.input = Some(input);
        self.phase = Phase::Generating;
        Ok(self.issue_ticket())
    }

    /// Deliver the result of a whole-scenario generation.
    ///
    /// Success moves to Ready viewing step 0; failure moves to Error with no
    /// scenario. A stale ticket is ignored.
    pub fn complete_generate(
        &mut self,
        ticket: RequestTicket,
        result: Result<SimulationScenario, String>,
    ) -> Result<(), ControllerError> {
        if !self.settle(ticket) {
            return Ok(());
        }

        match result {
            Ok(scenario) => {
                if let Err(invalid) = validate::validate_scenario(&scenario) {
                    self.fail(invalid.to_string());
                    return Err(ControllerError::DocumentRejected(invalid));
                }
                self.scenario = Some(scenario);
                self.step_index = 0;
                self.phase = Phase::Ready;
                self.last_error = None;
                Ok(())
            }
            Err(message) => {
                self.scenario = None;
                self.fail(message);
                Ok(())
            }
        }
    }

    // ── Turn-based continuation ───────────────────────────────────

    /// Start a continuation for the user's chosen defensive action. Only
    /// valid in Ready while viewing the latest step.
    pub fn begin_action(
        &mut self,
        choice: &str,
    ) -> Result<(RequestTicket, ContinuationRequest), ControllerError> {
        self.ensure_settled()?;
        if self.phase != Phase::Ready {
            return Err(ControllerError::InvalidPhase {
                operation: "take_action",
                phase: self.phase,
            });
        }
        if !self.viewing_latest_step() {
            return Err(ControllerError::NotLatestStep);
        }

        // Ready implies both are present.
        let (scenario, input) = match (&self.scenario, &self.input) {
            (Some(s), Some(i)) => (s, i),
            _ => return Err(ControllerError::NoScenario),
        };

        let request = ContinuationRequest {
            input: input.clone(),
            topology: scenario.network_topology.clone(),
            history: scenario.steps.clone(),
            last_action: choice.to_string(),
        };

        self.phase = Phase::AwaitingNextStep;
        Ok((self.issue_ticket(), request))
    }

    /// Deliver the result of a continuation.
    ///
    /// Success appends the step (re-checked against the topology and the
    /// step it follows) and advances the view to it. Failure moves to Error
    /// but retains every existing step: a failed continuation must not
    /// destroy prior progress.
    pub fn complete_action(
        &mut self,
        ticket: RequestTicket,
        result: Result<AttackStep, String>,
    ) -> Result<(), ControllerError> {
        if !self.settle(ticket) {
            return Ok(());
        }

        let step = match result {
            Ok(step) => step,
            Err(message) => {
                self.fail(message);
                return Ok(());
            }
        };

        let scenario = match &mut self.scenario {
            Some(s) => s,
            None => return Err(ControllerError::NoScenario),
        };

        if let Err(invalid) =
            validate::validate_continuation(&scenario.network_topology, scenario.steps.last(), &step)
        {
            self.fail(invalid.to_string());
            return Err(ControllerError::DocumentRejected(invalid));
        }

        scenario.steps.push(step);
        self.step_index = scenario.steps.len() - 1;
        self.phase = Phase::Ready;
        self.last_error = None;
        Ok(())
    }

    // ── View navigation ───────────────────────────────────────────

    /// Move the view to a previously revealed step. Out-of-range indices
    /// are a no-op; this never errors and never touches the steps.
    pub fn go_to_step(&mut self, index: usize) {
        if let Some(scenario) = &self.scenario {
            if index < scenario.steps.len() {
                self.step_index = index;
            }
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Reset to Idle. If a scenario is live, it is handed back for
    /// archival. Rejected while a request is in flight; `abort` first.
    pub fn clear(&mut self) -> Result<Option<ExportedScenario>, ControllerError> {
        self.ensure_settled()?;

        let archived = self.current_export();
        self.scenario = None;
        self.input = None;
        self.step_index = 0;
        self.last_error = None;
        self.phase = Phase::Idle;
        Ok(archived)
    }

    /// Abandon the in-flight request, restoring the pre-request phase. The
    /// abandoned request's eventual completion carries a stale ticket and
    /// is dropped. No-op when nothing is in flight.
    pub fn abort(&mut self) {
        if self.inflight.take().is_none() {
            return;
        }
        match self.phase {
            Phase::Generating => {
                self.phase = Phase::Idle;
                tracing::debug!("Aborted whole-scenario generation");
            }
            Phase::AwaitingNextStep => {
                self.phase = Phase::Ready;
                tracing::debug!("Aborted continuation request");
            }
            _ => {}
        }
    }

    /// Dismiss the error banner: back to Ready if a scenario survived the
    /// failure, otherwise Idle.
    pub fn dismiss_error(&mut self) {
        if self.phase != Phase::Error {
            return;
        }
        self.last_error = None;
        self.phase = if self.scenario.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        };
    }

    /// Replace the live state with a loaded history entry, viewing its last
    /// step.
    pub fn load_from_history(&mut self, entry: ExportedScenario) -> Result<(), ControllerError> {
        self.ensure_settled()?;

        self.step_index = entry.scenario_data.last_step_index().unwrap_or(0);
        self.input = Some(entry.user_input);
        self.scenario = Some(entry.scenario_data);
        self.last_error = None;
        self.phase = Phase::Ready;
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────

    fn ensure_settled(&self) -> Result<(), ControllerError> {
        if self.inflight.is_some() {
            return Err(ControllerError::RequestInFlight);
        }
        Ok(())
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        self.inflight = Some(ticket);
        ticket
    }

    /// Accept a completion if its ticket is current; stale tickets are
    /// dropped so an aborted request can never resolve into live state.
    fn settle(&mut self, ticket: RequestTicket) -> bool {
        if self.inflight == Some(ticket) {
            self.inflight = None;
            true
        } else {
            tracing::debug!(?ticket, "Dropping completion with stale ticket");
            false
        }
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(error = %message, "Simulation request failed");
        self.last_error = Some(message);
        self.phase = Phase::Error;
    }
}
