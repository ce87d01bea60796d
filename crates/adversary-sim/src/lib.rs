//! adversary-sim: The simulation controller for Adversary.
//!
//! Turns generation-service replies into a navigable, replayable simulation:
//! a synchronous state machine ([`controller::SimulationController`]) owns
//! all transitions, and an async driver ([`session::SimulationSession`])
//! connects it to a [`adversary_gen::ScenarioGenerator`], a history store,
//! and a cancellation token. At most one generation request is ever in
//! flight; the machine itself enforces this, not caller discipline.

pub mod cancel;
pub mod controller;
pub mod error;
pub mod session;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use controller::{Phase, RequestTicket, SimulationController};
pub use error::{ControllerError, SessionError};
pub use session::SimulationSession;
