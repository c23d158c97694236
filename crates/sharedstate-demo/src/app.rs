//! Composition root.
//!
//! [`App`] owns the root observable for the lifetime of the process and is
//! the only place that hands out capabilities to it: read-write for
//! controllers that mutate state, read-only for everything else.

use sharedstate_reactive::{Observable, ReadOnly};

use crate::controller::{DetailController, RosterController};
use crate::model::State;

#[derive(Debug)]
pub struct App {
    state: Observable<State>,
}

impl App {
    #[must_use]
    pub fn new(initial: State) -> Self {
        tracing::info!(message = "app.start", entities = initial.entities().len());
        Self {
            state: Observable::new(initial),
        }
    }

    /// Read capability on the root.
    #[must_use]
    pub fn state(&self) -> ReadOnly<State> {
        self.state.read_only()
    }

    #[must_use]
    pub fn current(&self) -> State {
        self.state.get()
    }

    #[must_use]
    pub fn roster(&self) -> RosterController {
        RosterController::new(self.state.clone())
    }

    #[must_use]
    pub fn detail(&self) -> DetailController {
        DetailController::new(&self.state())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(State::roster())
    }
}
