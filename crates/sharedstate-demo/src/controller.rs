//! Presentation controllers over the shared state.
//!
//! Each controller narrows the root [`State`] to the slice its view renders
//! (`root -> map(projection) -> distinct`) and owns a [`SubscriptionScope`]
//! for the render callbacks bound to it. `detach` releases them, which is the
//! controller's end of the view lifecycle.

use sharedstate_reactive::{Observable, ReadOnly, Readable, SubscriptionScope};

use crate::error::Result;
use crate::model::{Entity, State};

/// Lists entity names and owns the selection mutation.
///
/// Holds write access to the root; the names projection is deduplicated, so
/// selection changes do not re-render the list.
pub struct RosterController {
    state: Observable<State>,
    names: ReadOnly<Vec<String>>,
    scope: SubscriptionScope,
}

impl RosterController {
    #[must_use]
    pub fn new(state: Observable<State>) -> Self {
        let names = state.map(State::names).distinct();
        Self {
            state,
            names,
            scope: SubscriptionScope::new(),
        }
    }

    #[must_use]
    pub fn names(&self) -> &ReadOnly<Vec<String>> {
        &self.names
    }

    /// Render the current names now and on every change until `detach`.
    pub fn bind(&self, render: impl Fn(&[String]) + 'static) {
        self.scope
            .add(self.names.subscribe(move |names| render(names.as_slice())));
    }

    /// Make `name` the single selected entity.
    pub fn select(&self, name: &str) -> Result<()> {
        let next = self.state.with(|state| state.select(name))?;
        tracing::debug!(message = "roster.select", name);
        self.state.set(next);
        Ok(())
    }

    pub fn clear_selection(&self) {
        tracing::debug!(message = "roster.clear_selection");
        self.state.update(State::clear_selection);
    }

    pub fn detach(&self) {
        self.scope.clear();
    }

    #[must_use]
    pub fn bindings(&self) -> usize {
        self.scope.len()
    }
}

/// Shows the currently selected entity.
///
/// Read-only: it can observe the root but never write to it. "Nothing
/// selected" is a valid state and renders as an empty string.
pub struct DetailController {
    selection: ReadOnly<Option<Entity>>,
    display: ReadOnly<String>,
    scope: SubscriptionScope,
}

impl DetailController {
    #[must_use]
    pub fn new(state: &ReadOnly<State>) -> Self {
        let selection = state.map(|s| s.selected().cloned()).distinct();
        let display = selection.map(|selected| describe(selected.as_ref()));
        Self {
            selection,
            display,
            scope: SubscriptionScope::new(),
        }
    }

    #[must_use]
    pub fn selection(&self) -> &ReadOnly<Option<Entity>> {
        &self.selection
    }

    #[must_use]
    pub fn display(&self) -> &ReadOnly<String> {
        &self.display
    }

    /// Render the display text now and on every selection change.
    pub fn bind(&self, render: impl Fn(&str) + 'static) {
        self.scope
            .add(self.display.subscribe(move |text| render(text.as_str())));
    }

    pub fn detach(&self) {
        self.scope.clear();
    }

    #[must_use]
    pub fn bindings(&self) -> usize {
        self.scope.len()
    }
}

/// Display line for a selection; empty when nothing is selected.
#[must_use]
pub fn describe(selected: Option<&Entity>) -> String {
    match selected {
        Some(entity) => format!("{} ({})", entity.name, entity.power),
        None => String::new(),
    }
}
