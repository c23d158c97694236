//! Initial state configuration.
//!
//! A seed file is a JSON array of entities:
//!
//! ```json
//! [{"name": "Neo", "power": 42}, {"name": "Trinity", "power": 42, "selected": true}]
//! ```

use std::fs;
use std::path::Path;

use crate::error::{DemoError, Result};
use crate::model::{Entity, State};

/// Read and validate a seed file.
pub fn load_seed(path: &Path) -> Result<State> {
    let raw = fs::read_to_string(path)?;
    let entities: Vec<Entity> = serde_json::from_str(&raw)?;
    if entities.is_empty() {
        return Err(DemoError::invalid(format!(
            "seed file {} has no entities",
            path.display()
        )));
    }
    tracing::debug!(
        message = "config.seed",
        path = %path.display(),
        entities = entities.len()
    );
    State::new(entities)
}

/// The seed file's state, or the built-in roster when there is none.
pub fn initial_state(seed: Option<&Path>) -> Result<State> {
    match seed {
        Some(path) => load_seed(path),
        None => Ok(State::roster()),
    }
}
