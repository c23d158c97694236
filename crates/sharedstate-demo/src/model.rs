//! Shared application state: an ordered roster of entities.
//!
//! Both types are immutable values. Every transition builds a new `State`
//! from the current one, so equality is structural and order-significant,
//! which is what `distinct` relies on downstream.

use serde::{Deserialize, Serialize};

use crate::error::{DemoError, Result};

/// One roster member, identified by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub power: u32,
    #[serde(default)]
    pub selected: bool,
}

impl Entity {
    #[must_use]
    pub fn new(name: impl Into<String>, power: u32) -> Self {
        Self {
            name: name.into(),
            power,
            selected: false,
        }
    }

    /// Copy of `self` with only the selection flag changed.
    #[must_use]
    pub fn with_selected(&self, selected: bool) -> Self {
        Self {
            selected,
            ..self.clone()
        }
    }
}

/// The whole shared state.
///
/// By convention at most one entity is selected; [`State::select`] keeps
/// that true, but [`State::new`] accepts whatever flags it is given.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct State {
    entities: Vec<Entity>,
}

impl State {
    /// Build a state, rejecting duplicate names.
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        for (i, entity) in entities.iter().enumerate() {
            if entities[..i].iter().any(|e| e.name == entity.name) {
                return Err(DemoError::DuplicateEntity {
                    name: entity.name.clone(),
                });
            }
        }
        Ok(Self { entities })
    }

    /// The built-in roster: Neo, Trinity and Morpheus, nobody selected.
    #[must_use]
    pub fn roster() -> Self {
        Self {
            entities: vec![
                Entity::new("Neo", 42),
                Entity::new("Trinity", 42),
                Entity::new("Morpheus", 42),
            ],
        }
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// The first selected entity, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.selected)
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }

    /// New state in which exactly the entity called `name` is selected.
    pub fn select(&self, name: &str) -> Result<Self> {
        if self.get(name).is_none() {
            return Err(DemoError::UnknownEntity {
                name: name.to_string(),
            });
        }
        Ok(Self {
            entities: self
                .entities
                .iter()
                .map(|e| e.with_selected(e.name == name))
                .collect(),
        })
    }

    #[must_use]
    pub fn clear_selection(&self) -> Self {
        Self {
            entities: self
                .entities
                .iter()
                .map(|e| e.with_selected(false))
                .collect(),
        }
    }
}
