#![forbid(unsafe_code)]

//! Shared-state demo: one roster state observed by two controllers.
//!
//! [`App`] is the composition root. It owns the root observable and builds a
//! [`RosterController`] (names list, write access for selection) and a
//! [`DetailController`] (selected entity, read-only) over it.

pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;

pub use app::App;
pub use cli::{Cli, RenderEvent, run, run_from_env};
pub use controller::{DetailController, RosterController, describe};
pub use error::{DemoError, Result};
pub use model::{Entity, State};
