use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::initial_state;
use crate::error::{DemoError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "sharedstate-demo",
    about = "Replay roster selections against shared state and print what each view renders",
    version
)]
pub struct Cli {
    /// JSON array of entities to start from instead of the built-in roster.
    #[arg(long, value_name = "PATH")]
    pub seed: Option<PathBuf>,

    /// Select an entity by name. Repeatable; applied in order.
    #[arg(long = "select", value_name = "NAME")]
    pub select: Vec<String>,

    /// Clear the selection after all `--select` steps.
    #[arg(long)]
    pub clear: bool,

    /// Print render events as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Log filter, overriding RUST_LOG (e.g. `debug`, `sharedstate_reactive=trace`).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// One frame rendered by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RenderEvent {
    Roster { names: Vec<String> },
    Detail { text: String },
}

impl RenderEvent {
    fn to_line(&self, json: bool) -> Result<String> {
        if json {
            return Ok(serde_json::to_string(self)?);
        }
        Ok(match self {
            Self::Roster { names } => format!("roster: {}", names.join(", ")),
            Self::Detail { text } if text.is_empty() => "detail: <none>".to_string(),
            Self::Detail { text } => format!("detail: {text}"),
        })
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

/// Wire the app, bind both views, replay the script, and print each frame.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let app = App::new(initial_state(cli.seed.as_deref())?);
    let roster = app.roster();
    let detail = app.detail();

    let frames: Rc<RefCell<Vec<RenderEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&frames);
    roster.bind(move |names| {
        sink.borrow_mut().push(RenderEvent::Roster {
            names: names.to_vec(),
        });
    });
    let sink = Rc::clone(&frames);
    detail.bind(move |text| {
        sink.borrow_mut().push(RenderEvent::Detail {
            text: text.to_string(),
        });
    });

    for name in &cli.select {
        roster.select(name)?;
    }
    if cli.clear {
        roster.clear_selection();
    }

    roster.detach();
    detail.detach();

    for frame in frames.borrow().iter() {
        writeln!(out, "{}", frame.to_line(cli.json)?)?;
    }
    Ok(())
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|err| DemoError::invalid(format!("log level {level:?}: {err}")))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| DemoError::Logging {
            message: err.to_string(),
        })
}
