#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    match sharedstate_demo::run_from_env() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("sharedstate-demo: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}
