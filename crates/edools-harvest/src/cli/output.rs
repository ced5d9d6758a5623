//! Output mode flags shared by all subcommands.
//!
//! `main` records `--json` and `--quiet` in the environment so every
//! command can check them without threading flags through.

use serde::Serialize;

const JSON_ENV: &str = "EDOOLS_HARVEST_JSON";
const QUIET_ENV: &str = "EDOOLS_HARVEST_QUIET";

fn flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

pub fn set_json(on: bool) {
    if on {
        std::env::set_var(JSON_ENV, "1");
    }
}

pub fn set_quiet(on: bool) {
    if on {
        std::env::set_var(QUIET_ENV, "1");
    }
}

/// Machine-readable output requested.
pub fn is_json() -> bool {
    flag(JSON_ENV)
}

/// Non-essential output suppressed.
pub fn is_quiet() -> bool {
    flag(QUIET_ENV)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}

/// Print a human-readable status line unless quiet or JSON mode is on.
pub fn status(line: impl std::fmt::Display) {
    if !is_quiet() && !is_json() {
        println!("{line}");
    }
}
