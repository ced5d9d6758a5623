// Copyright 2026 Edools Harvest Contributors
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use edools_harvest::cli;
use edools_harvest::cli::output;
use edools_harvest::config::HarvestConfig;
use edools_harvest::error::{exit_codes, HarvestError};
use edools_harvest::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "edools-harvest",
    about = "Log in to an Edools school and harvest the lesson list of a course",
    version,
    after_help = "Run 'edools-harvest <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Platform base URL (overrides EDOOLS_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Session store file (overrides EDOOLS_SESSION_FILE)
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and save the session cookies
    Login {
        /// JSON file with "email" and "password"
        credentials: PathBuf,
        /// Log in again even if a session is already saved
        #[arg(long)]
        fresh: bool,
    },
    /// Collect the lesson list of a course
    Scrape {
        /// Course URL, e.g. https://school.myedools.com/enrollments/1/courses/2
        course_url: String,
        /// Output file (default: course-<id>_lessons.json)
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Write a bare array instead of the wrapped report
        #[arg(long)]
        bare: bool,
        /// Never fall back to the headless browser
        #[arg(long)]
        no_browser: bool,
        /// Milliseconds to wait for lessons to render in the browser
        #[arg(long)]
        render_timeout: Option<u64>,
        /// Chromium executable for the browser fallback
        #[arg(long)]
        chromium: Option<PathBuf>,
    },
    /// Check configuration, saved session and Chromium availability
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_config(cli: &Cli) -> Result<HarvestConfig> {
    let mut config = HarvestConfig::from_env()?;
    if let Some(base) = &cli.base_url {
        config.set_base_url(base)?;
    }
    if let Some(path) = &cli.session {
        config.session_file = path.clone();
    }
    if let Commands::Scrape {
        no_browser,
        render_timeout,
        chromium,
        ..
    } = &cli.command
    {
        if *no_browser {
            config.browser_fallback = false;
        }
        if let Some(ms) = render_timeout {
            config.render_timeout_ms = *ms;
        }
        if let Some(path) = chromium {
            config.chromium_path = Some(path.clone());
        }
    }
    Ok(config)
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    match cli.command {
        Commands::Login { credentials, fresh } => {
            cli::login_cmd::run(&config, &credentials, fresh).await
        }
        Commands::Scrape {
            course_url,
            out,
            bare,
            ..
        } => {
            let format = if bare {
                OutputFormat::Bare
            } else {
                OutputFormat::Wrapped
            };
            cli::scrape_cmd::run(&config, &course_url, out, format).await
        }
        Commands::Doctor => cli::doctor::run(&config).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "edools-harvest", &mut std::io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    output::set_json(cli.json);
    output::set_quiet(cli.quiet);
    init_tracing(&cli);

    let result = dispatch(cli).await;

    // 0=success, otherwise one code per failure kind
    if let Err(e) = &result {
        let harvest_err = e.downcast_ref::<HarvestError>();
        let code = harvest_err
            .map(HarvestError::exit_code)
            .unwrap_or(exit_codes::GENERIC);
        let hint = harvest_err.and_then(HarvestError::hint);

        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
                "hint": hint,
                "exit_code": code,
            }));
        } else {
            eprintln!("  Error: {e:#}");
            if let Some(hint) = hint {
                eprintln!("  Hint:  {hint}");
            }
        }
        std::process::exit(code);
    }
}
