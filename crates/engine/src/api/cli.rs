//! Command line surface for the `campbot` binary.

use std::path::PathBuf;

use anyhow::Context;
use campbot_domain::{CharacterState, Gauge};
use clap::{Parser, Subcommand};

use crate::app::App;
use crate::requests::ACTIONS;
use crate::use_cases::{SequenceReport, SequenceStatus};

#[derive(Debug, Parser)]
#[command(
    name = "campbot",
    about = "Automates campground actions for a browser game session",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one command and wait for it (e.g. `campbot do rest 2`)
    Do {
        /// Command words: ["try"] action [count]
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Run a script file as a background sequence
    Run {
        /// Script path, relative paths resolve under CAMPBOT_SCRIPTS_DIR
        script: PathBuf,

        /// Record every dispatched request to this macro log
        #[arg(short, long)]
        record: Option<PathBuf>,
    },

    /// Replay a recorded macro log in order
    Replay {
        /// Macro log path
        log: PathBuf,
    },

    /// List the known actions
    Actions,
}

/// Execute one parsed command line against the app.
///
/// Returns the text to print. Sequences that stop early are still reported,
/// not turned into errors.
pub async fn execute(app: &App, command: Commands) -> anyhow::Result<String> {
    let report = match command {
        Commands::Do { command } => app.scripts.run_command(&command.join(" ")).await?,
        Commands::Run { script, record } => {
            let path = app.config.resolve_script_path(script);
            if let Some(record) = &record {
                app.scripts
                    .start_recording(&app.config.resolve_script_path(record))
                    .await
                    .context("Failed to start recording")?;
            }
            let handle = app
                .scripts
                .run_script_file(&path)
                .await
                .with_context(|| format!("Failed to start {}", path.display()))?;
            tracing::info!(sequence_id = %handle.id(), "Waiting for script");
            let report = handle.join().await;
            if record.is_some() {
                app.scripts.stop_recording().await;
            }
            report?
        }
        Commands::Replay { log } => {
            let path = app.config.resolve_script_path(log);
            app.scripts
                .replay(&path)
                .await
                .with_context(|| format!("Failed to replay {}", path.display()))?
                .join()
                .await?
        }
        Commands::Actions => return Ok(list_actions()),
    };

    Ok(summary(&report, &app.session.snapshot()))
}

fn list_actions() -> String {
    ACTIONS
        .iter()
        .map(|spec| format!("{:<12} {}", spec.id, spec.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One summary line for the sequence, one for the character.
pub fn summary(report: &SequenceReport, character: &CharacterState) -> String {
    let mut line = format!(
        "{}: {} ({} dispatched, {} adventures spent)",
        report.name,
        report.status,
        report.dispatched(),
        report.adventures_used
    );
    if report.status != SequenceStatus::Completed {
        if let Some(reason) = &report.stopped_because {
            line.push_str(&format!(" - {}", reason));
        }
    }
    format!(
        "{}\n{}: HP {}, MP {}, {} meat, {} adventures left",
        line,
        character.name(),
        gauge_text(character.hp()),
        gauge_text(character.mp()),
        character.meat(),
        character
            .adventures_left()
            .map_or_else(|| "?".to_string(), |n| n.to_string())
    )
}

fn gauge_text(gauge: Option<Gauge>) -> String {
    match gauge {
        Some(g) => format!("{}/{}", g.current(), g.maximum()),
        None => "?/?".to_string(),
    }
}
