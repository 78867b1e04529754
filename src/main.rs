// src/main.rs
//! Interaction Recorder CLI
//!
//! Compiles saved recordings into replay scripts and checks their integrity
//! digests.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use interaction_recorder::observability::{describe_metrics, init_tracing_with};
use interaction_recorder::recording::{ExportFormat, Exporter, InteractionRecording};
use interaction_recorder::utils::config::EngineConfig;
use interaction_recorder::BuildInfo;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "interaction-recorder", version, about = "Interaction recording tools")]
struct Cli {
    /// Configuration file (overrides RECORDER_CONFIG)
    #[arg(long, global = true, env = "RECORDER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a recording into a replay script
    Compile {
        /// Recording exported as JSON
        recording: PathBuf,

        /// selenium, puppeteer, playwright or json
        #[arg(short, long, default_value = "playwright")]
        target: String,

        #[arg(long)]
        no_header: bool,

        #[arg(long)]
        no_setup: bool,

        #[arg(long)]
        no_waits: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a recording's integrity digest
    Verify {
        recording: PathBuf,
    },

    /// Print build information
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load_from(cli.config.as_deref())?;
    init_tracing_with(&config.logging)?;
    describe_metrics();

    match cli.command {
        Command::Compile {
            recording,
            target,
            no_header,
            no_setup,
            no_waits,
            output,
        } => {
            let format: ExportFormat = target.parse()?;
            let json = read_recording(&recording).await?;

            let mut options = config.export.clone();
            options.include_header &= !no_header;
            options.include_setup &= !no_setup;
            options.include_waits &= !no_waits;

            let result = Exporter::new(format)
                .with_script_options(options)
                .pretty(true)
                .export_serialized(&json)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &result.data)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {} ({} bytes)", path.display(), result.size);
                }
                None => print!("{}", result.data),
            }
        }

        Command::Verify { recording } => {
            let json = read_recording(&recording).await?;
            let recording = InteractionRecording::from_json(&json)?;

            if recording.verify_hash() {
                println!(
                    "OK {} ({} events, {} checkpoints)",
                    recording.id,
                    recording.events.len(),
                    recording.checkpoints.len()
                );
            } else {
                warn!("Digest mismatch for recording {}", recording.id);
                bail!("Recording {} failed integrity check", recording.id);
            }
        }

        Command::Info => {
            let build = BuildInfo::current();
            println!("interaction-recorder {}", build.version);
            println!("git:   {}", build.git_hash);
            println!("built: {}", build.build_timestamp);
            println!("rustc: {}", build.rustc_version);
        }
    }

    Ok(())
}

async fn read_recording(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{}").await.unwrap();
        assert_eq!(read_recording(&path).await.unwrap(), "{}");

        let missing = dir.path().join("missing.json");
        let err = read_recording(&missing).await.unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
