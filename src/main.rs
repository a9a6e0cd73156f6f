// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
mod audio;
mod config;
mod controller;
mod playback;
mod playsync;
mod runner;
mod scenario;
mod ui;

use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A scenario player for Wizard-of-Oz dialogue experiments."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists and verifies all scenarios in the given directory.
    Scenarios {
        /// The path to the scenario repository on disk.
        path: String,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Run will start an experimental session.
    Run {
        /// The path to the session config.
        session_path: String,
        /// Run the named condition instead of the configured assignment policy.
        #[arg(short, long)]
        condition: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scenarios { path } => {
            let scenarios = config::get_all_scenarios(&PathBuf::from(&path))?;

            if scenarios.is_empty() {
                println!("No scenarios found in {}.", path.as_str());
                return Ok(());
            }

            println!("Scenarios (count: {}):", scenarios.len());
            for scenario in scenarios.sorted_list() {
                println!("- {}", scenario);
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Run {
            session_path,
            condition,
        } => {
            config::init_session(&PathBuf::from(session_path), condition)
                .await?
                .join()
                .await?;
        }
    }

    Ok(())
}
