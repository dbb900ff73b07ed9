// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # pack-rt
//!
//! Command-line interface for inspecting inference packages.
//!
//! ## Usage
//! ```bash
//! # Print the assembled manifest, operators, topology and metadata
//! pack-rt inspect --package ./detector.fnnx
//!
//! # Same, extracting into scratch storage per a config file
//! pack-rt --config runtime.toml inspect --package ./detector.fnnx
//!
//! # List raw archive entries
//! pack-rt entries --package ./detector.fnnx
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pack-rt",
    about = "Inspector for self-contained inference packages",
    version,
    author
)]
struct Cli {
    /// Path to a TOML runtime configuration file.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a package and print its manifest, operators and topology.
    Inspect {
        /// Path to a package archive or extracted package directory.
        #[arg(short, long)]
        package: std::path::PathBuf,

        /// Print the patched manifest as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// List the entries of a package archive.
    Entries {
        /// Path to a package archive.
        #[arg(short, long)]
        package: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { package, json } => {
            commands::inspect::execute(package, cli.config, json).await
        }
        Commands::Entries { package } => commands::entries::execute(package).await,
    }
}
