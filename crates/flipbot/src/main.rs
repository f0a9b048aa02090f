// Flipbot
// Copyright (C) 2025 Throneless Tech

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod flip;
pub mod leaderboard;
pub mod render;
pub mod server;
pub mod socket;
pub mod utils;

use clap::{Parser, Subcommand};

use flipbot_common::error::FlipbotError;

/// The Flipbot server
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the websocket front door for the gateway bridge
    Server(server::ServerArgs),
    /// Register the slash commands with Discord and exit
    Sync(server::ServerArgs),
}

#[tokio::main]
async fn main() -> Result<(), FlipbotError> {
    let args = Cli::parse();
    match args.command {
        Commands::Server(server) => server::init_server(server).await,
        Commands::Sync(server) => server::sync_commands(server).await,
    }
}
