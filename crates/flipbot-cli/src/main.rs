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

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use flipbot_common::{
    chat::{Actor, FollowUp, InteractionRef},
    socket::{AdminRequest, SocketMessage},
};
use futures_util::{Sink, SinkExt, StreamExt};
use http::HeaderValue;
use std::marker::Unpin;
use tokio_tungstenite::{
    connect_async,
    tungstenite::client::IntoClientRequest,
    tungstenite::protocol::{CloseFrame, Message, frame::coding::CloseCode},
};
use tracing::{debug, error};
use tracing_log::AsTrace;
use url::Url;
use uuid::Uuid;

/// The Flipbot CLI
#[derive(Debug, Parser)] // requires `derive` feature
#[command(version, about, long_about = None)]
struct Cli {
    /// API authentication token
    #[arg(short, long)]
    auth: String,

    /// IP address and port to connect to
    #[arg(short, long)]
    connect: String,

    /// Guild (server) id to act on
    #[arg(short, long)]
    guild: i64,

    /// Discord user id recorded as the acting moderator
    #[arg(short, long, default_value_t = 0)]
    operator: i64,

    /// Verbosity
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// show the guild's channel bindings
    #[command()]
    ShowConfig {},

    /// bind the member flips and leaderboard channels
    #[command(arg_required_else_help = true)]
    SetChannels {
        /// Member flips channel id
        #[arg(short, long)]
        member_flips: i64,

        /// Leaderboard channel id
        #[arg(short, long)]
        leaderboard: i64,
    },

    /// bind the log channel
    #[command(arg_required_else_help = true)]
    SetLogChannel {
        /// Log channel id
        #[arg(short, long)]
        channel: i64,
    },

    /// list flips awaiting approval
    #[command()]
    Pending {},

    /// show the top members
    #[command()]
    Leaderboard {},

    /// rebuild the leaderboard summary message
    #[command()]
    Refresh {},

    /// check datastore connectivity
    #[command()]
    PingDb {},

    /// register slash commands with Discord
    #[command()]
    Sync {},
}

fn admin_request(guild_id: i64, operator: i64) -> AdminRequest {
    AdminRequest {
        interaction: InteractionRef {
            id: Uuid::new_v4().to_string(),
            guild_id,
            channel_id: 0,
            message_id: None,
            guild_name: None,
        },
        actor: Actor {
            id: operator,
            name: Some("flipbot-cli".to_owned()),
            manage_guild: true,
            is_owner: false,
        },
    }
}

fn build_request(command: Commands, request: AdminRequest) -> SocketMessage<FollowUp> {
    match command {
        Commands::ShowConfig {} => SocketMessage::ShowConfig(request),
        Commands::SetChannels {
            member_flips,
            leaderboard,
        } => SocketMessage::SetChannels {
            request,
            member_flips_channel_id: member_flips,
            leaderboard_channel_id: leaderboard,
        },
        Commands::SetLogChannel { channel } => SocketMessage::SetLogChannel {
            request,
            log_channel_id: channel,
        },
        Commands::Pending {} => SocketMessage::ListPending(request),
        Commands::Leaderboard {} => SocketMessage::ShowLeaderboard(request),
        Commands::Refresh {} => SocketMessage::RefreshLeaderboard(request),
        Commands::PingDb {} => SocketMessage::PingDb(request),
        Commands::Sync {} => SocketMessage::SyncCommands(request),
    }
}

/// Plain-text rendering of a reply for the terminal.
fn render(reply: &FollowUp) -> String {
    let mut out = Vec::new();
    if !reply.content.is_empty() {
        out.push(reply.content.clone());
    }
    for embed in &reply.embeds {
        if let Some(title) = &embed.title {
            out.push(title.clone());
        }
        if let Some(description) = &embed.description {
            out.push(description.clone());
        }
        for field in &embed.fields {
            out.push(format!(
                "{}:\n  {}",
                field.name,
                field.value.replace('\n', "\n  ")
            ));
        }
        if let Some(footer) = &embed.footer {
            out.push(footer.clone());
        }
    }
    out.join("\n")
}

fn print_reply(text: &str) -> Result<bool> {
    let reply: SocketMessage<serde_json::Value> =
        serde_json::from_str(text).context("Unreadable reply")?;
    let (ok, response) = match reply {
        SocketMessage::Response(res) => (true, res.response),
        SocketMessage::Error(res) => (false, res.response),
        other => {
            debug!("Ignoring {}", other.kind());
            return Ok(false);
        }
    };
    match serde_json::from_value::<FollowUp>(response.clone()) {
        Ok(follow_up) => println!("{}", render(&follow_up)),
        Err(_) => println!("{response}"),
    }
    if !ok {
        error!("Server reported an error");
    }
    Ok(true)
}

async fn send<S>(sender: &mut S, req: &SocketMessage<FollowUp>) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Send + Sync + std::error::Error + 'static,
{
    sender
        .send(Message::Text(serde_json::to_string(req)?.into()))
        .await
        .context("Failed to send!")
}

async fn hangup<S>(sender: &mut S) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Send + Sync + std::error::Error + 'static,
{
    sender
        .send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "Normal".into(),
        })))
        .await
        .context("Failed to send close message.")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.log_level_filter().as_trace())
        .init();

    let url = Url::parse(&format!("ws://{}/ws", args.connect)).context("Invalid address")?;
    let mut request = url.into_client_request()?;
    let auth_value = HeaderValue::from_str(&args.auth).context("Invalid auth token")?;
    request.headers_mut().insert("Authorization", auth_value);
    let ws_stream = match connect_async(request).await {
        Ok((stream, response)) => {
            debug!("Handshake for client has been completed");
            debug!("Server response was {response:?}");
            stream
        }
        Err(e) => {
            error!("WebSocket handshake for client failed with {e}!");
            return Ok(());
        }
    };

    let (mut sender, mut receiver) = ws_stream.split();
    let req = build_request(args.command, admin_request(args.guild, args.operator));
    debug!("Request: {:?}", serde_json::to_string(&req)?);
    send(&mut sender, &req).await?;

    while let Some(msg) = receiver.next().await {
        match msg? {
            Message::Text(t) => {
                if print_reply(t.as_str())? {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => debug!("Unrecognized message"),
        }
    }
    hangup(&mut sender).await?;
    Ok(())
}
