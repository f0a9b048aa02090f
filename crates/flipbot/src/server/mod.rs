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

use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
};
use clap::Args;
use clap_verbosity_flag::Verbosity;
use flipbot_common::error::Result;
use std::{net::SocketAddr, path::Path, sync::Arc};
use subtle::ConstantTimeEq;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_log::AsTrace;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, ApiState};
use crate::chat::{ChatPlatform, discord::DiscordClient};
use crate::config::{Settings, SettingsArgs};
use crate::{db, socket};

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Verbosity
    #[command(flatten)]
    verbose: Verbosity,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Console logging, plus daily rotated files when `log_dir` is set.
/// `RUST_LOG` overrides the level chosen on the command line.
pub fn init_tracing(level: LevelFilter, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(rolling::daily(dir, "flipbot.log"));
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

async fn authenticate(
    State(state): State<ApiState>,
    req: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    match auth_header {
        Some(auth_header) if bool::from(auth_header.as_bytes().ct_eq(state.auth.as_bytes())) => {
            Ok(next.run(req).await)
        }
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/ws", any(socket::handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .route("/health", get(api::health))
        .with_state(state)
}

fn discord_client(settings: &Settings) -> DiscordClient {
    DiscordClient::new(
        settings.discord_api_url.clone(),
        &settings.discord_token,
        settings.application_id,
    )
}

pub async fn init_server(server: ServerArgs) -> Result<()> {
    let settings = Settings::load(&server.settings)?;
    let _guard = init_tracing(
        server.verbose.log_level_filter().as_trace(),
        settings.log_dir.as_deref(),
    );

    let db = db::connect(&settings.database_url).await?;
    let chat: Arc<dyn ChatPlatform> = Arc::new(discord_client(&settings));

    if settings.sync_commands_on_start {
        match chat.register_commands().await {
            Ok(count) => info!("Globally synced {count} commands"),
            Err(err) => warn!("Command sync on start failed: {err}"),
        }
    }

    let state = ApiState {
        db,
        auth: settings.auth,
        chat,
        leaderboard_limit: settings.leaderboard_limit,
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    info!("Server is running on {}", settings.bind);
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Registers the slash commands once and exits.
pub async fn sync_commands(server: ServerArgs) -> Result<()> {
    let settings = Settings::load(&server.settings)?;
    let _guard = init_tracing(server.verbose.log_level_filter().as_trace(), None);

    let count = discord_client(&settings).register_commands().await?;
    info!("Globally synced {count} commands");
    Ok(())
}
