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

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use flipbot_common::{
    chat::{Actor, FollowUp},
    error::{FlipbotError, Result},
    socket::{AdminRequest, ModerateFlip, SubmitFlip},
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    chat::ChatPlatform,
    db::{self, guild_settings::GuildSettingsPatch},
    flip,
    leaderboard::{self, SummaryOutcome},
    render::{build_config_embed, build_leaderboard_embed, build_pending_embed},
};

/// Rows shown by the on-demand leaderboard view.
const LEADERBOARD_TOP: u64 = 10;

#[derive(Clone)]
pub struct ApiState {
    pub db: DatabaseConnection,
    pub auth: String,
    pub chat: Arc<dyn ChatPlatform>,
    pub leaderboard_limit: u64,
}

fn require_moderator(actor: &Actor) -> Result<()> {
    if actor.is_moderator() {
        Ok(())
    } else {
        Err(FlipbotError::PermissionDenied)
    }
}

/// Reply for an admin command that failed.
pub fn error_follow_up(kind: &str, err: &FlipbotError) -> FollowUp {
    if let FlipbotError::PermissionDenied = err {
        return FollowUp::ephemeral("You need Manage Server permission to use this.");
    }
    error!("{kind} failed: {err}");
    FollowUp::ephemeral(match kind {
        "ShowConfig" => "Failed to fetch configuration. Check logs.",
        "SetChannels" => "Failed to configure channels. Check logs.",
        "SetLogChannel" => "❌ Failed to configure log channel. Check logs.",
        "ListPending" => "Failed to list pending flips. Check logs.",
        "ShowLeaderboard" => "Failed to load the leaderboard. Check logs.",
        "RefreshLeaderboard" => "Failed to refresh the leaderboard summary. Check logs.",
        _ => "Something went wrong. Check logs.",
    })
}

/*
Flips
*/

pub async fn check_setup(req: &AdminRequest, state: &ApiState) -> FollowUp {
    let result = flip::check_setup(req.interaction.guild_id, &state.db, state.chat.as_ref()).await;
    flip::setup_follow_up(result)
}

pub async fn submit_flip(req: &SubmitFlip, state: &ApiState) -> FollowUp {
    flip::submit(req, &state.db, state.chat.as_ref()).await
}

pub async fn approve_flip(req: &ModerateFlip, state: &ApiState) -> FollowUp {
    flip::approve(req, &state.db, state.chat.as_ref(), state.leaderboard_limit).await
}

pub async fn reject_flip(req: &ModerateFlip, state: &ApiState) -> FollowUp {
    flip::deny(req, &state.db, state.chat.as_ref()).await
}

pub async fn list_pending(req: &AdminRequest, state: &ApiState) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    let pending = db::flip::get_pending(req.interaction.guild_id, &state.db).await?;
    Ok(FollowUp::ephemeral("").with_embed(build_pending_embed(&pending)))
}

/*
Leaderboard
*/

pub async fn show_leaderboard(req: &AdminRequest, state: &ApiState) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    let rows =
        db::user_profit::get_leaderboard(req.interaction.guild_id, LEADERBOARD_TOP, &state.db)
            .await?;
    Ok(FollowUp::ephemeral("").with_embed(build_leaderboard_embed(&rows)))
}

pub async fn refresh_leaderboard(req: &AdminRequest, state: &ApiState) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    let outcome = leaderboard::refresh_summary(
        req.interaction.guild_id,
        state.leaderboard_limit,
        &state.db,
        state.chat.as_ref(),
    )
    .await?;
    Ok(FollowUp::ephemeral(match outcome {
        SummaryOutcome::Edited { channel_id, .. } => {
            format!("✅ Leaderboard summary updated in <#{channel_id}>.")
        }
        SummaryOutcome::Created { channel_id, .. } => {
            format!("✅ Leaderboard summary posted to <#{channel_id}>.")
        }
        SummaryOutcome::NoChannel => {
            "No leaderboard channel is configured. Run `/setchannels` first.".to_owned()
        }
    }))
}

/*
Settings
*/

pub async fn show_config(req: &AdminRequest, state: &ApiState) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    let settings = db::guild_settings::get_or_create(req.interaction.guild_id, &state.db).await?;
    let guild_name = req
        .interaction
        .guild_name
        .as_deref()
        .unwrap_or("this server");
    Ok(FollowUp::ephemeral("").with_embed(build_config_embed(guild_name, &settings)))
}

pub async fn set_channels(
    req: &AdminRequest,
    member_flips_channel_id: i64,
    leaderboard_channel_id: i64,
    state: &ApiState,
) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    db::guild_settings::upsert(
        req.interaction.guild_id,
        GuildSettingsPatch {
            member_flips_channel_id: Some(member_flips_channel_id),
            leaderboard_channel_id: Some(leaderboard_channel_id),
            ..Default::default()
        },
        &state.db,
    )
    .await?;
    info!(guild_id = req.interaction.guild_id, "channels configured");
    Ok(FollowUp::ephemeral("✅ Channels configured."))
}

pub async fn set_log_channel(
    req: &AdminRequest,
    log_channel_id: i64,
    state: &ApiState,
) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    db::guild_settings::upsert(
        req.interaction.guild_id,
        GuildSettingsPatch {
            log_channel_id: Some(log_channel_id),
            ..Default::default()
        },
        &state.db,
    )
    .await?;
    Ok(FollowUp::ephemeral("✅ Log channel configured."))
}

/*
Maintenance
*/

pub async fn ping_db(req: &AdminRequest, state: &ApiState) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    let (ok, detail) = db::ping(&state.db).await;
    Ok(FollowUp::ephemeral(if ok {
        format!("✅ Database connected: {detail}")
    } else {
        format!("❌ Database ping failed: {detail}")
    }))
}

pub async fn sync_commands(req: &AdminRequest, state: &ApiState) -> Result<FollowUp> {
    require_moderator(&req.actor)?;
    match state.chat.register_commands().await {
        Ok(count) => {
            info!("Globally synced {count} commands");
            Ok(FollowUp::ephemeral(format!(
                "✅ Synced {count} global commands successfully."
            )))
        }
        Err(err) => {
            error!("Unexpected error during sync: {err}");
            Ok(FollowUp::ephemeral(format!("❌ Sync failed: {err}")))
        }
    }
}

pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let (ok, detail) = db::ping(&state.db).await;
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "ok": ok, "detail": detail })))
}
