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

use flipbot_common::{
    chat::{Embed, OutgoingMessage},
    error::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};

use crate::chat::ChatPlatform;
use crate::db::{self, entities::user_profit, guild_settings::GuildSettingsPatch};
use crate::render::{format_currency, standings_lines, truncate_field};

/// Channel used for the summary when none is configured.
pub const LEADERBOARD_CHANNEL_NAME: &str = "leaderboard";

/// How a summary refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    Edited { channel_id: i64, message_id: i64 },
    Created { channel_id: i64, message_id: i64 },
    NoChannel,
}

/// Sum of all totals, skipping values that are not finite numbers.
pub fn grand_total(rows: &[user_profit::Model]) -> f64 {
    rows.iter()
        .filter_map(|row| {
            if row.total_profit.is_finite() {
                Some(row.total_profit)
            } else {
                debug!(user_id = row.user_id, "skipping unusable total_profit");
                None
            }
        })
        .sum()
}

pub fn build_summary_embed(rows: &[user_profit::Model]) -> Embed {
    let participants = if rows.is_empty() {
        "No participants yet.".to_owned()
    } else {
        truncate_field(&standings_lines(rows).join("\n"))
    };

    Embed::new("🏆 Leaderboard Summary", "Totals and participants")
        .field("Total profit", format_currency(grand_total(rows)), false)
        .field("Participants", participants, false)
}

async fn resolve_channel(
    guild_id: i64,
    configured: Option<i64>,
    chat: &dyn ChatPlatform,
) -> Result<Option<i64>> {
    match configured {
        Some(id) => Ok(Some(id)),
        None => {
            chat.find_text_channel(guild_id, LEADERBOARD_CHANNEL_NAME)
                .await
        }
    }
}

/// Rebuilds the guild's summary message from the stored totals.
///
/// The stored message is edited in place while it exists. When it has been
/// deleted, a new one is posted and its id saved to the guild settings. Any
/// other platform failure aborts the run.
pub async fn refresh_summary(
    guild_id: i64,
    limit: u64,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> Result<SummaryOutcome> {
    let rows = db::user_profit::get_leaderboard(guild_id, limit, db).await?;
    let message = OutgoingMessage::embed(build_summary_embed(&rows));

    let settings = db::guild_settings::get_or_create(guild_id, db).await?;
    let Some(channel_id) =
        resolve_channel(guild_id, settings.leaderboard_channel_id, chat).await?
    else {
        info!(guild_id, "no leaderboard channel to send summary to");
        return Ok(SummaryOutcome::NoChannel);
    };

    if let Some(message_id) = settings.leaderboard_summary_message_id {
        let edited = match chat.fetch_message(channel_id, message_id).await {
            Ok(existing) => chat.edit_message(channel_id, existing.id, &message).await,
            Err(err) => Err(err),
        };
        match edited {
            Ok(_) => {
                debug!(guild_id, message_id, "edited leaderboard summary");
                return Ok(SummaryOutcome::Edited {
                    channel_id,
                    message_id,
                });
            }
            Err(err) if err.is_not_found() => {
                warn!(
                    guild_id,
                    message_id, "stored leaderboard summary was deleted, sending a new one"
                );
            }
            Err(err) => return Err(err),
        }
    }

    let posted = chat.send_message(channel_id, &message).await?;
    db::guild_settings::upsert(
        guild_id,
        GuildSettingsPatch {
            leaderboard_channel_id: Some(channel_id),
            leaderboard_summary_message_id: Some(posted.id),
            ..Default::default()
        },
        db,
    )
    .await?;
    info!(
        guild_id,
        message_id = posted.id,
        "posted new leaderboard summary"
    );

    Ok(SummaryOutcome::Created {
        channel_id,
        message_id: posted.id,
    })
}
