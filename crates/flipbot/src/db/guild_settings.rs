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

use flipbot_common::error::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use super::entities::{prelude::*, *};

/// Partial settings update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuildSettingsPatch {
    pub member_flips_channel_id: Option<i64>,
    pub leaderboard_channel_id: Option<i64>,
    pub log_channel_id: Option<i64>,
    pub leaderboard_summary_message_id: Option<i64>,
}

/// Reads the settings row of a guild, inserting a bare one on first access.
pub async fn get_or_create(
    guild_id: i64,
    db: &DatabaseConnection,
) -> Result<guild_settings::Model> {
    if let Some(existing) = GuildSettings::find_by_id(guild_id).one(db).await? {
        return Ok(existing);
    }

    let entry = guild_settings::ActiveModel {
        guild_id: ActiveValue::Set(guild_id),
        ..Default::default()
    };
    GuildSettings::insert(entry)
        .on_conflict(
            OnConflict::column(guild_settings::Column::GuildId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(GuildSettings::find_by_id(guild_id)
        .one(db)
        .await?
        .unwrap_or(guild_settings::Model {
            guild_id,
            ..Default::default()
        }))
}

pub async fn upsert(
    guild_id: i64,
    patch: GuildSettingsPatch,
    db: &DatabaseConnection,
) -> Result<()> {
    let mut entry = guild_settings::ActiveModel {
        guild_id: ActiveValue::Set(guild_id),
        ..Default::default()
    };
    let mut columns = vec![];

    if let Some(id) = patch.member_flips_channel_id {
        entry.member_flips_channel_id = ActiveValue::Set(Some(id));
        columns.push(guild_settings::Column::MemberFlipsChannelId);
    }
    if let Some(id) = patch.leaderboard_channel_id {
        entry.leaderboard_channel_id = ActiveValue::Set(Some(id));
        columns.push(guild_settings::Column::LeaderboardChannelId);
    }
    if let Some(id) = patch.log_channel_id {
        entry.log_channel_id = ActiveValue::Set(Some(id));
        columns.push(guild_settings::Column::LogChannelId);
    }
    if let Some(id) = patch.leaderboard_summary_message_id {
        entry.leaderboard_summary_message_id = ActiveValue::Set(Some(id));
        columns.push(guild_settings::Column::LeaderboardSummaryMessageId);
    }

    let mut on_conflict = OnConflict::column(guild_settings::Column::GuildId);
    if columns.is_empty() {
        on_conflict.do_nothing();
    } else {
        on_conflict.update_columns(columns);
    }

    GuildSettings::insert(entry)
        .on_conflict(on_conflict)
        .exec_without_returning(db)
        .await?;
    Ok(())
}
