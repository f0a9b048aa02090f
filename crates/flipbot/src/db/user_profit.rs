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

use chrono::Utc;
use flipbot_common::error::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use tracing::debug;

use super::entities::{prelude::*, *};

/// Credits `profit_delta` to a member's running total, creating the row on
/// their first approved flip.
///
/// This is a single upsert; the increment happens in the database so
/// concurrent approvals for the same member do not lose updates.
pub async fn add_or_update(
    guild_id: i64,
    user_id: i64,
    username: &str,
    profit_delta: f64,
    db: &DatabaseConnection,
) -> Result<()> {
    let entry = user_profit::ActiveModel {
        guild_id: ActiveValue::Set(guild_id),
        user_id: ActiveValue::Set(user_id),
        username: ActiveValue::Set(username.to_owned()),
        total_profit: ActiveValue::Set(profit_delta),
        updated_at: ActiveValue::Set(Utc::now()),
    };

    UserProfit::insert(entry)
        .on_conflict(
            OnConflict::columns([user_profit::Column::GuildId, user_profit::Column::UserId])
                .value(
                    user_profit::Column::TotalProfit,
                    Expr::col((UserProfit, user_profit::Column::TotalProfit)).add(profit_delta),
                )
                .update_columns([
                    user_profit::Column::Username,
                    user_profit::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    debug!(guild_id, user_id, profit_delta, "credited user profit");
    Ok(())
}

pub async fn get(
    guild_id: i64,
    user_id: i64,
    db: &DatabaseConnection,
) -> Result<Option<user_profit::Model>> {
    let entry = UserProfit::find_by_id((guild_id, user_id)).one(db).await?;
    Ok(entry)
}

/// Members of a guild by total profit, highest first.
pub async fn get_leaderboard(
    guild_id: i64,
    limit: u64,
    db: &DatabaseConnection,
) -> Result<Vec<user_profit::Model>> {
    let entries = UserProfit::find()
        .filter(user_profit::Column::GuildId.eq(guild_id))
        .order_by(user_profit::Column::TotalProfit, Order::Desc)
        .limit(limit)
        .all(db)
        .await?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::get_test_db;

    #[tokio::test]
    async fn it_should_create_then_accumulate() {
        let db = get_test_db().await;
        add_or_update(1, 7, "old name", 5.0, &db).await.unwrap();
        add_or_update(1, 7, "new name", 2.5, &db).await.unwrap();

        let entry = get(1, 7, &db).await.unwrap().unwrap();
        assert_eq!(entry.total_profit, 7.5);
        assert_eq!(entry.username, "new name");
    }

    #[tokio::test]
    async fn it_should_scope_totals_per_guild() {
        let db = get_test_db().await;
        add_or_update(1, 7, "alice", 5.0, &db).await.unwrap();
        add_or_update(2, 7, "alice", 9.0, &db).await.unwrap();

        assert_eq!(get(1, 7, &db).await.unwrap().unwrap().total_profit, 5.0);
        assert_eq!(get(2, 7, &db).await.unwrap().unwrap().total_profit, 9.0);
    }

    #[tokio::test]
    async fn it_should_order_the_leaderboard() {
        let db = get_test_db().await;
        add_or_update(1, 7, "low", 10.0, &db).await.unwrap();
        add_or_update(1, 8, "high", 30.0, &db).await.unwrap();
        add_or_update(1, 9, "mid", 20.0, &db).await.unwrap();
        add_or_update(2, 10, "elsewhere", 100.0, &db).await.unwrap();

        let rows = get_leaderboard(1, 10, &db).await.unwrap();
        let users: Vec<_> = rows.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![8, 9, 7]);

        let top = get_leaderboard(1, 2, &db).await.unwrap();
        assert_eq!(top.len(), 2);
    }
}
