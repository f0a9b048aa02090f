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

use chrono::{DateTime, Utc};
use flipbot_common::error::{FlipbotError, Result};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::debug;
use uuid;

use super::entities::{flip::FlipStatus, prelude::*, *};
use crate::flip::FlipDraft;

/// Partial update of a flip row. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct FlipPatch {
    pub status: Option<FlipStatus>,
    pub handled_by: Option<i64>,
    pub handled_at: Option<DateTime<Utc>>,
    pub member_message_id: Option<i64>,
}

pub async fn create(draft: &FlipDraft, db: &DatabaseConnection) -> Result<flip::Model> {
    let entry = flip::ActiveModel {
        id: ActiveValue::Set(uuid::Uuid::new_v4().to_string()),
        guild_id: ActiveValue::Set(draft.guild_id),
        user_id: ActiveValue::Set(draft.user_id),
        item: ActiveValue::Set(draft.item.to_owned()),
        purchase_price: ActiveValue::Set(draft.purchase_price),
        parts_price: ActiveValue::Set(draft.parts_price),
        sales_price: ActiveValue::Set(draft.sales_price),
        total_cost: ActiveValue::Set(draft.total_cost),
        profit: ActiveValue::Set(draft.profit),
        status: ActiveValue::Set(FlipStatus::Pending),
        created_at: ActiveValue::Set(Utc::now()),
        ..Default::default()
    };
    let model = entry.insert(db).await?;
    debug!(id = %model.id, guild_id = model.guild_id, "inserted flip");
    Ok(model)
}

fn patch_query(id: &str, patch: FlipPatch) -> Option<UpdateMany<Flip>> {
    let mut query = Flip::update_many().filter(flip::Column::Id.eq(id));
    let mut touched = false;
    if let Some(status) = patch.status {
        query = query.col_expr(flip::Column::Status, Expr::value(status.to_value()));
        touched = true;
    }
    if let Some(handled_by) = patch.handled_by {
        query = query.col_expr(flip::Column::HandledBy, Expr::value(handled_by));
        touched = true;
    }
    if let Some(handled_at) = patch.handled_at {
        query = query.col_expr(flip::Column::HandledAt, Expr::value(handled_at));
        touched = true;
    }
    if let Some(member_message_id) = patch.member_message_id {
        query = query.col_expr(
            flip::Column::MemberMessageId,
            Expr::value(member_message_id),
        );
        touched = true;
    }
    touched.then_some(query)
}

pub async fn update(id: &str, patch: FlipPatch, db: &DatabaseConnection) -> Result<()> {
    let Some(query) = patch_query(id, patch) else {
        return Ok(());
    };

    let res = query.exec(db).await?;
    if res.rows_affected == 0 {
        return Err(FlipbotError::RecordNotFound(id.to_owned()));
    }
    Ok(())
}

pub async fn set_member_message_id(
    id: &str,
    member_message_id: i64,
    db: &DatabaseConnection,
) -> Result<()> {
    update(
        id,
        FlipPatch {
            member_message_id: Some(member_message_id),
            ..Default::default()
        },
        db,
    )
    .await
}

/// Moves a pending flip into a terminal status.
///
/// The write only applies while the row is still pending, so two moderators
/// racing on the same flip cannot both succeed.
pub async fn transition(
    id: &str,
    status: FlipStatus,
    handled_by: i64,
    handled_at: DateTime<Utc>,
    db: &DatabaseConnection,
) -> Result<flip::Model> {
    let patch = FlipPatch {
        status: Some(status),
        handled_by: Some(handled_by),
        handled_at: Some(handled_at),
        ..Default::default()
    };
    let res = match patch_query(id, patch) {
        Some(query) => {
            query
                .filter(flip::Column::Status.eq(FlipStatus::Pending.to_value()))
                .exec(db)
                .await?
                .rows_affected
        }
        None => 0,
    };

    let current = get_by_id(id, db)
        .await?
        .ok_or_else(|| FlipbotError::RecordNotFound(id.to_owned()))?;

    if res == 0 {
        return Err(FlipbotError::AlreadyHandled {
            id: id.to_owned(),
            status: current.status.as_str().to_owned(),
        });
    }
    Ok(current)
}

pub async fn get_by_id(id: &str, db: &DatabaseConnection) -> Result<Option<flip::Model>> {
    let entry = Flip::find_by_id(id).one(db).await?;
    Ok(entry)
}

/// Pending flips of a guild, oldest submission first.
pub async fn get_pending(guild_id: i64, db: &DatabaseConnection) -> Result<Vec<flip::Model>> {
    let entries = Flip::find()
        .filter(flip::Column::GuildId.eq(guild_id))
        .filter(flip::Column::Status.eq(FlipStatus::Pending.to_value()))
        .order_by(flip::Column::CreatedAt, Order::Asc)
        .all(db)
        .await?;

    Ok(entries)
}

/// The most recently created pending flip for this submitter and item.
pub async fn find_pending(
    guild_id: i64,
    user_id: i64,
    item: &str,
    db: &DatabaseConnection,
) -> Result<Option<flip::Model>> {
    let entry = Flip::find()
        .filter(flip::Column::GuildId.eq(guild_id))
        .filter(flip::Column::UserId.eq(user_id))
        .filter(flip::Column::Item.eq(item))
        .filter(flip::Column::Status.eq(FlipStatus::Pending.to_value()))
        .order_by(flip::Column::CreatedAt, Order::Desc)
        .one(db)
        .await?;

    Ok(entry)
}
