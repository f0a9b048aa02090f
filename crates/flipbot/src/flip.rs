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
use flipbot_common::{
    chat::{FollowUp, InteractionRef, OutgoingMessage, mention_channel, mention_user},
    error::{FlipbotError, Result},
    flip::{FlipForm, FlipPayload},
    socket::{ModerateFlip, SubmitFlip},
};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, warn};

use crate::chat::ChatPlatform;
use crate::db::{
    self,
    entities::flip::{self, FlipStatus},
};
use crate::leaderboard;
use crate::render::{build_approval_request, format_currency};

/// Channel used for approval requests when none is configured.
pub const MEMBER_FLIPS_CHANNEL_NAME: &str = "member-flips";

/// A flip ready to be inserted, with its derived amounts computed.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipDraft {
    pub guild_id: i64,
    pub user_id: i64,
    pub item: String,
    pub purchase_price: f64,
    pub parts_price: f64,
    pub sales_price: f64,
    pub total_cost: f64,
    pub profit: f64,
}

impl FlipDraft {
    pub fn new(
        guild_id: i64,
        user_id: i64,
        item: impl Into<String>,
        purchase_price: f64,
        parts_price: f64,
        sales_price: f64,
    ) -> Self {
        let total_cost = purchase_price + parts_price;
        Self {
            guild_id,
            user_id,
            item: item.into(),
            purchase_price,
            parts_price,
            sales_price,
            total_cost,
            profit: sales_price - total_cost,
        }
    }

    pub fn from_form(guild_id: i64, user_id: i64, form: &FlipForm) -> Self {
        Self::new(
            guild_id,
            user_id,
            form.item.trim(),
            parse_amount(&form.purchase_price),
            parse_amount(&form.parts_price),
            parse_amount(&form.sales_price),
        )
    }
}

/// Reads a user-typed amount such as `$1,250.00`. Anything unreadable is 0.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// A moderator decision on a pending flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Approving also refreshes the leaderboard summary, ranking at most
    /// `leaderboard_limit` members.
    Approve { leaderboard_limit: u64 },
    Deny,
}

impl Decision {
    fn status(self) -> FlipStatus {
        match self {
            Self::Approve { .. } => FlipStatus::Approved,
            Self::Deny => FlipStatus::Denied,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Deny => "reject",
        }
    }

    fn header(self, user_id: i64) -> String {
        match self {
            Self::Approve { .. } => format!("{} — Approved ✅", mention_user(user_id)),
            Self::Deny => format!("{} — Rejected ❌", mention_user(user_id)),
        }
    }
}

/// Refuses submissions until both channels are configured and still exist.
pub async fn check_setup(
    guild_id: i64,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> Result<()> {
    let settings = db::guild_settings::get_or_create(guild_id, db).await?;
    let (Some(member_flips), Some(leaderboard)) =
        (settings.member_flips_channel_id, settings.leaderboard_channel_id)
    else {
        return Err(FlipbotError::SetupIncomplete(
            "member flips and leaderboard channels must both be set".to_owned(),
        ));
    };

    for channel_id in [member_flips, leaderboard] {
        if !chat.channel_exists(guild_id, channel_id).await? {
            return Err(FlipbotError::ChannelMissing(channel_id));
        }
    }
    Ok(())
}

pub fn setup_follow_up(result: Result<()>) -> FollowUp {
    match result {
        Ok(()) => FollowUp::ephemeral("Setup complete, the flip form can be shown."),
        Err(FlipbotError::SetupIncomplete(_)) => FollowUp::ephemeral(
            "**⚠️ Setup incomplete:**\n\
             This command can't be used until both channels are configured.\n\
             Please ask an admin to run `/setchannels` first.",
        ),
        Err(FlipbotError::ChannelMissing(_)) => FollowUp::ephemeral(
            "**⚠️ Channel not found:** One or both configured channels no longer exist.\n\
             Please have an admin re-run `/setchannels` to fix it.",
        ),
        Err(err) => {
            error!("Failed to check flip setup: {err}");
            FollowUp::ephemeral("Failed to check setup. Check logs.")
        }
    }
}

/// Posts a line to the guild's log channel. Never fails the caller.
pub async fn send_log_message(
    guild_id: i64,
    message: &str,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) {
    let channel_id = match db::guild_settings::get_or_create(guild_id, db).await {
        Ok(settings) => settings.log_channel_id,
        Err(err) => {
            warn!("Failed to send log message: {err}");
            return;
        }
    };
    let Some(channel_id) = channel_id else {
        return;
    };
    if let Err(err) = chat
        .send_message(channel_id, &OutgoingMessage::text(message))
        .await
    {
        warn!("Failed to send log message: {err}");
    }
}

async fn member_flips_channel(
    guild_id: i64,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> Result<Option<i64>> {
    let settings = db::guild_settings::get_or_create(guild_id, db).await?;
    match settings.member_flips_channel_id {
        Some(id) => Ok(Some(id)),
        None => {
            chat.find_text_channel(guild_id, MEMBER_FLIPS_CHANNEL_NAME)
                .await
        }
    }
}

async fn submit_inner(
    req: &SubmitFlip,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> Result<FollowUp> {
    let guild_id = req.interaction.guild_id;
    let draft = FlipDraft::from_form(guild_id, req.actor.id, &req.form);
    let record = db::flip::create(&draft, db).await?;

    let target = member_flips_channel(guild_id, db, chat).await?;
    let channel_id = target.unwrap_or(req.interaction.channel_id);
    let posted = chat
        .send_message(channel_id, &build_approval_request(&record))
        .await?;

    if let Err(err) = db::flip::set_member_message_id(&record.id, posted.id, db).await {
        error!(
            id = %record.id,
            "Failed to persist member_message_id for submitted flip: {err}"
        );
    }

    let channel = match target {
        Some(id) => mention_channel(id),
        None => format!("#{MEMBER_FLIPS_CHANNEL_NAME}"),
    };
    send_log_message(
        guild_id,
        &format!(
            "📝 **Flip submitted for approval by** {} — `{}` (Profit: {})",
            mention_user(req.actor.id),
            record.item,
            format_currency(record.profit)
        ),
        db,
        chat,
    )
    .await;
    info!(id = %record.id, guild_id, "flip submitted");

    Ok(FollowUp::ephemeral(format!(
        "✅ Flip saved and posted to {channel} for admin approval."
    )))
}

/// Records a member's flip as pending and asks moderators to review it.
pub async fn submit(
    req: &SubmitFlip,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> FollowUp {
    match submit_inner(req, db, chat).await {
        Ok(reply) => reply,
        Err(err) => {
            error!("Error posting flip for approval: {err}");
            FollowUp::ephemeral("Failed to submit flip — please try again later.")
        }
    }
}

/// Finds the row a moderator acted on.
///
/// A payload without an id falls back to the newest pending flip with the
/// same guild, submitter and item.
pub async fn resolve_target(payload: &FlipPayload, db: &DatabaseConnection) -> Result<flip::Model> {
    if let Some(id) = payload.id.as_deref().filter(|id| !id.is_empty()) {
        return db::flip::get_by_id(id, db)
            .await?
            .ok_or_else(|| FlipbotError::RecordNotFound(id.to_owned()));
    }

    debug!(
        guild_id = payload.guild_id,
        user_id = payload.user_id,
        "flip payload has no id, looking up pending flip"
    );
    db::flip::find_pending(payload.guild_id, payload.user_id, &payload.item, db)
        .await?
        .ok_or_else(|| {
            FlipbotError::RecordNotFound(format!(
                "pending `{}` by {}",
                payload.item, payload.user_id
            ))
        })
}

/// The profit credited on approval. A profit carried by the payload wins,
/// unreadable text counts as 0, and without one the stored value is used.
pub fn approved_profit(payload: &FlipPayload, record: &flip::Model) -> f64 {
    match payload.profit.as_deref() {
        Some(raw) => parse_amount(raw),
        None => record.profit,
    }
}

async fn display_name(guild_id: i64, user_id: i64, chat: &dyn ChatPlatform) -> String {
    match chat.member_name(guild_id, user_id).await {
        Ok(Some(name)) => name,
        Ok(None) => user_id.to_string(),
        Err(err) => {
            warn!(user_id, "Could not look up member name: {err}");
            user_id.to_string()
        }
    }
}

/// Rewrites a message to the decision header, keeping its embeds and
/// dropping its buttons. Posts the header instead if the edit is refused.
async fn mark_message(
    channel_id: i64,
    message_id: i64,
    header: &str,
    chat: &dyn ChatPlatform,
) -> Result<()> {
    let existing = chat.fetch_message(channel_id, message_id).await?;
    let replacement = OutgoingMessage {
        content: Some(header.to_owned()),
        embeds: existing.embeds,
        buttons: vec![],
    };
    if let Err(err) = chat
        .edit_message(channel_id, message_id, &replacement)
        .await
    {
        warn!(
            message_id,
            "Could not edit submission message, posting instead: {err}"
        );
        chat.send_message(channel_id, &OutgoingMessage::text(header))
            .await?;
    }
    Ok(())
}

async fn update_submission_message(
    decision: Decision,
    record: &flip::Model,
    member_message_id: Option<i64>,
    interaction: &InteractionRef,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) {
    let header = decision.header(record.user_id);

    let Some(message_id) = member_message_id else {
        if let Some(own) = interaction.message_id {
            if let Err(err) = mark_message(interaction.channel_id, own, &header, chat).await {
                debug!("Could not edit interaction message: {err}");
            }
        }
        return;
    };

    // Requests fall back to the submitter's channel when no member flips
    // channel exists, which is also where the moderator clicked.
    let channel_id = match member_flips_channel(record.guild_id, db, chat).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            debug!("No member flips channel, using the interaction channel.");
            interaction.channel_id
        }
        Err(err) => {
            warn!("Could not resolve member flips channel: {err}");
            return;
        }
    };
    if let Err(err) = mark_message(channel_id, message_id, &header, chat).await {
        error!(
            message_id,
            "Failed to edit original submission message: {err}"
        );
    }
}

async fn decide_inner(
    decision: Decision,
    req: &ModerateFlip,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> Result<flip::Model> {
    if !req.actor.is_moderator() {
        return Err(FlipbotError::PermissionDenied);
    }

    let target = resolve_target(&req.flip, db).await?;
    let record = db::flip::transition(&target.id, decision.status(), req.actor.id, Utc::now(), db)
        .await?;
    info!(
        id = %record.id,
        status = record.status.as_str(),
        handled_by = req.actor.id,
        "flip handled"
    );

    if let Decision::Approve { leaderboard_limit } = decision {
        let username = display_name(record.guild_id, record.user_id, chat).await;
        let profit = approved_profit(&req.flip, &record);
        db::user_profit::add_or_update(record.guild_id, record.user_id, &username, profit, db)
            .await?;

        if let Err(err) =
            leaderboard::refresh_summary(record.guild_id, leaderboard_limit, db, chat).await
        {
            warn!(
                guild_id = record.guild_id,
                "Failed sending leaderboard summary after approve: {err}"
            );
        }
    }

    let member_message_id = req.flip.member_message_id.or(record.member_message_id);
    update_submission_message(
        decision,
        &record,
        member_message_id,
        &req.interaction,
        db,
        chat,
    )
    .await;

    let line = match decision {
        Decision::Approve { .. } => "✅ **Flip approved:**",
        Decision::Deny => "❌ **Flip rejected:**",
    };
    send_log_message(
        record.guild_id,
        &format!(
            "{line} {} (submitted by {})",
            record.item,
            mention_user(record.user_id)
        ),
        db,
        chat,
    )
    .await;

    Ok(record)
}

/// Applies a moderator decision and turns the outcome into the actor's reply.
pub async fn decide(
    decision: Decision,
    req: &ModerateFlip,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> FollowUp {
    let verb = decision.verb();
    let err = match decide_inner(decision, req, db, chat).await {
        Ok(_) => {
            return FollowUp::ephemeral(match decision {
                Decision::Approve { .. } => "Flip approved and posted.",
                Decision::Deny => "Flip denied.",
            });
        }
        Err(err) => err,
    };

    let (reply, banner) = match &err {
        FlipbotError::PermissionDenied => {
            return FollowUp::ephemeral(format!("You don't have permission to {verb} flips."));
        }
        FlipbotError::AlreadyHandled { status, .. } => {
            info!("Ignoring repeated {verb}: {err}");
            return FollowUp::ephemeral(format!("This flip was already {status}."));
        }
        FlipbotError::RecordNotFound(_) => {
            error!("Attempted to {verb} flip but no DB id found: {err}");
            (
                format!(
                    "Failed to {verb} — could not locate the database row for this submission."
                ),
                format!("Failed to {verb} (no DB row)."),
            )
        }
        _ => {
            error!("Error trying to {verb} flip: {err}");
            (
                format!("Failed to {verb} flip. Check logs."),
                format!("Failed to {verb} (see logs)."),
            )
        }
    };

    if let Some(message_id) = req.interaction.message_id {
        let notice = OutgoingMessage::text(banner);
        if let Err(err) = chat
            .edit_message(req.interaction.channel_id, message_id, &notice)
            .await
        {
            debug!("Could not edit interaction message: {err}");
        }
    }
    FollowUp::ephemeral(reply)
}

pub async fn approve(
    req: &ModerateFlip,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
    leaderboard_limit: u64,
) -> FollowUp {
    decide(Decision::Approve { leaderboard_limit }, req, db, chat).await
}

pub async fn deny(
    req: &ModerateFlip,
    db: &DatabaseConnection,
    chat: &dyn ChatPlatform,
) -> FollowUp {
    decide(Decision::Deny, req, db, chat).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::guild_settings::GuildSettingsPatch;
    use crate::utils::{MockChat, get_test_db};
    use flipbot_common::{chat::Actor, flip::approve_custom_id};
    use quickcheck_macros::quickcheck;
    use sea_orm::ConnectionTrait;

    const GUILD: i64 = 10;
    const MEMBER_CHANNEL: i64 = 100;
    const LEADERBOARD_CHANNEL: i64 = 200;
    const LOG_CHANNEL: i64 = 300;
    const SUBMITTER: i64 = 7;
    const MODERATOR: i64 = 42;
    const ITEM: &str = "1997 Mercury 9.9";

    async fn setup() -> (DatabaseConnection, MockChat) {
        let db = get_test_db().await;
        let chat = MockChat::new();
        chat.add_channel(GUILD, MEMBER_CHANNEL, MEMBER_FLIPS_CHANNEL_NAME);
        chat.add_channel(GUILD, LEADERBOARD_CHANNEL, "leaderboard");
        chat.add_channel(GUILD, LOG_CHANNEL, "flip-logs");
        chat.add_member(GUILD, SUBMITTER, "alice");
        db::guild_settings::upsert(
            GUILD,
            GuildSettingsPatch {
                member_flips_channel_id: Some(MEMBER_CHANNEL),
                leaderboard_channel_id: Some(LEADERBOARD_CHANNEL),
                log_channel_id: Some(LOG_CHANNEL),
                ..Default::default()
            },
            &db,
        )
        .await
        .unwrap();
        (db, chat)
    }

    fn submission(purchase: &str, parts: &str, sales: &str) -> SubmitFlip {
        SubmitFlip {
            interaction: InteractionRef {
                id: "1".into(),
                guild_id: GUILD,
                channel_id: 999,
                message_id: None,
                guild_name: None,
            },
            actor: Actor {
                id: SUBMITTER,
                ..Default::default()
            },
            form: FlipForm {
                item: format!("  {ITEM} "),
                purchase_price: purchase.into(),
                parts_price: parts.into(),
                sales_price: sales.into(),
            },
        }
    }

    fn moderation(flip: FlipPayload, manage_guild: bool) -> ModerateFlip {
        ModerateFlip {
            interaction: InteractionRef {
                id: "2".into(),
                guild_id: GUILD,
                channel_id: MEMBER_CHANNEL,
                message_id: flip.member_message_id,
                guild_name: None,
            },
            actor: Actor {
                id: MODERATOR,
                manage_guild,
                ..Default::default()
            },
            flip,
        }
    }

    fn payload_for(record: &flip::Model) -> FlipPayload {
        FlipPayload {
            id: Some(record.id.clone()),
            guild_id: record.guild_id,
            user_id: record.user_id,
            item: record.item.clone(),
            profit: Some(format!("{:.2}", record.profit)),
            member_message_id: record.member_message_id,
        }
    }

    async fn submitted(db: &DatabaseConnection, chat: &MockChat) -> flip::Model {
        submit(&submission("10.00", "5.00", "20.00"), db, chat).await;
        db::flip::get_pending(GUILD, db).await.unwrap().remove(0)
    }

    async fn total_for(db: &DatabaseConnection, user_id: i64) -> Option<f64> {
        db::user_profit::get(GUILD, user_id, db)
            .await
            .unwrap()
            .map(|row| row.total_profit)
    }

    #[test]
    fn it_should_parse_amounts_leniently() {
        assert_eq!(parse_amount("10.00"), 10.0);
        assert_eq!(parse_amount(" $1,250.50 "), 1250.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("ten"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[quickcheck]
    fn derived_fields_follow_inputs(purchase: u32, parts: u32, sales: u32) -> bool {
        let (purchase, parts, sales) = (
            purchase as f64 / 100.0,
            parts as f64 / 100.0,
            sales as f64 / 100.0,
        );
        let draft = FlipDraft::new(GUILD, SUBMITTER, ITEM, purchase, parts, sales);
        draft.total_cost == purchase + parts && draft.profit == sales - draft.total_cost
    }

    #[tokio::test]
    async fn it_should_submit_a_pending_flip() {
        let (db, chat) = setup().await;

        let reply = submit(&submission("10.00", "5.00", "20.00"), &db, &chat).await;
        assert_eq!(
            reply.content,
            format!(
                "✅ Flip saved and posted to <#{MEMBER_CHANNEL}> for admin approval."
            )
        );
        assert!(reply.ephemeral);

        let pending = db::flip::get_pending(GUILD, &db).await.unwrap();
        assert_eq!(pending.len(), 1);
        let record = &pending[0];
        assert_eq!(record.item, ITEM);
        assert_eq!(record.total_cost, 15.0);
        assert_eq!(record.profit, 5.0);
        assert_eq!(record.status, FlipStatus::Pending);
        assert_eq!(record.handled_by, None);

        let posted = chat.messages_in(MEMBER_CHANNEL);
        assert_eq!(posted.len(), 1);
        assert_eq!(record.member_message_id, Some(posted[0].id));
        assert_eq!(posted[0].embeds[0].field_value("Profit"), Some("$5.00"));
        let buttons = chat.buttons(MEMBER_CHANNEL, posted[0].id);
        assert_eq!(buttons[0].custom_id, approve_custom_id(&record.id));

        let log = chat.messages_in(LOG_CHANNEL);
        assert_eq!(
            log[0].content,
            format!(
                "📝 **Flip submitted for approval by** <@{SUBMITTER}> — `{ITEM}` (Profit: $5.00)"
            )
        );
    }

    #[tokio::test]
    async fn it_should_fall_back_to_the_interaction_channel() {
        let db = get_test_db().await;
        let chat = MockChat::new();

        let reply = submit(&submission("1", "1", "5"), &db, &chat).await;
        assert_eq!(
            reply.content,
            "✅ Flip saved and posted to #member-flips for admin approval."
        );
        assert_eq!(chat.messages_in(999).len(), 1);
    }

    #[tokio::test]
    async fn it_should_approve_and_credit_profit_once() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;

        let reply = approve(&moderation(payload_for(&record), true), &db, &chat, 1000).await;
        assert_eq!(reply.content, "Flip approved and posted.");

        let stored = db::flip::get_by_id(&record.id, &db).await.unwrap().unwrap();
        assert_eq!(stored.status, FlipStatus::Approved);
        assert_eq!(stored.handled_by, Some(MODERATOR));
        assert!(stored.handled_at.is_some());
        assert_eq!(total_for(&db, SUBMITTER).await, Some(5.0));
        let aggregate = db::user_profit::get(GUILD, SUBMITTER, &db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(aggregate.username, "alice");

        let message_id = record.member_message_id.unwrap();
        let edited = chat.message(MEMBER_CHANNEL, message_id).unwrap();
        assert_eq!(edited.content, format!("<@{SUBMITTER}> — Approved ✅"));
        assert_eq!(edited.embeds.len(), 1);
        assert!(chat.buttons(MEMBER_CHANNEL, message_id).is_empty());

        assert_eq!(chat.messages_in(LEADERBOARD_CHANNEL).len(), 1);
        let log = chat.messages_in(LOG_CHANNEL);
        assert_eq!(
            log.last().unwrap().content,
            format!("✅ **Flip approved:** {ITEM} (submitted by <@{SUBMITTER}>)")
        );

        let again = approve(&moderation(payload_for(&record), true), &db, &chat, 1000).await;
        assert_eq!(again.content, "This flip was already approved.");
        assert_eq!(total_for(&db, SUBMITTER).await, Some(5.0));
    }

    #[tokio::test]
    async fn it_should_credit_once_under_concurrent_approvals() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;
        let req = moderation(payload_for(&record), true);

        let (a, b) = tokio::join!(
            approve(&req, &db, &chat, 1000),
            approve(&req, &db, &chat, 1000)
        );
        let successes = [a, b]
            .iter()
            .filter(|r| r.content == "Flip approved and posted.")
            .count();
        assert_eq!(successes, 1);
        assert_eq!(total_for(&db, SUBMITTER).await, Some(5.0));
    }

    #[tokio::test]
    async fn it_should_deny_without_touching_profit() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;

        let reply = deny(&moderation(payload_for(&record), true), &db, &chat).await;
        assert_eq!(reply.content, "Flip denied.");

        let stored = db::flip::get_by_id(&record.id, &db).await.unwrap().unwrap();
        assert_eq!(stored.status, FlipStatus::Denied);
        assert_eq!(stored.handled_by, Some(MODERATOR));
        assert_eq!(total_for(&db, SUBMITTER).await, None);

        let edited = chat
            .message(MEMBER_CHANNEL, record.member_message_id.unwrap())
            .unwrap();
        assert_eq!(edited.content, format!("<@{SUBMITTER}> — Rejected ❌"));
        assert!(chat.messages_in(LEADERBOARD_CHANNEL).is_empty());

        let approved_later =
            approve(&moderation(payload_for(&record), true), &db, &chat, 1000).await;
        assert_eq!(approved_later.content, "This flip was already denied.");
        assert_eq!(total_for(&db, SUBMITTER).await, None);
    }

    #[tokio::test]
    async fn it_should_resolve_flips_without_an_id() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;

        let mut payload = payload_for(&record);
        payload.id = None;
        payload.member_message_id = None;
        approve(&moderation(payload, true), &db, &chat, 1000).await;

        let stored = db::flip::get_by_id(&record.id, &db).await.unwrap().unwrap();
        assert_eq!(stored.status, FlipStatus::Approved);
        assert_eq!(total_for(&db, SUBMITTER).await, Some(5.0));
        let edited = chat
            .message(MEMBER_CHANNEL, record.member_message_id.unwrap())
            .unwrap();
        assert_eq!(edited.content, format!("<@{SUBMITTER}> — Approved ✅"));
    }

    #[tokio::test]
    async fn it_should_report_unresolvable_flips() {
        let (db, chat) = setup().await;
        let banner = chat.seed_message(MEMBER_CHANNEL, "approval request");

        let payload = FlipPayload {
            id: None,
            guild_id: GUILD,
            user_id: SUBMITTER,
            item: "nothing pending".into(),
            profit: Some("50".into()),
            member_message_id: None,
        };
        let mut req = moderation(payload, true);
        req.interaction.message_id = Some(banner);

        let reply = approve(&req, &db, &chat, 1000).await;
        assert_eq!(
            reply.content,
            "Failed to approve — could not locate the database row for this submission."
        );
        assert_eq!(total_for(&db, SUBMITTER).await, None);
        assert_eq!(
            chat.message(MEMBER_CHANNEL, banner).unwrap().content,
            "Failed to approve (no DB row)."
        );

        let reply = deny(&req, &db, &chat).await;
        assert_eq!(
            reply.content,
            "Failed to reject — could not locate the database row for this submission."
        );
    }

    #[tokio::test]
    async fn it_should_refuse_non_moderators() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;

        let reply = approve(&moderation(payload_for(&record), false), &db, &chat, 1000).await;
        assert_eq!(reply.content, "You don't have permission to approve flips.");
        let reply = deny(&moderation(payload_for(&record), false), &db, &chat).await;
        assert_eq!(reply.content, "You don't have permission to reject flips.");

        let stored = db::flip::get_by_id(&record.id, &db).await.unwrap().unwrap();
        assert_eq!(stored.status, FlipStatus::Pending);
        assert_eq!(total_for(&db, SUBMITTER).await, None);
    }

    #[tokio::test]
    async fn it_should_approve_when_the_summary_cannot_refresh() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;
        let summary = chat.seed_message(LEADERBOARD_CHANNEL, "old summary");
        db::guild_settings::upsert(
            GUILD,
            GuildSettingsPatch {
                leaderboard_summary_message_id: Some(summary),
                ..Default::default()
            },
            &db,
        )
        .await
        .unwrap();
        chat.fail_fetches(true);

        let reply = approve(&moderation(payload_for(&record), true), &db, &chat, 1000).await;
        assert_eq!(reply.content, "Flip approved and posted.");
        assert_eq!(total_for(&db, SUBMITTER).await, Some(5.0));
    }

    #[tokio::test]
    async fn it_should_leave_status_approved_when_crediting_fails() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;
        db.execute_unprepared("ALTER TABLE user_profit RENAME TO user_profit_offline")
            .await
            .unwrap();

        let reply = approve(&moderation(payload_for(&record), true), &db, &chat, 1000).await;
        assert_eq!(reply.content, "Failed to approve flip. Check logs.");

        let stored = db::flip::get_by_id(&record.id, &db).await.unwrap().unwrap();
        assert_eq!(stored.status, FlipStatus::Approved);
        assert_eq!(stored.handled_by, Some(MODERATOR));
        assert!(chat.messages_in(LEADERBOARD_CHANNEL).is_empty());

        db.execute_unprepared("ALTER TABLE user_profit_offline RENAME TO user_profit")
            .await
            .unwrap();
        assert_eq!(total_for(&db, SUBMITTER).await, None);

        let again = approve(&moderation(payload_for(&record), true), &db, &chat, 1000).await;
        assert_eq!(again.content, "This flip was already approved.");
        assert_eq!(total_for(&db, SUBMITTER).await, None);
    }

    #[tokio::test]
    async fn it_should_mark_requests_posted_in_the_interaction_channel() {
        let db = get_test_db().await;
        let chat = MockChat::new();
        let record = submitted(&db, &chat).await;
        let message_id = record.member_message_id.unwrap();

        let mut req = moderation(payload_for(&record), true);
        req.interaction.channel_id = 999;
        let reply = approve(&req, &db, &chat, 1000).await;
        assert_eq!(reply.content, "Flip approved and posted.");

        let edited = chat.message(999, message_id).unwrap();
        assert_eq!(edited.content, format!("<@{SUBMITTER}> — Approved ✅"));
        assert_eq!(edited.embeds.len(), 1);
        assert!(chat.buttons(999, message_id).is_empty());
    }

    #[tokio::test]
    async fn it_should_post_the_header_when_the_edit_fails() {
        let (db, chat) = setup().await;
        let record = submitted(&db, &chat).await;
        chat.fail_edits(true);

        deny(&moderation(payload_for(&record), true), &db, &chat).await;
        let posted = chat.messages_in(MEMBER_CHANNEL);
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[1].content, format!("<@{SUBMITTER}> — Rejected ❌"));
    }

    #[test]
    fn it_should_prefer_the_payload_profit() {
        let draft = FlipDraft::new(GUILD, SUBMITTER, ITEM, 10.0, 5.0, 20.0);
        let record = flip::Model {
            id: "x".into(),
            guild_id: draft.guild_id,
            user_id: draft.user_id,
            item: draft.item,
            purchase_price: draft.purchase_price,
            parts_price: draft.parts_price,
            sales_price: draft.sales_price,
            total_cost: draft.total_cost,
            profit: draft.profit,
            status: FlipStatus::Pending,
            handled_by: None,
            handled_at: None,
            member_message_id: None,
            created_at: Utc::now(),
        };
        let mut payload = payload_for(&record);
        payload.profit = Some("$7.50".into());
        assert_eq!(approved_profit(&payload, &record), 7.5);
        payload.profit = Some("n/a".into());
        assert_eq!(approved_profit(&payload, &record), 0.0);
        payload.profit = None;
        assert_eq!(approved_profit(&payload, &record), 5.0);
    }

    #[tokio::test]
    async fn it_should_gate_submission_on_setup() {
        let db = get_test_db().await;
        let chat = MockChat::new();

        let result = check_setup(GUILD, &db, &chat).await;
        assert!(matches!(result, Err(FlipbotError::SetupIncomplete(_))));

        db::guild_settings::upsert(
            GUILD,
            GuildSettingsPatch {
                member_flips_channel_id: Some(MEMBER_CHANNEL),
                leaderboard_channel_id: Some(LEADERBOARD_CHANNEL),
                ..Default::default()
            },
            &db,
        )
        .await
        .unwrap();
        chat.add_channel(GUILD, MEMBER_CHANNEL, MEMBER_FLIPS_CHANNEL_NAME);
        let result = check_setup(GUILD, &db, &chat).await;
        assert!(matches!(
            result,
            Err(FlipbotError::ChannelMissing(LEADERBOARD_CHANNEL))
        ));
        let reply = setup_follow_up(result);
        assert!(reply.content.contains("Channel not found"));

        chat.add_channel(GUILD, LEADERBOARD_CHANNEL, "leaderboard");
        assert!(check_setup(GUILD, &db, &chat).await.is_ok());
    }
}
