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
    chat::{Button, ButtonStyle, Embed, OutgoingMessage, mention_channel, mention_user},
    flip::{approve_custom_id, reject_custom_id},
};

use crate::db::entities::{flip, guild_settings, user_profit};

pub const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Formats an amount as dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

pub fn rank_marker(rank: usize) -> String {
    match rank {
        1..=3 => MEDALS[rank - 1].to_owned(),
        _ => format!("#{rank}"),
    }
}

/// One `<marker> <@user> — $amount` line per member, in the given order.
pub fn standings_lines(rows: &[user_profit::Model]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let profit = if row.total_profit.is_finite() {
                row.total_profit
            } else {
                0.0
            };
            format!(
                "{} {} — {}",
                rank_marker(i + 1),
                mention_user(row.user_id),
                format_currency(profit)
            )
        })
        .collect()
}

pub fn build_flip_embed(record: &flip::Model) -> Embed {
    Embed::new(
        record.item.clone(),
        format!("Submitted by {}", mention_user(record.user_id)),
    )
    .field(
        "Purchase price",
        format_currency(record.purchase_price),
        true,
    )
    .field("Parts price", format_currency(record.parts_price), true)
    .field("Total cost", format_currency(record.total_cost), true)
    .field("Sale price", format_currency(record.sales_price), true)
    .field("Profit", format_currency(record.profit), true)
}

/// The approval request posted for moderators.
pub fn build_approval_request(record: &flip::Model) -> OutgoingMessage {
    OutgoingMessage {
        content: None,
        embeds: vec![build_flip_embed(record)],
        buttons: vec![
            Button {
                custom_id: approve_custom_id(&record.id),
                label: "Approve".to_owned(),
                style: ButtonStyle::Success,
            },
            Button {
                custom_id: reject_custom_id(&record.id),
                label: "Reject".to_owned(),
                style: ButtonStyle::Danger,
            },
        ],
    }
}

/// Top members view, independent of the reconciled summary message.
pub fn build_leaderboard_embed(rows: &[user_profit::Model]) -> Embed {
    let embed = Embed::new("🏆 Leaderboard", "Top members by total profit");
    if rows.is_empty() {
        return embed.field("No data", "No approved flips yet.", false);
    }
    embed.field("Leaderboard", standings_lines(rows).join("\n"), false)
}

pub fn build_pending_embed(rows: &[flip::Model]) -> Embed {
    let embed = Embed::new(
        "⏳ Pending flips",
        format!("{} awaiting approval", rows.len()),
    );
    if rows.is_empty() {
        return embed.field("Pending", "Nothing waiting for approval.", false);
    }
    let lines: Vec<String> = rows
        .iter()
        .map(|f| {
            format!(
                "`{}` {} — {} ({})",
                f.item,
                mention_user(f.user_id),
                format_currency(f.profit),
                f.created_at.format("%Y-%m-%d %H:%M UTC")
            )
        })
        .collect();
    embed.field("Pending", truncate_field(&lines.join("\n")), false)
}

fn channel_display(id: Option<i64>) -> String {
    match id {
        Some(id) => format!("{} (id: `{id}`)", mention_channel(id)),
        None => "Not set".to_owned(),
    }
}

pub fn build_config_embed(guild_name: &str, settings: &guild_settings::Model) -> Embed {
    Embed::new(
        "🔧 Bot Configuration",
        format!("Server: **{guild_name}** (`{}`)", settings.guild_id),
    )
    .field(
        "Member flips channel",
        channel_display(settings.member_flips_channel_id),
        false,
    )
    .field(
        "Leaderboard channel",
        channel_display(settings.leaderboard_channel_id),
        false,
    )
    .field(
        "Log channel",
        channel_display(settings.log_channel_id),
        false,
    )
    .field(
        "Leaderboard summary message id",
        settings
            .leaderboard_summary_message_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "Not set".to_owned()),
        true,
    )
    .footer(
        "Use /setchannels and /setlogchannel to update these settings.",
    )
}

/// Embed field values are capped at 1024 characters by the platform.
pub const FIELD_LIMIT: usize = 1024;
const FIELD_KEEP: usize = 1000;

pub fn truncate_field(text: &str) -> String {
    if text.chars().count() <= FIELD_LIMIT {
        return text.to_owned();
    }
    let kept: String = text.chars().take(FIELD_KEEP).collect();
    format!("{kept}\n…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(user_id: i64, total_profit: f64) -> user_profit::Model {
        user_profit::Model {
            guild_id: 1,
            user_id,
            username: format!("user{user_id}"),
            total_profit,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn it_should_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(5.0), "$5.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-5.5), "-$5.50");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn it_should_mark_ranks() {
        let lines = standings_lines(&[row(1, 40.0), row(2, 30.0), row(3, 20.0), row(4, 10.0)]);
        assert_eq!(lines[0], "🥇 <@1> — $40.00");
        assert_eq!(lines[1], "🥈 <@2> — $30.00");
        assert_eq!(lines[2], "🥉 <@3> — $20.00");
        assert_eq!(lines[3], "#4 <@4> — $10.00");
    }

    #[test]
    fn it_should_truncate_long_fields() {
        let short = "a".repeat(FIELD_LIMIT);
        assert_eq!(truncate_field(&short), short);

        let long = "é".repeat(FIELD_LIMIT + 1);
        let truncated = truncate_field(&long);
        assert!(truncated.ends_with("\n…"));
        assert_eq!(truncated.chars().count(), FIELD_KEEP + 2);
    }

    #[test]
    fn it_should_show_an_empty_leaderboard() {
        let embed = build_leaderboard_embed(&[]);
        assert_eq!(embed.field_value("No data"), Some("No approved flips yet."));
    }

    #[test]
    fn it_should_show_unset_channels() {
        let settings = guild_settings::Model {
            guild_id: 9,
            log_channel_id: Some(33),
            ..Default::default()
        };
        let embed = build_config_embed("Boats", &settings);
        assert_eq!(embed.field_value("Member flips channel"), Some("Not set"));
        assert_eq!(embed.field_value("Log channel"), Some("<#33> (id: `33`)"));
        assert_eq!(
            embed.field_value("Leaderboard summary message id"),
            Some("Not set")
        );
    }
}
