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

use async_trait::async_trait;
use flipbot_common::{
    chat::{Button, ButtonStyle, Embed, EmbedField, OutgoingMessage, PostedMessage},
    error::{FlipbotError, Result},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::ChatPlatform;

const GUILD_TEXT: u8 = 0;
const GUILD_ANNOUNCEMENT: u8 = 5;
const ADMINISTRATOR: &str = "8";

/// Discord REST v10 client authenticated as the bot user.
#[derive(Clone)]
pub struct DiscordClient {
    agent: ureq::Agent,
    api: Url,
    token: String,
    application_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawFooter {
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawEmbed {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    fields: Vec<EmbedField>,
    footer: Option<RawFooter>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    channel_id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    embeds: Vec<RawEmbed>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    guild_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    user: Option<RawUser>,
}

fn parse_snowflake(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| FlipbotError::Chat(format!("invalid snowflake `{raw}`")))
}

impl TryFrom<RawMessage> for PostedMessage {
    type Error = FlipbotError;

    fn try_from(raw: RawMessage) -> Result<Self> {
        Ok(PostedMessage {
            id: parse_snowflake(&raw.id)?,
            channel_id: parse_snowflake(&raw.channel_id)?,
            content: raw.content,
            embeds: raw
                .embeds
                .into_iter()
                .map(|e| Embed {
                    title: e.title,
                    description: e.description,
                    fields: e.fields,
                    footer: e.footer.map(|f| f.text),
                })
                .collect(),
        })
    }
}

fn embed_json(embed: &Embed) -> Value {
    let mut value = json!({
        "fields": embed.fields.iter().map(|f| json!({
            "name": f.name,
            "value": f.value,
            "inline": f.inline,
        })).collect::<Vec<_>>(),
    });
    if let Some(title) = &embed.title {
        value["title"] = json!(title);
    }
    if let Some(description) = &embed.description {
        value["description"] = json!(description);
    }
    if let Some(footer) = &embed.footer {
        value["footer"] = json!({ "text": footer });
    }
    value
}

fn button_json(button: &Button) -> Value {
    let style = match button.style {
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
    };
    json!({
        "type": 2,
        "style": style,
        "label": button.label,
        "custom_id": button.custom_id,
    })
}

/// Request body for creating or editing a message.
fn message_body(message: &OutgoingMessage) -> Value {
    let components = if message.buttons.is_empty() {
        vec![]
    } else {
        vec![json!({
            "type": 1,
            "components": message.buttons.iter().map(button_json).collect::<Vec<_>>(),
        })]
    };
    let mut body = json!({
        "embeds": message.embeds.iter().map(embed_json).collect::<Vec<_>>(),
        "components": components,
    });
    if let Some(content) = &message.content {
        body["content"] = json!(content);
    }
    body
}

fn channel_option(name: &str, description: &str) -> Value {
    json!({
        "type": 7,
        "name": name,
        "description": description,
        "required": true,
        "channel_types": [GUILD_TEXT, GUILD_ANNOUNCEMENT],
    })
}

/// Slash commands published by `register_commands`.
pub fn command_definitions() -> Value {
    json!([
        {
            "name": "flip",
            "type": 1,
            "description": "Submit a flip for approval (single modal)",
            "dm_permission": false,
        },
        {
            "name": "showconfig",
            "type": 1,
            "description":
                "Display current bot configuration for this guild (channels & message IDs).",
            "default_member_permissions": ADMINISTRATOR,
            "dm_permission": false,
        },
        {
            "name": "setchannels",
            "type": 1,
            "description": "Configure member-flips and leaderboard channels",
            "default_member_permissions": ADMINISTRATOR,
            "dm_permission": false,
            "options": [
                channel_option(
                    "member_flips_channel",
                    "Channel where flips are posted for approval"
                ),
                channel_option("leaderboard_channel", "Channel for the leaderboard summary"),
            ],
        },
        {
            "name": "setlogchannel",
            "type": 1,
            "description": "Configure a logging channel for flip events",
            "default_member_permissions": ADMINISTRATOR,
            "dm_permission": false,
            "options": [
                channel_option("log_channel", "Channel where flip logs will be posted"),
            ],
        },
        {
            "name": "pending",
            "type": 1,
            "description": "List flips waiting for approval",
            "default_member_permissions": ADMINISTRATOR,
            "dm_permission": false,
        },
        {
            "name": "leaderboard",
            "type": 1,
            "description": "Show the top members by total profit",
            "dm_permission": false,
        },
        {
            "name": "pingdb",
            "type": 1,
            "description": "Check datastore connectivity",
            "default_member_permissions": ADMINISTRATOR,
            "dm_permission": false,
        },
        {
            "name": "sync",
            "type": 1,
            "description": "Sync bot's slash commands globally (admin only).",
            "default_member_permissions": ADMINISTRATOR,
            "dm_permission": false,
        },
    ])
}

impl DiscordClient {
    pub fn new(api: Url, token: &str, application_id: Option<i64>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!(
                "DiscordBot (https://github.com/throneless-tech/flipbot, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build();
        Self {
            agent,
            api,
            token: token.to_owned(),
            application_id,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api.as_str().trim_end_matches('/'), path)
    }

    /// Performs one REST call off the async runtime. A 404 comes back as
    /// `Ok(None)`.
    async fn call<T>(
        &self,
        method: &'static str,
        path: String,
        body: Option<Value>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let url = self.endpoint(&path);
        let auth = format!("Bot {}", self.token);

        tokio::task::spawn_blocking(move || -> Result<Option<T>> {
            debug!(method, %url, "discord request");
            let request = agent.request(method, &url).set("Authorization", &auth);
            let response = match body {
                Some(body) => request.send_json(body),
                None => request.call(),
            };
            match response {
                Ok(response) => Ok(Some(response.into_json::<T>()?)),
                Err(ureq::Error::Status(404, _)) => Ok(None),
                Err(ureq::Error::Status(code, response)) => Err(FlipbotError::Http(format!(
                    "{method} {path} returned {code}: {}",
                    response.into_string().unwrap_or_default()
                ))),
                Err(err) => Err(FlipbotError::Http(err.to_string())),
            }
        })
        .await?
    }

    async fn guild_channels(&self, guild_id: i64) -> Result<Vec<RawChannel>> {
        Ok(self
            .call("GET", format!("guilds/{guild_id}/channels"), None)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    async fn send_message(
        &self,
        channel_id: i64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage> {
        let raw: RawMessage = self
            .call(
                "POST",
                format!("channels/{channel_id}/messages"),
                Some(message_body(message)),
            )
            .await?
            .ok_or_else(|| FlipbotError::Chat(format!("channel {channel_id} not found")))?;
        raw.try_into()
    }

    async fn fetch_message(&self, channel_id: i64, message_id: i64) -> Result<PostedMessage> {
        let raw: RawMessage = self
            .call(
                "GET",
                format!("channels/{channel_id}/messages/{message_id}"),
                None,
            )
            .await?
            .ok_or(FlipbotError::MessageNotFound)?;
        raw.try_into()
    }

    async fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage> {
        let raw: RawMessage = self
            .call(
                "PATCH",
                format!("channels/{channel_id}/messages/{message_id}"),
                Some(message_body(message)),
            )
            .await?
            .ok_or(FlipbotError::MessageNotFound)?;
        raw.try_into()
    }

    async fn find_text_channel(&self, guild_id: i64, name: &str) -> Result<Option<i64>> {
        self.guild_channels(guild_id)
            .await?
            .into_iter()
            .find(|c| {
                matches!(c.kind, GUILD_TEXT | GUILD_ANNOUNCEMENT) && c.name.as_deref() == Some(name)
            })
            .map(|c| parse_snowflake(&c.id))
            .transpose()
    }

    async fn channel_exists(&self, guild_id: i64, channel_id: i64) -> Result<bool> {
        let channel: Option<RawChannel> = self
            .call("GET", format!("channels/{channel_id}"), None)
            .await?;
        Ok(channel
            .and_then(|c| c.guild_id)
            .is_some_and(|g| g == guild_id.to_string()))
    }

    async fn member_name(&self, guild_id: i64, user_id: i64) -> Result<Option<String>> {
        let member: Option<RawMember> = self
            .call("GET", format!("guilds/{guild_id}/members/{user_id}"), None)
            .await?;
        Ok(member.and_then(|m| m.user).map(|u| u.username))
    }

    async fn register_commands(&self) -> Result<usize> {
        let application_id = self
            .application_id
            .ok_or_else(|| FlipbotError::Chat("application id is not configured".to_owned()))?;
        let registered: Vec<Value> = self
            .call(
                "PUT",
                format!("applications/{application_id}/commands"),
                Some(command_definitions()),
            )
            .await?
            .unwrap_or_default();
        info!(count = registered.len(), "registered application commands");
        Ok(registered.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_render_buttons_as_an_action_row() {
        let embed = Embed::new("Outboard", "Submitted by <@7>").field("Profit", "5.0", true);
        let message = OutgoingMessage {
            content: None,
            embeds: vec![embed],
            buttons: vec![Button {
                custom_id: "flip:approve:abc".into(),
                label: "Approve".into(),
                style: ButtonStyle::Success,
            }],
        };
        let body = message_body(&message);

        assert!(body.get("content").is_none());
        assert_eq!(body["embeds"][0]["title"], "Outboard");
        assert_eq!(body["embeds"][0]["fields"][0]["value"], "5.0");
        assert_eq!(body["components"][0]["type"], 1);
        assert_eq!(body["components"][0]["components"][0]["style"], 3);
        assert_eq!(
            body["components"][0]["components"][0]["custom_id"],
            "flip:approve:abc"
        );
    }

    #[test]
    fn it_should_clear_components_on_edit() {
        let body = message_body(&OutgoingMessage::text("<@7> — Approved ✅"));
        assert_eq!(body["content"], "<@7> — Approved ✅");
        assert_eq!(body["components"], json!([]));
    }

    #[test]
    fn it_should_parse_a_message() {
        let raw: RawMessage = serde_json::from_value(json!({
            "id": "1180000000000000001",
            "channel_id": "1180000000000000002",
            "content": "",
            "embeds": [{
                "type": "rich",
                "title": "🏆 Leaderboard Summary",
                "fields": [{ "name": "Total profit", "value": "$5.00", "inline": false }],
                "footer": { "text": "hi" }
            }],
            "components": []
        }))
        .unwrap();
        let message = PostedMessage::try_from(raw).unwrap();

        assert_eq!(message.id, 1180000000000000001);
        assert_eq!(message.channel_id, 1180000000000000002);
        assert_eq!(message.embeds[0].field_value("Total profit"), Some("$5.00"));
        assert_eq!(message.embeds[0].footer.as_deref(), Some("hi"));
    }

    #[test]
    fn it_should_define_unique_commands() {
        let commands = command_definitions();
        let names: Vec<_> = commands
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_owned())
            .collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();

        assert_eq!(names.len(), unique.len());
        assert!(names.contains(&"flip".to_owned()));
        assert!(names.contains(&"sync".to_owned()));
    }
}
