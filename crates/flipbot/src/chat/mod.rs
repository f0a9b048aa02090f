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

pub mod discord;

use async_trait::async_trait;
use flipbot_common::{
    chat::{OutgoingMessage, PostedMessage},
    error::Result,
};

/// Outbound operations the bot needs from the chat platform. Event delivery
/// and permission resolution happen on the gateway side of the websocket.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_message(
        &self,
        channel_id: i64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage>;

    /// Fails with `FlipbotError::MessageNotFound` when the message was deleted.
    async fn fetch_message(&self, channel_id: i64, message_id: i64) -> Result<PostedMessage>;

    async fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage>;

    /// Looks up a text channel of the guild by its name.
    async fn find_text_channel(&self, guild_id: i64, name: &str) -> Result<Option<i64>>;

    async fn channel_exists(&self, guild_id: i64, channel_id: i64) -> Result<bool>;

    /// Display name of a guild member, if they are still in the guild.
    async fn member_name(&self, guild_id: i64, user_id: i64) -> Result<Option<String>>;

    /// Publishes the application commands. Returns how many were registered.
    async fn register_commands(&self) -> Result<usize>;
}
