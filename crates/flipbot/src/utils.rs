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

#[cfg(test)]
use crate::chat::{ChatPlatform, discord::command_definitions};
#[cfg(test)]
use crate::db;
#[cfg(test)]
use crate::{api::ApiState, server};
#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use axum::http::{HeaderValue, header};
#[cfg(test)]
use axum_test::{TestServer, TestWebSocket};
#[cfg(test)]
use flipbot_common::{
    chat::{Button, OutgoingMessage, PostedMessage},
    error::{FlipbotError, Result},
};
#[cfg(test)]
use sea_orm::{Database, DatabaseConnection};
#[cfg(test)]
use sea_orm_migration::MigratorTrait;
#[cfg(test)]
use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

#[cfg(test)]
pub async fn get_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db::migration::Migrator::refresh(&db).await.unwrap();
    db
}

#[cfg(test)]
#[derive(Default)]
struct MockState {
    next_id: i64,
    messages: BTreeMap<(i64, i64), (PostedMessage, Vec<Button>)>,
    channels: Vec<(i64, i64, String)>,
    members: HashMap<(i64, i64), String>,
    sent: usize,
    fail_fetches: bool,
    fail_edits: bool,
}

/// In-memory chat platform with scripted channels, members and failures.
#[cfg(test)]
#[derive(Default)]
pub struct MockChat {
    state: Mutex<MockState>,
}

#[cfg(test)]
impl MockChat {
    pub fn new() -> Self {
        let chat = Self::default();
        chat.state.lock().unwrap().next_id = 9000;
        chat
    }

    pub fn add_channel(&self, guild_id: i64, channel_id: i64, name: &str) {
        self.state
            .lock()
            .unwrap()
            .channels
            .push((guild_id, channel_id, name.to_owned()));
    }

    pub fn add_member(&self, guild_id: i64, user_id: i64, name: &str) {
        self.state
            .lock()
            .unwrap()
            .members
            .insert((guild_id, user_id), name.to_owned());
    }

    /// Places a message without counting it as sent by the bot.
    pub fn seed_message(&self, channel_id: i64, content: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let posted = PostedMessage {
            id,
            channel_id,
            content: content.to_owned(),
            embeds: vec![],
        };
        state.messages.insert((channel_id, id), (posted, vec![]));
        id
    }

    pub fn delete_message(&self, channel_id: i64, message_id: i64) {
        self.state
            .lock()
            .unwrap()
            .messages
            .remove(&(channel_id, message_id));
    }

    pub fn message(&self, channel_id: i64, message_id: i64) -> Option<PostedMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(&(channel_id, message_id))
            .map(|(posted, _)| posted.clone())
    }

    pub fn buttons(&self, channel_id: i64, message_id: i64) -> Vec<Button> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(&(channel_id, message_id))
            .map(|(_, buttons)| buttons.clone())
            .unwrap_or_default()
    }

    /// Live messages of a channel, oldest first.
    pub fn messages_in(&self, channel_id: i64) -> Vec<PostedMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|((channel, _), _)| *channel == channel_id)
            .map(|(_, (posted, _))| posted.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.state.lock().unwrap().sent
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetches = fail;
    }

    pub fn fail_edits(&self, fail: bool) {
        self.state.lock().unwrap().fail_edits = fail;
    }
}

#[cfg(test)]
#[async_trait]
impl ChatPlatform for MockChat {
    async fn send_message(
        &self,
        channel_id: i64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.sent += 1;
        let posted = PostedMessage {
            id: state.next_id,
            channel_id,
            content: message.content.clone().unwrap_or_default(),
            embeds: message.embeds.clone(),
        };
        state.messages.insert(
            (channel_id, posted.id),
            (posted.clone(), message.buttons.clone()),
        );
        Ok(posted)
    }

    async fn fetch_message(&self, channel_id: i64, message_id: i64) -> Result<PostedMessage> {
        let state = self.state.lock().unwrap();
        if state.fail_fetches {
            return Err(FlipbotError::Http("503 Service Unavailable".to_owned()));
        }
        state
            .messages
            .get(&(channel_id, message_id))
            .map(|(posted, _)| posted.clone())
            .ok_or(FlipbotError::MessageNotFound)
    }

    async fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage> {
        let mut state = self.state.lock().unwrap();
        if state.fail_edits {
            return Err(FlipbotError::Chat("Missing Permissions".to_owned()));
        }
        let (posted, buttons) = state
            .messages
            .get_mut(&(channel_id, message_id))
            .ok_or(FlipbotError::MessageNotFound)?;
        if let Some(content) = &message.content {
            posted.content = content.clone();
        }
        posted.embeds = message.embeds.clone();
        *buttons = message.buttons.clone();
        Ok(posted.clone())
    }

    async fn find_text_channel(&self, guild_id: i64, name: &str) -> Result<Option<i64>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|(guild, _, channel_name)| *guild == guild_id && channel_name == name)
            .map(|(_, id, _)| *id))
    }

    async fn channel_exists(&self, guild_id: i64, channel_id: i64) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .iter()
            .any(|(guild, id, _)| *guild == guild_id && *id == channel_id))
    }

    async fn member_name(&self, guild_id: i64, user_id: i64) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .get(&(guild_id, user_id))
            .cloned())
    }

    async fn register_commands(&self) -> Result<usize> {
        Ok(command_definitions().as_array().map_or(0, |c| c.len()))
    }
}

#[cfg(test)]
pub async fn get_test_state() -> (ApiState, Arc<MockChat>) {
    let chat = Arc::new(MockChat::new());
    let state = ApiState {
        db: get_test_db().await,
        auth: "test".into(),
        chat: chat.clone(),
        leaderboard_limit: 1000,
    };
    (state, chat)
}

#[cfg(test)]
pub fn get_test_server(state: ApiState) -> TestServer {
    let app = server::router(state);
    TestServer::builder()
        .http_transport()
        .build(app.into_make_service_with_connect_info::<SocketAddr>())
        .unwrap()
}

#[cfg(test)]
pub async fn get_test_socket(state: ApiState) -> (TestServer, TestWebSocket) {
    let server = get_test_server(state);
    let socket = server
        .get_websocket("/ws")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("test"))
        .await
        .into_websocket()
        .await;
    (server, socket)
}
