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

use figment;
use sea_orm::DbErr;
use serde_json::Error as SerdeError;
use std::io;
use thiserror::Error;
use tokio;

#[derive(Debug, Error)]
pub enum FlipbotError {
    #[error("Database error: `{0}`")]
    Db(#[from] DbErr),
    #[error("Serialization/deserialization error: `{0}`")]
    Serde(#[from] SerdeError),
    #[error("Figment error: `{0}`")]
    Figment(#[from] Box<figment::Error>),
    #[error("I/O error: `{0}`")]
    Io(#[from] io::Error),
    #[error("Task error: `{0}`")]
    Join(#[from] tokio::task::JoinError),
    #[error("Chat platform error: `{0}`")]
    Chat(String),
    #[error("HTTP error: `{0}`")]
    Http(String),
    #[error("Message not found")]
    MessageNotFound,
    #[error("No flip record found for `{0}`")]
    RecordNotFound(String),
    #[error("Flip `{id}` was already {status}")]
    AlreadyHandled { id: String, status: String },
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Setup incomplete: `{0}`")]
    SetupIncomplete(String),
    #[error("Configured channel `{0}` no longer exists")]
    ChannelMissing(i64),
    #[error("Websocket close")]
    WebsocketClose,
}

impl From<figment::Error> for FlipbotError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl FlipbotError {
    /// True when a fetched external message has been deleted.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MessageNotFound)
    }
}

pub type Result<T> = std::result::Result<T, FlipbotError>;
