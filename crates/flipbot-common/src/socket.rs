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

use serde::{Deserialize, Serialize};

use crate::chat::{Actor, InteractionRef};
use crate::flip::{FlipForm, FlipPayload};

#[derive(Debug, Serialize, Deserialize)]
pub struct Response<S: Serialize> {
    pub response_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub response: S,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFlip {
    pub interaction: InteractionRef,
    pub actor: Actor,
    pub form: FlipForm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerateFlip {
    pub interaction: InteractionRef,
    pub actor: Actor,
    pub flip: FlipPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRequest {
    pub interaction: InteractionRef,
    pub actor: Actor,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "message_type", content = "data")]
pub enum SocketMessage<S: Serialize> {
    /// Sent when a member invokes the submission command, before the form
    /// is shown.
    CheckSetup(AdminRequest),
    SubmitFlip(Box<SubmitFlip>),
    ApproveFlip(Box<ModerateFlip>),
    RejectFlip(Box<ModerateFlip>),
    ListPending(AdminRequest),
    ShowConfig(AdminRequest),
    ShowLeaderboard(AdminRequest),
    RefreshLeaderboard(AdminRequest),
    SetChannels {
        request: AdminRequest,
        member_flips_channel_id: i64,
        leaderboard_channel_id: i64,
    },
    SetLogChannel {
        request: AdminRequest,
        log_channel_id: i64,
    },
    PingDb(AdminRequest),
    SyncCommands(AdminRequest),
    Response(Response<S>),
    Error(Response<S>),
}

impl<S: Serialize> SocketMessage<S> {
    /// Name used as `response_type` in the reply.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CheckSetup(_) => "CheckSetup",
            Self::SubmitFlip(_) => "SubmitFlip",
            Self::ApproveFlip(_) => "ApproveFlip",
            Self::RejectFlip(_) => "RejectFlip",
            Self::ListPending(_) => "ListPending",
            Self::ShowConfig(_) => "ShowConfig",
            Self::ShowLeaderboard(_) => "ShowLeaderboard",
            Self::RefreshLeaderboard(_) => "RefreshLeaderboard",
            Self::SetChannels { .. } => "SetChannels",
            Self::SetLogChannel { .. } => "SetLogChannel",
            Self::PingDb(_) => "PingDb",
            Self::SyncCommands(_) => "SyncCommands",
            Self::Response(_) => "Response",
            Self::Error(_) => "Error",
        }
    }

    /// The interaction id to echo back so the gateway can route the reply.
    pub fn request_id(&self) -> Option<String> {
        let interaction = match self {
            Self::CheckSetup(r)
            | Self::ListPending(r)
            | Self::ShowConfig(r)
            | Self::ShowLeaderboard(r)
            | Self::RefreshLeaderboard(r)
            | Self::PingDb(r)
            | Self::SyncCommands(r) => &r.interaction,
            Self::SetChannels { request, .. } | Self::SetLogChannel { request, .. } => {
                &request.interaction
            }
            Self::SubmitFlip(s) => &s.interaction,
            Self::ApproveFlip(m) | Self::RejectFlip(m) => &m.interaction,
            Self::Response(_) | Self::Error(_) => return None,
        };
        Some(interaction.id.clone()).filter(|id| !id.is_empty())
    }
}
